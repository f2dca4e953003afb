//! Callbacks through which a running filter reaches the calling application.

use std::sync::Arc;

use filterhost_abi::RgbColor;
use filterhost_surface::PixelSurface;
use serde::{Deserialize, Serialize};

/// Polled between plug-in calls and by the plug-in's abort proc.
pub type AbortPredicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// Receives progress reported by the plug-in.
pub type ProgressSink = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Shows a color picker with the given prompt; `None` when dismissed.
pub type PickColor = Arc<dyn Fn(&str) -> Option<RgbColor> + Send + Sync>;

/// Receives preview pixels the plug-in asked the host to display.
pub type PreviewSink = Arc<dyn Fn(&PreviewFrame) + Send + Sync>;

/// One progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Units of work done.
    pub done: i32,
    /// Total units of work.
    pub total: i32,
}

impl ProgressEvent {
    /// Completed fraction in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total <= 0 {
            return 0.0;
        }
        (f64::from(self.done) / f64::from(self.total)).clamp(0.0, 1.0)
    }
}

/// Preview pixels, converted to BGRA and color corrected.
#[derive(Debug, Clone)]
pub struct PreviewFrame {
    /// The pixels.
    pub surface: PixelSurface,
    /// Destination row in the plug-in's preview.
    pub row: i32,
    /// Destination column in the plug-in's preview.
    pub column: i32,
}

/// The full set of application callbacks for a run.
#[derive(Clone, Default)]
pub struct HostCallbacks {
    /// Abort predicate.
    pub abort: Option<AbortPredicate>,
    /// Progress sink.
    pub progress: Option<ProgressSink>,
    /// Color picker.
    pub pick_color: Option<PickColor>,
    /// Preview sink.
    pub preview: Option<PreviewSink>,
}

impl HostCallbacks {
    /// Whether the abort predicate asks to stop.
    pub fn should_abort(&self) -> bool {
        self.abort.as_ref().is_some_and(|abort| abort())
    }

    /// Forward a progress report.
    pub fn report_progress(&self, event: ProgressEvent) {
        if let Some(progress) = &self.progress {
            progress(event);
        }
    }
}

impl std::fmt::Debug for HostCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostCallbacks")
            .field("abort", &self.abort.is_some())
            .field("progress", &self.progress.is_some())
            .field("pick_color", &self.pick_color.is_some())
            .field("preview", &self.preview.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn test_fraction_clamps() {
        assert_eq!(ProgressEvent { done: 5, total: 10 }.fraction(), 0.5);
        assert_eq!(ProgressEvent { done: 20, total: 10 }.fraction(), 1.0);
        assert_eq!(ProgressEvent { done: 1, total: 0 }.fraction(), 0.0);
    }

    #[test]
    fn test_callbacks_default_to_no_op() {
        let callbacks = HostCallbacks::default();
        assert!(!callbacks.should_abort());
        callbacks.report_progress(ProgressEvent::default());
    }

    #[test]
    fn test_progress_is_forwarded() {
        let last = Arc::new(AtomicI32::new(0));
        let seen = last.clone();
        let callbacks = HostCallbacks {
            progress: Some(Arc::new(move |e: ProgressEvent| seen.store(e.done, Ordering::SeqCst))),
            ..HostCallbacks::default()
        };
        callbacks.report_progress(ProgressEvent { done: 7, total: 9 });
        assert_eq!(last.load(Ordering::SeqCst), 7);
    }
}
