//! Per-run session state and the routing of suite calls to it.
//!
//! Suite tables are static, so trampolines find their state through a
//! process-wide slot holding the active [`SessionContext`]. Only one
//! session runs at a time: [`SuiteSession::begin`] takes a run lock for
//! the lifetime of the session and clears the slot when it ends. Calls
//! arriving afterwards find no session and fail with a null result.

use std::sync::Arc;
use std::time::Instant;

use filterhost_abi::RgbColor;
use parking_lot::{Mutex, MutexGuard, RwLock};
use uuid::Uuid;

use super::arena::next_session_tag;
use super::buffer::BufferStore;
use super::descriptor::DescriptorStore;
use super::handle::HandleStore;
use super::property::{DocumentProperties, PropertyStore};
use super::{SuiteError, SuiteResult};
use crate::callbacks::{HostCallbacks, PreviewFrame, ProgressEvent};
use crate::color::ColorProfileConverter;

static ACTIVE_SESSION: RwLock<Option<Arc<SessionContext>>> = parking_lot::const_rwlock(None);
static RUN_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// The session suite calls are routed to, if any.
pub(crate) fn active() -> Option<Arc<SessionContext>> {
    ACTIVE_SESSION.read().clone()
}

/// Run `f` against the active session.
///
/// # Errors
///
/// [`SuiteError::NoSession`] when no session is active.
pub(crate) fn with_active<T>(f: impl FnOnce(&SessionContext) -> SuiteResult<T>) -> SuiteResult<T> {
    let session = active().ok_or(SuiteError::NoSession)?;
    f(&session)
}

/// Fixed facts about the run a session serves.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Title of the running filter.
    pub plugin_title: String,
    /// Title of the document.
    pub document_title: String,
    /// Record image mode.
    pub image_mode: i16,
    /// Channels in the document.
    pub channel_count: i32,
    /// Bytes of buffer space advertised to the plug-in.
    pub max_space: i32,
    /// Owner window handle.
    pub owner_window: isize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            plugin_title: String::new(),
            document_title: "Untitled".to_string(),
            image_mode: filterhost_abi::image_mode::RGB_COLOR,
            channel_count: 3,
            max_space: 64 * 1024 * 1024,
            owner_window: 0,
        }
    }
}

/// Resources still live when a session ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeakReport {
    /// Unfreed buffers.
    pub buffers: usize,
    /// Undisposed handles.
    pub handles: usize,
    /// Unfreed descriptors.
    pub descriptors: usize,
}

impl LeakReport {
    /// Whether nothing leaked.
    pub fn is_clean(&self) -> bool {
        self.buffers == 0 && self.handles == 0 && self.descriptors == 0
    }
}

/// State owned by one filter run.
///
/// Each store is behind its own lock; no method holds two at once.
pub struct SessionContext {
    id: Uuid,
    tag: u16,
    options: SessionOptions,
    callbacks: HostCallbacks,
    converter: Mutex<Option<ColorProfileConverter>>,
    started: Instant,
    buffers: Mutex<BufferStore>,
    handles: Mutex<HandleStore>,
    descriptors: Mutex<DescriptorStore>,
    properties: Mutex<PropertyStore>,
}

impl SessionContext {
    /// Fresh state for one run.
    pub fn new(options: SessionOptions, callbacks: HostCallbacks) -> Self {
        let tag = next_session_tag();
        let limit = usize::try_from(options.max_space).unwrap_or(0);
        let properties = PropertyStore::new(DocumentProperties {
            channel_count: options.channel_count,
            image_mode: options.image_mode,
            title: options.document_title.clone(),
        });
        Self {
            id: Uuid::new_v4(),
            tag,
            options,
            callbacks,
            converter: Mutex::new(None),
            started: Instant::now(),
            buffers: Mutex::new(BufferStore::new(tag, limit)),
            handles: Mutex::new(HandleStore::new(tag)),
            descriptors: Mutex::new(DescriptorStore::new(tag)),
            properties: Mutex::new(properties),
        }
    }

    /// Attach the color bridge used for previews.
    pub fn with_color_converter(self, converter: ColorProfileConverter) -> Self {
        *self.converter.lock() = Some(converter);
        self
    }

    /// Unique id, used in logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Tag carried by every identifier this session hands out.
    pub fn tag(&self) -> u16 {
        self.tag
    }

    /// Options the session was created with.
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Buffer store.
    pub fn buffers(&self) -> MutexGuard<'_, BufferStore> {
        self.buffers.lock()
    }

    /// Handle store.
    pub fn handles(&self) -> MutexGuard<'_, HandleStore> {
        self.handles.lock()
    }

    /// Descriptor store.
    pub fn descriptors(&self) -> MutexGuard<'_, DescriptorStore> {
        self.descriptors.lock()
    }

    /// Property store.
    pub fn properties(&self) -> MutexGuard<'_, PropertyStore> {
        self.properties.lock()
    }

    /// Whether the application asked to abort.
    pub fn is_aborted(&self) -> bool {
        self.callbacks.should_abort()
    }

    /// Forward progress to the application.
    pub fn report_progress(&self, done: i32, total: i32) {
        self.callbacks.report_progress(ProgressEvent { done, total });
    }

    /// Milliseconds since the session started, wrapping.
    pub fn tick_count(&self) -> u32 {
        self.started.elapsed().as_millis() as u32
    }

    /// Ask the application for a color.
    ///
    /// # Errors
    ///
    /// [`SuiteError::Cancelled`] when no picker is installed or the user
    /// dismissed it.
    pub fn pick_color(&self, prompt: &str) -> SuiteResult<RgbColor> {
        let pick = self.callbacks.pick_color.as_ref().ok_or(SuiteError::Cancelled)?;
        pick(prompt).ok_or(SuiteError::Cancelled)
    }

    /// Whether a preview sink is installed.
    pub fn has_preview(&self) -> bool {
        self.callbacks.preview.is_some()
    }

    /// Color correct a BGRA preview and hand it to the preview sink.
    ///
    /// # Errors
    ///
    /// Propagates color transform failures.
    pub fn present_preview(&self, frame: PreviewFrame) -> crate::error::Result<()> {
        let Some(sink) = &self.callbacks.preview else {
            return Ok(());
        };
        let corrected = match self.converter.lock().as_ref() {
            Some(converter) => {
                let mut out = frame.surface.clone();
                if converter.color_correct_bgra(&frame.surface, &mut out)? {
                    PreviewFrame {
                        surface: out,
                        ..frame
                    }
                } else {
                    frame
                }
            }
            None => frame,
        };
        sink(&corrected);
        Ok(())
    }

    /// Color correct an 8-bit gray preview and hand it to the preview sink.
    ///
    /// `frame` holds the gray samples already expanded to BGRA; `gray`
    /// holds the raw samples, `stride` bytes per row.
    ///
    /// # Errors
    ///
    /// Propagates color transform failures.
    pub fn present_gray_preview(
        &self,
        gray: &[u8],
        stride: usize,
        frame: PreviewFrame,
    ) -> crate::error::Result<()> {
        let Some(sink) = &self.callbacks.preview else {
            return Ok(());
        };
        let mut frame = frame;
        if let Some(converter) = self.converter.lock().as_ref() {
            converter.color_correct_grayscale(gray, stride, &mut frame.surface)?;
        }
        sink(&frame);
        Ok(())
    }

    /// Live resource counts.
    pub fn leak_report(&self) -> LeakReport {
        LeakReport {
            buffers: self.buffers.lock().len(),
            handles: self.handles.lock().len(),
            descriptors: self.descriptors.lock().len(),
        }
    }

    /// Free every resource the plug-in left behind and dispose the color
    /// bridge. Returns what was still live.
    pub fn release_all(&self) -> LeakReport {
        let report = LeakReport {
            buffers: self.buffers.lock().release_all(),
            handles: self.handles.lock().release_all(),
            descriptors: self.descriptors.lock().release_all(),
        };
        if let Some(mut converter) = self.converter.lock().take() {
            converter.dispose();
        }
        report
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("options", &self.options)
            .field("callbacks", &self.callbacks)
            .finish_non_exhaustive()
    }
}

/// Scope during which suite calls reach one [`SessionContext`].
///
/// Ending the scope, by [`SuiteSession::end`] or by drop, detaches the
/// context, frees everything the plug-in leaked and warns about it.
pub struct SuiteSession {
    context: Arc<SessionContext>,
    report: Option<LeakReport>,
    _run: MutexGuard<'static, ()>,
}

impl SuiteSession {
    /// Make `context` the target of suite calls, waiting for any other
    /// session to end first.
    pub fn begin(context: SessionContext) -> Self {
        let run = RUN_LOCK.lock();
        let context = Arc::new(context);
        *ACTIVE_SESSION.write() = Some(context.clone());
        tracing::debug!(
            session = %context.id(),
            plugin = %context.options().plugin_title,
            "Suite session started"
        );
        Self {
            context,
            report: None,
            _run: run,
        }
    }

    /// The session's state.
    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// End the session now and return what the plug-in leaked.
    pub fn end(mut self) -> LeakReport {
        self.finish()
    }

    fn finish(&mut self) -> LeakReport {
        if let Some(report) = self.report {
            return report;
        }
        ACTIVE_SESSION.write().take();
        let report = self.context.release_all();
        if report.is_clean() {
            tracing::debug!(session = %self.context.id(), "Suite session ended");
        } else {
            tracing::warn!(
                session = %self.context.id(),
                plugin = %self.context.options().plugin_title,
                buffers = report.buffers,
                handles = report.handles,
                descriptors = report.descriptors,
                "Plug-in leaked resources; released at session end"
            );
        }
        self.report = Some(report);
        report
    }
}

impl Drop for SuiteSession {
    fn drop(&mut self) {
        self.finish();
    }
}

impl std::fmt::Debug for SuiteSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteSession")
            .field("context", &self.context)
            .field("ended", &self.report.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_session_routes_and_detaches() -> TestResult {
        let session = SuiteSession::begin(SessionContext::new(
            SessionOptions::default(),
            HostCallbacks::default(),
        ));
        let handle = with_active(|s| s.handles().allocate(4))?;
        assert!(session.context().handles().contains(handle));

        let report = session.end();
        assert_eq!(report.handles, 1);
        // Another test may have started its own session by now, so only
        // the failure is certain, not its kind.
        assert!(with_active(|s| s.handles().size(handle)).is_err());
        Ok(())
    }

    #[test]
    fn test_handles_do_not_cross_sessions() -> TestResult {
        let first = SuiteSession::begin(SessionContext::new(
            SessionOptions::default(),
            HostCallbacks::default(),
        ));
        let leaked = first.context().handles().allocate(16)?;
        drop(first);

        let second = SuiteSession::begin(SessionContext::new(
            SessionOptions::default(),
            HostCallbacks::default(),
        ));
        assert!(!second.context().handles().contains(leaked));
        let fresh = second.context().handles().allocate(16)?;
        assert_ne!(fresh, leaked);
        assert!(second.end().handles == 1);
        Ok(())
    }

    #[test]
    fn test_pick_color_without_picker_is_cancelled() {
        let context = SessionContext::new(SessionOptions::default(), HostCallbacks::default());
        assert_eq!(context.pick_color("Pick"), Err(SuiteError::Cancelled));
    }
}
