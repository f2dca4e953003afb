//! Host UI services offered to plug-ins.

use filterhost_abi::{RawHandle, RgbColor};

use super::SuiteResult;
use super::session::SessionContext;

/// Prompt shown when the plug-in passes none.
pub const DEFAULT_PICK_PROMPT: &str = "Choose a color";

/// Owner window handle for plug-in dialogs.
pub fn main_window(context: &SessionContext) -> isize {
    context.options().owner_window
}

/// New handle holding the running filter's title as a C string.
///
/// # Errors
///
/// [`super::SuiteError::Exhausted`] when no handle identifier is left.
pub fn plugin_name(context: &SessionContext) -> SuiteResult<RawHandle> {
    let mut bytes = context.options().plugin_title.as_bytes().to_vec();
    bytes.push(0);
    context.handles().from_bytes(&bytes)
}

/// Ask the application's color picker for a color.
///
/// # Errors
///
/// [`super::SuiteError::Cancelled`] when there is no picker or the user
/// dismissed it.
pub fn pick_color(context: &SessionContext, prompt: Option<&str>) -> SuiteResult<RgbColor> {
    let prompt = prompt.filter(|p| !p.is_empty()).unwrap_or(DEFAULT_PICK_PROMPT);
    tracing::debug!(prompt, "Plug-in requested a color");
    context.pick_color(prompt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::HostCallbacks;
    use crate::suites::SuiteError;
    use crate::suites::session::SessionOptions;
    use std::sync::Arc;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn context(callbacks: HostCallbacks) -> SessionContext {
        SessionContext::new(
            SessionOptions {
                plugin_title: "Ripple".into(),
                owner_window: 42,
                ..SessionOptions::default()
            },
            callbacks,
        )
    }

    #[test]
    fn test_plugin_name_is_nul_terminated() -> TestResult {
        let context = context(HostCallbacks::default());
        let handle = plugin_name(&context)?;
        assert_eq!(context.handles().bytes(handle), Some(&b"Ripple\0"[..]));
        assert_eq!(main_window(&context), 42);
        Ok(())
    }

    #[test]
    fn test_pick_color_uses_default_prompt() -> TestResult {
        let context = context(HostCallbacks {
            pick_color: Some(Arc::new(|prompt: &str| {
                (prompt == DEFAULT_PICK_PROMPT).then(|| RgbColor::from_rgb8(1, 2, 3))
            })),
            ..HostCallbacks::default()
        });
        assert_eq!(pick_color(&context, None)?, RgbColor::from_rgb8(1, 2, 3));
        assert_eq!(pick_color(&context, Some("Other")), Err(SuiteError::Cancelled));
        Ok(())
    }
}
