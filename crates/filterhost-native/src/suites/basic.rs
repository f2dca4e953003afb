//! Suite lookup by name and version.

use filterhost_abi::suite;

use super::handle::HandleSuiteVersion;
use super::{SuiteError, SuiteResult};

/// A suite the basic suite can hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuiteKind {
    /// Pointer-based buffer suite.
    Buffer,
    /// Handle suite in one of its versions.
    Handle(HandleSuiteVersion),
    /// UI hooks suite.
    UiHooks,
    /// Action descriptor procs.
    ActionDescriptor,
}

impl SuiteKind {
    /// Resolve an `AcquireSuite` request.
    ///
    /// # Errors
    ///
    /// [`SuiteError::SuiteNotFound`] for names or versions this host does
    /// not provide.
    pub fn resolve(name: &str, version: i32) -> SuiteResult<Self> {
        let kind = match name {
            suite::BUFFER if version == suite::BUFFER_VERSION => Some(Self::Buffer),
            suite::HANDLE => HandleSuiteVersion::from_version(version).map(Self::Handle),
            suite::UI_HOOKS if version == suite::UI_HOOKS_VERSION => Some(Self::UiHooks),
            suite::ACTION_DESCRIPTOR if version == suite::ACTION_DESCRIPTOR_VERSION => {
                Some(Self::ActionDescriptor)
            }
            _ => None,
        };
        kind.ok_or_else(|| SuiteError::SuiteNotFound {
            name: name.to_string(),
            version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_suites_resolve() {
        assert_eq!(SuiteKind::resolve(suite::BUFFER, 1), Ok(SuiteKind::Buffer));
        assert_eq!(
            SuiteKind::resolve(suite::HANDLE, 2),
            Ok(SuiteKind::Handle(HandleSuiteVersion::V2))
        );
        assert_eq!(SuiteKind::resolve(suite::UI_HOOKS, 1), Ok(SuiteKind::UiHooks));
        assert_eq!(
            SuiteKind::resolve(suite::ACTION_DESCRIPTOR, 1),
            Ok(SuiteKind::ActionDescriptor)
        );
    }

    #[test]
    fn test_unknown_suite_or_version() {
        assert!(matches!(
            SuiteKind::resolve("Photoshop Channel Ports Suite", 3),
            Err(SuiteError::SuiteNotFound { version: 3, .. })
        ));
        assert!(SuiteKind::resolve(suite::BUFFER, 2).is_err());
        assert!(SuiteKind::resolve(suite::HANDLE, 0).is_err());
    }
}
