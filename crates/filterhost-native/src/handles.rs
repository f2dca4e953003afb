//! Scoped ownership of native resources.
//!
//! A [`SafeHandle`] owns exactly one resource and releases it exactly once:
//! either when [`SafeHandle::release`] is called or when the handle is
//! dropped, including during unwinding. Further release requests are
//! no-ops. The wrapped value is reachable only through
//! [`SafeHandle::raw_for_abi`], which exists for code that hands the
//! resource across the plug-in boundary.

/// A native resource that needs an explicit release step.
pub trait NativeResource: Send {
    /// Short name used in logs.
    const KIND: &'static str;

    /// Release the resource. Called at most once.
    fn release(self);
}

/// Owns one [`NativeResource`] and releases it exactly once.
pub struct SafeHandle<R: NativeResource> {
    resource: Option<R>,
}

impl<R: NativeResource> SafeHandle<R> {
    /// Take ownership of `resource`.
    pub fn new(resource: R) -> Self {
        Self {
            resource: Some(resource),
        }
    }

    /// A handle that owns nothing.
    pub fn invalid() -> Self {
        Self { resource: None }
    }

    /// Whether the handle still owns its resource.
    pub fn is_valid(&self) -> bool {
        self.resource.is_some()
    }

    /// Release the resource now. Later calls do nothing.
    pub fn release(&mut self) {
        if let Some(resource) = self.resource.take() {
            tracing::debug!(kind = R::KIND, "Releasing native resource");
            resource.release();
        }
    }

    /// Borrow the resource to pass it across the plug-in boundary.
    ///
    /// Returns `None` once the handle has been released.
    pub fn raw_for_abi(&self) -> Option<&R> {
        self.resource.as_ref()
    }

    pub(crate) fn get_mut(&mut self) -> Option<&mut R> {
        self.resource.as_mut()
    }
}

impl<R: NativeResource> Drop for SafeHandle<R> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<R: NativeResource> std::fmt::Debug for SafeHandle<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SafeHandle")
            .field("kind", &R::KIND)
            .field("valid", &self.is_valid())
            .finish()
    }
}

impl NativeResource for libloading::Library {
    const KIND: &'static str = "module";

    fn release(self) {
        if let Err(e) = self.close() {
            tracing::warn!(error = %e, "Failed to unload plug-in module");
        }
    }
}

impl NativeResource for walkdir::IntoIter {
    const KIND: &'static str = "directory search";

    fn release(self) {
        drop(self);
    }
}

/// A loaded plug-in module.
pub type SafeModuleHandle = SafeHandle<libloading::Library>;

/// An open directory search.
pub type SafeFindHandle = SafeHandle<walkdir::IntoIter>;

pub use crate::color::{SafeProfileHandle, SafeTransformHandle};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counted(Arc<AtomicUsize>);

    impl NativeResource for Counted {
        const KIND: &'static str = "counted";

        fn release(self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_release_runs_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut handle = SafeHandle::new(Counted(count.clone()));
        assert!(handle.is_valid());
        handle.release();
        handle.release();
        assert!(!handle.is_valid());
        drop(handle);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases() {
        let count = Arc::new(AtomicUsize::new(0));
        {
            let _handle = SafeHandle::new(Counted(count.clone()));
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_runs_during_unwind() {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        let result = std::panic::catch_unwind(move || {
            let _handle = SafeHandle::new(Counted(inner));
            panic!("boom");
        });
        assert!(result.is_err());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_raw_access_ends_with_release() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut handle = SafeHandle::new(Counted(count));
        assert!(handle.raw_for_abi().is_some());
        handle.release();
        assert!(handle.raw_for_abi().is_none());
    }

    #[test]
    fn test_invalid_handle_never_releases() {
        let mut handle = SafeHandle::<Counted>::invalid();
        assert!(!handle.is_valid());
        handle.release();
    }
}
