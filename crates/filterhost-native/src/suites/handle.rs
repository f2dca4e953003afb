//! Relocatable memory blocks addressed by identifier.

use filterhost_abi::{RawHandle, suite};

use super::arena::Arena;
use super::{SuiteError, SuiteResult};

/// Handle suite variant a plug-in acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleSuiteVersion {
    /// Allocation, disposal, locking and resizing.
    V1,
    /// Adds `dispose_regular_handle`, which tolerates unknown handles.
    V2,
}

impl HandleSuiteVersion {
    /// Variant for the version number passed to `AcquireSuite`.
    pub fn from_version(version: i32) -> Option<Self> {
        match version {
            suite::HANDLE_VERSION_1 => Some(Self::V1),
            suite::HANDLE_VERSION_2 => Some(Self::V2),
            _ => None,
        }
    }

    /// Version number of this variant.
    pub fn version(self) -> i32 {
        match self {
            Self::V1 => suite::HANDLE_VERSION_1,
            Self::V2 => suite::HANDLE_VERSION_2,
        }
    }
}

#[derive(Debug)]
struct Block {
    data: Vec<u8>,
    locks: u32,
}

/// Handles owned by one session.
#[derive(Debug)]
pub struct HandleStore {
    blocks: Arena<Block>,
}

fn checked_size(size: i32) -> SuiteResult<usize> {
    usize::try_from(size)
        .ok()
        .ok_or(SuiteError::InvalidSize(i64::from(size)))
}

impl HandleStore {
    /// An empty store.
    pub fn new(tag: u16) -> Self {
        Self {
            blocks: Arena::new(tag),
        }
    }

    /// Allocate a zero-filled block of `size` bytes.
    ///
    /// # Errors
    ///
    /// [`SuiteError::InvalidSize`] for negative sizes.
    pub fn allocate(&mut self, size: i32) -> SuiteResult<RawHandle> {
        let size = checked_size(size)?;
        self.insert(vec![0; size])
    }

    /// Allocate a block holding a copy of `bytes`.
    ///
    /// # Errors
    ///
    /// [`SuiteError::Exhausted`] when no identifier is left.
    pub fn from_bytes(&mut self, bytes: &[u8]) -> SuiteResult<RawHandle> {
        self.insert(bytes.to_vec())
    }

    fn insert(&mut self, data: Vec<u8>) -> SuiteResult<RawHandle> {
        self.blocks
            .insert(Block { data, locks: 0 })
            .ok_or(SuiteError::Exhausted)
    }

    /// Dispose a block.
    ///
    /// # Errors
    ///
    /// [`SuiteError::UnknownHandle`] for stale or foreign identifiers.
    pub fn dispose(&mut self, handle: RawHandle) -> SuiteResult<()> {
        self.blocks
            .remove(handle)
            .map(drop)
            .ok_or(SuiteError::UnknownHandle(handle))
    }

    /// Whether `handle` is live.
    pub fn contains(&self, handle: RawHandle) -> bool {
        self.blocks.contains(handle)
    }

    /// Size of a block in bytes.
    ///
    /// # Errors
    ///
    /// [`SuiteError::UnknownHandle`] for stale or foreign identifiers.
    pub fn size(&self, handle: RawHandle) -> SuiteResult<i32> {
        let block = self
            .blocks
            .get(handle)
            .ok_or(SuiteError::UnknownHandle(handle))?;
        i32::try_from(block.data.len())
            .ok()
            .ok_or(SuiteError::InvalidSize(block.data.len() as i64))
    }

    /// Resize a block, keeping its prefix and zero-filling any growth.
    ///
    /// A locked block may move; the plug-in must lock it again.
    ///
    /// # Errors
    ///
    /// [`SuiteError::UnknownHandle`] or [`SuiteError::InvalidSize`].
    pub fn set_size(&mut self, handle: RawHandle, size: i32) -> SuiteResult<()> {
        let size = checked_size(size)?;
        let block = self
            .blocks
            .get_mut(handle)
            .ok_or(SuiteError::UnknownHandle(handle))?;
        block.data.resize(size, 0);
        Ok(())
    }

    /// Lock a block and return its address.
    ///
    /// # Errors
    ///
    /// [`SuiteError::UnknownHandle`] for stale or foreign identifiers.
    pub fn lock(&mut self, handle: RawHandle) -> SuiteResult<*mut u8> {
        self.set_lock(handle, true).map(|(address, _)| address)
    }

    /// Unlock a block.
    ///
    /// # Errors
    ///
    /// [`SuiteError::UnknownHandle`] for stale or foreign identifiers.
    pub fn unlock(&mut self, handle: RawHandle) -> SuiteResult<()> {
        self.set_lock(handle, false).map(drop)
    }

    /// Lock or unlock a block.
    ///
    /// Returns the block's address (null when unlocking) and whether it
    /// was locked before the call.
    ///
    /// # Errors
    ///
    /// [`SuiteError::UnknownHandle`] for stale or foreign identifiers.
    pub fn set_lock(&mut self, handle: RawHandle, lock: bool) -> SuiteResult<(*mut u8, bool)> {
        let block = self
            .blocks
            .get_mut(handle)
            .ok_or(SuiteError::UnknownHandle(handle))?;
        let was_locked = block.locks > 0;
        if lock {
            block.locks = block.locks.saturating_add(1);
            Ok((block.data.as_mut_ptr(), was_locked))
        } else {
            block.locks = block.locks.saturating_sub(1);
            Ok((std::ptr::null_mut(), was_locked))
        }
    }

    /// Contents of a block.
    pub fn bytes(&self, handle: RawHandle) -> Option<&[u8]> {
        self.blocks.get(handle).map(|b| b.data.as_slice())
    }

    /// Number of live blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether no blocks are live.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Dispose everything, returning how many blocks were still live.
    pub fn release_all(&mut self) -> usize {
        self.blocks.drain().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_version_selection() {
        assert_eq!(HandleSuiteVersion::from_version(1), Some(HandleSuiteVersion::V1));
        assert_eq!(HandleSuiteVersion::from_version(2), Some(HandleSuiteVersion::V2));
        assert_eq!(HandleSuiteVersion::from_version(3), None);
        assert_eq!(HandleSuiteVersion::V2.version(), 2);
    }

    #[test]
    fn test_resize_keeps_prefix() -> TestResult {
        let mut store = HandleStore::new(1);
        let handle = store.from_bytes(b"abc")?;
        store.set_size(handle, 5)?;
        assert_eq!(store.bytes(handle), Some(&b"abc\0\0"[..]));
        store.set_size(handle, 2)?;
        assert_eq!(store.bytes(handle), Some(&b"ab"[..]));
        assert_eq!(store.size(handle)?, 2);
        Ok(())
    }

    #[test]
    fn test_set_lock_reports_previous_state() -> TestResult {
        let mut store = HandleStore::new(1);
        let handle = store.allocate(8)?;
        let (address, was_locked) = store.set_lock(handle, true)?;
        assert!(!address.is_null());
        assert!(!was_locked);
        let (address, was_locked) = store.set_lock(handle, false)?;
        assert!(address.is_null());
        assert!(was_locked);
        Ok(())
    }

    #[test]
    fn test_disposed_handle_is_unknown() -> TestResult {
        let mut store = HandleStore::new(1);
        let handle = store.allocate(1)?;
        store.dispose(handle)?;
        assert!(!store.contains(handle));
        assert_eq!(store.dispose(handle), Err(SuiteError::UnknownHandle(handle)));
        assert_eq!(store.size(handle), Err(SuiteError::UnknownHandle(handle)));
        assert!(store.lock(handle).is_err());
        Ok(())
    }

    #[test]
    fn test_negative_size_rejected() {
        let mut store = HandleStore::new(1);
        assert_eq!(store.allocate(-4), Err(SuiteError::InvalidSize(-4)));
    }
}
