//! Scratch buffers counted against the advertised buffer space.
//!
//! Buffers are reachable two ways: by identifier through the record's
//! buffer procs, and by address through the pointer-based buffer suite.
//! Both views share one budget.

use std::collections::HashMap;

use filterhost_abi::RawBuffer;

use super::arena::Arena;
use super::{SuiteError, SuiteResult};

#[derive(Debug)]
struct Block {
    data: Box<[u8]>,
    size: usize,
    locks: u32,
}

impl Block {
    fn address(&mut self) -> *mut u8 {
        self.data.as_mut_ptr()
    }
}

/// Buffers owned by one session.
#[derive(Debug)]
pub struct BufferStore {
    blocks: Arena<Block>,
    by_address: HashMap<usize, RawBuffer>,
    allocated: usize,
    limit: usize,
}

impl BufferStore {
    /// An empty store allowing `limit` bytes in total.
    pub fn new(tag: u16, limit: usize) -> Self {
        Self {
            blocks: Arena::new(tag),
            by_address: HashMap::new(),
            allocated: 0,
            limit,
        }
    }

    /// Bytes still available.
    pub fn space(&self) -> usize {
        self.limit.saturating_sub(self.allocated)
    }

    /// Allocate `size` bytes, zero-filled.
    ///
    /// # Errors
    ///
    /// [`SuiteError::InvalidSize`] for negative sizes and
    /// [`SuiteError::OutOfSpace`] when the budget is exceeded.
    pub fn allocate(&mut self, size: i32) -> SuiteResult<RawBuffer> {
        let size = usize::try_from(size)
            .ok()
            .ok_or(SuiteError::InvalidSize(i64::from(size)))?;
        if size > self.space() {
            return Err(SuiteError::OutOfSpace {
                requested: size as u64,
                available: self.space() as u64,
            });
        }
        // Zero-length blocks still get a distinct address.
        let mut block = Block {
            data: vec![0u8; size.max(1)].into_boxed_slice(),
            size,
            locks: 0,
        };
        let address = block.address() as usize;
        let id = self.blocks.insert(block).ok_or(SuiteError::Exhausted)?;
        self.by_address.insert(address, id);
        self.allocated += size;
        Ok(id)
    }

    /// Lock a buffer and return its address. The address is stable for
    /// the buffer's lifetime.
    ///
    /// # Errors
    ///
    /// [`SuiteError::UnknownBuffer`] for stale or foreign identifiers.
    pub fn lock(&mut self, id: RawBuffer) -> SuiteResult<*mut u8> {
        let block = self
            .blocks
            .get_mut(id)
            .ok_or(SuiteError::UnknownBuffer(id))?;
        block.locks = block.locks.saturating_add(1);
        Ok(block.address())
    }

    /// Unlock a buffer.
    ///
    /// # Errors
    ///
    /// [`SuiteError::UnknownBuffer`] for stale or foreign identifiers.
    pub fn unlock(&mut self, id: RawBuffer) -> SuiteResult<()> {
        let block = self
            .blocks
            .get_mut(id)
            .ok_or(SuiteError::UnknownBuffer(id))?;
        block.locks = block.locks.saturating_sub(1);
        Ok(())
    }

    /// Free a buffer and return its bytes to the budget.
    ///
    /// # Errors
    ///
    /// [`SuiteError::UnknownBuffer`] when the buffer was already freed.
    pub fn free(&mut self, id: RawBuffer) -> SuiteResult<()> {
        let mut block = self.blocks.remove(id).ok_or(SuiteError::UnknownBuffer(id))?;
        self.by_address.remove(&(block.address() as usize));
        self.allocated -= block.size;
        Ok(())
    }

    /// Size in bytes of a buffer.
    pub fn size(&self, id: RawBuffer) -> Option<usize> {
        self.blocks.get(id).map(|b| b.size)
    }

    /// Allocate for the pointer-based suite.
    ///
    /// Tries `requested` bytes first, then whatever space is left if that
    /// is at least `minimum`. Returns the address and the size granted.
    ///
    /// # Errors
    ///
    /// [`SuiteError::OutOfSpace`] when not even `minimum` bytes are left.
    pub fn allocate_pointer(&mut self, requested: u32, minimum: u32) -> SuiteResult<(*mut u8, u32)> {
        let space = self.space();
        let granted = if requested as usize <= space {
            requested
        } else if minimum as usize <= space {
            u32::try_from(space).unwrap_or(u32::MAX)
        } else {
            return Err(SuiteError::OutOfSpace {
                requested: u64::from(minimum),
                available: space as u64,
            });
        };
        let size = i32::try_from(granted)
            .ok()
            .ok_or(SuiteError::InvalidSize(i64::from(granted)))?;
        let id = self.allocate(size)?;
        let address = self
            .blocks
            .get_mut(id)
            .map(Block::address)
            .ok_or(SuiteError::UnknownBuffer(id))?;
        Ok((address, granted))
    }

    /// Free a buffer by address.
    ///
    /// # Errors
    ///
    /// [`SuiteError::UnknownBuffer`] when the address is not a live buffer.
    pub fn free_pointer(&mut self, address: *mut u8) -> SuiteResult<()> {
        let id = self
            .by_address
            .get(&(address as usize))
            .copied()
            .ok_or(SuiteError::UnknownBuffer(address as u64))?;
        self.free(id)
    }

    /// Size of a buffer by address; zero when unknown.
    pub fn size_of_pointer(&self, address: *mut u8) -> usize {
        self.by_address
            .get(&(address as usize))
            .and_then(|&id| self.size(id))
            .unwrap_or(0)
    }

    /// Number of live buffers.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether no buffers are live.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Free everything, returning how many buffers were still live.
    pub fn release_all(&mut self) -> usize {
        let leaked = self.blocks.drain().len();
        self.by_address.clear();
        self.allocated = 0;
        leaked
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn test_allocation_consumes_space() -> TestResult {
        let mut store = BufferStore::new(1, 100);
        let id = store.allocate(40)?;
        assert_eq!(store.space(), 60);
        assert_eq!(store.size(id), Some(40));
        store.free(id)?;
        assert_eq!(store.space(), 100);
        Ok(())
    }

    #[test]
    fn test_double_free_is_reported() -> TestResult {
        let mut store = BufferStore::new(1, 100);
        let id = store.allocate(4)?;
        store.free(id)?;
        assert_eq!(store.free(id), Err(SuiteError::UnknownBuffer(id)));
        Ok(())
    }

    #[test]
    fn test_out_of_space() {
        let mut store = BufferStore::new(1, 8);
        assert!(matches!(
            store.allocate(9),
            Err(SuiteError::OutOfSpace {
                requested: 9,
                available: 8
            })
        ));
        assert_eq!(store.allocate(-1), Err(SuiteError::InvalidSize(-1)));
    }

    #[test]
    fn test_lock_returns_stable_writable_address() -> TestResult {
        let mut store = BufferStore::new(1, 64);
        let id = store.allocate(16)?;
        let first = store.lock(id)?;
        let second = store.lock(id)?;
        assert_eq!(first, second);
        store.unlock(id)?;
        store.unlock(id)?;
        Ok(())
    }

    #[test]
    fn test_pointer_allocation_falls_back_to_remaining_space() -> TestResult {
        let mut store = BufferStore::new(1, 100);
        let (address, granted) = store.allocate_pointer(500, 50)?;
        assert_eq!(granted, 100);
        assert_eq!(store.size_of_pointer(address), 100);
        assert!(store.allocate_pointer(10, 1).is_err());
        store.free_pointer(address)?;
        assert_eq!(store.size_of_pointer(address), 0);
        assert_eq!(store.space(), 100);
        Ok(())
    }

    #[test]
    fn test_release_all_counts_leaks() -> TestResult {
        let mut store = BufferStore::new(1, 100);
        store.allocate(1)?;
        store.allocate(0)?;
        assert_eq!(store.release_all(), 2);
        assert!(store.is_empty());
        assert_eq!(store.space(), 100);
        Ok(())
    }
}
