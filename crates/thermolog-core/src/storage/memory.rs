//! RAM-backed storage region.
//!
//! Behaves like freshly erased flash (`0xFF` everywhere) until written. Used by
//! tests and by boards that have no persistent region wired up.

use embedded_storage::{ReadStorage, Storage};

/// Value an erased byte reads back as.
pub const ERASED_BYTE: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryStorageError {
    /// The access touches bytes past the end of the region.
    OutOfBounds { offset: u32, len: usize },
}

/// A storage region of `N` bytes held in RAM.
#[derive(Debug, Clone)]
pub struct MemoryStorage<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> Default for MemoryStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MemoryStorage<N> {
    /// A fully erased region.
    pub const fn new() -> Self {
        Self {
            bytes: [ERASED_BYTE; N],
        }
    }

    /// A region pre-loaded with `bytes`.
    pub const fn with_contents(bytes: [u8; N]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }

    fn range(offset: u32, len: usize) -> Result<core::ops::Range<usize>, MemoryStorageError> {
        let start = offset as usize;
        match start.checked_add(len) {
            Some(end) if end <= N => Ok(start..end),
            _ => Err(MemoryStorageError::OutOfBounds { offset, len }),
        }
    }
}

impl<const N: usize> ReadStorage for MemoryStorage<N> {
    type Error = MemoryStorageError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let range = Self::range(offset, bytes.len())?;
        bytes.copy_from_slice(&self.bytes[range]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Storage for MemoryStorage<N> {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        // Bounds are checked before touching anything, so a rejected write
        // leaves the region untouched.
        let range = Self::range(offset, bytes.len())?;
        self.bytes[range].copy_from_slice(bytes);
        Ok(())
    }
}
