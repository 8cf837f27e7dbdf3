//! Persistence of the reading history to non-volatile storage.
//!
//! The history is stored as one fixed-size record (see [`layout`]) at the start
//! of a reserved region. Any backend implementing [`embedded_storage::Storage`]
//! can hold it: on-chip flash, an EEPROM, a file on the simulator host, or RAM.

pub mod layout;
pub mod memory;

pub use layout::{RECORD_LEN, RECORD_OFFSET};
pub use memory::MemoryStorage;

use core::fmt::Debug;

use embedded_storage::Storage;
use log::{debug, error};
use thiserror_no_std::Error;

use crate::history::HistoryBuffer;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    #[error("persisted cursor {cursor} is outside the history")]
    Corrupted { cursor: i32 },
    #[error("storage region holds {capacity} bytes but the record needs {required}")]
    RegionMismatch { required: usize, capacity: usize },
    #[error("storage read failed")]
    ReadFailed,
    #[error("storage write failed")]
    WriteFailed,
}

impl StoreError {
    /// Returns `true` for errors that mean the stored image cannot be trusted
    /// and should be replaced by an empty history.
    pub const fn is_corruption(&self) -> bool {
        matches!(self, Self::Corrupted { .. } | Self::RegionMismatch { .. })
    }
}

/// Loads and saves the history record on a storage backend.
///
/// The store is owned by the input worker, which is the only component that
/// ever writes the history, so it needs no locking of its own.
pub struct PersistentStore<S> {
    storage: S,
}

impl<S> PersistentStore<S>
where
    S: Storage,
    S::Error: Debug,
{
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    fn check_region(&self) -> Result<(), StoreError> {
        let capacity = self.storage.capacity();
        let required = RECORD_OFFSET as usize + RECORD_LEN;
        if capacity < required {
            return Err(StoreError::RegionMismatch { required, capacity });
        }
        Ok(())
    }

    /// Read and validate the persisted history.
    pub fn load(&mut self) -> Result<HistoryBuffer, StoreError> {
        self.check_region()?;

        let mut bytes = [0u8; RECORD_LEN];
        self.storage.read(RECORD_OFFSET, &mut bytes).map_err(|e| {
            error!("Failed to read history record: {:?}", e);
            StoreError::ReadFailed
        })?;

        let record = layout::from_bytes(&bytes);
        record.validate().ok_or(StoreError::Corrupted {
            cursor: record.cursor,
        })
    }

    /// Write the whole history record.
    ///
    /// The record goes out in a single backend write; the history is durable
    /// once this returns `Ok`. On error the previously stored record stays
    /// authoritative.
    pub fn save(&mut self, history: &HistoryBuffer) -> Result<(), StoreError> {
        self.check_region()?;

        let bytes = layout::to_bytes(history);
        self.storage.write(RECORD_OFFSET, &bytes).map_err(|e| {
            error!("Failed to write history record: {:?}", e);
            StoreError::WriteFailed
        })?;

        debug!("History committed (cursor {})", history.cursor());
        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}
