//! File-backed persistent region.
//!
//! The whole region lives in memory and is written back on every write. The
//! new image goes to a sibling temp file that is synced and then renamed over
//! the region file, so a crash leaves either the old or the new image.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use embedded_storage::{ReadStorage, Storage};
use log::{debug, info};
use thiserror_no_std::Error;

/// Value of never-written bytes, as on erased flash.
const ERASED_BYTE: u8 = 0xFF;

#[derive(Error, Debug)]
pub enum FileStorageError {
    #[error("access of {len} bytes at offset {offset} is outside the region")]
    OutOfBounds { offset: u32, len: usize },
    #[error("region file I/O failed: {0}")]
    Io(io::Error),
}

pub struct FileStorage {
    path: PathBuf,
    image: Vec<u8>,
}

impl FileStorage {
    /// Open `path` as a region of `capacity` bytes.
    ///
    /// A missing file reads as erased; a short one is padded with erased
    /// bytes. A file longer than `capacity` is rejected rather than cut down
    /// on the next write. Nothing is written until the first `write`.
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut image = match fs::read(&path) {
            Ok(bytes) => {
                info!("Opened region file {} ({} bytes)", path.display(), bytes.len());
                bytes
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("No region file at {}, starting erased", path.display());
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        if image.len() > capacity {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "region file {} is {} bytes, larger than the {capacity}-byte region",
                    path.display(),
                    image.len()
                ),
            ));
        }
        image.resize(capacity, ERASED_BYTE);

        Ok(Self { path, image })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn range(&self, offset: u32, len: usize) -> Result<std::ops::Range<usize>, FileStorageError> {
        let start = offset as usize;
        match start.checked_add(len) {
            Some(end) if end <= self.image.len() => Ok(start..end),
            _ => Err(FileStorageError::OutOfBounds { offset, len }),
        }
    }

    fn persist(&self, image: &[u8]) -> io::Result<()> {
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(image)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)
    }
}

impl ReadStorage for FileStorage {
    type Error = FileStorageError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let range = self.range(offset, bytes.len())?;
        bytes.copy_from_slice(&self.image[range]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.image.len()
    }
}

impl Storage for FileStorage {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let range = self.range(offset, bytes.len())?;

        let mut image = self.image.clone();
        image[range].copy_from_slice(bytes);
        self.persist(&image).map_err(FileStorageError::Io)?;
        self.image = image;

        debug!("Wrote {} bytes at {} to {}", bytes.len(), offset, self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermolog_core::history::HistoryBuffer;
    use thermolog_core::storage::PersistentStore;

    #[test]
    fn test_missing_file_reads_erased() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::open(dir.path().join("region.nvs"), 64).unwrap();

        let mut bytes = [0u8; 8];
        storage.read(0, &mut bytes).unwrap();
        assert_eq!(bytes, [ERASED_BYTE; 8]);
        assert_eq!(storage.capacity(), 64);
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_history_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("region.nvs");
        let mut history = HistoryBuffer::new();
        history.write(23.5);

        let mut store = PersistentStore::new(FileStorage::open(&path, 64).unwrap());
        store.save(&history).unwrap();

        let mut reopened = PersistentStore::new(FileStorage::open(&path, 64).unwrap());
        assert_eq!(reopened.load(), Ok(history));
        assert_eq!(fs::read(&path).unwrap().len(), 64);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_oversized_file_is_rejected_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("region.nvs");
        fs::write(&path, [0xA5; 96]).unwrap();

        let err = FileStorage::open(&path, 64).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(fs::read(&path).unwrap(), [0xA5; 96]);
    }

    #[test]
    fn test_short_file_is_padded_erased() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("region.nvs");
        fs::write(&path, [0x00; 4]).unwrap();

        let mut storage = FileStorage::open(&path, 8).unwrap();
        let mut bytes = [0u8; 8];
        storage.read(0, &mut bytes).unwrap();
        assert_eq!(bytes, [0, 0, 0, 0, ERASED_BYTE, ERASED_BYTE, ERASED_BYTE, ERASED_BYTE]);
    }

    #[test]
    fn test_out_of_bounds_write_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("region.nvs");
        let mut storage = FileStorage::open(&path, 16).unwrap();

        let err = storage.write(12, &[0; 8]).unwrap_err();
        assert!(matches!(err, FileStorageError::OutOfBounds { offset: 12, len: 8 }));
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_persist_keeps_old_image() {
        let dir = tempfile::tempdir().unwrap();
        // The region file's parent does not exist, so persisting fails.
        let path = dir.path().join("missing").join("region.nvs");
        let mut storage = FileStorage::open(&path, 16).unwrap();

        assert!(matches!(
            storage.write(0, &[1, 2, 3, 4]),
            Err(FileStorageError::Io(_))
        ));
        let mut bytes = [0u8; 4];
        storage.read(0, &mut bytes).unwrap();
        assert_eq!(bytes, [ERASED_BYTE; 4]);
    }
}
