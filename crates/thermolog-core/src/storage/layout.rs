//! Binary image of the history as written to non-volatile storage.
//!
//! Binary format (little-endian), 28 bytes at offset 0 of the reserved region:
//! - slots: 24 bytes (6 × f32), in storage order
//! - cursor: 4 bytes (i32)

use crate::history::{HISTORY_SLOTS, HistoryBuffer};

/// Size of a single `f32`/`i32` field in the record.
const FIELD_LEN: usize = 4;

/// Byte offset of the cursor within the record.
const CURSOR_OFFSET: usize = HISTORY_SLOTS * FIELD_LEN;

/// Total size of the persisted record (28 bytes).
pub const RECORD_LEN: usize = CURSOR_OFFSET + FIELD_LEN;

/// Offset of the record inside the storage region.
pub const RECORD_OFFSET: u32 = 0;

/// Record contents that passed the size check but not validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawRecord {
    pub slots: [f32; HISTORY_SLOTS],
    pub cursor: i32,
}

impl RawRecord {
    /// Validate the cursor and turn the record into a history.
    pub fn validate(self) -> Option<HistoryBuffer> {
        HistoryBuffer::from_parts(self.slots, self.cursor)
    }
}

/// Converts the history to the on-storage byte image.
pub fn to_bytes(history: &HistoryBuffer) -> [u8; RECORD_LEN] {
    let mut bytes = [0u8; RECORD_LEN];

    for (i, value) in history.iter().enumerate() {
        let offset = i * FIELD_LEN;
        bytes[offset..offset + FIELD_LEN].copy_from_slice(&value.to_le_bytes());
    }

    // The cursor is always < HISTORY_SLOTS, so it fits an i32.
    let cursor = history.cursor() as i32;
    bytes[CURSOR_OFFSET..].copy_from_slice(&cursor.to_le_bytes());

    bytes
}

/// Parses a byte image without validating it.
pub fn from_bytes(bytes: &[u8; RECORD_LEN]) -> RawRecord {
    let mut slots = [0f32; HISTORY_SLOTS];
    for (i, slot) in slots.iter_mut().enumerate() {
        let offset = i * FIELD_LEN;
        let mut field = [0u8; FIELD_LEN];
        field.copy_from_slice(&bytes[offset..offset + FIELD_LEN]);
        *slot = f32::from_le_bytes(field);
    }

    let mut field = [0u8; FIELD_LEN];
    field.copy_from_slice(&bytes[CURSOR_OFFSET..]);
    let cursor = i32::from_le_bytes(field);

    RawRecord { slots, cursor }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::EMPTY_READING;

    #[test]
    fn test_record_size() {
        assert_eq!(RECORD_LEN, 28, "record must be 6 floats and one i32");
    }

    #[test]
    fn test_byte_order_is_little_endian() {
        let mut history = HistoryBuffer::new();
        history.write(23.5);

        let bytes = to_bytes(&history);

        assert_eq!(&bytes[0..4], &23.5f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &EMPTY_READING.to_le_bytes());
        assert_eq!(&bytes[24..28], &[1, 0, 0, 0]);
    }

    #[test]
    fn test_out_of_range_cursor_fails_validation() {
        let mut bytes = to_bytes(&HistoryBuffer::new());
        bytes[24..28].copy_from_slice(&7i32.to_le_bytes());

        let record = from_bytes(&bytes);
        assert_eq!(record.cursor, 7);
        assert!(record.validate().is_none());
    }

    #[test]
    fn test_erased_flash_fails_validation() {
        // Erased NOR/EEPROM reads back as 0xFF, which is a cursor of -1.
        let record = from_bytes(&[0xFF; RECORD_LEN]);
        assert_eq!(record.cursor, -1);
        assert!(record.validate().is_none());
    }

    #[test]
    fn test_zeroed_region_is_valid() {
        let history = from_bytes(&[0; RECORD_LEN]).validate().unwrap();
        assert_eq!(history.cursor(), 0);
        assert!(history.iter().all(|v| v == 0.0));
    }
}
