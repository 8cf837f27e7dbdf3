//! Circular history of saved temperature readings.
//!
//! The history is a fixed ring of [`HISTORY_SLOTS`] readings plus a write cursor.
//! All slots are meaningful from the start: an unused slot holds
//! [`EMPTY_READING`], so there is no separate fill counter.

/// Number of readings kept in the history ring.
pub const HISTORY_SLOTS: usize = 6;

/// Reading stored in a slot that has never been written.
///
/// Far outside the physical range of any supported sensor.
pub const EMPTY_READING: f32 = -999.0;

/// Any slot value at or below this threshold is treated as "never written".
///
/// Sits just above [`EMPTY_READING`] so display code never depends on exact
/// float equality with the sentinel.
pub const EMPTY_THRESHOLD: f32 = -900.0;

/// Returns `true` when `value` denotes an unused history slot.
#[inline]
pub fn is_empty_reading(value: f32) -> bool {
    value <= EMPTY_THRESHOLD
}

/// Fixed-capacity ring of temperature readings with a write cursor.
///
/// Invariant: `cursor` is always in `0..HISTORY_SLOTS`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryBuffer {
    slots: [f32; HISTORY_SLOTS],
    cursor: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryBuffer {
    /// An empty history: every slot holds the sentinel and the cursor is 0.
    pub const fn new() -> Self {
        Self {
            slots: [EMPTY_READING; HISTORY_SLOTS],
            cursor: 0,
        }
    }

    /// Rebuild a history from its raw parts.
    ///
    /// Returns `None` when `cursor` is not a valid slot index.
    pub fn from_parts(slots: [f32; HISTORY_SLOTS], cursor: i32) -> Option<Self> {
        let cursor = usize::try_from(cursor).ok()?;
        if cursor >= HISTORY_SLOTS {
            return None;
        }
        Some(Self { slots, cursor })
    }

    /// Store `value` at the cursor and advance it, overwriting the oldest entry
    /// once the ring has wrapped.
    pub fn write(&mut self, value: f32) {
        self.slots[self.cursor] = value;
        self.cursor = (self.cursor + 1) % HISTORY_SLOTS;
    }

    /// Forget every reading and rewind the cursor.
    pub fn reset(&mut self) {
        self.slots = [EMPTY_READING; HISTORY_SLOTS];
        self.cursor = 0;
    }

    /// Index of the most recently written slot.
    ///
    /// Before any write this points at the last slot, which then holds the
    /// sentinel; callers must check [`is_empty_reading`] before marking it.
    pub const fn last_written_index(&self) -> usize {
        if self.cursor == 0 {
            HISTORY_SLOTS - 1
        } else {
            self.cursor - 1
        }
    }

    /// Index of the next slot to be written.
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// All slots in storage order (not chronological order).
    pub const fn slots(&self) -> &[f32; HISTORY_SLOTS] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<f32> {
        self.slots.get(index).copied()
    }

    /// Returns `true` if the slot at `index` holds a real reading.
    pub fn is_recorded(&self, index: usize) -> bool {
        self.get(index).is_some_and(|value| !is_empty_reading(value))
    }

    /// Number of slots that hold a real reading.
    pub fn recorded_count(&self) -> usize {
        self.slots.iter().filter(|v| !is_empty_reading(**v)).count()
    }

    /// Iterate over the slots in storage order.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.slots.iter().copied()
    }
}
