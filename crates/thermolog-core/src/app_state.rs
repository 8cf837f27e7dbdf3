//! Application-wide shared state for thermolog
//!
//! The latest temperature and the reading history live behind a single async
//! mutex. The sampling/render loop and the input worker only ever reach them
//! through [`SharedState`], and every acquisition is bounded by a timeout so a
//! stuck holder can never stall the other worker forever.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::{Mutex as AsyncMutex, MutexGuard};
use embassy_time::{Duration, with_timeout};
use thiserror_no_std::Error;

use crate::history::HistoryBuffer;

/// Point-in-time copy of the shared state, taken in one critical section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub latest_temperature: f32,
    pub history: HistoryBuffer,
}

/// State guarded by [`SharedState`].
///
/// Fields are private: code outside this module gets at them only through a
/// held lock.
#[derive(Debug)]
pub struct AppState {
    latest_temperature: f32,
    history: HistoryBuffer,
}

impl AppState {
    const fn new(history: HistoryBuffer) -> Self {
        Self {
            latest_temperature: 0.0,
            history,
        }
    }

    pub fn latest_temperature(&self) -> f32 {
        self.latest_temperature
    }

    pub fn set_latest_temperature(&mut self, celsius: f32) {
        self.latest_temperature = celsius;
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    /// Append the latest temperature to the history and return a copy of the
    /// updated history for persisting.
    pub fn record_latest(&mut self) -> HistoryBuffer {
        self.history.write(self.latest_temperature);
        self.history
    }

    /// Wipe the history and return a copy of the empty history for persisting.
    pub fn clear_history(&mut self) -> HistoryBuffer {
        self.history.reset();
        self.history
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            latest_temperature: self.latest_temperature,
            history: self.history,
        }
    }
}

/// The shared state could not be acquired within the configured timeout.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("timed out waiting for the shared state lock")]
pub struct LockTimeout;

pub type StateGuard<'a> = MutexGuard<'a, CriticalSectionRawMutex, AppState>;

/// Single authoritative holder of the latest temperature and the history.
pub struct SharedState {
    inner: AsyncMutex<CriticalSectionRawMutex, AppState>,
    lock_timeout: Duration,
}

impl SharedState {
    /// Create the shared state around a restored (or empty) history.
    pub const fn new(history: HistoryBuffer, lock_timeout: Duration) -> Self {
        Self {
            inner: AsyncMutex::new(AppState::new(history)),
            lock_timeout,
        }
    }

    /// Acquire a scoped guard, waiting at most the lock timeout.
    ///
    /// Hold the guard only for in-memory work; drop it before any I/O.
    pub async fn lock(&self) -> Result<StateGuard<'_>, LockTimeout> {
        with_timeout(self.lock_timeout, self.inner.lock())
            .await
            .map_err(|_| LockTimeout)
    }

    /// Run `f` inside a critical section.
    ///
    /// `f` is synchronous, so it cannot await while the lock is held.
    pub async fn with_lock<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> Result<R, LockTimeout> {
        let mut guard = self.lock().await?;
        Ok(f(&mut *guard))
    }

    /// Copy the latest temperature and the history together.
    pub async fn snapshot(&self) -> Result<Snapshot, LockTimeout> {
        self.with_lock(|state| state.snapshot()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_futures::block_on;

    fn shared() -> SharedState {
        SharedState::new(HistoryBuffer::new(), Duration::from_millis(20))
    }

    #[test]
    fn test_record_latest_uses_current_temperature() {
        let shared = shared();

        let persisted = block_on(shared.with_lock(|state| {
            state.set_latest_temperature(21.75);
            state.record_latest()
        }))
        .unwrap();

        assert_eq!(persisted.get(0), Some(21.75));
        assert_eq!(persisted.cursor(), 1);
        let snapshot = block_on(shared.snapshot()).unwrap();
        assert_eq!(snapshot.history, persisted);
        assert_eq!(snapshot.latest_temperature, 21.75);
    }

    #[test]
    fn test_clear_history_returns_empty_copy() {
        let shared = shared();
        block_on(shared.with_lock(|state| {
            state.set_latest_temperature(19.0);
            state.record_latest();
            state.record_latest();
        }))
        .unwrap();

        let persisted = block_on(shared.with_lock(AppState::clear_history)).unwrap();

        assert_eq!(persisted, HistoryBuffer::new());
        // The latest temperature is not part of the history.
        let snapshot = block_on(shared.snapshot()).unwrap();
        assert_eq!(snapshot.latest_temperature, 19.0);
    }

    #[test]
    fn test_lock_times_out_while_held() {
        let shared = shared();
        let guard = block_on(shared.lock()).unwrap();

        assert_eq!(block_on(shared.snapshot()), Err(LockTimeout));

        drop(guard);
        assert!(block_on(shared.snapshot()).is_ok());
    }
}
