//! Cross-thread checks of the shared state.
//!
//! A writer appends readings while a reader takes snapshots on another worker
//! thread. Every snapshot must show a history that some prefix of the writes
//! could have produced.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use embassy_time::Duration;
use thermolog_core::app_state::{SharedState, Snapshot};
use thermolog_core::history::{EMPTY_READING, HISTORY_SLOTS, HistoryBuffer};

const WRITES: u32 = 600;

/// Expected contents after the values `1..=n` were saved in order.
fn expected_after(n: u32) -> HistoryBuffer {
    let mut history = HistoryBuffer::new();
    for value in 1..=n {
        history.write(value as f32);
    }
    history
}

fn assert_consistent(snapshot: &Snapshot) {
    let history = &snapshot.history;
    if history.recorded_count() == 0 {
        assert_eq!(history.cursor(), 0);
        assert!(history.iter().all(|v| v == EMPTY_READING));
        return;
    }

    let last = history
        .get(history.last_written_index())
        .expect("slot in range");
    let n = last as u32;
    assert_eq!(*history, expected_after(n), "torn history: {history:?}");
    assert_eq!(snapshot.latest_temperature, last);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_snapshots_never_observe_torn_history() {
    let shared = Arc::new(SharedState::new(
        HistoryBuffer::new(),
        Duration::from_secs(1),
    ));
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let shared = shared.clone();
        let done = done.clone();
        tokio::spawn(async move {
            for value in 1..=WRITES {
                shared
                    .with_lock(|state| {
                        state.set_latest_temperature(value as f32);
                        state.record_latest()
                    })
                    .await
                    .expect("writer lock");
                tokio::task::yield_now().await;
            }
            done.store(true, Ordering::Release);
        })
    };

    let reader = {
        let shared = shared.clone();
        let done = done.clone();
        tokio::spawn(async move {
            let mut seen = 0usize;
            while !done.load(Ordering::Acquire) {
                let snapshot = shared.snapshot().await.expect("reader lock");
                assert_consistent(&snapshot);
                seen += 1;
                tokio::task::yield_now().await;
            }
            seen
        })
    };

    writer.await.expect("writer task");
    let seen = reader.await.expect("reader task");
    assert!(seen > 0);

    let last = shared.snapshot().await.unwrap();
    assert_eq!(last.history, expected_after(WRITES));
    assert_eq!(last.history.cursor(), WRITES as usize % HISTORY_SLOTS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_saves_and_resets_stay_consistent() {
    let shared = Arc::new(SharedState::new(
        HistoryBuffer::new(),
        Duration::from_secs(1),
    ));

    let mut tasks = Vec::new();
    for round in 0..4u32 {
        let shared = shared.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..100u32 {
                let result = if (round + i) % 10 == 0 {
                    shared.with_lock(|state| state.clear_history()).await
                } else {
                    shared.with_lock(|state| state.record_latest()).await
                };
                let history = result.expect("lock");
                assert!(history.cursor() < HISTORY_SLOTS);
                tokio::task::yield_now().await;
            }
        }));
    }
    for task in tasks {
        task.await.expect("task");
    }

    let snapshot = shared.snapshot().await.unwrap();
    assert!(snapshot.history.cursor() < HISTORY_SLOTS);
    assert!(snapshot.history.recorded_count() <= HISTORY_SLOTS);
}
