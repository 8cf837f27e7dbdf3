//! Input worker: polls the Save and Reset buttons and applies their intents.
//!
//! The worker is the only writer of the history and the only user of the
//! persistent store. Each intent mutates the shared state in one short critical
//! section that also copies the resulting history; the copy is persisted after
//! the lock is released. Since nothing else writes the history, the stored
//! record always matches the order in which intents were applied.

pub mod button;

pub use button::{ButtonIntent, ButtonState, DebouncedButton};

use core::fmt::Debug;

use embassy_time::{Duration, Instant, Timer};
use embedded_hal::digital::InputPin;
use embedded_storage::Storage;
use heapless::Vec;
use log::{debug, error, info, warn};

use crate::app_state::{AppState, SharedState};
use crate::config::Config;
use crate::history::HistoryBuffer;
use crate::storage::PersistentStore;

/// Intents applied during a single poll (at most one per button).
pub type AppliedIntents = Vec<ButtonIntent, 2>;

/// Sample an active-low button line. Read errors count as "not pressed".
fn is_actuated<P: InputPin>(pin: &mut P, label: &str) -> bool {
    pin.is_low().unwrap_or_else(|e| {
        warn!("{} button read failed: {:?}", label, e);
        false
    })
}

pub struct InputWorker<'a, SP, RP, S> {
    shared: &'a SharedState,
    save_pin: SP,
    reset_pin: RP,
    save_button: DebouncedButton,
    reset_button: DebouncedButton,
    store: PersistentStore<S>,
    /// History copy whose save failed; retried on the next poll.
    pending: Option<HistoryBuffer>,
    poll_interval: Duration,
}

impl<'a, SP, RP, S> InputWorker<'a, SP, RP, S>
where
    SP: InputPin,
    RP: InputPin,
    S: Storage,
    S::Error: Debug,
{
    pub fn new(
        shared: &'a SharedState,
        save_pin: SP,
        reset_pin: RP,
        store: PersistentStore<S>,
        config: &Config,
    ) -> Self {
        Self {
            shared,
            save_pin,
            reset_pin,
            save_button: DebouncedButton::from_config(ButtonIntent::Save, &config.input),
            reset_button: DebouncedButton::from_config(ButtonIntent::Reset, &config.input),
            store,
            pending: None,
            poll_interval: config.timing.poll_interval(),
        }
    }

    pub fn store(&self) -> &PersistentStore<S> {
        &self.store
    }

    pub fn pending_commit(&self) -> Option<&HistoryBuffer> {
        self.pending.as_ref()
    }

    /// Poll forever at the configured interval.
    pub async fn run(mut self) -> ! {
        info!("Input worker started");
        loop {
            self.poll_once(Instant::now()).await;
            Timer::after(self.poll_interval).await;
        }
    }

    /// One poll: retry any pending commit, then evaluate Save and Reset.
    pub async fn poll_once(&mut self, now: Instant) -> AppliedIntents {
        if let Some(history) = self.pending.take() {
            debug!("Retrying pending history commit");
            self.commit(history);
        }

        let mut applied = AppliedIntents::new();

        let save = self
            .save_button
            .poll(is_actuated(&mut self.save_pin, "Save"), now);
        if self.apply(save).await {
            applied.push(save).ok();
        }

        let reset = self
            .reset_button
            .poll(is_actuated(&mut self.reset_pin, "Reset"), now);
        if self.apply(reset).await {
            applied.push(reset).ok();
        }

        applied
    }

    /// Apply one intent to the shared state and persist the result.
    ///
    /// Returns `false` if there was nothing to do or the lock timed out.
    async fn apply(&mut self, intent: ButtonIntent) -> bool {
        let result = match intent {
            ButtonIntent::None => return false,
            ButtonIntent::Save => self.shared.with_lock(AppState::record_latest).await,
            ButtonIntent::Reset => self.shared.with_lock(AppState::clear_history).await,
        };

        let history = match result {
            Ok(history) => history,
            Err(e) => {
                warn!("{:?} button dropped: {}", intent, e);
                return false;
            }
        };

        match intent {
            ButtonIntent::Save => {
                let slot = history.last_written_index();
                info!(
                    "Save button: stored {:.2} °C in slot {}",
                    history.get(slot).unwrap_or_default(),
                    slot + 1
                );
            }
            _ => info!("Reset button: history cleared"),
        }

        self.commit(history);
        true
    }

    fn commit(&mut self, history: HistoryBuffer) {
        match self.store.save(&history) {
            Ok(()) => self.pending = None,
            Err(e) => {
                error!("History not persisted, retrying next poll: {}", e);
                self.pending = Some(history);
            }
        }
    }
}
