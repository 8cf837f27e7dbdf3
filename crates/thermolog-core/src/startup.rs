//! Boot sequence: restore the persisted history and bring up the display.

use core::fmt::Debug;

use embassy_time::{Duration, Timer};
use embedded_storage::Storage;
use log::{error, info, warn};
use thiserror_no_std::Error;

use crate::display::{DisplayDriver, Renderer};
use crate::history::HistoryBuffer;
use crate::storage::PersistentStore;

/// How long the splash screen stays up.
pub const SPLASH_DURATION: Duration = Duration::from_secs(1);

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupError {
    #[error("display initialization failed")]
    DisplayInit,
    #[error("failed to draw the splash screen")]
    Splash,
}

/// Load the history, healing the store if its contents are invalid.
///
/// - Valid record: returned as is.
/// - Corrupted record: an empty history is written back and returned.
/// - Unreadable backend: an empty history is returned and storage is left
///   untouched, so a transient fault cannot wipe good data.
pub fn restore_history<S>(store: &mut PersistentStore<S>) -> HistoryBuffer
where
    S: Storage,
    S::Error: Debug,
{
    match store.load() {
        Ok(history) => {
            info!(
                "Restored {} readings (cursor {})",
                history.recorded_count(),
                history.cursor()
            );
            history
        }
        Err(e) if e.is_corruption() => {
            warn!("Stored history invalid ({}), resetting", e);
            let history = HistoryBuffer::new();
            if let Err(e) = store.save(&history) {
                error!("Could not rewrite history: {}", e);
            }
            history
        }
        Err(e) => {
            error!("Stored history unreadable ({}), starting empty", e);
            HistoryBuffer::new()
        }
    }
}

/// Initialize the panel and show the splash screen for `splash`.
///
/// Returns the renderer that drew the splash; hand it to the sampling loop.
pub async fn init_display<D: DisplayDriver>(
    display: &mut D,
    splash: Duration,
) -> Result<Renderer, StartupError> {
    display.init().map_err(|e| {
        error!("Display init failed: {:?}", e);
        StartupError::DisplayInit
    })?;

    let mut renderer = Renderer::new();
    renderer.show_splash(display).map_err(|e| {
        error!("Splash screen failed: {:?}", e);
        StartupError::Splash
    })?;
    Timer::after(splash).await;

    info!("Display ready");
    Ok(renderer)
}
