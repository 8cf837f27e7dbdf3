//! Desktop simulator for the thermolog temperature logger.
//!
//! Runs the real sampling/render loop and input worker from `thermolog-core`
//! on two OS threads, each with its own single-threaded runtime, against a
//! synthetic sensor, a terminal-drawn panel, keyboard buttons and a file-backed
//! persistent region.
//!
//! # Keys
//!
//! | Key          | Action                      |
//! |--------------|-----------------------------|
//! | s            | Tap Save                    |
//! | r            | Tap Reset                   |
//! | S            | Hold Save (shows re-firing) |
//! | R            | Hold Reset                  |
//! | q, Esc, ^C   | Quit                        |
//!
//! The terminal runs in raw mode on the alternate screen. Logs go to stderr;
//! redirect them (`2>thermolog.log`) to keep the panel tidy.

mod buttons;
mod file_storage;
mod sensor;
mod terminal;

use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, anyhow};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::{debug, info};
use tokio::runtime::{Builder, Runtime};

use thermolog_core::app_state::SharedState;
use thermolog_core::config::Config;
use thermolog_core::input::InputWorker;
use thermolog_core::sampling::SamplingRenderLoop;
use thermolog_core::startup::{SPLASH_DURATION, init_display, restore_history};
use thermolog_core::storage::PersistentStore;

use buttons::{ButtonHandle, HOLD_DURATION, TAP_DURATION};
use file_storage::FileStorage;
use sensor::SimSensor;
use terminal::{TermDisplay, TerminalGuard};

/// Size of the emulated EEPROM region.
const REGION_LEN: usize = 64;

#[derive(Parser, Debug)]
#[command(version, about = "Run the thermolog firmware logic in a terminal")]
struct Args {
    /// TOML file overriding timing and input settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// File holding the persistent region
    #[arg(long, default_value = "thermolog.nvs")]
    store: PathBuf,

    /// Make every n-th conversion report a disconnected sensor (0 = never)
    #[arg(long, default_value_t = 0)]
    sensor_dropout: u32,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: Config =
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

fn worker_runtime() -> anyhow::Result<Runtime> {
    Builder::new_current_thread()
        .build()
        .context("building worker runtime")
}

fn spawn_worker(name: &str, job: impl FnOnce() + Send + 'static) -> anyhow::Result<()> {
    thread::Builder::new()
        .name(name.into())
        .spawn(job)
        .with_context(|| format!("spawning {name} thread"))?;
    Ok(())
}

/// Act on one key press. Returns `false` on quit.
fn handle_key(key: KeyEvent, save: &ButtonHandle, reset: &ButtonHandle) -> bool {
    let (button, duration) = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return false,
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => return false,
        KeyCode::Char('s') => (save, TAP_DURATION),
        KeyCode::Char('S') => (save, HOLD_DURATION),
        KeyCode::Char('r') => (reset, TAP_DURATION),
        KeyCode::Char('R') => (reset, HOLD_DURATION),
        other => {
            debug!("Ignoring key {:?}", other);
            return true;
        }
    };
    debug!("{} pressed for {} ms", button.name(), duration.as_millis());
    button.press_for(duration);
    true
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    info!("Starting thermolog simulator");

    let config = load_config(args.config.as_deref())?;
    debug!("{:?}", config);

    let storage = FileStorage::open(&args.store, REGION_LEN)
        .with_context(|| format!("opening region file {}", args.store.display()))?;
    let mut store = PersistentStore::new(storage);
    let history = restore_history(&mut store);

    let shared: &'static SharedState = Box::leak(Box::new(SharedState::new(
        history,
        config.timing.lock_timeout(),
    )));

    let sampling_rt = worker_runtime()?;
    let input_rt = worker_runtime()?;

    let _terminal = TerminalGuard::new().context("preparing terminal")?;
    let mut display = TermDisplay::new(io::stdout());
    let renderer = sampling_rt
        .block_on(init_display(&mut display, SPLASH_DURATION))
        .map_err(|e| anyhow!("{e}"))?;

    let (save, save_pin) = buttons::button("Save");
    let (reset, reset_pin) = buttons::button("Reset");

    let sampling = SamplingRenderLoop::new(
        shared,
        SimSensor::new(args.sensor_dropout),
        display,
        renderer,
        &config,
    );
    let input = InputWorker::new(shared, save_pin, reset_pin, store, &config);

    spawn_worker("sampling", move || {
        sampling_rt.block_on(sampling.run());
    })?;
    spawn_worker("input", move || {
        input_rt.block_on(input.run());
    })?;

    info!("Keys: s=save  r=reset  S/R=hold  q=quit");
    loop {
        match event::read().context("reading keyboard")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if !handle_key(key, &save, &reset) {
                    break;
                }
            }
            _ => {}
        }
    }

    info!("Simulator exiting");
    Ok(())
}
