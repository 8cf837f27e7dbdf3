//! Sampling and render loop.
//!
//! One worker owns the sensor and the display. Every sample interval it reads
//! the conversion started on the previous cycle and starts the next one, so
//! the accepted value is always one interval old. Every render interval it
//! draws a snapshot of the shared state.

use embassy_time::{Duration, Instant, Ticker};
use log::{debug, error, info, warn};

use crate::app_state::SharedState;
use crate::config::Config;
use crate::display::{DisplayDriver, Renderer};
use crate::sensors::{TemperatureSensor, read_plausible};

/// What happened to one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    /// The reading was accepted as the latest temperature.
    Updated(f32),
    /// The reading was implausible or the driver failed.
    Discarded,
    /// The shared state was busy; the reading was dropped.
    Skipped,
}

pub struct SamplingRenderLoop<'a, S, D> {
    shared: &'a SharedState,
    sensor: S,
    display: D,
    renderer: Renderer,
    sample_interval: Duration,
    render_interval: Duration,
}

impl<'a, S, D> SamplingRenderLoop<'a, S, D>
where
    S: TemperatureSensor,
    D: DisplayDriver,
{
    /// `renderer` should be the one that drew the splash screen, so the first
    /// frame replaces it completely.
    pub fn new(
        shared: &'a SharedState,
        sensor: S,
        display: D,
        renderer: Renderer,
        config: &Config,
    ) -> Self {
        Self {
            shared,
            sensor,
            display,
            renderer,
            sample_interval: config.timing.sample_interval(),
            render_interval: config.timing.render_interval(),
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    /// Kick off the first conversion.
    pub async fn start(&mut self) {
        if let Err(e) = self.sensor.request_conversion().await {
            warn!("Initial conversion request failed: {}", e);
        }
    }

    /// Read the previous conversion, publish it if plausible, then start the
    /// next conversion.
    pub async fn sample_once(&mut self) -> SampleOutcome {
        let outcome = match read_plausible(&mut self.sensor).await {
            Ok(celsius) => {
                let published = self
                    .shared
                    .with_lock(|state| state.set_latest_temperature(celsius))
                    .await;
                match published {
                    Ok(()) => {
                        debug!("Temperature: {:.2} °C", celsius);
                        SampleOutcome::Updated(celsius)
                    }
                    Err(e) => {
                        warn!("Sample {:.2} °C dropped: {}", celsius, e);
                        SampleOutcome::Skipped
                    }
                }
            }
            Err(e) => {
                warn!("Sample discarded: {}", e);
                SampleOutcome::Discarded
            }
        };

        if let Err(e) = self.sensor.request_conversion().await {
            warn!("Conversion request failed: {}", e);
        }

        outcome
    }

    /// Draw the current snapshot. Returns `false` if nothing was drawn.
    pub async fn render_once(&mut self) -> bool {
        let snapshot = match self.shared.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Render skipped: {}", e);
                return false;
            }
        };

        match self.renderer.render(&snapshot, &mut self.display) {
            Ok(()) => true,
            Err(e) => {
                error!("Render failed: {:?}", e);
                false
            }
        }
    }

    /// Sample and render forever.
    pub async fn run(mut self) -> ! {
        info!(
            "Sampling every {} ms, rendering every {} ms",
            self.sample_interval.as_millis(),
            self.render_interval.as_millis()
        );
        self.start().await;

        let mut next_sample = Instant::now() + self.sample_interval;
        let mut ticker = Ticker::every(self.render_interval);
        loop {
            let now = Instant::now();
            if now >= next_sample {
                self.sample_once().await;
                next_sample = now + self.sample_interval;
            }
            self.render_once().await;
            ticker.next().await;
        }
    }
}
