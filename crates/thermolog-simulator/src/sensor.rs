//! Synthetic one-wire temperature sensor.

use std::time::Instant;

use thermolog_core::sensors::{SensorError, TemperatureSensor};

/// What a one-wire sensor reports when nothing answers on the bus.
pub const DISCONNECTED_CELSIUS: f32 = -127.0;

/// Smoothly drifting room temperature.
///
/// Like a real sensor in non-blocking mode, a reading returns the result of
/// the previous conversion request, and `-127 °C` before the first one.
pub struct SimSensor {
    started: Instant,
    scratchpad: f32,
    conversions: u32,
    /// Every n-th conversion comes back disconnected; 0 disables.
    dropout_every: u32,
}

impl SimSensor {
    pub fn new(dropout_every: u32) -> Self {
        Self {
            started: Instant::now(),
            scratchpad: DISCONNECTED_CELSIUS,
            conversions: 0,
            dropout_every,
        }
    }

    /// Temperature `secs` seconds after start: 20-26 °C with a slow drift.
    pub fn temperature_at(secs: f64) -> f32 {
        (23.0 + 2.5 * (secs / 90.0).sin() + 0.5 * (secs / 17.0).cos()) as f32
    }

    fn is_dropout(&self) -> bool {
        self.dropout_every != 0 && self.conversions % self.dropout_every == 0
    }
}

impl TemperatureSensor for SimSensor {
    fn name(&self) -> &'static str {
        "sim-ds18b20"
    }

    async fn request_conversion(&mut self) -> Result<(), SensorError> {
        self.conversions = self.conversions.wrapping_add(1);
        self.scratchpad = if self.is_dropout() {
            DISCONNECTED_CELSIUS
        } else {
            Self::temperature_at(self.started.elapsed().as_secs_f64())
        };
        Ok(())
    }

    async fn read_last_celsius(&mut self) -> Result<f32, SensorError> {
        Ok(self.scratchpad)
    }
}
