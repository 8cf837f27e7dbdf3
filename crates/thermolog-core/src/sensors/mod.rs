//! Temperature sensor abstraction.
//!
//! Sensors run conversions in the background: the sampling loop asks for a new
//! conversion each cycle and reads back the result of the previous one, so every
//! accepted reading is one sampling interval old.

use thiserror_no_std::Error;

/// Readings at or below this value mean "no sensor" or a failed conversion.
pub const MIN_PLAUSIBLE_CELSIUS: f32 = -100.0;

/// Returns `true` for readings a connected sensor could actually produce.
#[inline]
pub fn is_plausible(celsius: f32) -> bool {
    celsius > MIN_PLAUSIBLE_CELSIUS
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SensorError {
    #[error("{sensor}: failed to {operation}")]
    ReadFailed {
        sensor: &'static str,
        operation: &'static str,
    },
    #[error("{sensor}: implausible reading {celsius} °C")]
    Implausible { sensor: &'static str, celsius: f32 },
}

/// A digital temperature sensor with non-blocking conversions.
pub trait TemperatureSensor {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Start a new conversion without waiting for it to finish.
    fn request_conversion(&mut self) -> impl Future<Output = Result<(), SensorError>>;

    /// Result of the last completed conversion, in degrees Celsius.
    ///
    /// Drivers report "no sensor" as a value at or below
    /// [`MIN_PLAUSIBLE_CELSIUS`] rather than an error, matching common one-wire
    /// sensor libraries.
    fn read_last_celsius(&mut self) -> impl Future<Output = Result<f32, SensorError>>;
}

/// Read the last conversion and reject implausible values.
pub async fn read_plausible<S: TemperatureSensor>(sensor: &mut S) -> Result<f32, SensorError> {
    let celsius = sensor.read_last_celsius().await?;
    if is_plausible(celsius) {
        Ok(celsius)
    } else {
        Err(SensorError::Implausible {
            sensor: sensor.name(),
            celsius,
        })
    }
}
