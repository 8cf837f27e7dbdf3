//! Push buttons driven from the keyboard.
//!
//! A [`ButtonHandle`] presses the button for a while; the matching
//! [`SimButton`] is the active-low input line the input worker polls.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use embedded_hal::digital::{ErrorType, InputPin};

/// How long a tap keeps the line low; a few poll periods.
pub const TAP_DURATION: Duration = Duration::from_millis(150);

/// Long enough for a held button to fire several times.
pub const HOLD_DURATION: Duration = Duration::from_millis(1600);

type PressedUntil = Arc<Mutex<Option<Instant>>>;

fn is_pressed(line: &PressedUntil) -> bool {
    line.lock()
        .map(|until| until.is_some_and(|t| Instant::now() < t))
        .unwrap_or(false)
}

/// Create a connected handle/pin pair.
pub fn button(name: &'static str) -> (ButtonHandle, SimButton) {
    let line = PressedUntil::default();
    (
        ButtonHandle {
            name,
            line: line.clone(),
        },
        SimButton { line },
    )
}

#[derive(Clone)]
pub struct ButtonHandle {
    name: &'static str,
    line: PressedUntil,
}

impl ButtonHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Keep the button pressed for `duration` from now.
    pub fn press_for(&self, duration: Duration) {
        if let Ok(mut until) = self.line.lock() {
            *until = Some(Instant::now() + duration);
        }
    }

    pub fn is_pressed(&self) -> bool {
        is_pressed(&self.line)
    }
}

pub struct SimButton {
    line: PressedUntil,
}

impl ErrorType for SimButton {
    type Error = Infallible;
}

impl InputPin for SimButton {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!is_pressed(&self.line))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(is_pressed(&self.line))
    }
}
