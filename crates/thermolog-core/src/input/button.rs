//! Time-based button debouncing.
//!
//! A button fires when it is actuated and at least one debounce window has passed
//! since it last fired. With [`RetriggerPolicy::WhileHeld`] a button that stays
//! actuated fires again every window; with [`RetriggerPolicy::EdgeOnly`] it has
//! to be released first.

use embassy_time::{Duration, Instant};

use crate::config::{InputConfig, RetriggerPolicy};

/// What the operator asked for by pressing a button.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ButtonIntent {
    #[default]
    None,
    /// Append the latest reading to the history.
    Save,
    /// Wipe the history.
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonState {
    /// Not actuated, or actuated without having fired yet.
    Idle,
    /// Fired during the current actuation.
    Pressed,
}

/// Debounce state machine for one physical button.
#[derive(Debug, Clone)]
pub struct DebouncedButton {
    intent: ButtonIntent,
    window: Duration,
    policy: RetriggerPolicy,
    state: ButtonState,
    last_fired: Option<Instant>,
}

impl DebouncedButton {
    pub const fn new(intent: ButtonIntent, window: Duration, policy: RetriggerPolicy) -> Self {
        Self {
            intent,
            window,
            policy,
            state: ButtonState::Idle,
            last_fired: None,
        }
    }

    pub const fn from_config(intent: ButtonIntent, config: &InputConfig) -> Self {
        Self::new(intent, config.debounce_window(), config.retrigger)
    }

    pub const fn state(&self) -> ButtonState {
        self.state
    }

    /// Whether enough time has passed since the last fire.
    pub fn is_eligible(&self, now: Instant) -> bool {
        self.last_fired
            .is_none_or(|fired| now.saturating_duration_since(fired) >= self.window)
    }

    /// Feed one sample of the (debounced) input line.
    ///
    /// Returns the button's intent when it fires, [`ButtonIntent::None`]
    /// otherwise.
    pub fn poll(&mut self, actuated: bool, now: Instant) -> ButtonIntent {
        if !actuated {
            self.state = ButtonState::Idle;
            return ButtonIntent::None;
        }

        if !self.is_eligible(now) {
            return ButtonIntent::None;
        }

        if self.policy == RetriggerPolicy::EdgeOnly && self.state == ButtonState::Pressed {
            return ButtonIntent::None;
        }

        self.state = ButtonState::Pressed;
        self.last_fired = Some(now);
        self.intent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(500);

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn save_button(policy: RetriggerPolicy) -> DebouncedButton {
        DebouncedButton::new(ButtonIntent::Save, WINDOW, policy)
    }

    #[test]
    fn test_first_press_fires_immediately() {
        let mut button = save_button(RetriggerPolicy::WhileHeld);
        assert_eq!(button.poll(true, at(0)), ButtonIntent::Save);
        assert_eq!(button.state(), ButtonState::Pressed);
    }

    #[test]
    fn test_polls_100ms_apart_fire_once() {
        let mut button = save_button(RetriggerPolicy::WhileHeld);
        assert_eq!(button.poll(true, at(1_000)), ButtonIntent::Save);
        assert_eq!(button.poll(true, at(1_100)), ButtonIntent::None);
    }

    #[test]
    fn test_polls_600ms_apart_fire_twice() {
        let mut button = save_button(RetriggerPolicy::WhileHeld);
        assert_eq!(button.poll(true, at(1_000)), ButtonIntent::Save);
        assert_eq!(button.poll(true, at(1_600)), ButtonIntent::Save);
    }

    #[test]
    fn test_bounce_inside_window_is_ignored() {
        let mut button = DebouncedButton::new(
            ButtonIntent::Reset,
            WINDOW,
            RetriggerPolicy::WhileHeld,
        );
        assert_eq!(button.poll(true, at(0)), ButtonIntent::Reset);
        assert_eq!(button.poll(false, at(50)), ButtonIntent::None);
        assert_eq!(button.poll(true, at(100)), ButtonIntent::None);
        assert_eq!(button.poll(false, at(150)), ButtonIntent::None);
        assert_eq!(button.poll(true, at(500)), ButtonIntent::Reset);
    }

    #[test]
    fn test_held_button_refires_every_window() {
        let mut button = save_button(RetriggerPolicy::WhileHeld);
        let fired = (0..=40)
            .map(|i| button.poll(true, at(i * 50)))
            .filter(|intent| *intent == ButtonIntent::Save)
            .count();
        // 0, 500, 1000, 1500, 2000 ms
        assert_eq!(fired, 5);
    }

    #[test]
    fn test_edge_only_needs_release() {
        let mut button = save_button(RetriggerPolicy::EdgeOnly);
        let fired = (0..=40)
            .map(|i| button.poll(true, at(i * 50)))
            .filter(|intent| *intent == ButtonIntent::Save)
            .count();
        assert_eq!(fired, 1);

        assert_eq!(button.poll(false, at(2_050)), ButtonIntent::None);
        assert_eq!(button.poll(true, at(2_100)), ButtonIntent::Save);
    }

    #[test]
    fn test_edge_only_still_debounces() {
        let mut button = save_button(RetriggerPolicy::EdgeOnly);
        assert_eq!(button.poll(true, at(0)), ButtonIntent::Save);
        assert_eq!(button.poll(false, at(100)), ButtonIntent::None);
        assert_eq!(button.poll(true, at(200)), ButtonIntent::None);
        // Still held once the window has passed: the press is honoured.
        assert_eq!(button.poll(true, at(550)), ButtonIntent::Save);
    }

    #[test]
    fn test_idle_line_never_fires() {
        let mut button = save_button(RetriggerPolicy::WhileHeld);
        for i in 0..20 {
            assert_eq!(button.poll(false, at(i * 50)), ButtonIntent::None);
        }
        assert_eq!(button.state(), ButtonState::Idle);
    }
}
