//! Turn/hazard indicator state, driven by whatever command was actually
//! issued, in either mode.

use std::time::{Duration, Instant};

use crate::control::MotionCommand;

const BLINK_PERIOD: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Reversing,
    TurnLeft,
    TurnRight,
    Neutral,
}

pub fn classify(command: &MotionCommand) -> MotionState {
    if command.speed < 1500 {
        MotionState::Reversing
    } else if command.steering < 1450 {
        MotionState::TurnLeft
    } else if command.steering > 1550 {
        MotionState::TurnRight
    } else {
        MotionState::Neutral
    }
}

pub struct Indicators {
    left_on: bool,
    right_on: bool,
    left_last_toggle: Instant,
    right_last_toggle: Instant,
}

impl Indicators {
    pub fn new(now: Instant) -> Self {
        Indicators {
            left_on: false,
            right_on: false,
            left_last_toggle: now,
            right_last_toggle: now,
        }
    }

    /// Re-evaluated every cycle, no hysteresis. Blinking is free-running:
    /// each side toggles whenever 200 ms have passed since its own last
    /// toggle, regardless of when the state was entered.
    pub fn update(&mut self, command: &MotionCommand, now: Instant) -> (bool, bool) {
        match classify(command) {
            MotionState::Reversing => {
                self.left_on = true;
                self.right_on = true;
            }
            MotionState::TurnLeft => {
                self.right_on = false;
                if now.duration_since(self.left_last_toggle) >= BLINK_PERIOD {
                    self.left_on = !self.left_on;
                    self.left_last_toggle = now;
                }
            }
            MotionState::TurnRight => {
                self.left_on = false;
                if now.duration_since(self.right_last_toggle) >= BLINK_PERIOD {
                    self.right_on = !self.right_on;
                    self.right_last_toggle = now;
                }
            }
            MotionState::Neutral => {
                self.left_on = false;
                self.right_on = false;
            }
        }

        (self.left_on, self.right_on)
    }

    pub fn state(&self) -> (bool, bool) {
        (self.left_on, self.right_on)
    }
}
