//! Per-approach signal head
//!
//! Holds the countdowns for one approach. Which signal is active is owned by
//! the scheduler; a signal only knows its own timers.

/// Colour shown by a signal head
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightState {
    Red,
    Yellow,
    Green,
}

/// Red countdowns above this value are displayed as "---"
pub const RED_DISPLAY_LIMIT: i32 = 10;

/// A traffic signal for one approach
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    /// Seconds until this approach turns green; display only, may go negative
    pub red: i32,
    pub yellow: u32,
    pub green: u32,
}

impl Signal {
    pub fn new(red: i32, yellow: u32, green: u32) -> Self {
        Self { red, yellow, green }
    }

    /// Count one second off the countdown for the given light.
    /// Returns true when a green or yellow countdown has run out.
    pub fn count_down(&mut self, light: LightState) -> bool {
        match light {
            LightState::Green => {
                self.green = self.green.saturating_sub(1);
                self.green == 0
            }
            LightState::Yellow => {
                self.yellow = self.yellow.saturating_sub(1);
                self.yellow == 0
            }
            LightState::Red => {
                self.red = self.red.saturating_sub(1);
                false
            }
        }
    }

    /// Text shown next to the signal head
    pub fn label(&self, light: LightState) -> String {
        match light {
            LightState::Green => self.green.to_string(),
            LightState::Yellow => self.yellow.to_string(),
            LightState::Red if self.red <= RED_DISPLAY_LIMIT => self.red.to_string(),
            LightState::Red => "---".to_string(),
        }
    }
}
