//! Game calendar.

use serde::{Deserialize, Serialize};

/// Current day and horizon of a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameClock {
    /// Day currently open for decisions, starting at 1.
    pub current_day: u32,
    /// Last resolvable day.
    pub duration_days: u32,
    pub ended: bool,
}

impl GameClock {
    pub fn new(duration_days: u32) -> Self {
        Self {
            current_day: 1,
            duration_days,
            ended: false,
        }
    }

    /// Move to the next day. Returns `true` once the horizon has passed.
    pub fn advance(&mut self) -> bool {
        self.current_day = self.current_day.saturating_add(1);
        if self.current_day > self.duration_days {
            self.ended = true;
        }
        self.ended
    }

    /// Days still open for resolution, the current one included.
    pub fn days_remaining(&self) -> u32 {
        if self.ended {
            0
        } else {
            self.duration_days.saturating_sub(self.current_day) + 1
        }
    }
}
