//! Day-stamped news feed.

use crate::player::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Category of a news entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsKind {
    Absent,
    DecisionRejected,
    Mined,
    RaidSucceeded,
    RaidFailed,
    RaidNoFuel,
    Raided,
    LostInChaos,
    Dumped,
    Sold,
    Upgraded,
    UpgradeFailed,
    MarketShock,
    GameEnded,
}

/// One immutable resolution-time occurrence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsEvent {
    pub day: u32,
    /// Player the entry is about, if any.
    pub player: Option<PlayerId>,
    pub kind: NewsKind,
    pub message: String,
}

impl NewsEvent {
    pub fn new(day: u32, player: Option<PlayerId>, kind: NewsKind, message: String) -> Self {
        Self {
            day,
            player,
            kind,
            message,
        }
    }
}

/// Append-only feed that retains the most recent `capacity` entries.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsLog {
    capacity: usize,
    events: VecDeque<NewsEvent>,
}

impl NewsLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: VecDeque::with_capacity(capacity),
        }
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = NewsEvent>) {
        self.events.extend(events);
        while self.events.len() > self.capacity {
            self.events.pop_front();
        }
    }

    /// Retained entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &NewsEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_trailing_window() {
        let mut log = NewsLog::new(3);
        log.extend((1..=5).map(|d| NewsEvent::new(d, None, NewsKind::Mined, format!("day {d}"))));
        let days: Vec<u32> = log.iter().map(|e| e.day).collect();
        assert_eq!(days, vec![3, 4, 5]);
        assert_eq!(log.len(), 3);
    }
}
