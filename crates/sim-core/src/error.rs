//! Engine error kinds.
//!
//! Unmet preconditions during resolution (no fuel, no credits, empty stock)
//! are not errors; they show up as news.

use crate::player::PlayerId;
use crate::resource::Resource;
use rust_decimal::Decimal;
use thiserror::Error;

/// A submission or registration the engine refuses. Never fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("total effort {total} exceeds {cap} points")]
    EffortCapExceeded { total: u32, cap: u32 },
    #[error("sell order of {requested} {resource} exceeds cap {cap}")]
    SellCapExceeded {
        resource: Resource,
        requested: Decimal,
        cap: Decimal,
    },
    #[error("dump of {requested} {resource} exceeds daily cap {cap}")]
    DumpCapExceeded {
        resource: Resource,
        requested: Decimal,
        cap: Decimal,
    },
    #[error("negative quantity for {0}")]
    NegativeQuantity(Resource),
    #[error("a tribe cannot raid itself")]
    SelfRaid,
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("day {day} is closed; current day is {current}")]
    DayAlreadyResolved { day: u32, current: u32 },
    #[error("day {day} is not open yet; current day is {current}")]
    DayNotOpen { day: u32, current: u32 },
    #[error("the game has ended")]
    GameEnded,
    #[error("roster is full ({0} tribes)")]
    RosterFull(usize),
    #[error("player and tribe names must not be empty")]
    EmptyName,
    #[error("name {0:?} is already taken")]
    NameTaken(String),
    #[error("player id {0} appears more than once")]
    DuplicatePlayer(PlayerId),
}

/// Resolution refused or aborted; nothing was committed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("day {day} was already resolved; current day is {current}")]
    DayAlreadyResolved { day: u32, current: u32 },
    #[error("day {day} is not open yet; current day is {current}")]
    DayNotOpen { day: u32, current: u32 },
    #[error("game ended after day {last_day}")]
    GameEnded { last_day: u32 },
    #[error("invariant violated: {0}")]
    InvariantViolated(String),
}
