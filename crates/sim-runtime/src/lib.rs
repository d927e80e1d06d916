#![deny(warnings)]

//! Day-resolution engine for Space Tribes.
//!
//! [`resolve_day`] is the pure batch transform; [`GameSession`] owns one
//! game's state around it and [`SharedSession`] serializes access to a
//! session from many threads.

pub mod normalize;
pub mod raid;
pub mod resolver;
pub mod session;
pub mod shared;

pub use normalize::{normalize_decision, validate_decision};
pub use raid::{apply_raid_outcome, resolve_raids, RaidGroup, RaidOutcome, RaidRequest};
pub use resolver::{check_day, mining_yield, resolve_day, DayInput, DayOutcome, DayReport, UpgradeResult};
pub use session::{GameSession, PlayerView, SessionError};
pub use shared::SharedSession;
