#![deny(warnings)]

//! Core domain models and invariants for Space Tribes.
//!
//! This crate defines the serializable state the day-resolution engine works
//! on (tribes, decisions, market, clock, news) together with the game
//! configuration and validation helpers that guarantee basic invariants.

pub mod clock;
pub mod config;
pub mod decision;
pub mod error;
pub mod invariants;
pub mod market;
pub mod news;
pub mod player;
pub mod resource;

pub use clock::GameClock;
pub use config::{
    AbsenteePolicy, BotConfig, ConfigError, CostCurve, DemandSchedule, GameConfig, MarketShock,
    PriceBand, PricingConfig, UpgradeCosts,
};
pub use decision::{Decision, DecisionSource, DumpOrder, FallbackKind, RaidOrder, RawDecision};
pub use error::{StateError, ValidationError};
pub use invariants::{check_invariants, InvariantViolation};
pub use market::{MarketRecord, MarketState};
pub use news::{NewsEvent, NewsKind, NewsLog};
pub use player::{standings, PlayerId, PlayerKind, PlayerState, Standing, UpgradeKind, Upgrades};
pub use resource::{clamp_quantity, floor_to, round_to, Resource, ResourceMap};

use rust_decimal::Decimal;
use std::collections::BTreeSet;

/// Validate a single tribe loaded from outside the engine.
pub fn validate_player(p: &PlayerState) -> Result<(), ValidationError> {
    if p.name.trim().is_empty() || p.tribe_name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    for r in Resource::ALL {
        if p.stockpile[r] < Decimal::ZERO || p.protected_stockpile[r] < Decimal::ZERO {
            return Err(ValidationError::NegativeQuantity(r));
        }
    }
    Ok(())
}

/// Validate a roster: every tribe valid, ids and names unique.
pub fn validate_roster(players: &[PlayerState]) -> Result<(), ValidationError> {
    let mut ids = BTreeSet::new();
    let mut names = BTreeSet::new();
    for p in players {
        validate_player(p)?;
        if !ids.insert(p.id) {
            return Err(ValidationError::DuplicatePlayer(p.id));
        }
        if !names.insert(p.name.to_lowercase()) {
            return Err(ValidationError::NameTaken(p.name.clone()));
        }
    }
    Ok(())
}
