//! Tribes and their holdings.

use crate::config::GameConfig;
use crate::resource::{Resource, ResourceMap};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable player identifier, assigned in registration order starting at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who drives a tribe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerKind {
    #[default]
    Human,
    Bot,
}

/// Purchasable capability tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    /// Mining robots: more yield per effort point.
    Miner,
    /// Defense systems: part of the stockpile is shielded from raids.
    Defense,
}

impl UpgradeKind {
    pub const ALL: [UpgradeKind; 2] = [UpgradeKind::Miner, UpgradeKind::Defense];
}

/// Upgrade levels; they only ever go up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Upgrades {
    pub miner: u32,
    pub defense: u32,
}

impl Upgrades {
    pub fn level(&self, kind: UpgradeKind) -> u32 {
        match kind {
            UpgradeKind::Miner => self.miner,
            UpgradeKind::Defense => self.defense,
        }
    }

    pub fn level_mut(&mut self, kind: UpgradeKind) -> &mut u32 {
        match kind {
            UpgradeKind::Miner => &mut self.miner,
            UpgradeKind::Defense => &mut self.defense,
        }
    }
}

/// Everything the engine tracks about one tribe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    pub id: PlayerId,
    /// Login name.
    pub name: String,
    /// Display name of the tribe.
    pub tribe_name: String,
    #[serde(default)]
    pub kind: PlayerKind,
    /// Credit balance; normal play keeps it non-negative but it is not clamped.
    pub credits: Decimal,
    /// Freely usable holdings.
    #[serde(default)]
    pub stockpile: ResourceMap<Decimal>,
    /// Fresh loot, immune to raids until merged at the start of the next day.
    #[serde(default)]
    pub protected_stockpile: ResourceMap<Decimal>,
    #[serde(default)]
    pub upgrades: Upgrades,
}

impl PlayerState {
    /// New tribe with the configured starting grant.
    pub fn new(
        id: PlayerId,
        name: impl Into<String>,
        tribe_name: impl Into<String>,
        kind: PlayerKind,
        cfg: &GameConfig,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            tribe_name: tribe_name.into(),
            kind,
            credits: cfg.starting_credits,
            stockpile: cfg.starting_stockpile,
            protected_stockpile: ResourceMap::default(),
            upgrades: Upgrades::default(),
        }
    }

    pub fn is_bot(&self) -> bool {
        self.kind == PlayerKind::Bot
    }

    /// Usable plus protected holdings of `r`.
    pub fn holdings(&self, r: Resource) -> Decimal {
        self.stockpile[r] + self.protected_stockpile[r]
    }
}

/// Position on the leaderboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    /// 1-based rank.
    pub rank: usize,
    pub player: PlayerId,
    pub name: String,
    pub tribe_name: String,
    pub credits: Decimal,
}

/// Rank players by credits, highest first. Ties keep roster order.
pub fn standings(players: &[PlayerState]) -> Vec<Standing> {
    let mut order: Vec<&PlayerState> = players.iter().collect();
    // sort_by is stable
    order.sort_by(|a, b| b.credits.cmp(&a.credits));
    order
        .into_iter()
        .enumerate()
        .map(|(i, p)| Standing {
            rank: i + 1,
            player: p.id,
            name: p.name.clone(),
            tribe_name: p.tribe_name.clone(),
            credits: p.credits,
        })
        .collect()
}
