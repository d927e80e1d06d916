//! Daily decisions as submitted and in canonical form.

use crate::player::{PlayerId, UpgradeKind};
use crate::resource::{Resource, ResourceMap};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raid another tribe's stockpile of one resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidOrder {
    pub target: PlayerId,
    pub resource: Resource,
}

/// Emergency sale at the fixed dump price.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DumpOrder {
    pub resource: Resource,
    pub quantity: Decimal,
}

/// A decision exactly as a player sent it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDecision {
    /// Effort points per resource.
    pub mining: ResourceMap<u32>,
    /// Units to sell per resource.
    pub sell: ResourceMap<Decimal>,
    pub raid: Option<RaidOrder>,
    pub upgrade: Option<UpgradeKind>,
    pub dump: Option<DumpOrder>,
}

/// Named rule that produced a decision for a player who submitted nothing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    Idle,
    Standard,
    Bot,
}

/// Where a canonical decision came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    Submitted,
    Fallback(FallbackKind),
}

/// Validated decision ready for resolution.
///
/// Effort is within the daily budget, sell and dump amounts are within their
/// caps and quantized; they are still clamped to stock at resolution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub mining: ResourceMap<u32>,
    pub sell: ResourceMap<Decimal>,
    pub raid: Option<RaidOrder>,
    pub upgrade: Option<UpgradeKind>,
    pub dump: Option<DumpOrder>,
    pub source: DecisionSource,
}

impl Decision {
    /// Decision that does nothing at all.
    pub fn idle(source: DecisionSource) -> Self {
        Self {
            mining: ResourceMap::default(),
            sell: ResourceMap::default(),
            raid: None,
            upgrade: None,
            dump: None,
            source,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.source, DecisionSource::Fallback(_))
    }
}

impl From<&Decision> for RawDecision {
    fn from(d: &Decision) -> Self {
        RawDecision {
            mining: d.mining,
            sell: d.sell,
            raid: d.raid,
            upgrade: d.upgrade,
            dump: d.dump,
        }
    }
}
