//! Game configuration. Every constant the engine consults lives here and can
//! be overridden from a serialized config; missing fields take the defaults of
//! the classic six-tribe game.

use crate::player::UpgradeKind;
use crate::resource::{Resource, ResourceMap};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One band of the supply/demand price response.
///
/// A band applies when `sold / demand >= min_ratio`; bands are checked from the
/// highest `min_ratio` down.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceBand {
    /// Inclusive lower bound of the sold/demand ratio.
    pub min_ratio: Decimal,
    /// Factor applied to the current price.
    pub multiplier: Decimal,
}

impl PriceBand {
    pub const fn new(min_ratio: Decimal, multiplier: Decimal) -> Self {
        Self {
            min_ratio,
            multiplier,
        }
    }
}

/// Default price response: oversupply drops prices, shortage raises them.
pub fn default_price_bands() -> Vec<PriceBand> {
    vec![
        PriceBand::new(Decimal::new(15, 1), Decimal::new(6, 1)),
        PriceBand::new(Decimal::new(12, 1), Decimal::new(8, 1)),
        PriceBand::new(Decimal::new(8, 1), Decimal::ONE),
        PriceBand::new(Decimal::new(5, 1), Decimal::new(13, 1)),
        PriceBand::new(Decimal::ZERO, Decimal::new(16, 1)),
    ]
}

/// Market pricing parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Lowest price a resource can reach.
    pub price_min: Decimal,
    /// Highest price a resource can reach.
    pub price_max: Decimal,
    /// Decimal places prices are rounded to (0 = whole credits).
    pub price_scale: u32,
    /// Opening price of every resource.
    pub starting_price: Decimal,
    /// Ratio bands, highest `min_ratio` first; the last band must start at 0.
    pub bands: Vec<PriceBand>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            price_min: Decimal::new(5, 0),
            price_max: Decimal::new(50, 0),
            price_scale: 0,
            starting_price: Decimal::new(10, 0),
            bands: default_price_bands(),
        }
    }
}

/// How the colony's daily demand is produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DemandSchedule {
    /// Fixed rotation: day `d` uses entry `(d - 1) % cycle.len()`.
    Cyclic { cycle: Vec<ResourceMap<Decimal>> },
    /// Uniform whole-unit draw in `[min, max]` per resource per day.
    Seeded { min: u32, max: u32 },
}

impl Default for DemandSchedule {
    fn default() -> Self {
        let row = |a: i64, b: i64, c: i64, d: i64| ResourceMap {
            bluegems: Decimal::new(a, 0),
            redrubies: Decimal::new(b, 0),
            whitediamonds: Decimal::new(c, 0),
            greenpoison: Decimal::new(d, 0),
        };
        DemandSchedule::Cyclic {
            cycle: vec![
                row(20, 15, 10, 15),
                row(15, 20, 12, 10),
                row(25, 10, 8, 15),
                row(10, 15, 15, 20),
                row(20, 20, 10, 10),
            ],
        }
    }
}

/// Random one-off price jolt applied after pricing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketShock {
    /// Probability per day in `[0, 1]`; 0 disables shocks.
    pub chance: f64,
    /// Absolute price change, applied up or down.
    pub magnitude: Decimal,
}

impl Default for MarketShock {
    fn default() -> Self {
        Self {
            chance: 0.0,
            magnitude: Decimal::new(2, 0),
        }
    }
}

/// Linear upgrade price: `base + level * increment`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostCurve {
    pub base: Decimal,
    pub increment: Decimal,
}

impl CostCurve {
    /// Price of the next level when the current level is `level`.
    pub fn cost(&self, level: u32) -> Decimal {
        self.base + Decimal::from(level) * self.increment
    }
}

/// Cost curves per upgrade track.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeCosts {
    pub miner: CostCurve,
    pub defense: CostCurve,
}

impl UpgradeCosts {
    pub fn curve(&self, kind: UpgradeKind) -> &CostCurve {
        match kind {
            UpgradeKind::Miner => &self.miner,
            UpgradeKind::Defense => &self.defense,
        }
    }
}

impl Default for UpgradeCosts {
    fn default() -> Self {
        Self {
            miner: CostCurve {
                base: Decimal::new(100, 0),
                increment: Decimal::new(50, 0),
            },
            defense: CostCurve {
                base: Decimal::new(80, 0),
                increment: Decimal::new(40, 0),
            },
        }
    }
}

/// What a human player who submitted nothing does for the day.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenteePolicy {
    /// Mine nothing and sell nothing.
    Idle,
    /// Spread `standard_effort_per_resource` on every resource, sell nothing.
    #[default]
    Standard,
}

/// Behaviour of bot tribes that have no submitted decision.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Fraction of each stockpile offered for sale, in `[0, 1]`.
    pub sell_fraction: Decimal,
    /// Daily probability of raiding another tribe.
    pub raid_chance: f64,
    /// Daily probability of attempting an upgrade.
    pub upgrade_chance: f64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            sell_fraction: Decimal::new(5, 1),
            raid_chance: 0.2,
            upgrade_chance: 0.3,
        }
    }
}

/// Full engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Daily effort budget across all resources.
    pub max_effort_points: u32,
    /// Per-resource cap on a single day's sell order.
    pub max_sell_per_resource: Decimal,
    /// Cap on a single day's emergency dump.
    pub max_dump_per_day: Decimal,
    /// Fixed price paid for dumped units.
    pub dump_price: Decimal,
    /// Resource burned to attempt a raid.
    pub raid_fuel: Resource,
    /// Fuel burned per raid attempt.
    pub raid_cost: Decimal,
    /// Loot each valid raider demands from the victim.
    pub raid_loot_per_attacker: Decimal,
    /// Share of a victim's stock shielded per defense level.
    pub defense_shield_per_level: Decimal,
    /// Upper bound on the shielded share.
    pub max_defense_shield: Decimal,
    pub pricing: PricingConfig,
    /// Decimal places quantities are kept at (0 = whole units).
    pub quantity_scale: u32,
    /// Number of resolvable days.
    pub duration_days: u32,
    /// Units mined per effort point before upgrades.
    pub per_unit_yield: ResourceMap<Decimal>,
    /// Extra yield fraction per miner level.
    pub mining_bonus_per_level: Decimal,
    pub upgrades: UpgradeCosts,
    pub colony_needs: DemandSchedule,
    pub market_shock: MarketShock,
    pub absentee_policy: AbsenteePolicy,
    /// Effort per resource under [`AbsenteePolicy::Standard`] and for bots.
    pub standard_effort_per_resource: u32,
    pub bot: BotConfig,
    pub starting_credits: Decimal,
    pub starting_stockpile: ResourceMap<Decimal>,
    /// Days of market history retained for display.
    pub history_len: usize,
    /// News entries retained for display.
    pub news_len: usize,
    /// Roster size bots pad up to. Humans may join beyond it.
    pub roster_size: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_effort_points: 10,
            max_sell_per_resource: Decimal::new(50, 0),
            max_dump_per_day: Decimal::new(10, 0),
            dump_price: Decimal::new(3, 0),
            raid_fuel: Resource::GreenPoison,
            raid_cost: Decimal::new(2, 0),
            raid_loot_per_attacker: Decimal::new(5, 0),
            defense_shield_per_level: Decimal::new(1, 1),
            max_defense_shield: Decimal::new(5, 1),
            pricing: PricingConfig::default(),
            quantity_scale: 0,
            duration_days: 30,
            per_unit_yield: ResourceMap {
                bluegems: Decimal::new(3, 0),
                redrubies: Decimal::new(2, 0),
                whitediamonds: Decimal::ONE,
                greenpoison: Decimal::new(2, 0),
            },
            mining_bonus_per_level: Decimal::new(1, 1),
            upgrades: UpgradeCosts::default(),
            colony_needs: DemandSchedule::default(),
            market_shock: MarketShock::default(),
            absentee_policy: AbsenteePolicy::Standard,
            standard_effort_per_resource: 2,
            bot: BotConfig::default(),
            starting_credits: Decimal::new(1000, 0),
            starting_stockpile: ResourceMap::default(),
            history_len: 10,
            news_len: 20,
            roster_size: 6,
        }
    }
}

/// Configuration rejected by [`GameConfig::validate`].
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("price bounds invalid: min {min} max {max}")]
    PriceBounds { min: Decimal, max: Decimal },
    #[error("price bands must be non-empty, strictly descending and end at ratio 0")]
    PriceBands,
    #[error("{0} must not be negative")]
    Negative(&'static str),
    #[error("probability {0} outside [0, 1]")]
    Probability(&'static str),
    #[error("colony demand schedule is empty or inverted")]
    DemandSchedule,
    #[error("duration must be at least one day")]
    ZeroDuration,
    #[error("scale {0} exceeds the supported 4 decimal places")]
    Scale(u32),
}

impl GameConfig {
    /// Check cross-field invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pricing;
        if p.price_min <= Decimal::ZERO || p.price_min > p.price_max {
            return Err(ConfigError::PriceBounds {
                min: p.price_min,
                max: p.price_max,
            });
        }
        validate_bands(&p.bands)?;
        if p.price_scale > 4 {
            return Err(ConfigError::Scale(p.price_scale));
        }
        if self.quantity_scale > 4 {
            return Err(ConfigError::Scale(self.quantity_scale));
        }
        let non_negative = [
            ("max_sell_per_resource", self.max_sell_per_resource),
            ("max_dump_per_day", self.max_dump_per_day),
            ("dump_price", self.dump_price),
            ("raid_cost", self.raid_cost),
            ("raid_loot_per_attacker", self.raid_loot_per_attacker),
            ("defense_shield_per_level", self.defense_shield_per_level),
            ("mining_bonus_per_level", self.mining_bonus_per_level),
            ("starting_credits", self.starting_credits),
            ("market_shock.magnitude", self.market_shock.magnitude),
        ];
        for (name, v) in non_negative {
            if v < Decimal::ZERO {
                return Err(ConfigError::Negative(name));
            }
        }
        if self.per_unit_yield.iter().any(|(_, v)| *v < Decimal::ZERO)
            || self.starting_stockpile.iter().any(|(_, v)| *v < Decimal::ZERO)
        {
            return Err(ConfigError::Negative("per-resource amounts"));
        }
        if self.max_defense_shield < Decimal::ZERO || self.max_defense_shield > Decimal::ONE {
            return Err(ConfigError::Probability("max_defense_shield"));
        }
        if self.bot.sell_fraction < Decimal::ZERO || self.bot.sell_fraction > Decimal::ONE {
            return Err(ConfigError::Probability("bot.sell_fraction"));
        }
        for (name, v) in [
            ("bot.raid_chance", self.bot.raid_chance),
            ("bot.upgrade_chance", self.bot.upgrade_chance),
            ("market_shock.chance", self.market_shock.chance),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(ConfigError::Probability(name));
            }
        }
        match &self.colony_needs {
            DemandSchedule::Cyclic { cycle } => {
                if cycle.is_empty()
                    || cycle
                        .iter()
                        .any(|row| row.iter().any(|(_, v)| *v < Decimal::ZERO))
                {
                    return Err(ConfigError::DemandSchedule);
                }
            }
            DemandSchedule::Seeded { min, max } => {
                if min > max {
                    return Err(ConfigError::DemandSchedule);
                }
            }
        }
        if self.duration_days == 0 {
            return Err(ConfigError::ZeroDuration);
        }
        Ok(())
    }
}

fn validate_bands(bands: &[PriceBand]) -> Result<(), ConfigError> {
    let Some(last) = bands.last() else {
        return Err(ConfigError::PriceBands);
    };
    if last.min_ratio != Decimal::ZERO {
        return Err(ConfigError::PriceBands);
    }
    let descending = bands.windows(2).all(|w| w[0].min_ratio > w[1].min_ratio);
    let positive = bands.iter().all(|b| b.multiplier > Decimal::ZERO);
    if !descending || !positive {
        return Err(ConfigError::PriceBands);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let cfg: GameConfig = serde_json::from_str(
            r#"{"raid_cost": 3, "pricing": {"price_max": 80}, "absentee_policy": "idle"}"#,
        )
        .unwrap();
        assert_eq!(cfg.raid_cost, Decimal::new(3, 0));
        assert_eq!(cfg.pricing.price_max, Decimal::new(80, 0));
        assert_eq!(cfg.pricing.price_min, Decimal::new(5, 0));
        assert_eq!(cfg.absentee_policy, AbsenteePolicy::Idle);
        assert_eq!(cfg.max_effort_points, 10);
        cfg.validate().unwrap();
    }

    #[test]
    fn seeded_schedule_parses() {
        let cfg: GameConfig =
            serde_json::from_str(r#"{"colony_needs": {"mode": "seeded", "min": 5, "max": 25}}"#)
                .unwrap();
        assert_eq!(cfg.colony_needs, DemandSchedule::Seeded { min: 5, max: 25 });
    }

    #[test]
    fn rejects_inverted_price_bounds() {
        let mut cfg = GameConfig::default();
        cfg.pricing.price_min = Decimal::new(60, 0);
        assert!(matches!(cfg.validate(), Err(ConfigError::PriceBounds { .. })));
    }

    #[test]
    fn rejects_unsorted_bands() {
        let mut cfg = GameConfig::default();
        cfg.pricing.bands.swap(0, 1);
        assert_eq!(cfg.validate(), Err(ConfigError::PriceBands));
        cfg.pricing.bands.clear();
        assert_eq!(cfg.validate(), Err(ConfigError::PriceBands));
    }

    #[test]
    fn rejects_bad_probability() {
        let mut cfg = GameConfig::default();
        cfg.bot.raid_chance = 1.5;
        assert_eq!(cfg.validate(), Err(ConfigError::Probability("bot.raid_chance")));
    }

    #[test]
    fn upgrade_cost_grows_with_level() {
        let costs = UpgradeCosts::default();
        assert_eq!(costs.miner.cost(0), Decimal::new(100, 0));
        assert_eq!(costs.miner.cost(2), Decimal::new(200, 0));
        assert_eq!(costs.defense.cost(1), Decimal::new(120, 0));
    }
}
