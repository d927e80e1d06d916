#![deny(warnings)]

//! Market model: price formation and colony demand for Space Tribes.
//!
//! This crate provides deterministic utilities for:
//! - Next-day prices from aggregate sales vs colony demand (step bands)
//! - Colony demand per day from a fixed rotation or a seeded draw
//! - Optional random market shocks drawn from an injected RNG

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{round_to, DemandSchedule, MarketShock, PriceBand, PricingConfig, Resource, ResourceMap};
use tracing::debug;

/// Deterministic RNG for one game day.
///
/// Every random draw of a day (bot choices, demand, shocks) comes from this
/// stream, so replaying a seed replays the game.
pub fn day_rng(seed: u64, day: u32) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed ^ u64::from(day).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Sold/demand ratio. `None` means demand is zero and the ratio saturates.
pub fn supply_ratio(sold: Decimal, demand: Decimal) -> Option<Decimal> {
    if demand <= Decimal::ZERO {
        return None;
    }
    sold.checked_div(demand)
}

/// Price multiplier for a ratio.
///
/// Bands are scanned from the highest `min_ratio` down; a saturated ratio
/// takes the first (steepest drop) band. Without bands the price holds.
pub fn price_multiplier(ratio: Option<Decimal>, bands: &[PriceBand]) -> Decimal {
    let Some(ratio) = ratio else {
        return bands.first().map_or(Decimal::ONE, |b| b.multiplier);
    };
    bands
        .iter()
        .find(|b| ratio >= b.min_ratio)
        .or_else(|| bands.last())
        .map_or(Decimal::ONE, |b| b.multiplier)
}

/// Clamp a price into the configured bounds. The ceiling wins if the bounds
/// are inverted.
pub fn clamp_price(price: Decimal, pricing: &PricingConfig) -> Decimal {
    price.max(pricing.price_min).min(pricing.price_max)
}

/// Next price of one resource: current price times the band multiplier,
/// rounded to `price_scale`, then clamped.
pub fn next_price(current: Decimal, sold: Decimal, demand: Decimal, pricing: &PricingConfig) -> Decimal {
    let mult = price_multiplier(supply_ratio(sold, demand), &pricing.bands);
    clamp_price(round_to(current * mult, pricing.price_scale), pricing)
}

/// Next-day prices for every resource. Pure and side-effect free.
///
/// Example:
/// let next = next_prices(&ResourceMap::splat(10.into()), &ResourceMap::default(),
///                        &ResourceMap::splat(15.into()), &PricingConfig::default());
/// assert_eq!(next[Resource::BlueGems], Decimal::from(16));
pub fn next_prices(
    current: &ResourceMap<Decimal>,
    total_sold: &ResourceMap<Decimal>,
    demand: &ResourceMap<Decimal>,
    pricing: &PricingConfig,
) -> ResourceMap<Decimal> {
    ResourceMap::from_fn(|r| {
        let p = next_price(current[r], total_sold[r], demand[r], pricing);
        debug!(resource = %r, sold = %total_sold[r], demand = %demand[r], from = %current[r], to = %p, "repriced");
        p
    })
}

/// Colony demand for `day` (1-based).
///
/// Cyclic schedules never touch the RNG; seeded schedules draw one whole
/// number per resource in canonical order.
pub fn colony_needs_for<R: Rng>(schedule: &DemandSchedule, day: u32, rng: &mut R) -> ResourceMap<Decimal> {
    match schedule {
        DemandSchedule::Cyclic { cycle } => {
            if cycle.is_empty() {
                return ResourceMap::default();
            }
            let idx = (day.saturating_sub(1) as usize) % cycle.len();
            cycle[idx]
        }
        DemandSchedule::Seeded { min, max } => {
            let (lo, hi) = if min <= max { (*min, *max) } else { (*max, *min) };
            ResourceMap::from_fn(|_| Decimal::from(rng.gen_range(lo..=hi)))
        }
    }
}

/// A random price jolt that happened after pricing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShockEvent {
    pub resource: Resource,
    pub from: Decimal,
    pub to: Decimal,
}

impl ShockEvent {
    pub fn rose(&self) -> bool {
        self.to > self.from
    }
}

/// Maybe move one resource's price by `±magnitude`, clamped to bounds.
pub fn apply_market_shock<R: Rng>(
    prices: &mut ResourceMap<Decimal>,
    shock: &MarketShock,
    pricing: &PricingConfig,
    rng: &mut R,
) -> Option<ShockEvent> {
    if !(shock.chance.is_finite() && shock.chance > 0.0) {
        return None;
    }
    if !rng.gen_bool(shock.chance.min(1.0)) {
        return None;
    }
    let resource = Resource::ALL[rng.gen_range(0..Resource::ALL.len())];
    let delta = if rng.gen_bool(0.5) {
        shock.magnitude
    } else {
        -shock.magnitude
    };
    let from = prices[resource];
    let to = clamp_price(from + delta, pricing);
    prices[resource] = to;
    Some(ShockEvent { resource, from, to })
}
