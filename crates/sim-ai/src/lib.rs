#![deny(warnings)]

//! Fallback policies for tribes that submitted nothing for the day.
//!
//! Humans fall back to the configured [`AbsenteePolicy`]; bots play a simple
//! seeded heuristic. Both are pure functions of their inputs and the injected
//! RNG, so a replayed seed yields the same decisions.

use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use sim_core::{
    floor_to, AbsenteePolicy, Decision, DecisionSource, FallbackKind, GameConfig, MarketState,
    PlayerId, PlayerState, RaidOrder, Resource, ResourceMap, UpgradeKind,
};
use tracing::trace;

/// What a fallback policy may look at besides the player itself.
#[derive(Clone, Copy, Debug)]
pub struct FallbackContext<'a> {
    pub cfg: &'a GameConfig,
    pub market: &'a MarketState,
    /// Every tribe in the game, in roster order.
    pub roster: &'a [PlayerId],
}

/// Spread up to `per_resource` effort on each resource in canonical order
/// without exceeding `budget`.
pub fn spread_effort(per_resource: u32, budget: u32) -> ResourceMap<u32> {
    let mut remaining = budget;
    ResourceMap::from_fn(|_| {
        let e = per_resource.min(remaining);
        remaining -= e;
        e
    })
}

/// Decision for an absent human under `policy`. Never random.
pub fn absentee_decision(policy: AbsenteePolicy, cfg: &GameConfig) -> Decision {
    match policy {
        AbsenteePolicy::Idle => Decision::idle(DecisionSource::Fallback(FallbackKind::Idle)),
        AbsenteePolicy::Standard => {
            let mut d = Decision::idle(DecisionSource::Fallback(FallbackKind::Standard));
            d.mining = spread_effort(cfg.standard_effort_per_resource, cfg.max_effort_points);
            d
        }
    }
}

/// Resource with the highest current price; earlier resources win ties.
fn best_priced(market: &MarketState) -> Resource {
    let mut best = Resource::ALL[0];
    for r in Resource::ALL {
        if market.prices[r] > market.prices[best] {
            best = r;
        }
    }
    best
}

/// Bot heuristic: standard mining with leftover effort on the best-priced
/// resource, sell a fixed share of stock, sometimes raid, sometimes upgrade.
pub fn bot_decision<R: Rng>(player: &PlayerState, ctx: &FallbackContext<'_>, rng: &mut R) -> Decision {
    let cfg = ctx.cfg;
    let mut d = Decision::idle(DecisionSource::Fallback(FallbackKind::Bot));

    d.mining = spread_effort(cfg.standard_effort_per_resource, cfg.max_effort_points);
    let leftover = cfg.max_effort_points.saturating_sub(d.mining.total());
    d.mining[best_priced(ctx.market)] += leftover;

    d.sell = ResourceMap::from_fn(|r| {
        floor_to(player.stockpile[r] * cfg.bot.sell_fraction, cfg.quantity_scale)
            .max(Decimal::ZERO)
            .min(cfg.max_sell_per_resource)
    });

    let targets: Vec<PlayerId> = ctx.roster.iter().copied().filter(|id| *id != player.id).collect();
    if !targets.is_empty() && rng.gen_bool(cfg.bot.raid_chance.clamp(0.0, 1.0)) {
        if let (Some(target), Some(resource)) = (targets.choose(rng), Resource::ALL.choose(rng)) {
            d.raid = Some(RaidOrder {
                target: *target,
                resource: *resource,
            });
        }
    }

    if rng.gen_bool(cfg.bot.upgrade_chance.clamp(0.0, 1.0)) {
        d.upgrade = UpgradeKind::ALL.choose(rng).copied();
    }

    trace!(player = %player.id, raid = ?d.raid, upgrade = ?d.upgrade, "bot decided");
    d
}

/// Fallback for any absent player: bots play, humans follow the policy.
pub fn fallback_decision<R: Rng>(player: &PlayerState, ctx: &FallbackContext<'_>, rng: &mut R) -> Decision {
    if player.is_bot() {
        bot_decision(player, ctx, rng)
    } else {
        absentee_decision(ctx.cfg.absentee_policy, ctx.cfg)
    }
}
