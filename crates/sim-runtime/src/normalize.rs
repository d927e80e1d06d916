//! Decision normalizer: raw submission (or its absence) to canonical decision.

use rand::Rng;
use rust_decimal::Decimal;
use sim_ai::{fallback_decision, FallbackContext};
use sim_core::{
    floor_to, Decision, DecisionSource, DumpOrder, GameConfig, PlayerState, RawDecision, Resource,
    ResourceMap, ValidationError,
};

/// Validate a submitted decision against the caps and quantize its amounts.
///
/// Stock is deliberately not consulted: it may change before resolution, so
/// sell and dump amounts are clamped to stock only when the day resolves.
pub fn validate_decision(
    raw: &RawDecision,
    player: &PlayerState,
    cfg: &GameConfig,
) -> Result<Decision, ValidationError> {
    let total = raw.mining.total();
    if total > cfg.max_effort_points {
        return Err(ValidationError::EffortCapExceeded {
            total,
            cap: cfg.max_effort_points,
        });
    }

    let mut sell = ResourceMap::<Decimal>::default();
    for r in Resource::ALL {
        let requested = raw.sell[r];
        if requested < Decimal::ZERO {
            return Err(ValidationError::NegativeQuantity(r));
        }
        if requested > cfg.max_sell_per_resource {
            return Err(ValidationError::SellCapExceeded {
                resource: r,
                requested,
                cap: cfg.max_sell_per_resource,
            });
        }
        sell[r] = floor_to(requested, cfg.quantity_scale);
    }

    let dump = match raw.dump {
        Some(order) => {
            if order.quantity < Decimal::ZERO {
                return Err(ValidationError::NegativeQuantity(order.resource));
            }
            if order.quantity > cfg.max_dump_per_day {
                return Err(ValidationError::DumpCapExceeded {
                    resource: order.resource,
                    requested: order.quantity,
                    cap: cfg.max_dump_per_day,
                });
            }
            Some(DumpOrder {
                resource: order.resource,
                quantity: floor_to(order.quantity, cfg.quantity_scale),
            })
        }
        None => None,
    };

    if let Some(raid) = raw.raid {
        if raid.target == player.id {
            return Err(ValidationError::SelfRaid);
        }
    }

    Ok(Decision {
        mining: raw.mining,
        sell,
        raid: raw.raid,
        upgrade: raw.upgrade,
        dump,
        source: DecisionSource::Submitted,
    })
}

/// Canonical decision for `player`.
///
/// A submission is validated; no submission yields the fallback policy's
/// decision, which is fixed for humans and seeded for bots.
pub fn normalize_decision<R: Rng>(
    raw: Option<&RawDecision>,
    player: &PlayerState,
    ctx: &FallbackContext<'_>,
    rng: &mut R,
) -> Result<Decision, ValidationError> {
    match raw {
        Some(raw) => validate_decision(raw, player, ctx.cfg),
        None => Ok(fallback_decision(player, ctx, rng)),
    }
}
