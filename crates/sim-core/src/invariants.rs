//! Post-resolution sanity checks. A violation here is an engine bug.

use crate::config::GameConfig;
use crate::market::MarketState;
use crate::player::PlayerState;
use rust_decimal::Decimal;
use std::fmt;

/// One broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    pub message: String,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Check stock non-negativity and price bounds; empty when all hold.
pub fn check_invariants(
    players: &[PlayerState],
    market: &MarketState,
    cfg: &GameConfig,
) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    for p in players {
        for (r, v) in p.stockpile.iter() {
            if *v < Decimal::ZERO {
                violations.push(InvariantViolation {
                    message: format!("player {} has negative {} stock {}", p.id, r, v),
                });
            }
        }
        for (r, v) in p.protected_stockpile.iter() {
            if *v < Decimal::ZERO {
                violations.push(InvariantViolation {
                    message: format!("player {} has negative protected {} {}", p.id, r, v),
                });
            }
        }
    }
    let (lo, hi) = (cfg.pricing.price_min, cfg.pricing.price_max);
    for (r, price) in market.prices.iter() {
        if *price < lo || *price > hi {
            violations.push(InvariantViolation {
                message: format!("{r} price {price} outside [{lo}, {hi}]"),
            });
        }
    }
    if !violations.is_empty() {
        tracing::warn!(count = violations.len(), "invariant violations detected");
    }
    violations
}
