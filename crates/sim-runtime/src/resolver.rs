//! Day resolver.
//!
//! Phases run in a fixed order over a working copy of the roster:
//! merge protected loot, mining, raiding, dumping, pricing, selling,
//! upgrades, then market roll-over and the clock. Inputs are never mutated;
//! the caller commits the returned [`DayOutcome`] as a whole or not at all.

use crate::normalize::normalize_decision;
use crate::raid::{apply_raid_outcome, resolve_raids, RaidOutcome, RaidRequest};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_ai::{fallback_decision, FallbackContext};
use sim_core::{
    check_invariants, clamp_quantity, floor_to, Decision, DumpOrder, GameClock, GameConfig,
    MarketRecord, MarketState, NewsEvent, NewsKind, PlayerId, PlayerState, RawDecision, Resource,
    ResourceMap, Standing, StateError, UpgradeKind,
};
use sim_econ::{apply_market_shock, colony_needs_for, next_prices, ShockEvent};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Everything one resolution reads. Borrowed, never mutated.
#[derive(Clone, Copy, Debug)]
pub struct DayInput<'a> {
    pub cfg: &'a GameConfig,
    pub clock: &'a GameClock,
    pub market: &'a MarketState,
    /// Roster order; ties in standings keep this order.
    pub players: &'a [PlayerState],
    /// Frozen submissions for the day. Entries for unknown ids are ignored.
    pub decisions: &'a BTreeMap<PlayerId, RawDecision>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpgradeResult {
    pub player: PlayerId,
    pub kind: UpgradeKind,
    pub cost: Decimal,
    /// Level after purchase; `None` if the tribe could not pay.
    pub new_level: Option<u32>,
}

/// Per-phase figures of one resolved day.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DayReport {
    pub day: u32,
    pub mined: BTreeMap<PlayerId, ResourceMap<Decimal>>,
    pub total_mined: ResourceMap<Decimal>,
    pub raids: RaidOutcome,
    /// Quantities actually dumped, after clamping to stock.
    pub dumped: BTreeMap<PlayerId, DumpOrder>,
    /// Quantities actually sold, after clamping to stock.
    pub sold: BTreeMap<PlayerId, ResourceMap<Decimal>>,
    /// Exactly the quantities fed to the market model.
    pub total_sold: ResourceMap<Decimal>,
    /// Prices the day's sales cleared at.
    pub sale_prices: ResourceMap<Decimal>,
    pub upgrades: Vec<UpgradeResult>,
    pub absentees: Vec<PlayerId>,
    pub rejected: Vec<(PlayerId, String)>,
    pub shock: Option<ShockEvent>,
}

/// Next state plus what happened. Nothing here is committed yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DayOutcome {
    pub day: u32,
    pub next_market: MarketState,
    pub next_players: Vec<PlayerState>,
    pub next_clock: GameClock,
    /// Canonical decision each tribe played, in roster order.
    pub decisions: Vec<(PlayerId, Decision)>,
    pub news: Vec<NewsEvent>,
    pub report: DayReport,
    pub game_ended: bool,
    /// Final leaderboard, present only when this day ended the game.
    pub standings: Option<Vec<Standing>>,
}

/// Refuse resolving anything but the open day of a running game.
pub fn check_day(clock: &GameClock, day: u32) -> Result<(), StateError> {
    let current = clock.current_day;
    match day.cmp(&current) {
        Ordering::Less => Err(StateError::DayAlreadyResolved { day, current }),
        _ if clock.ended => Err(StateError::GameEnded {
            last_day: clock.duration_days,
        }),
        Ordering::Greater => Err(StateError::DayNotOpen { day, current }),
        Ordering::Equal => Ok(()),
    }
}

fn describe(amounts: &ResourceMap<Decimal>) -> String {
    let parts: Vec<String> = amounts
        .iter()
        .filter(|(_, q)| **q > Decimal::ZERO)
        .map(|(r, q)| format!("{q} {r}"))
        .collect();
    parts.join(", ")
}

fn merge_protected(players: &mut [PlayerState]) {
    for p in players {
        for r in Resource::ALL {
            p.stockpile[r] += p.protected_stockpile[r];
        }
        p.protected_stockpile = ResourceMap::default();
    }
}

/// Yield of `effort` points for a tribe at miner level `level`.
pub fn mining_yield(effort: &ResourceMap<u32>, level: u32, cfg: &GameConfig) -> ResourceMap<Decimal> {
    let bonus = Decimal::ONE + Decimal::from(level) * cfg.mining_bonus_per_level;
    ResourceMap::from_fn(|r| {
        floor_to(
            Decimal::from(effort[r]) * cfg.per_unit_yield[r] * bonus,
            cfg.quantity_scale,
        )
        .max(Decimal::ZERO)
    })
}

/// Resolve `day`. Pure apart from `rng`, which must be the day's stream.
pub fn resolve_day<R: Rng>(input: &DayInput<'_>, day: u32, rng: &mut R) -> Result<DayOutcome, StateError> {
    let DayInput {
        cfg,
        clock,
        market,
        players,
        decisions,
    } = *input;
    check_day(clock, day)?;

    let mut news = Vec::new();
    let mut report = DayReport {
        day,
        ..DayReport::default()
    };

    // canonical decisions, roster order
    let roster: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
    let ctx = FallbackContext {
        cfg,
        market,
        roster: &roster,
    };
    let mut canonical: Vec<(PlayerId, Decision)> = Vec::with_capacity(players.len());
    for p in players {
        let raw = decisions.get(&p.id);
        let decision = match normalize_decision(raw, p, &ctx, rng) {
            Ok(d) => d,
            Err(e) => {
                warn!(day, player = %p.id, error = %e, "submitted orders void at resolution");
                news.push(NewsEvent::new(
                    day,
                    Some(p.id),
                    NewsKind::DecisionRejected,
                    format!("{}'s orders were void ({e}); the tribe fell back to standing orders", p.name),
                ));
                report.rejected.push((p.id, e.to_string()));
                fallback_decision(p, &ctx, rng)
            }
        };
        if raw.is_none() && !p.is_bot() {
            report.absentees.push(p.id);
            news.push(NewsEvent::new(
                day,
                Some(p.id),
                NewsKind::Absent,
                format!("{} sent no orders and followed standing orders", p.name),
            ));
        }
        canonical.push((p.id, decision));
    }

    let mut next = players.to_vec();
    merge_protected(&mut next);

    // mining
    for (p, (_, d)) in next.iter_mut().zip(&canonical) {
        let mined = mining_yield(&d.mining, p.upgrades.miner, cfg);
        for r in Resource::ALL {
            p.stockpile[r] += mined[r];
            report.total_mined[r] += mined[r];
        }
        if mined.total() > Decimal::ZERO {
            news.push(NewsEvent::new(
                day,
                Some(p.id),
                NewsKind::Mined,
                format!("{} mined {}", p.name, describe(&mined)),
            ));
        }
        report.mined.insert(p.id, mined);
    }

    // raiding
    let requests: Vec<RaidRequest> = canonical
        .iter()
        .filter_map(|(id, d)| {
            d.raid.map(|o| RaidRequest {
                attacker: *id,
                target: o.target,
                resource: o.resource,
            })
        })
        .collect();
    let raids = resolve_raids(&requests, &next, cfg, day);
    apply_raid_outcome(&mut next, &raids, cfg);
    news.extend(raids.news.iter().cloned());
    report.raids = raids;

    // dumping, outside the market tally
    for (p, (_, d)) in next.iter_mut().zip(&canonical) {
        let Some(order) = d.dump else {
            continue;
        };
        let quantity = clamp_quantity(order.quantity.min(cfg.max_dump_per_day), p.stockpile[order.resource]);
        if quantity <= Decimal::ZERO {
            continue;
        }
        p.stockpile[order.resource] -= quantity;
        let proceeds = quantity * cfg.dump_price;
        p.credits += proceeds;
        news.push(NewsEvent::new(
            day,
            Some(p.id),
            NewsKind::Dumped,
            format!("{} dumped {} {} for {} credits", p.name, quantity, order.resource, proceeds),
        ));
        report.dumped.insert(
            p.id,
            DumpOrder {
                resource: order.resource,
                quantity,
            },
        );
    }

    // pricing
    let sales: Vec<ResourceMap<Decimal>> = next
        .iter()
        .zip(&canonical)
        .map(|(p, (_, d))| ResourceMap::from_fn(|r| clamp_quantity(d.sell[r], p.stockpile[r])))
        .collect();
    for s in &sales {
        for r in Resource::ALL {
            report.total_sold[r] += s[r];
        }
    }
    let sale_prices = next_prices(&market.prices, &report.total_sold, &market.colony_needs, &cfg.pricing);
    report.sale_prices = sale_prices;

    // selling at the new prices
    for ((p, (_, d)), sold) in next.iter_mut().zip(&canonical).zip(&sales) {
        if sold.total() <= Decimal::ZERO {
            continue;
        }
        let mut revenue = Decimal::ZERO;
        for r in Resource::ALL {
            p.stockpile[r] -= sold[r];
            revenue += sold[r] * sale_prices[r];
        }
        p.credits += revenue;
        let trimmed = Resource::ALL.iter().any(|r| sold[*r] < d.sell[*r]);
        news.push(NewsEvent::new(
            day,
            Some(p.id),
            NewsKind::Sold,
            format!(
                "{} sold {} for {} credits{}",
                p.name,
                describe(sold),
                revenue,
                if trimmed { " (orders trimmed to stock)" } else { "" }
            ),
        ));
        report.sold.insert(p.id, *sold);
    }

    // upgrades
    for (p, (_, d)) in next.iter_mut().zip(&canonical) {
        let Some(kind) = d.upgrade else {
            continue;
        };
        let level = p.upgrades.level(kind);
        let cost = cfg.upgrades.curve(kind).cost(level);
        if p.credits >= cost {
            p.credits -= cost;
            let new_level = level.saturating_add(1);
            *p.upgrades.level_mut(kind) = new_level;
            news.push(NewsEvent::new(
                day,
                Some(p.id),
                NewsKind::Upgraded,
                format!("{} bought {:?} level {} for {} credits", p.name, kind, new_level, cost),
            ));
            report.upgrades.push(UpgradeResult {
                player: p.id,
                kind,
                cost,
                new_level: Some(new_level),
            });
        } else {
            news.push(NewsEvent::new(
                day,
                Some(p.id),
                NewsKind::UpgradeFailed,
                format!("{} could not afford {:?} ({} credits needed)", p.name, kind, cost),
            ));
            report.upgrades.push(UpgradeResult {
                player: p.id,
                kind,
                cost,
                new_level: None,
            });
        }
    }

    // market roll-over
    let mut next_market = market.clone();
    next_market.last_prices = market.prices;
    next_market.prices = sale_prices;
    report.shock = apply_market_shock(&mut next_market.prices, &cfg.market_shock, &cfg.pricing, rng);
    if let Some(shock) = report.shock {
        news.push(NewsEvent::new(
            day,
            None,
            NewsKind::MarketShock,
            format!(
                "Colony rumors sent {} {} from {} to {}",
                shock.resource,
                if shock.rose() { "up" } else { "down" },
                shock.from,
                shock.to
            ),
        ));
    }
    next_market.record(
        MarketRecord {
            day,
            prices: sale_prices,
            colony_needs: market.colony_needs,
            sold: report.total_sold,
        },
        cfg.history_len,
    );
    next_market.colony_needs = colony_needs_for(&cfg.colony_needs, day.saturating_add(1), rng);

    let mut next_clock = *clock;
    let game_ended = next_clock.advance();
    let final_standings = game_ended.then(|| sim_core::standings(&next));
    if let Some(top) = final_standings.as_ref().and_then(|s| s.first()) {
        news.push(NewsEvent::new(
            day,
            None,
            NewsKind::GameEnded,
            format!(
                "The trading season is over; {} of {} leads with {} credits",
                top.name, top.tribe_name, top.credits
            ),
        ));
    }

    let violations = check_invariants(&next, &next_market, cfg);
    if let Some(v) = violations.first() {
        warn!(day, violations = violations.len(), "resolution aborted");
        return Err(StateError::InvariantViolated(v.message.clone()));
    }

    debug!(day, mined = %report.total_mined.total(), sold = %report.total_sold.total(), "phases complete");
    info!(
        day,
        players = next.len(),
        raids = report.raids.groups.len(),
        ended = game_ended,
        "day resolved"
    );

    Ok(DayOutcome {
        day,
        next_market,
        next_players: next,
        next_clock,
        decisions: canonical,
        news,
        report,
        game_ended,
        standings: final_standings,
    })
}
