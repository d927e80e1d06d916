//! Property tests over whole resolved days.
//!
//! Random rosters, stocks and orders go through the full pipeline; the
//! accounting and bounds that must hold after every day are checked here.

use proptest::prelude::*;
use rust_decimal::Decimal;
use sim_core::{
    DumpOrder, GameClock, GameConfig, MarketState, PlayerId, PlayerKind, PlayerState, RaidOrder,
    RawDecision, Resource, ResourceMap, StateError, UpgradeKind,
};
use sim_econ::day_rng;
use sim_runtime::{resolve_day, DayInput, GameSession};
use std::collections::BTreeMap;

fn resource() -> impl Strategy<Value = Resource> {
    prop::sample::select(Resource::ALL.to_vec())
}

fn stock() -> impl Strategy<Value = ResourceMap<Decimal>> {
    prop::array::uniform4(0i64..60).prop_map(|[a, b, c, d]| ResourceMap {
        bluegems: Decimal::from(a),
        redrubies: Decimal::from(b),
        whitediamonds: Decimal::from(c),
        greenpoison: Decimal::from(d),
    })
}

fn raw_decision(players: u32) -> impl Strategy<Value = RawDecision> {
    (
        prop::array::uniform4(0u32..4),
        prop::array::uniform4(0i64..=50),
        prop::option::of((1..=players, resource())),
        prop::option::of(prop::sample::select(UpgradeKind::ALL.to_vec())),
        prop::option::of((resource(), 0i64..=10)),
    )
        .prop_map(|(effort, sell, raid, upgrade, dump)| RawDecision {
            mining: ResourceMap {
                bluegems: effort[0],
                redrubies: effort[1],
                whitediamonds: effort[2],
                greenpoison: effort[3],
            },
            sell: ResourceMap {
                bluegems: Decimal::from(sell[0]),
                redrubies: Decimal::from(sell[1]),
                whitediamonds: Decimal::from(sell[2]),
                greenpoison: Decimal::from(sell[3]),
            },
            raid: raid.map(|(t, resource)| RaidOrder {
                target: PlayerId(t),
                resource,
            }),
            upgrade,
            dump: dump.map(|(resource, q)| DumpOrder {
                resource,
                quantity: Decimal::from(q),
            }),
        })
}

#[derive(Debug, Clone)]
struct Day {
    players: Vec<PlayerState>,
    decisions: BTreeMap<PlayerId, RawDecision>,
}

fn day(max_players: u32) -> impl Strategy<Value = Day> {
    (2..=max_players).prop_flat_map(|n| {
        (
            prop::collection::vec((stock(), 0i64..2000, any::<bool>(), 0u32..4), n as usize),
            prop::collection::vec(prop::option::of(raw_decision(n)), n as usize),
        )
            .prop_map(move |(states, raws)| {
                let cfg = GameConfig::default();
                let players = states
                    .into_iter()
                    .enumerate()
                    .map(|(i, (stock, credits, bot, defense))| {
                        let id = PlayerId(i as u32 + 1);
                        let kind = if bot { PlayerKind::Bot } else { PlayerKind::Human };
                        let mut p = PlayerState::new(id, format!("p{}", id.0), "T", kind, &cfg);
                        p.stockpile = stock;
                        p.credits = Decimal::from(credits);
                        p.upgrades.defense = defense;
                        p
                    })
                    .collect();
                let decisions = raws
                    .into_iter()
                    .enumerate()
                    .filter_map(|(i, r)| r.map(|r| (PlayerId(i as u32 + 1), r)))
                    .collect();
                Day { players, decisions }
            })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn resolved_day_keeps_books_balanced(d in day(6), seed in any::<u64>()) {
        let cfg = GameConfig::default();
        let clock = GameClock::new(cfg.duration_days);
        let market = MarketState::opening(&cfg, ResourceMap::splat(Decimal::from(15)));
        let input = DayInput {
            cfg: &cfg,
            clock: &clock,
            market: &market,
            players: &d.players,
            decisions: &d.decisions,
        };
        let out = resolve_day(&input, 1, &mut day_rng(seed, 1)).unwrap();

        // stocks never go negative
        for p in &out.next_players {
            for r in Resource::ALL {
                prop_assert!(p.stockpile[r] >= Decimal::ZERO);
                prop_assert!(p.protected_stockpile[r] >= Decimal::ZERO);
            }
        }

        // prices stay in bounds
        for (_, price) in out.next_market.prices.iter() {
            prop_assert!(*price >= cfg.pricing.price_min && *price <= cfg.pricing.price_max);
        }

        // the market saw exactly what was sold
        for r in Resource::ALL {
            let summed: Decimal = out.report.sold.values().map(|s| s[r]).sum();
            prop_assert_eq!(summed, out.report.total_sold[r]);
        }

        // raid accounting
        for g in &out.report.raids.groups {
            let n = Decimal::from(g.attackers.len() as u64);
            prop_assert_eq!(g.per_raider * n + g.destroyed, g.actual_loot);
            prop_assert!(g.actual_loot <= g.pre_raid_stock);
        }
        let mut charged = BTreeMap::new();
        for (attacker, cost) in &out.report.raids.fuel_spent {
            prop_assert_eq!(*cost, cfg.raid_cost);
            prop_assert!(charged.insert(*attacker, ()).is_none(), "fuel charged twice");
        }

        // conservation per resource: stock before + mined = stock after + sold + dumped + destroyed
        for r in Resource::ALL {
            let before: Decimal = d.players.iter().map(|p| p.holdings(r)).sum();
            let after: Decimal = out.next_players.iter().map(|p| p.holdings(r)).sum();
            let dumped: Decimal = out
                .report
                .dumped
                .values()
                .filter(|o| o.resource == r)
                .map(|o| o.quantity)
                .sum();
            let destroyed: Decimal = out
                .report
                .raids
                .groups
                .iter()
                .filter(|g| g.resource == r)
                .map(|g| g.destroyed)
                .sum();
            let fuel: Decimal = if r == cfg.raid_fuel {
                out.report.raids.fuel_spent.iter().map(|(_, c)| *c).sum()
            } else {
                Decimal::ZERO
            };
            prop_assert_eq!(
                before + out.report.total_mined[r],
                after + out.report.total_sold[r] + dumped + destroyed + fuel
            );
        }

        prop_assert_eq!(out.next_clock.current_day, clock.current_day + 1);
    }

    #[test]
    fn days_advance_one_at_a_time(seed in any::<u64>(), days in 1u32..8) {
        let mut cfg = GameConfig::default();
        cfg.duration_days = 5;
        let mut s = GameSession::new(cfg, seed).unwrap();
        s.login("ann", "A").unwrap();
        s.fill_with_bots();
        for _ in 0..days {
            let before = s.clone();
            let day = s.current_day();
            match s.process_day() {
                Ok(out) => {
                    prop_assert_eq!(out.day, day);
                    prop_assert_eq!(s.current_day(), day + 1);
                    prop_assert_eq!(out.game_ended, day == 5);
                    let again = s.resolve_day(day);
                    let is_already_resolved = matches!(again, Err(StateError::DayAlreadyResolved { .. }));
                    prop_assert!(is_already_resolved);
                }
                Err(e) => {
                    prop_assert_eq!(e, StateError::GameEnded { last_day: 5 });
                    prop_assert_eq!(&s, &before);
                }
            }
        }
    }
}
