//! Raid arbiter.
//!
//! All raids of a day are judged against one pre-raid snapshot: fuel checks,
//! victim stock and loot never depend on the order groups are visited in.
//! Loot lands in the raider's protected stockpile; whatever cannot be split
//! evenly between simultaneous raiders is destroyed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{floor_to, GameConfig, NewsEvent, NewsKind, PlayerId, PlayerState, Resource};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// One attacker's raid order for the day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidRequest {
    pub attacker: PlayerId,
    pub target: PlayerId,
    pub resource: Resource,
}

/// Result of all valid raids on one `(target, resource)` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidGroup {
    pub target: PlayerId,
    pub resource: Resource,
    /// Attackers that paid fuel, in request order.
    pub attackers: Vec<PlayerId>,
    /// Victim stock of `resource` before the raid phase.
    pub pre_raid_stock: Decimal,
    pub demanded: Decimal,
    /// Taken from the victim: `per_raider * attackers + destroyed`.
    pub actual_loot: Decimal,
    pub per_raider: Decimal,
    /// Lost in the chaos.
    pub destroyed: Decimal,
}

/// Everything the raid phase decided; nothing is mutated until
/// [`apply_raid_outcome`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidOutcome {
    /// Fuel burned per valid attacker.
    pub fuel_spent: Vec<(PlayerId, Decimal)>,
    pub groups: Vec<RaidGroup>,
    pub news: Vec<NewsEvent>,
}

impl RaidOutcome {
    /// Loot moved into raiders' protected stockpiles.
    pub fn transfers(&self) -> impl Iterator<Item = (PlayerId, PlayerId, Resource, Decimal)> + '_ {
        self.groups.iter().flat_map(|g| {
            g.attackers
                .iter()
                .filter(move |_| g.per_raider > Decimal::ZERO)
                .map(move |a| (*a, g.target, g.resource, g.per_raider))
        })
    }

    pub fn total_destroyed(&self) -> Decimal {
        self.groups.iter().map(|g| g.destroyed).sum()
    }
}

fn shield_fraction(defense: u32, cfg: &GameConfig) -> Decimal {
    (Decimal::from(defense) * cfg.defense_shield_per_level)
        .min(cfg.max_defense_shield)
        .max(Decimal::ZERO)
}

fn name_of<'a>(index: &BTreeMap<PlayerId, &'a PlayerState>, id: PlayerId) -> &'a str {
    index.get(&id).copied().map_or("an unknown tribe", |p| p.name.as_str())
}

/// Judge every raid request against `players` as they stand before the raid
/// phase.
pub fn resolve_raids(
    requests: &[RaidRequest],
    players: &[PlayerState],
    cfg: &GameConfig,
    day: u32,
) -> RaidOutcome {
    let index: BTreeMap<PlayerId, &PlayerState> = players.iter().map(|p| (p.id, p)).collect();
    let mut out = RaidOutcome::default();
    let mut seen = BTreeSet::new();
    let mut own_fuel_spend: BTreeMap<PlayerId, Decimal> = BTreeMap::new();
    let mut groups: BTreeMap<(PlayerId, Resource), Vec<PlayerId>> = BTreeMap::new();

    for req in requests {
        let Some(attacker) = index.get(&req.attacker) else {
            debug!(attacker = %req.attacker, "raid from unknown player ignored");
            continue;
        };
        if !seen.insert(req.attacker) {
            debug!(attacker = %req.attacker, "second raid order ignored");
            continue;
        }
        if req.target == req.attacker {
            out.news.push(NewsEvent::new(
                day,
                Some(req.attacker),
                NewsKind::RaidFailed,
                format!("{}'s raiders refused to attack their own camp", attacker.name),
            ));
            continue;
        }
        if !index.contains_key(&req.target) {
            out.news.push(NewsEvent::new(
                day,
                Some(req.attacker),
                NewsKind::RaidFailed,
                format!("{}'s raiders found no tribe at {}", attacker.name, req.target),
            ));
            continue;
        }
        if attacker.stockpile[cfg.raid_fuel] < cfg.raid_cost {
            out.news.push(NewsEvent::new(
                day,
                Some(req.attacker),
                NewsKind::RaidNoFuel,
                format!(
                    "{} lacked the {} {} needed to raid {}",
                    attacker.name,
                    cfg.raid_cost,
                    cfg.raid_fuel,
                    name_of(&index, req.target)
                ),
            ));
            continue;
        }
        out.fuel_spent.push((req.attacker, cfg.raid_cost));
        *own_fuel_spend.entry(req.attacker).or_insert(Decimal::ZERO) += cfg.raid_cost;
        groups
            .entry((req.target, req.resource))
            .or_default()
            .push(req.attacker);
    }

    for ((target, resource), attackers) in groups {
        let Some(victim) = index.get(&target) else {
            continue;
        };
        let pre_raid_stock = victim.stockpile[resource];
        let burned = if resource == cfg.raid_fuel {
            own_fuel_spend.get(&target).copied().unwrap_or(Decimal::ZERO)
        } else {
            Decimal::ZERO
        };
        let available = (pre_raid_stock - burned).max(Decimal::ZERO);
        let lootable = floor_to(
            available * (Decimal::ONE - shield_fraction(victim.upgrades.defense, cfg)),
            cfg.quantity_scale,
        )
        .max(Decimal::ZERO);

        let n = Decimal::from(attackers.len() as u64);
        let demanded = cfg.raid_loot_per_attacker * n;
        let actual_loot = demanded.min(lootable);
        let per_raider = floor_to(actual_loot / n, cfg.quantity_scale);
        let destroyed = actual_loot - per_raider * n;

        for a in &attackers {
            if per_raider > Decimal::ZERO {
                out.news.push(NewsEvent::new(
                    day,
                    Some(*a),
                    NewsKind::RaidSucceeded,
                    format!("{} raided {} for {} {}", name_of(&index, *a), victim.name, per_raider, resource),
                ));
            } else {
                out.news.push(NewsEvent::new(
                    day,
                    Some(*a),
                    NewsKind::RaidFailed,
                    format!("{}'s raid on {} came back empty-handed", name_of(&index, *a), victim.name),
                ));
            }
        }
        if actual_loot > Decimal::ZERO {
            out.news.push(NewsEvent::new(
                day,
                Some(target),
                NewsKind::Raided,
                format!(
                    "{} lost {} {} to {} raider(s)",
                    victim.name,
                    actual_loot,
                    resource,
                    attackers.len()
                ),
            ));
        }
        if destroyed > Decimal::ZERO {
            out.news.push(NewsEvent::new(
                day,
                Some(target),
                NewsKind::LostInChaos,
                format!("{} {} was lost in the chaos at {}'s camp", destroyed, resource, victim.name),
            ));
        }
        debug!(%target, %resource, raiders = attackers.len(), %actual_loot, %per_raider, %destroyed, "raid group resolved");

        out.groups.push(RaidGroup {
            target,
            resource,
            attackers,
            pre_raid_stock,
            demanded,
            actual_loot,
            per_raider,
            destroyed,
        });
    }

    out
}

/// Apply fuel burn, victim losses and protected loot.
pub fn apply_raid_outcome(players: &mut [PlayerState], outcome: &RaidOutcome, cfg: &GameConfig) {
    let index: BTreeMap<PlayerId, usize> = players.iter().enumerate().map(|(i, p)| (p.id, i)).collect();
    for (attacker, cost) in &outcome.fuel_spent {
        if let Some(&i) = index.get(attacker) {
            let stock = &mut players[i].stockpile[cfg.raid_fuel];
            *stock = (*stock - *cost).max(Decimal::ZERO);
        }
    }
    for g in &outcome.groups {
        if let Some(&i) = index.get(&g.target) {
            let stock = &mut players[i].stockpile[g.resource];
            *stock = (*stock - g.actual_loot).max(Decimal::ZERO);
        }
        if g.per_raider > Decimal::ZERO {
            for a in &g.attackers {
                if let Some(&i) = index.get(a) {
                    players[i].protected_stockpile[g.resource] += g.per_raider;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use sim_core::PlayerKind;

    fn d(v: i64) -> Decimal {
        Decimal::new(v, 0)
    }

    fn roster(n: u32, cfg: &GameConfig) -> Vec<PlayerState> {
        (1..=n)
            .map(|i| {
                let mut p = PlayerState::new(PlayerId(i), format!("p{i}"), format!("T{i}"), PlayerKind::Human, cfg);
                p.stockpile[Resource::GreenPoison] = d(10);
                p
            })
            .collect()
    }

    fn req(a: u32, t: u32, r: Resource) -> RaidRequest {
        RaidRequest {
            attacker: PlayerId(a),
            target: PlayerId(t),
            resource: r,
        }
    }

    #[test]
    fn two_raiders_split_three_units_and_destroy_one() {
        let mut cfg = GameConfig::default();
        cfg.raid_loot_per_attacker = d(2);
        let mut players = roster(3, &cfg);
        players[2].stockpile[Resource::BlueGems] = d(3);

        let reqs = [req(1, 3, Resource::BlueGems), req(2, 3, Resource::BlueGems)];
        let out = resolve_raids(&reqs, &players, &cfg, 4);
        assert_eq!(out.groups.len(), 1);
        let g = &out.groups[0];
        assert_eq!(g.demanded, d(4));
        assert_eq!(g.actual_loot, d(3));
        assert_eq!(g.per_raider, d(1));
        assert_eq!(g.destroyed, d(1));
        assert!(out.news.iter().any(|n| n.kind == NewsKind::LostInChaos));

        apply_raid_outcome(&mut players, &out, &cfg);
        assert_eq!(players[2].stockpile[Resource::BlueGems], d(0));
        assert_eq!(players[0].protected_stockpile[Resource::BlueGems], d(1));
        assert_eq!(players[1].protected_stockpile[Resource::BlueGems], d(1));
        assert_eq!(players[0].stockpile[Resource::GreenPoison], d(8));
        assert_eq!(players[1].stockpile[Resource::GreenPoison], d(8));
        assert_eq!(players[2].stockpile[Resource::GreenPoison], d(10));
    }

    #[test]
    fn attacker_without_fuel_fails_without_blocking_others() {
        let cfg = GameConfig::default();
        let mut players = roster(3, &cfg);
        players[0].stockpile[Resource::GreenPoison] = d(1);
        players[2].stockpile[Resource::RedRubies] = d(20);

        let reqs = [req(1, 3, Resource::RedRubies), req(2, 3, Resource::RedRubies)];
        let out = resolve_raids(&reqs, &players, &cfg, 1);
        assert_eq!(out.fuel_spent, vec![(PlayerId(2), d(2))]);
        assert_eq!(out.groups[0].attackers, vec![PlayerId(2)]);
        assert_eq!(out.groups[0].per_raider, d(5));
        assert!(out
            .news
            .iter()
            .any(|n| n.kind == NewsKind::RaidNoFuel && n.player == Some(PlayerId(1))));

        apply_raid_outcome(&mut players, &out, &cfg);
        assert_eq!(players[0].stockpile[Resource::GreenPoison], d(1));
        assert_eq!(players[2].stockpile[Resource::RedRubies], d(15));
    }

    #[test]
    fn self_and_unknown_targets_are_failed_raids_without_cost() {
        let cfg = GameConfig::default();
        let players = roster(2, &cfg);
        let reqs = [req(1, 1, Resource::BlueGems), req(2, 99, Resource::BlueGems)];
        let out = resolve_raids(&reqs, &players, &cfg, 1);
        assert!(out.fuel_spent.is_empty());
        assert!(out.groups.is_empty());
        assert_eq!(out.news.iter().filter(|n| n.kind == NewsKind::RaidFailed).count(), 2);
    }

    #[test]
    fn empty_victim_costs_fuel_and_is_logged_as_failure() {
        let cfg = GameConfig::default();
        let mut players = roster(2, &cfg);
        let out = resolve_raids(&[req(1, 2, Resource::WhiteDiamonds)], &players, &cfg, 2);
        assert_eq!(out.groups[0].actual_loot, d(0));
        assert!(out.news.iter().any(|n| n.kind == NewsKind::RaidFailed));
        apply_raid_outcome(&mut players, &out, &cfg);
        assert_eq!(players[0].stockpile[Resource::GreenPoison], d(8));
    }

    #[test]
    fn fuel_checks_use_the_pre_raid_snapshot() {
        // p1 raids p2's fuel while p2 raids p3; p2's check must not see p1's raid.
        let cfg = GameConfig::default();
        let mut players = roster(3, &cfg);
        players[1].stockpile[Resource::GreenPoison] = d(3);
        players[2].stockpile[Resource::BlueGems] = d(10);
        let reqs = [req(1, 2, Resource::GreenPoison), req(2, 3, Resource::BlueGems)];
        let out = resolve_raids(&reqs, &players, &cfg, 1);
        assert_eq!(out.fuel_spent.len(), 2);
        // p2 had 3, burned 2 attacking, so only 1 is left to steal
        let g = out.groups.iter().find(|g| g.target == PlayerId(2)).unwrap();
        assert_eq!(g.actual_loot, d(1));

        apply_raid_outcome(&mut players, &out, &cfg);
        assert_eq!(players[1].stockpile[Resource::GreenPoison], d(0));
        assert_eq!(players[0].protected_stockpile[Resource::GreenPoison], d(1));
        assert_eq!(players[1].protected_stockpile[Resource::BlueGems], d(5));

        let reversed = [reqs[1], reqs[0]];
        let out2 = resolve_raids(&reversed, &players_before(&cfg), &cfg, 1);
        assert_eq!(out2.groups, out.groups);
    }

    fn players_before(cfg: &GameConfig) -> Vec<PlayerState> {
        let mut players = roster(3, cfg);
        players[1].stockpile[Resource::GreenPoison] = d(3);
        players[2].stockpile[Resource::BlueGems] = d(10);
        players
    }

    #[test]
    fn defense_shields_part_of_the_stock() {
        let cfg = GameConfig::default();
        let mut players = roster(4, &cfg);
        players[3].stockpile[Resource::RedRubies] = d(10);
        players[3].upgrades.defense = 3;
        let reqs = [
            req(1, 4, Resource::RedRubies),
            req(2, 4, Resource::RedRubies),
            req(3, 4, Resource::RedRubies),
        ];
        let out = resolve_raids(&reqs, &players, &cfg, 1);
        // 30% shielded: 7 lootable, 2 each, 1 destroyed
        let g = &out.groups[0];
        assert_eq!(g.actual_loot, d(7));
        assert_eq!(g.per_raider, d(2));
        assert_eq!(g.destroyed, d(1));
    }

    #[test]
    fn fractional_game_splits_to_one_decimal() {
        let mut cfg = GameConfig::default();
        cfg.quantity_scale = 1;
        cfg.raid_loot_per_attacker = d(2);
        let mut players = roster(4, &cfg);
        players[3].stockpile[Resource::BlueGems] = Decimal::new(31, 1);
        let reqs = [
            req(1, 4, Resource::BlueGems),
            req(2, 4, Resource::BlueGems),
            req(3, 4, Resource::BlueGems),
        ];
        let g = resolve_raids(&reqs, &players, &cfg, 1).groups.remove(0);
        assert_eq!(g.actual_loot, Decimal::new(31, 1));
        assert_eq!(g.per_raider, Decimal::new(10, 1));
        assert_eq!(g.destroyed, Decimal::new(1, 1));
    }

    proptest! {
        #[test]
        fn loot_accounting_balances(
            stock in 0i64..40,
            fuel in proptest::collection::vec(0i64..5, 5),
            loot in 0i64..8,
        ) {
            let mut cfg = GameConfig::default();
            cfg.raid_loot_per_attacker = d(loot);
            let mut players = roster(6, &cfg);
            players[5].stockpile[Resource::WhiteDiamonds] = d(stock);
            for (i, f) in fuel.iter().enumerate() {
                players[i].stockpile[Resource::GreenPoison] = d(*f);
            }
            let reqs: Vec<RaidRequest> = (1..=5).map(|a| req(a, 6, Resource::WhiteDiamonds)).collect();
            let out = resolve_raids(&reqs, &players, &cfg, 1);

            let valid = fuel.iter().filter(|f| d(**f) >= cfg.raid_cost).count();
            prop_assert_eq!(out.fuel_spent.len(), valid);
            for g in &out.groups {
                let n = Decimal::from(g.attackers.len() as u64);
                prop_assert_eq!(g.per_raider * n + g.destroyed, g.actual_loot);
                prop_assert!(g.actual_loot <= g.pre_raid_stock);
                prop_assert!(g.destroyed >= Decimal::ZERO);
            }

            let before = players.clone();
            apply_raid_outcome(&mut players, &out, &cfg);
            for (p, b) in players.iter().zip(&before) {
                for r in Resource::ALL {
                    prop_assert!(p.stockpile[r] >= Decimal::ZERO);
                }
                let spent = out.fuel_spent.iter().filter(|(a, _)| *a == p.id).count();
                if p.id != PlayerId(6) {
                    prop_assert_eq!(
                        b.stockpile[Resource::GreenPoison] - p.stockpile[Resource::GreenPoison],
                        cfg.raid_cost * Decimal::from(spent as u64)
                    );
                }
            }
        }
    }
}
