//! `GameSession`: the aggregate an outer caller owns for one game.
//!
//! Holds roster, market, clock, the open day's pending decisions and the news
//! window. Submissions are validated on arrival; the last valid submission of
//! a player for the open day replaces any earlier one. Resolution computes on
//! copies and commits everything at once.

use crate::normalize::validate_decision;
use crate::resolver::{self, DayInput, DayOutcome};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sim_core::{
    check_invariants, standings, validate_roster, ConfigError, Decision, GameClock, GameConfig, MarketState,
    NewsEvent, NewsLog, PlayerId, PlayerKind, PlayerState, RawDecision, ResourceMap, Standing,
    StateError, ValidationError,
};
use sim_econ::{colony_needs_for, day_rng};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A restored session that does not hold together.
#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid roster: {0}")]
    Roster(#[from] ValidationError),
    #[error("clock runs {clock} days but config says {config}")]
    DurationMismatch { clock: u32, config: u32 },
    #[error("broken state: {0}")]
    Inconsistent(String),
}

/// What one tribe sees: public market data plus its own holdings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub day: u32,
    pub days_remaining: u32,
    pub game_ended: bool,
    pub prices: ResourceMap<Decimal>,
    pub last_prices: ResourceMap<Decimal>,
    pub colony_needs: ResourceMap<Decimal>,
    pub player: PlayerState,
    pub pending: Option<RawDecision>,
    pub leaderboard: Vec<Standing>,
    pub news: Vec<NewsEvent>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    config: GameConfig,
    seed: u64,
    clock: GameClock,
    market: MarketState,
    players: Vec<PlayerState>,
    #[serde(default)]
    pending: BTreeMap<PlayerId, RawDecision>,
    news: NewsLog,
    #[serde(default)]
    standings: Option<Vec<Standing>>,
    /// Next id to hand out; ids are never reused within a game.
    #[serde(default)]
    next_id: u32,
}

impl GameSession {
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::fresh(config, seed))
    }

    fn fresh(config: GameConfig, seed: u64) -> Self {
        // day 1 demand comes from the pre-game stream
        let needs = colony_needs_for(&config.colony_needs, 1, &mut day_rng(seed, 0));
        Self {
            clock: GameClock::new(config.duration_days),
            market: MarketState::opening(&config, needs),
            players: Vec::new(),
            pending: BTreeMap::new(),
            news: NewsLog::new(config.news_len),
            standings: None,
            next_id: 1,
            config,
            seed,
        }
    }

    /// Check a deserialized session before use.
    pub fn verify(&self) -> Result<(), SessionError> {
        self.config.validate()?;
        validate_roster(&self.players)?;
        if self.clock.duration_days != self.config.duration_days {
            return Err(SessionError::DurationMismatch {
                clock: self.clock.duration_days,
                config: self.config.duration_days,
            });
        }
        for (id, raw) in &self.pending {
            if self.player(*id).is_none() {
                return Err(ValidationError::UnknownPlayer(*id).into());
            }
            if let Some(raid) = raw.raid {
                if self.player(raid.target).is_none() {
                    return Err(ValidationError::UnknownPlayer(raid.target).into());
                }
            }
        }
        if let Some(v) = check_invariants(&self.players, &self.market, &self.config)
            .into_iter()
            .next()
        {
            return Err(SessionError::Inconsistent(v.message));
        }
        Ok(())
    }

    /// Back to day 1 with an empty roster, same config and seed.
    pub fn reset(&mut self) {
        info!(seed = self.seed, "session reset");
        *self = Self::fresh(self.config.clone(), self.seed);
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn current_day(&self) -> u32 {
        self.clock.current_day
    }

    pub fn is_ended(&self) -> bool {
        self.clock.ended
    }

    pub fn market(&self) -> &MarketState {
        &self.market
    }

    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn find_player(&self, name: &str) -> Option<&PlayerState> {
        let name = name.trim();
        self.players.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn news(&self) -> &NewsLog {
        &self.news
    }

    /// Final standings once the game has ended.
    pub fn final_standings(&self) -> Option<&[Standing]> {
        self.standings.as_deref()
    }

    fn allocate_id(&mut self) -> PlayerId {
        // snapshots written before the counter existed start from the roster
        let floor = self.players.iter().map(|p| p.id.0).max().unwrap_or(0) + 1;
        let id = self.next_id.max(floor);
        self.next_id = id + 1;
        PlayerId(id)
    }

    /// Add a tribe. Bots only fill up to `roster_size`; humans may always join.
    pub fn register_player(
        &mut self,
        name: &str,
        tribe_name: &str,
        kind: PlayerKind,
    ) -> Result<PlayerId, ValidationError> {
        let (name, tribe_name) = (name.trim(), tribe_name.trim());
        if name.is_empty() || tribe_name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.find_player(name).is_some() {
            return Err(ValidationError::NameTaken(name.to_string()));
        }
        if kind == PlayerKind::Bot && self.players.len() >= self.config.roster_size {
            return Err(ValidationError::RosterFull(self.config.roster_size));
        }
        let id = self.allocate_id();
        self.players
            .push(PlayerState::new(id, name, tribe_name, kind, &self.config));
        info!(player = %id, name, ?kind, "tribe joined");
        Ok(id)
    }

    /// Log in a human by name, creating the tribe on first login.
    pub fn login(&mut self, name: &str, tribe_name: &str) -> Result<PlayerId, ValidationError> {
        if let Some(p) = self.find_player(name) {
            return if p.is_bot() {
                Err(ValidationError::NameTaken(p.name.clone()))
            } else {
                Ok(p.id)
            };
        }
        self.register_player(name, tribe_name, PlayerKind::Human)
    }

    /// Pad the roster with bots up to `roster_size`.
    pub fn fill_with_bots(&mut self) -> Vec<PlayerId> {
        let mut added = Vec::new();
        let mut n = self.players.iter().filter(|p| p.is_bot()).count() + 1;
        while self.players.len() < self.config.roster_size {
            let name = format!("Bot{n}");
            let tribe = format!("Bot Tribe {n}");
            n += 1;
            if self.find_player(&name).is_some() {
                continue;
            }
            match self.register_player(&name, &tribe, PlayerKind::Bot) {
                Ok(id) => added.push(id),
                Err(err) => {
                    warn!(name = %name, %err, "bot not added");
                    break;
                }
            }
        }
        added
    }

    /// Accept a decision for the open day. Replaces an earlier one.
    pub fn submit_decision(
        &mut self,
        player: PlayerId,
        day: u32,
        raw: RawDecision,
    ) -> Result<Decision, ValidationError> {
        if self.clock.ended {
            return Err(ValidationError::GameEnded);
        }
        let current = self.clock.current_day;
        if day < current {
            return Err(ValidationError::DayAlreadyResolved { day, current });
        }
        if day > current {
            return Err(ValidationError::DayNotOpen { day, current });
        }
        let state = self
            .player(player)
            .ok_or(ValidationError::UnknownPlayer(player))?;
        if let Some(raid) = raw.raid {
            if raid.target != player && self.player(raid.target).is_none() {
                return Err(ValidationError::UnknownPlayer(raid.target));
            }
        }
        let decision = validate_decision(&raw, state, &self.config)?;
        let replaced = self.pending.insert(player, raw).is_some();
        debug!(%player, day, replaced, "decision accepted");
        Ok(decision)
    }

    pub fn pending_decision(&self, player: PlayerId) -> Option<&RawDecision> {
        self.pending.get(&player)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Resolve `day` and commit. On error nothing changes.
    pub fn resolve_day(&mut self, day: u32) -> Result<DayOutcome, StateError> {
        let input = DayInput {
            cfg: &self.config,
            clock: &self.clock,
            market: &self.market,
            players: &self.players,
            decisions: &self.pending,
        };
        let outcome = resolver::resolve_day(&input, day, &mut day_rng(self.seed, day))?;

        self.players = outcome.next_players.clone();
        self.market = outcome.next_market.clone();
        self.clock = outcome.next_clock;
        self.pending.clear();
        self.news.extend(outcome.news.iter().cloned());
        if outcome.standings.is_some() {
            self.standings = outcome.standings.clone();
        }
        Ok(outcome)
    }

    /// Resolve whatever day is open; the daily trigger calls this.
    pub fn process_day(&mut self) -> Result<DayOutcome, StateError> {
        self.resolve_day(self.clock.current_day)
    }

    /// Live ranking by credits.
    pub fn leaderboard(&self) -> Vec<Standing> {
        standings(&self.players)
    }

    pub fn player_view(&self, id: PlayerId) -> Option<PlayerView> {
        let player = self.player(id)?.clone();
        Some(PlayerView {
            day: self.clock.current_day,
            days_remaining: self.clock.days_remaining(),
            game_ended: self.clock.ended,
            prices: self.market.prices,
            last_prices: self.market.last_prices,
            colony_needs: self.market.colony_needs,
            player,
            pending: self.pending.get(&id).cloned(),
            leaderboard: self.leaderboard(),
            news: self.news.iter().cloned().collect(),
        })
    }
}
