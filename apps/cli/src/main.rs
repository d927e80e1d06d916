#![deny(warnings)]

//! Headless CLI: run a Space Tribes game for a number of days with bots
//! filling the empty slots, then print the standings.

use anyhow::{Context, Result};
use persistence::{read_snapshot_file, write_snapshot_file};
use sim_core::{GameConfig, NewsEvent, Standing};
use sim_runtime::{DayOutcome, GameSession, SharedSession};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    days: Option<u32>,
    seed: Option<u64>,
    players: Vec<(String, String)>,
    resume: Option<PathBuf>,
    snapshot: Option<PathBuf>,
    db: Option<String>,
    tick_secs: Option<u64>,
    version: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next().map(PathBuf::from),
            "--days" => args.days = it.next().and_then(|s| s.parse().ok()),
            "--seed" => args.seed = it.next().and_then(|s| s.parse().ok()),
            // --player name[:tribe]
            "--player" => {
                if let Some(spec) = it.next() {
                    let (name, tribe) = match spec.split_once(':') {
                        Some((n, t)) => (n.to_string(), t.to_string()),
                        None => (spec.clone(), format!("{spec}'s Tribe")),
                    };
                    args.players.push((name, tribe));
                }
            }
            "--resume" => args.resume = it.next().map(PathBuf::from),
            "--snapshot" => args.snapshot = it.next().map(PathBuf::from),
            "--db" => args.db = it.next(),
            // seconds between day resolutions; 86400 for a daily game
            "--tick" => args.tick_secs = it.next().and_then(|s| s.parse().ok()),
            "--version" | "-V" => args.version = true,
            _ => {}
        }
    }
    args
}

fn load_config(path: Option<&Path>) -> Result<GameConfig> {
    let Some(path) = path else {
        return Ok(GameConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let cfg: GameConfig =
        serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    Ok(cfg)
}

fn print_news(events: &[NewsEvent]) {
    for e in events {
        println!("  [day {:>2}] {}", e.day, e.message);
    }
}

fn print_day(outcome: &DayOutcome) -> Result<()> {
    println!(
        "Day {} | sold {} | raids {} | prices {}",
        outcome.day,
        outcome.report.total_sold.total(),
        outcome.report.raids.groups.len(),
        serde_json::to_string(&outcome.next_market.prices)?
    );
    print_news(&outcome.news);
    Ok(())
}

/// Resolve up to `days` days, one per `period`, while submitters share the session.
async fn run_on_timer(shared: &SharedSession, period: Duration, days: u32) -> Result<Vec<DayOutcome>> {
    let mut ticker = tokio::time::interval(period);
    // the first tick fires at once; the open day gets a full period
    ticker.tick().await;
    let mut outcomes = Vec::new();
    for _ in 0..days {
        if shared.with(|s| s.is_ended()) {
            break;
        }
        ticker.tick().await;
        let outcome = shared.process_day()?;
        info!(day = outcome.day, "timer resolved day");
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

fn print_standings(title: &str, board: &[Standing]) {
    println!("{title}");
    for s in board {
        println!("  {:>2}. {:<12} {:<20} {:>10}", s.rank, s.name, s.tribe_name, s.credits);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    if args.version {
        println!(
            "space-tribes {} ({} built {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    info!(config = ?args.config, days = ?args.days, seed = ?args.seed, "starting CLI");

    let mut session = match &args.resume {
        Some(path) => read_snapshot_file(path)?,
        None => {
            let cfg = load_config(args.config.as_deref())?;
            GameSession::new(cfg, args.seed.unwrap_or(42)).context("invalid game config")?
        }
    };
    for (name, tribe) in &args.players {
        let id = session
            .login(name, tribe)
            .with_context(|| format!("joining as {name}"))?;
        info!(player = %id, name = %name, "human tribe ready");
    }
    let bots = session.fill_with_bots();
    info!(bots = bots.len(), roster = session.players().len(), "roster filled");

    let days = args
        .days
        .unwrap_or_else(|| session.clock().days_remaining());
    match args.tick_secs {
        Some(secs) => {
            let shared = SharedSession::new(session);
            for outcome in run_on_timer(&shared, Duration::from_secs(secs), days).await? {
                print_day(&outcome)?;
            }
            session = shared.snapshot();
        }
        None => {
            for _ in 0..days {
                if session.is_ended() {
                    break;
                }
                print_day(&session.process_day()?)?;
            }
        }
    }

    match session.final_standings() {
        Some(board) => print_standings("Final standings", board),
        None => print_standings(
            &format!("Standings after day {}", session.current_day().saturating_sub(1)),
            &session.leaderboard(),
        ),
    }

    if let Some(path) = &args.snapshot {
        write_snapshot_file(path, &session)?;
        println!("Snapshot written to {}", path.display());
    }
    if let Some(url) = &args.db {
        let pool = persistence::init_db(url).await?;
        let save = persistence::create_save(&pool, "cli", Some("headless run")).await?;
        let snapshot = persistence::store_snapshot(&pool, save, &session).await?;
        println!("Saved snapshot {snapshot} to {url}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::{AbsenteePolicy, DemandSchedule};

    #[test]
    fn bundled_configs_parse_and_validate() {
        let classic: GameConfig =
            serde_yaml::from_str(include_str!("../../../assets/configs/classic.yaml")).unwrap();
        classic.validate().unwrap();
        assert_eq!(classic.duration_days, 30);
        assert_eq!(classic.market_shock.chance, 0.2);

        let volatile: GameConfig =
            serde_yaml::from_str(include_str!("../../../assets/configs/volatile.yaml")).unwrap();
        volatile.validate().unwrap();
        assert_eq!(volatile.quantity_scale, 1);
        assert_eq!(volatile.absentee_policy, AbsenteePolicy::Idle);
        assert_eq!(volatile.colony_needs, DemandSchedule::Seeded { min: 5, max: 30 });
        // untouched keys keep their defaults
        assert_eq!(volatile.raid_cost, GameConfig::default().raid_cost);
    }

    #[tokio::test]
    async fn timer_resolves_one_day_per_tick_until_the_end() {
        let mut cfg = GameConfig::default();
        cfg.duration_days = 2;
        let mut session = GameSession::new(cfg, 7).unwrap();
        session.fill_with_bots();
        let shared = SharedSession::new(session);

        let outcomes = run_on_timer(&shared, Duration::from_millis(1), 5).await.unwrap();
        assert_eq!(outcomes.iter().map(|o| o.day).collect::<Vec<_>>(), vec![1, 2]);
        assert!(shared.with(|s| s.is_ended()));
    }

    #[test]
    fn missing_config_means_defaults() {
        assert_eq!(load_config(None).unwrap(), GameConfig::default());
        assert!(load_config(Some(Path::new("/nonexistent/space-tribes.yaml"))).is_err());
    }
}
