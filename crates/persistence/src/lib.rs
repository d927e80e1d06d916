#![deny(warnings)]

//! Persistence layer: SQLite save slots holding JSON session snapshots, plus
//! plain JSON snapshot files.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sim_runtime::GameSession;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Returns the default SQLite URL used for local saves.
pub fn default_sqlite_url() -> &'static str {
    "sqlite://./saves/main.db"
}

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS saves (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        note TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS snapshots (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        save_id INTEGER NOT NULL REFERENCES saves(id),
        day INTEGER NOT NULL,
        ended INTEGER NOT NULL,
        state_json TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS snapshots_by_save ON snapshots(save_id, id)",
];

/// A save slot and the day of its newest snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SaveInfo {
    pub id: i64,
    pub name: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub latest_day: Option<u32>,
}

pub async fn init_db(url: &str) -> Result<SqlitePool> {
    init_db_with(url, 5).await
}

/// Open (creating if needed) the database at `url` and apply the schema.
pub async fn init_db_with(url: &str, max_connections: u32) -> Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(url)
        .with_context(|| format!("invalid sqlite url {url}"))?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(opts)
        .await
        .with_context(|| format!("connecting to {url}"))?;
    for stmt in SCHEMA {
        sqlx::query(stmt).execute(&pool).await.context("applying schema")?;
    }
    info!(url, "database ready");
    Ok(pool)
}

/// Id of the save called `name`, created on first use.
pub async fn create_save(pool: &SqlitePool, name: &str, note: Option<&str>) -> Result<i64> {
    if let Some(row) = sqlx::query("SELECT id FROM saves WHERE name = ?1")
        .bind(name)
        .fetch_optional(pool)
        .await?
    {
        return Ok(row.try_get("id")?);
    }
    let id = sqlx::query("INSERT INTO saves (name, note, created_at) VALUES (?1, ?2, ?3)")
        .bind(name)
        .bind(note)
        .bind(Utc::now().to_rfc3339())
        .execute(pool)
        .await
        .with_context(|| format!("creating save {name}"))?
        .last_insert_rowid();
    info!(save = id, name, "save created");
    Ok(id)
}

/// Append a snapshot of `session` to save `save_id`.
pub async fn store_snapshot(pool: &SqlitePool, save_id: i64, session: &GameSession) -> Result<i64> {
    let json = serde_json::to_string(session).context("serializing session")?;
    let id = sqlx::query(
        "INSERT INTO snapshots (save_id, day, ended, state_json, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(save_id)
    .bind(i64::from(session.current_day()))
    .bind(session.is_ended())
    .bind(json)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await
    .with_context(|| format!("storing snapshot for save {save_id}"))?
    .last_insert_rowid();
    debug!(save = save_id, snapshot = id, day = session.current_day(), "snapshot stored");
    Ok(id)
}

/// Newest snapshot of save `save_id`, checked before it is handed out.
pub async fn load_latest_snapshot(pool: &SqlitePool, save_id: i64) -> Result<Option<GameSession>> {
    let row = sqlx::query("SELECT state_json FROM snapshots WHERE save_id = ?1 ORDER BY id DESC LIMIT 1")
        .bind(save_id)
        .fetch_optional(pool)
        .await?;
    let Some(row) = row else {
        return Ok(None);
    };
    let json: String = row.try_get("state_json")?;
    let session: GameSession =
        serde_json::from_str(&json).with_context(|| format!("decoding snapshot of save {save_id}"))?;
    session.verify()?;
    Ok(Some(session))
}

pub async fn list_saves(pool: &SqlitePool) -> Result<Vec<SaveInfo>> {
    let rows = sqlx::query(
        "SELECT s.id, s.name, s.note, s.created_at, MAX(n.day) AS latest_day
         FROM saves s LEFT JOIN snapshots n ON n.save_id = s.id
         GROUP BY s.id ORDER BY s.id",
    )
    .fetch_all(pool)
    .await?;
    rows.iter()
        .map(|row| -> Result<SaveInfo> {
            let created: String = row.try_get("created_at")?;
            let latest: Option<i64> = row.try_get("latest_day")?;
            Ok(SaveInfo {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
                note: row.try_get("note")?,
                created_at: DateTime::parse_from_rfc3339(&created)
                    .with_context(|| format!("bad timestamp {created}"))?
                    .with_timezone(&Utc),
                latest_day: latest.and_then(|d| u32::try_from(d).ok()),
            })
        })
        .collect()
}

/// Write `session` as pretty JSON, creating parent directories.
pub fn write_snapshot_file(path: &Path, session: &GameSession) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(session)?;
    std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    debug!(path = %path.display(), day = session.current_day(), "snapshot written");
    Ok(())
}

pub fn read_snapshot_file(path: &Path) -> Result<GameSession> {
    let json = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let session: GameSession =
        serde_json::from_str(&json).with_context(|| format!("decoding {}", path.display()))?;
    session.verify()?;
    Ok(session)
}
