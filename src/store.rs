use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

const BUSY_TIMEOUT_SECS: u64 = 15;

/// SQLite-backed document store. Each tier lives in its own table with the
/// natural key as columns and the record as a JSON document.
pub struct StatsDb {
    conn: Connection,
    path: Option<PathBuf>,
}

impl StatsDb {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS))?;
        init_schema(&conn)?;
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Private database; cannot be shared with worker connections.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS players (
            player_id INTEGER PRIMARY KEY,
            jersey_number INTEGER NOT NULL,
            name TEXT NOT NULL,
            position TEXT NOT NULL,
            league TEXT NOT NULL,
            season TEXT NOT NULL,
            active INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_players_jersey ON players(jersey_number);

        CREATE TABLE IF NOT EXISTS team_game_stats (
            game_key TEXT NOT NULL,
            home_or_away TEXT NOT NULL,
            team_name TEXT NOT NULL,
            doc TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (game_key, home_or_away)
        );

        CREATE TABLE IF NOT EXISTS player_game_stats (
            player_id INTEGER NOT NULL,
            game_key TEXT NOT NULL,
            doc TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (player_id, game_key)
        );

        CREATE TABLE IF NOT EXISTS player_season_stats (
            player_id INTEGER NOT NULL,
            season TEXT NOT NULL,
            league TEXT NOT NULL,
            position TEXT NOT NULL,
            doc TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (player_id, season)
        );
        CREATE INDEX IF NOT EXISTS idx_season_scope ON player_season_stats(season, league);

        CREATE TABLE IF NOT EXISTS player_career_stats (
            player_id INTEGER PRIMARY KEY,
            position TEXT NOT NULL,
            active INTEGER NOT NULL,
            doc TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

pub(crate) fn encode<T: Serialize>(doc: &T) -> Result<String> {
    Ok(serde_json::to_string(doc)?)
}

pub(crate) fn decode<T: DeserializeOwned>(raw: &str) -> Result<T> {
    Ok(serde_json::from_str(raw)?)
}

/// Reads a single JSON document by an arbitrary keyed query.
pub(crate) fn find_doc<T, P>(conn: &Connection, sql: &str, key: P) -> Result<Option<T>>
where
    T: DeserializeOwned,
    P: rusqlite::Params,
{
    let raw = conn
        .query_row(sql, key, |row| row.get::<_, String>(0))
        .optional()?;
    raw.as_deref().map(|raw| decode::<T>(raw)).transpose()
}

/// Reads every JSON document matched by a filter query.
pub(crate) fn scan_docs<T, P>(conn: &Connection, sql: &str, filter: P) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    P: rusqlite::Params,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(filter, |row| row.get::<_, String>(0))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(decode(&row?)?);
    }
    Ok(out)
}

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub(crate) fn bool_to_i64(v: bool) -> i64 {
    if v { 1 } else { 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    #[test]
    fn schema_is_reentrant() {
        let db = StatsDb::open_in_memory().unwrap();
        init_schema(db.conn()).unwrap();
        let tables: i64 = db
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
                params![],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 5);
    }
}
