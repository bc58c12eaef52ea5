use rusqlite::{OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::{StatsDb, bool_to_i64};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: i64,
    pub jersey_number: u32,
    pub name: String,
    pub position: String,
    pub league: String,
    /// Season the player's new games are filed under.
    pub season: String,
    pub active: bool,
}

/// Identity lookups the aggregator needs. Roster management lives elsewhere.
pub trait PlayerDirectory {
    fn find_by_jersey_number(&self, jersey_number: u32) -> Result<Option<Player>>;
    fn find_by_id(&self, id: i64) -> Result<Option<Player>>;
}

const PLAYER_COLUMNS: &str = "player_id, jersey_number, name, position, league, season, active";

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get(0)?,
        jersey_number: row.get(1)?,
        name: row.get(2)?,
        position: row.get(3)?,
        league: row.get(4)?,
        season: row.get(5)?,
        active: row.get::<_, i64>(6)? != 0,
    })
}

impl PlayerDirectory for StatsDb {
    fn find_by_jersey_number(&self, jersey_number: u32) -> Result<Option<Player>> {
        let sql = format!(
            "SELECT {PLAYER_COLUMNS} FROM players WHERE jersey_number = ?1 ORDER BY player_id LIMIT 1"
        );
        let player = self
            .conn()
            .query_row(&sql, params![jersey_number], player_from_row)
            .optional()?;
        Ok(player)
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Player>> {
        let sql = format!("SELECT {PLAYER_COLUMNS} FROM players WHERE player_id = ?1");
        let player = self
            .conn()
            .query_row(&sql, params![id], player_from_row)
            .optional()?;
        Ok(player)
    }
}

/// Seeds or refreshes a roster entry.
pub fn upsert_player(db: &StatsDb, player: &Player) -> Result<()> {
    db.conn().execute(
        r#"
        INSERT INTO players (player_id, jersey_number, name, position, league, season, active)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(player_id) DO UPDATE SET
            jersey_number = excluded.jersey_number,
            name = excluded.name,
            position = excluded.position,
            league = excluded.league,
            season = excluded.season,
            active = excluded.active
        "#,
        params![
            player.id,
            player.jersey_number,
            player.name,
            player.position,
            player.league,
            player.season,
            bool_to_i64(player.active),
        ],
    )?;
    Ok(())
}
