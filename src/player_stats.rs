use rusqlite::{Connection, TransactionBehavior, params};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DuplicateGamePolicy;
use crate::error::{Result, StatsError};
use crate::player::{Player, PlayerDirectory};
use crate::stat_fields::{DerivedStats, StatField, StatLine};
use crate::store::{StatsDb, bool_to_i64, encode, find_doc, now_rfc3339};

/// One player's externally analyzed contribution to one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatsUpdate {
    pub jersey_number: u32,
    pub game_key: String,
    pub game_date: String,
    pub home_team: String,
    pub away_team: String,
    pub stats: StatLine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatRecord {
    pub player_id: i64,
    pub jersey_number: u32,
    pub game_key: String,
    pub game_date: String,
    pub home_team: String,
    pub away_team: String,
    pub position: String,
    pub games_played: u32,
    pub stats: StatLine,
    pub derived: DerivedStats,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonStatRecord {
    pub player_id: i64,
    pub season: String,
    pub league: String,
    pub position: String,
    pub game_keys: Vec<String>,
    pub games_played: u32,
    pub stats: StatLine,
    pub derived: DerivedStats,
    pub updated_at: String,
}

impl SeasonStatRecord {
    pub fn metric(&self, name: &str) -> Option<f64> {
        if name == "gamesPlayed" {
            return Some(f64::from(self.games_played));
        }
        self.derived
            .metric(name)
            .or_else(|| StatField::from_name(name).map(|field| self.stats.value(field)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CareerStatRecord {
    pub player_id: i64,
    pub position: String,
    pub active: bool,
    pub seasons_played: Vec<String>,
    pub total_games_played: u32,
    pub total_seasons: u32,
    pub stats: StatLine,
    pub derived: DerivedStats,
    /// Ratchet: only ever raised by a season that beats it.
    pub best_season_yards: f64,
    pub best_season_year: Option<String>,
    /// Ratchet, same rule as `best_season_yards`.
    pub most_touchdowns_in_season: f64,
    pub updated_at: String,
}

impl CareerStatRecord {
    pub fn metric(&self, name: &str) -> Option<f64> {
        let value = match name {
            "totalGamesPlayed" | "gamesPlayed" => f64::from(self.total_games_played),
            "totalSeasons" => f64::from(self.total_seasons),
            "bestSeasonYards" => self.best_season_yards,
            "mostTouchdownsInSeason" => self.most_touchdowns_in_season,
            _ => {
                return self
                    .derived
                    .metric(name)
                    .or_else(|| StatField::from_name(name).map(|field| self.stats.value(field)));
            }
        };
        Some(value)
    }
}

/// Outcome of folding one game into the season tier.
#[derive(Debug, Clone)]
pub struct SeasonFold {
    pub record: SeasonStatRecord,
    /// The game key was not yet on the season record.
    pub new_game: bool,
    /// The delta was added to the season totals.
    pub accumulated: bool,
}

/// Records one player's game and rolls it up into the season and career tiers.
///
/// The game tier is committed on its own. Season and career are then folded
/// inside one immediate transaction, which takes SQLite's write lock before
/// reading so two concurrent calls for the same player cannot interleave their
/// read-modify-write. A failure in that second step leaves the game tier
/// committed and season/career untouched.
pub fn update_game_stats(
    db: &mut StatsDb,
    update: &GameStatsUpdate,
    policy: DuplicateGamePolicy,
) -> Result<GameStatRecord> {
    let player = db
        .find_by_jersey_number(update.jersey_number)?
        .ok_or(StatsError::PlayerNotFound(update.jersey_number))?;

    let game = build_game_record(&player, update);
    save_game_record(db.conn(), &game)?;

    let tx = db
        .conn_mut()
        .transaction_with_behavior(TransactionBehavior::Immediate)?;

    let existing_season = load_season(&tx, player.id, &player.season)?;
    let fold = fold_season(existing_season, &player, update, policy);
    if fold.accumulated || fold.new_game {
        save_season(&tx, &fold.record)?;
        let existing_career = load_career(&tx, player.id)?;
        let career = fold_career(existing_career, &player, &fold, &update.stats);
        save_career(&tx, &career)?;
    }
    tx.commit()?;

    info!(
        player_id = player.id,
        jersey = update.jersey_number,
        game_key = %update.game_key,
        season = %player.season,
        new_game = fold.new_game,
        "player game stats recorded"
    );
    Ok(game)
}

fn build_game_record(player: &Player, update: &GameStatsUpdate) -> GameStatRecord {
    GameStatRecord {
        player_id: player.id,
        jersey_number: update.jersey_number,
        game_key: update.game_key.clone(),
        game_date: update.game_date.clone(),
        home_team: update.home_team.clone(),
        away_team: update.away_team.clone(),
        position: player.position.clone(),
        games_played: 1,
        stats: update.stats.clone(),
        derived: DerivedStats::from_totals(&update.stats),
        updated_at: now_rfc3339(),
    }
}

/// Season-tier fold. `gamesPlayed` only grows for a game key the season has
/// not seen. Under `Reaccumulate` a known key still adds the delta again.
pub fn fold_season(
    existing: Option<SeasonStatRecord>,
    player: &Player,
    update: &GameStatsUpdate,
    policy: DuplicateGamePolicy,
) -> SeasonFold {
    let Some(mut record) = existing else {
        let record = SeasonStatRecord {
            player_id: player.id,
            season: player.season.clone(),
            league: player.league.clone(),
            position: player.position.clone(),
            game_keys: vec![update.game_key.clone()],
            games_played: 1,
            stats: update.stats.clone(),
            derived: DerivedStats::from_totals(&update.stats),
            updated_at: now_rfc3339(),
        };
        return SeasonFold {
            record,
            new_game: true,
            accumulated: true,
        };
    };

    let new_game = !record.game_keys.iter().any(|key| key == &update.game_key);
    if new_game {
        record.game_keys.push(update.game_key.clone());
        record.games_played += 1;
    }

    let accumulated = match (new_game, policy) {
        (true, _) | (false, DuplicateGamePolicy::Reaccumulate) => true,
        (false, DuplicateGamePolicy::Skip) => false,
    };
    if !new_game {
        if accumulated {
            warn!(
                player_id = player.id,
                game_key = %update.game_key,
                "game already on season record, delta added again"
            );
        } else {
            debug!(
                player_id = player.id,
                game_key = %update.game_key,
                "game already on season record, delta skipped"
            );
        }
    }

    if accumulated {
        record.stats.accumulate(&update.stats);
        record.derived.recompute(&record.stats);
        record.position = player.position.clone();
        record.league = player.league.clone();
        record.updated_at = now_rfc3339();
    }

    SeasonFold {
        record,
        new_game,
        accumulated,
    }
}

/// Career-tier fold, gated on `seasonsPlayed`. The best-season ratchets are
/// compared against the season totals after this game was folded in.
pub fn fold_career(
    existing: Option<CareerStatRecord>,
    player: &Player,
    season: &SeasonFold,
    delta: &StatLine,
) -> CareerStatRecord {
    let season_yards = season.record.stats.total_yards();
    let season_touchdowns = season.record.stats.total_touchdowns();

    let Some(mut record) = existing else {
        return CareerStatRecord {
            player_id: player.id,
            position: player.position.clone(),
            active: player.active,
            seasons_played: vec![season.record.season.clone()],
            total_games_played: u32::from(season.new_game),
            total_seasons: 1,
            stats: delta.clone(),
            derived: DerivedStats::from_totals(delta),
            best_season_yards: season_yards,
            best_season_year: Some(season.record.season.clone()),
            most_touchdowns_in_season: season_touchdowns,
            updated_at: now_rfc3339(),
        };
    };

    if !record
        .seasons_played
        .iter()
        .any(|s| s == &season.record.season)
    {
        record.seasons_played.push(season.record.season.clone());
        record.total_seasons += 1;
    }
    if season.new_game {
        record.total_games_played += 1;
    }
    if season.accumulated {
        record.stats.accumulate(delta);
        record.derived.recompute(&record.stats);
    }

    if season_yards > record.best_season_yards {
        record.best_season_yards = season_yards;
        record.best_season_year = Some(season.record.season.clone());
    }
    if season_touchdowns > record.most_touchdowns_in_season {
        record.most_touchdowns_in_season = season_touchdowns;
    }

    record.position = player.position.clone();
    record.active = player.active;
    record.updated_at = now_rfc3339();
    record
}

pub fn get_game_stats(db: &StatsDb, player_id: i64, game_key: &str) -> Result<GameStatRecord> {
    find_doc(
        db.conn(),
        "SELECT doc FROM player_game_stats WHERE player_id = ?1 AND game_key = ?2",
        params![player_id, game_key],
    )?
    .ok_or_else(|| StatsError::NotFound(format!("game stats for player {player_id} in {game_key}")))
}

pub fn get_season_stats(db: &StatsDb, player_id: i64, season: &str) -> Result<SeasonStatRecord> {
    load_season(db.conn(), player_id, season)?.ok_or_else(|| {
        StatsError::NotFound(format!("season {season} stats for player {player_id}"))
    })
}

pub fn get_career_stats(db: &StatsDb, player_id: i64) -> Result<CareerStatRecord> {
    load_career(db.conn(), player_id)?
        .ok_or_else(|| StatsError::NotFound(format!("career stats for player {player_id}")))
}

fn save_game_record(conn: &Connection, game: &GameStatRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO player_game_stats (player_id, game_key, doc, updated_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(player_id, game_key) DO UPDATE SET
            doc = excluded.doc,
            updated_at = excluded.updated_at
        "#,
        params![game.player_id, game.game_key, encode(game)?, game.updated_at],
    )?;
    Ok(())
}

fn load_season(conn: &Connection, player_id: i64, season: &str) -> Result<Option<SeasonStatRecord>> {
    find_doc(
        conn,
        "SELECT doc FROM player_season_stats WHERE player_id = ?1 AND season = ?2",
        params![player_id, season],
    )
}

fn save_season(conn: &Connection, record: &SeasonStatRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO player_season_stats (player_id, season, league, position, doc, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(player_id, season) DO UPDATE SET
            league = excluded.league,
            position = excluded.position,
            doc = excluded.doc,
            updated_at = excluded.updated_at
        "#,
        params![
            record.player_id,
            record.season,
            record.league,
            record.position,
            encode(record)?,
            record.updated_at,
        ],
    )?;
    Ok(())
}

fn load_career(conn: &Connection, player_id: i64) -> Result<Option<CareerStatRecord>> {
    find_doc(
        conn,
        "SELECT doc FROM player_career_stats WHERE player_id = ?1",
        params![player_id],
    )
}

fn save_career(conn: &Connection, record: &CareerStatRecord) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO player_career_stats (player_id, position, active, doc, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(player_id) DO UPDATE SET
            position = excluded.position,
            active = excluded.active,
            doc = excluded.doc,
            updated_at = excluded.updated_at
        "#,
        params![
            record.player_id,
            record.position,
            bool_to_i64(record.active),
            encode(record)?,
            record.updated_at,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player() -> Player {
        Player {
            id: 7,
            jersey_number: 15,
            name: "Test QB".to_string(),
            position: "QB".to_string(),
            league: "HS".to_string(),
            season: "2024".to_string(),
            active: true,
        }
    }

    fn update(game_key: &str, yards: f64) -> GameStatsUpdate {
        GameStatsUpdate {
            jersey_number: 15,
            game_key: game_key.to_string(),
            game_date: "2024-09-06".to_string(),
            home_team: "Home".to_string(),
            away_team: "Away".to_string(),
            stats: StatLine::new()
                .with(StatField::PassingYards, yards)
                .with(StatField::LongestPass, yards / 4.0),
        }
    }

    #[test]
    fn skip_policy_leaves_known_game_untouched() {
        let first = fold_season(None, &player(), &update("G1", 100.0), DuplicateGamePolicy::Skip);
        let again = fold_season(
            Some(first.record),
            &player(),
            &update("G1", 100.0),
            DuplicateGamePolicy::Skip,
        );
        assert!(!again.new_game);
        assert!(!again.accumulated);
        assert_eq!(again.record.stats.value(StatField::PassingYards), 100.0);
        assert_eq!(again.record.games_played, 1);
    }

    #[test]
    fn first_career_fold_counts_only_a_new_game() {
        let first = fold_season(None, &player(), &update("G1", 80.0), DuplicateGamePolicy::default());
        let repeat = fold_season(
            Some(first.record),
            &player(),
            &update("G1", 80.0),
            DuplicateGamePolicy::Reaccumulate,
        );
        assert!(!repeat.new_game);
        let career = fold_career(None, &player(), &repeat, &update("G1", 80.0).stats);
        assert_eq!(career.total_games_played, 0);
        assert_eq!(career.total_seasons, 1);
    }

    #[test]
    fn career_ratchet_does_not_drop_for_a_weaker_season() {
        let mut strong = player();
        strong.season = "2023".to_string();
        let s1 = fold_season(None, &strong, &update("G1", 300.0), DuplicateGamePolicy::Skip);
        let career = fold_career(None, &strong, &s1, &update("G1", 300.0).stats);
        assert_eq!(career.best_season_yards, 300.0);

        let s2 = fold_season(None, &player(), &update("G2", 120.0), DuplicateGamePolicy::Skip);
        let career = fold_career(Some(career), &player(), &s2, &update("G2", 120.0).stats);
        assert_eq!(career.best_season_yards, 300.0);
        assert_eq!(career.best_season_year.as_deref(), Some("2023"));
        assert_eq!(career.total_seasons, 2);
        assert_eq!(career.total_games_played, 2);
        assert_eq!(career.stats.value(StatField::PassingYards), 420.0);
        assert_eq!(career.stats.value(StatField::LongestPass), 75.0);
    }
}
