use rusqlite::params;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::classifier::{TeamDelta, classify};
use crate::error::Result;
use crate::play::{GameRecord, Side};
use crate::store::{StatsDb, encode, find_doc, now_rfc3339};

/// Stored totals for one side of one game.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamGameStats {
    pub team_name: String,
    pub passing_yards: i64,
    /// Net of sack yardage.
    pub rushing_yards: i64,
    pub interception_return_yards: i64,
    pub punt_return_yards: i64,
    pub kickoff_return_yards: i64,
    pub turnovers: i64,
    pub sack_yards: i64,
    /// Reserved; no play rule populates it yet.
    pub penalty_yards: i64,
    pub total_yards: i64,
}

impl TeamGameStats {
    fn from_folded(team_name: &str, folded: &TeamDelta) -> Self {
        let rushing_yards = folded.rushing_yards - folded.sack_yards;
        let total_yards = folded.passing_yards
            + rushing_yards
            + folded.interception_return_yards
            + folded.punt_return_yards
            + folded.kickoff_return_yards;
        Self {
            team_name: team_name.to_string(),
            passing_yards: folded.passing_yards,
            rushing_yards,
            interception_return_yards: folded.interception_return_yards,
            punt_return_yards: folded.punt_return_yards,
            kickoff_return_yards: folded.kickoff_return_yards,
            turnovers: folded.turnovers,
            sack_yards: folded.sack_yards,
            penalty_yards: 0,
            total_yards,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStatsPair {
    pub home: TeamGameStats,
    pub away: TeamGameStats,
}

impl TeamStatsPair {
    pub fn side(&self, side: Side) -> &TeamGameStats {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }
}

/// Folds every play of the game into home/away totals.
///
/// Sack yardage is netted out of rushing and `totalYards` is the sum of the
/// five yardage categories on the stored (net) values.
pub fn analyze_team_stats(game: &GameRecord) -> TeamStatsPair {
    let mut home = TeamDelta::default();
    let mut away = TeamDelta::default();

    for (idx, play) in game.plays.iter().enumerate() {
        let Some(offense_side) = play.offense else {
            warn!(
                game_key = %game.game_key,
                play = idx,
                "play has no offense side, excluded from team totals"
            );
            continue;
        };
        let defense_side = offense_side.opposite();
        let (offense, defense) = classify(
            play,
            game.team_name(offense_side),
            game.team_name(defense_side),
        );
        match offense_side {
            Side::Home => {
                home.add(&offense);
                away.add(&defense);
            }
            Side::Away => {
                away.add(&offense);
                home.add(&defense);
            }
        }
    }

    TeamStatsPair {
        home: TeamGameStats::from_folded(&game.home_team_name, &home),
        away: TeamGameStats::from_folded(&game.away_team_name, &away),
    }
}

/// Overwrites both sides of the game. Re-running for the same key replaces
/// the previous totals.
pub fn save_team_stats(db: &mut StatsDb, game_key: &str, stats: &TeamStatsPair) -> Result<()> {
    let tx = db.conn_mut().transaction()?;
    for side in [Side::Home, Side::Away] {
        let row = stats.side(side);
        tx.execute(
            r#"
            INSERT INTO team_game_stats (game_key, home_or_away, team_name, doc, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(game_key, home_or_away) DO UPDATE SET
                team_name = excluded.team_name,
                doc = excluded.doc,
                updated_at = excluded.updated_at
            "#,
            params![game_key, side.key(), row.team_name, encode(row)?, now_rfc3339()],
        )?;
    }
    tx.commit()?;
    info!(
        game_key,
        home = %stats.home.team_name,
        away = %stats.away.team_name,
        home_total = stats.home.total_yards,
        away_total = stats.away.total_yards,
        "team stats saved"
    );
    Ok(())
}

pub fn analyze_and_save_team_stats(db: &mut StatsDb, game: &GameRecord) -> Result<TeamStatsPair> {
    let stats = analyze_team_stats(game);
    save_team_stats(db, &game.game_key, &stats)?;
    Ok(stats)
}

/// Both sides of a stored game, or `None` if either side is missing.
pub fn get_team_stats_by_game(db: &StatsDb, game_key: &str) -> Result<Option<TeamStatsPair>> {
    let sql = "SELECT doc FROM team_game_stats WHERE game_key = ?1 AND home_or_away = ?2";
    let home = find_doc::<TeamGameStats, _>(db.conn(), sql, params![game_key, Side::Home.key()])?;
    let away = find_doc::<TeamGameStats, _>(db.conn(), sql, params![game_key, Side::Away.key()])?;
    Ok(match (home, away) {
        (Some(home), Some(away)) => Some(TeamStatsPair { home, away }),
        _ => None,
    })
}
