use std::cmp::Ordering;

use rusqlite::params;
use serde::Serialize;

use crate::config::DEFAULT_RANKINGS_LIMIT;
use crate::error::{Result, StatsError};
use crate::player_stats::{CareerStatRecord, SeasonStatRecord};
use crate::stat_fields::{DerivedStats, StatField};
use crate::store::{StatsDb, scan_docs};

pub const DEFAULT_SORT: &str = "totalYards";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingRow<T> {
    pub rank: usize,
    pub player_id: i64,
    pub position: String,
    pub value: f64,
    pub record: T,
}

#[derive(Debug, Clone)]
pub struct RankingQuery<'a> {
    pub position: Option<&'a str>,
    pub sort_by: &'a str,
    pub limit: usize,
}

impl Default for RankingQuery<'_> {
    fn default() -> Self {
        Self {
            position: None,
            sort_by: DEFAULT_SORT,
            limit: DEFAULT_RANKINGS_LIMIT,
        }
    }
}

/// Top players of one season in one league, highest `sort_by` first.
pub fn get_season_rankings(
    db: &StatsDb,
    season: &str,
    league: &str,
    query: &RankingQuery<'_>,
) -> Result<Vec<RankingRow<SeasonStatRecord>>> {
    if !is_season_metric(query.sort_by) {
        return Err(StatsError::UnknownMetric(query.sort_by.to_string()));
    }
    let records: Vec<SeasonStatRecord> = match query.position {
        Some(position) => scan_docs(
            db.conn(),
            "SELECT doc FROM player_season_stats
             WHERE season = ?1 AND league = ?2 AND position = ?3 COLLATE NOCASE",
            params![season, league, position],
        )?,
        None => scan_docs(
            db.conn(),
            "SELECT doc FROM player_season_stats WHERE season = ?1 AND league = ?2",
            params![season, league],
        )?,
    };
    rank(records, query, |r| r.metric(query.sort_by), |r| {
        (r.player_id, r.position.as_str())
    })
}

/// Top active careers, highest `sort_by` first.
pub fn get_career_rankings(
    db: &StatsDb,
    query: &RankingQuery<'_>,
) -> Result<Vec<RankingRow<CareerStatRecord>>> {
    if !is_career_metric(query.sort_by) {
        return Err(StatsError::UnknownMetric(query.sort_by.to_string()));
    }
    let records: Vec<CareerStatRecord> = match query.position {
        Some(position) => scan_docs(
            db.conn(),
            "SELECT doc FROM player_career_stats
             WHERE active = 1 AND position = ?1 COLLATE NOCASE",
            params![position],
        )?,
        None => scan_docs(
            db.conn(),
            "SELECT doc FROM player_career_stats WHERE active = 1",
            params![],
        )?,
    };
    rank(records, query, |r| r.metric(query.sort_by), |r| {
        (r.player_id, r.position.as_str())
    })
}

fn rank<T>(
    records: Vec<T>,
    query: &RankingQuery<'_>,
    metric: impl Fn(&T) -> Option<f64>,
    identity: impl Fn(&T) -> (i64, &str),
) -> Result<Vec<RankingRow<T>>> {
    let mut scored = Vec::with_capacity(records.len());
    for record in records {
        let value = metric(&record)
            .ok_or_else(|| StatsError::UnknownMetric(query.sort_by.to_string()))?;
        scored.push((value, record));
    }
    // Ties fall back to player id so the order is stable across reads.
    scored.sort_by(|(va, ra), (vb, rb)| {
        vb.partial_cmp(va)
            .unwrap_or(Ordering::Equal)
            .then_with(|| identity(ra).0.cmp(&identity(rb).0))
    });
    scored.truncate(query.limit.max(1));

    Ok(scored
        .into_iter()
        .enumerate()
        .map(|(idx, (value, record))| {
            let (player_id, position) = identity(&record);
            let position = position.to_string();
            RankingRow {
                rank: idx + 1,
                player_id,
                position,
                value,
                record,
            }
        })
        .collect())
}

pub fn is_season_metric(name: &str) -> bool {
    name == "gamesPlayed"
        || StatField::from_name(name).is_some()
        || DerivedStats::default().metric(name).is_some()
}

pub fn is_career_metric(name: &str) -> bool {
    is_season_metric(name)
        || matches!(
            name,
            "totalGamesPlayed" | "totalSeasons" | "bestSeasonYards" | "mostTouchdownsInSeason"
        )
}
