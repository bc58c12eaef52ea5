use std::collections::BTreeMap;
use std::path::Path;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config::{DuplicateGamePolicy, EngineConfig};
use crate::error::Result;
use crate::ingest::IngestedGame;
use crate::player_stats::{GameStatRecord, GameStatsUpdate, update_game_stats};
use crate::store::StatsDb;
use crate::team_stats::{TeamStatsPair, analyze_and_save_team_stats};

#[derive(Debug, Clone)]
pub struct PlayerOutcome {
    pub jersey_number: u32,
    pub result: std::result::Result<GameStatRecord, String>,
}

#[derive(Debug, Clone)]
pub struct GameProcessingReport {
    pub game_key: String,
    pub team_stats: std::result::Result<TeamStatsPair, String>,
    pub players: Vec<PlayerOutcome>,
}

impl GameProcessingReport {
    pub fn succeeded(&self) -> usize {
        self.players.iter().filter(|p| p.result.is_ok()).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (u32, &str)> + '_ {
        self.players.iter().filter_map(|p| match &p.result {
            Ok(_) => None,
            Err(err) => Some((p.jersey_number, err.as_str())),
        })
    }
}

/// Saves team totals, then fans the per-player updates out over a bounded
/// pool. Each worker uses its own connection. Updates for one jersey stay on
/// one worker and run in input order. A failing player is reported, not fatal.
pub fn process_game(
    db_path: &Path,
    ingested: &IngestedGame,
    config: &EngineConfig,
) -> Result<GameProcessingReport> {
    let game_key = ingested.game.game_key.clone();
    let team_stats = {
        let mut db = StatsDb::open(db_path)?;
        analyze_and_save_team_stats(&mut db, &ingested.game).map_err(|err| err.to_string())
    };
    if let Err(err) = &team_stats {
        warn!(%game_key, %err, "team stats failed");
    }

    let groups = group_by_jersey(&ingested.player_stats);
    log_missing_deltas(ingested);
    let workers = config.workers.min(groups.len()).max(1);
    let pool = build_worker_pool(workers);
    let policy = config.duplicate_policy;

    let players = with_worker_pool(&pool, || {
        groups
            .par_iter()
            .map_init(
                || StatsDb::open(db_path),
                |db, (jersey, updates)| match db {
                    Ok(db) => run_player_updates(db, *jersey, updates, policy),
                    Err(err) => vec![PlayerOutcome {
                        jersey_number: *jersey,
                        result: Err(format!("open stats db: {err}")),
                    }],
                },
            )
            .flatten()
            .collect::<Vec<_>>()
    });

    let report = GameProcessingReport {
        game_key,
        team_stats,
        players,
    };
    info!(
        game_key = %report.game_key,
        workers,
        succeeded = report.succeeded(),
        failed = report.players.len() - report.succeeded(),
        "game processed"
    );
    Ok(report)
}

/// Single-connection variant for callers that own the database handle,
/// including in-memory databases.
pub fn process_game_sequential(
    db: &mut StatsDb,
    ingested: &IngestedGame,
    policy: DuplicateGamePolicy,
) -> GameProcessingReport {
    let team_stats =
        analyze_and_save_team_stats(db, &ingested.game).map_err(|err| err.to_string());
    let players = group_by_jersey(&ingested.player_stats)
        .into_iter()
        .flat_map(|(jersey, updates)| run_player_updates(db, jersey, &updates, policy))
        .collect();
    GameProcessingReport {
        game_key: ingested.game.game_key.clone(),
        team_stats,
        players,
    }
}

fn run_player_updates(
    db: &mut StatsDb,
    jersey: u32,
    updates: &[&GameStatsUpdate],
    policy: DuplicateGamePolicy,
) -> Vec<PlayerOutcome> {
    updates
        .iter()
        .map(|update| {
            let result = update_game_stats(db, update, policy).map_err(|err| {
                warn!(jersey, game_key = %update.game_key, %err, "player update failed");
                err.to_string()
            });
            PlayerOutcome {
                jersey_number: jersey,
                result,
            }
        })
        .collect()
}

fn group_by_jersey(updates: &[GameStatsUpdate]) -> Vec<(u32, Vec<&GameStatsUpdate>)> {
    let mut groups: BTreeMap<u32, Vec<&GameStatsUpdate>> = BTreeMap::new();
    for update in updates {
        groups.entry(update.jersey_number).or_default().push(update);
    }
    groups.into_iter().collect()
}

fn log_missing_deltas(ingested: &IngestedGame) {
    let reported = ingested
        .player_stats
        .iter()
        .map(|u| u.jersey_number)
        .collect::<Vec<_>>();
    let missing = ingested
        .game
        .participating_jerseys()
        .into_iter()
        .filter(|jersey| !reported.contains(jersey))
        .count();
    if missing > 0 {
        debug!(
            game_key = %ingested.game.game_key,
            missing,
            "participants without an analyzed stat line"
        );
    }
}

fn build_worker_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .ok()
}

fn with_worker_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}
