use std::path::Path;
use std::thread;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::tempdir;

use gridiron_stats::batch::{process_game, process_game_sequential};
use gridiron_stats::config::{DuplicateGamePolicy, EngineConfig};
use gridiron_stats::fake_game::{fake_game, fake_players};
use gridiron_stats::player::upsert_player;
use gridiron_stats::player_stats::{
    GameStatsUpdate, get_career_stats, get_season_stats, update_game_stats,
};
use gridiron_stats::stat_fields::{StatField, StatLine};
use gridiron_stats::store::StatsDb;
use gridiron_stats::team_stats::get_team_stats_by_game;

const LEAGUE: &str = "Demo";
const SEASON: &str = "2024";

fn seed(path: &Path) {
    let db = StatsDb::open(path).unwrap();
    for player in fake_players(LEAGUE, SEASON) {
        upsert_player(&db, &player).unwrap();
    }
}

fn config(path: &Path, workers: usize, policy: DuplicateGamePolicy) -> EngineConfig {
    EngineConfig {
        workers,
        duplicate_policy: policy,
        ..EngineConfig::default()
    }
    .with_db_path(path.to_path_buf())
}

#[test]
fn parallel_run_matches_sequential_run() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stats.sqlite");
    seed(&path);

    let mut memory = StatsDb::open_in_memory().unwrap();
    for player in fake_players(LEAGUE, SEASON) {
        upsert_player(&memory, &player).unwrap();
    }

    let mut rng = StdRng::seed_from_u64(11);
    let games = (0..4)
        .map(|n| fake_game(&mut rng, &format!("W{n}"), "2024-09-06", "Harbor", "Ridge", 120))
        .collect::<Vec<_>>();

    let cfg = config(&path, 4, DuplicateGamePolicy::default());
    for game in &games {
        let parallel = process_game(&path, game, &cfg).unwrap();
        assert!(parallel.team_stats.is_ok());
        assert_eq!(parallel.failures().count(), 0);
        assert_eq!(parallel.succeeded(), game.player_stats.len());

        let sequential = process_game_sequential(&mut memory, game, cfg.duplicate_policy);
        assert_eq!(sequential.succeeded(), parallel.succeeded());
    }

    let disk = StatsDb::open(&path).unwrap();
    for player in fake_players(LEAGUE, SEASON) {
        let on_disk = get_season_stats(&disk, player.id, SEASON);
        let in_memory = get_season_stats(&memory, player.id, SEASON);
        match (on_disk, in_memory) {
            (Ok(a), Ok(b)) => {
                assert_eq!(a.games_played, b.games_played);
                assert_eq!(a.stats, b.stats);
            }
            (Err(_), Err(_)) => {}
            (a, b) => panic!("tiers diverged for player {}: {a:?} vs {b:?}", player.id),
        }
    }
    for game in &games {
        let a = get_team_stats_by_game(&disk, &game.game.game_key).unwrap();
        let b = get_team_stats_by_game(&memory, &game.game.game_key).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn unknown_jerseys_are_reported_not_fatal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stats.sqlite");
    seed(&path);

    let mut rng = StdRng::seed_from_u64(3);
    let mut game = fake_game(&mut rng, "W1", "2024-09-06", "Harbor", "Ridge", 60);
    let mut stray = game.player_stats[0].clone();
    stray.jersey_number = 999;
    game.player_stats.push(stray);

    let report = process_game(&path, &game, &config(&path, 2, DuplicateGamePolicy::default()))
        .unwrap();
    let failures = report.failures().collect::<Vec<_>>();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, 999);
    assert_eq!(report.succeeded(), game.player_stats.len() - 1);
}

fn concurrent_same_game(policy: DuplicateGamePolicy) -> (u32, f64, u32) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("stats.sqlite");
    seed(&path);

    // jersey 12 is the home quarterback in the demo roster
    let update = GameStatsUpdate {
        jersey_number: 12,
        game_key: "W1".to_string(),
        game_date: "2024-09-06".to_string(),
        home_team: "Harbor".to_string(),
        away_team: "Ridge".to_string(),
        stats: StatLine::new().with(StatField::PassingYards, 180.0),
    };

    let handles = (0..2)
        .map(|_| {
            let path = path.clone();
            let update = update.clone();
            thread::spawn(move || {
                let mut db = StatsDb::open(&path).unwrap();
                for _ in 0..5 {
                    update_game_stats(&mut db, &update, policy).unwrap();
                }
            })
        })
        .collect::<Vec<_>>();
    for handle in handles {
        handle.join().unwrap();
    }

    let db = StatsDb::open(&path).unwrap();
    let season = get_season_stats(&db, 1012, SEASON).unwrap();
    let career = get_career_stats(&db, 1012).unwrap();
    (
        season.games_played,
        season.stats.value(StatField::PassingYards),
        career.total_games_played,
    )
}

#[test]
fn concurrent_updates_do_not_lose_deltas() {
    let (games, yards, career_games) = concurrent_same_game(DuplicateGamePolicy::Reaccumulate);
    assert_eq!(games, 1);
    assert_eq!(career_games, 1);
    assert_eq!(yards, 180.0 * 10.0);
}

#[test]
fn concurrent_updates_under_skip_count_once() {
    let (games, yards, career_games) = concurrent_same_game(DuplicateGamePolicy::Skip);
    assert_eq!(games, 1);
    assert_eq!(career_games, 1);
    assert_eq!(yards, 180.0);
}
