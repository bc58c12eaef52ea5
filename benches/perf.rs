use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::hint::black_box;

use gridiron_stats::batch::process_game_sequential;
use gridiron_stats::config::DuplicateGamePolicy;
use gridiron_stats::fake_game::{fake_game, fake_players};
use gridiron_stats::ingest::{IngestedGame, parse_game_json};
use gridiron_stats::player::upsert_player;
use gridiron_stats::rankings::{RankingQuery, get_season_rankings};
use gridiron_stats::store::StatsDb;
use gridiron_stats::team_stats::analyze_team_stats;

fn sample_games(count: usize, plays: usize) -> Vec<IngestedGame> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..count)
        .map(|n| fake_game(&mut rng, &format!("B{n:03}"), "2024-09-06", "Harbor", "Ridge", plays))
        .collect()
}

fn seeded_db() -> StatsDb {
    let db = StatsDb::open_in_memory().unwrap();
    for player in fake_players("Bench", "2024") {
        upsert_player(&db, &player).unwrap();
    }
    db
}

fn bench_game_json_parse(c: &mut Criterion) {
    c.bench_function("game_json_parse", |b| {
        b.iter(|| {
            let game = parse_game_json(black_box(GAME_JSON)).unwrap();
            black_box(game.game.plays.len());
        })
    });
}

fn bench_team_stats(c: &mut Criterion) {
    let games = sample_games(8, 160);
    c.bench_function("team_stats_analyze", |b| {
        b.iter(|| {
            for game in &games {
                let stats = analyze_team_stats(black_box(&game.game));
                black_box(stats.home.total_yards + stats.away.total_yards);
            }
        })
    });
}

fn bench_process_game(c: &mut Criterion) {
    let games = sample_games(4, 140);
    c.bench_function("process_game_sequential", |b| {
        b.iter_batched(
            seeded_db,
            |mut db| {
                for game in &games {
                    let report =
                        process_game_sequential(&mut db, game, DuplicateGamePolicy::default());
                    black_box(report.succeeded());
                }
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_season_rankings(c: &mut Criterion) {
    let mut db = seeded_db();
    for game in &sample_games(10, 140) {
        process_game_sequential(&mut db, game, DuplicateGamePolicy::default());
    }
    let query = RankingQuery::default();

    c.bench_function("season_rankings", |b| {
        b.iter(|| {
            let rows = get_season_rankings(&db, "2024", "Bench", black_box(&query)).unwrap();
            black_box(rows.len());
        })
    });
}

criterion_group!(
    perf,
    bench_game_json_parse,
    bench_team_stats,
    bench_process_game,
    bench_season_rankings
);
criterion_main!(perf);

static GAME_JSON: &str = include_str!("../tests/fixtures/game_basic.json");
