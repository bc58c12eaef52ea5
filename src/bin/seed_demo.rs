use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use rand::SeedableRng;
use rand::rngs::StdRng;

use gridiron_stats::batch;
use gridiron_stats::config::{EngineConfig, parse_db_path_arg};
use gridiron_stats::fake_game::{fake_game, fake_players};
use gridiron_stats::logging;
use gridiron_stats::player::upsert_player;
use gridiron_stats::store::StatsDb;

const DEFAULT_GAMES: usize = 10;
const PLAYS_PER_GAME: usize = 130;

/// Seeds a roster and a run of synthetic games into the configured database.
fn main() -> Result<()> {
    logging::init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut config = EngineConfig::from_env()?;
    if let Some(path) = parse_db_path_arg(&args) {
        config = config.with_db_path(path);
    }
    let games = std::env::var("DEMO_GAMES")
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(DEFAULT_GAMES)
        .clamp(1, 200);
    let seed = std::env::var("DEMO_SEED")
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(26);
    let season = std::env::var("DEMO_SEASON").unwrap_or_else(|_| "2024".to_string());
    let league = std::env::var("DEMO_LEAGUE").unwrap_or_else(|_| "Demo".to_string());

    let db = StatsDb::open(&config.db_path)
        .with_context(|| format!("open {}", config.db_path.display()))?;
    for player in fake_players(&league, &season) {
        upsert_player(&db, &player)?;
    }
    drop(db);

    let mut rng = StdRng::seed_from_u64(seed);
    let opener = NaiveDate::from_ymd_opt(2024, 9, 6).context("valid season opener")?;
    for week in 0..games {
        let date = opener + Duration::weeks(week as i64);
        let key = format!("{season}-W{:02}", week + 1);
        let game = fake_game(&mut rng, &key, &date.to_string(), "Harbor", "Ridge", PLAYS_PER_GAME);
        let report = batch::process_game(&config.db_path, &game, &config)?;
        println!(
            "{}: players {}/{}",
            report.game_key,
            report.succeeded(),
            report.players.len()
        );
    }
    println!("Seeded {games} games into {}", config.db_path.display());
    Ok(())
}
