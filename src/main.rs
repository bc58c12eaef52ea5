use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing::{error, info};

use gridiron_stats::batch;
use gridiron_stats::config::{EngineConfig, parse_db_path_arg};
use gridiron_stats::ingest;
use gridiron_stats::logging;

fn main() -> Result<()> {
    logging::init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut config = EngineConfig::from_env().context("load engine config")?;
    if let Some(path) = parse_db_path_arg(&args) {
        config = config.with_db_path(path);
    }

    let files = game_file_args(&args);
    if files.is_empty() {
        return Err(anyhow!(
            "usage: gridiron_stats <game.json>... [--db <stats.sqlite>]"
        ));
    }
    info!(db = %config.db_path.display(), games = files.len(), "ingesting games");

    let mut failed_games = 0usize;
    for file in &files {
        let ingested = match ingest::load_game_file(file) {
            Ok(game) => game,
            Err(err) => {
                error!(file = %file.display(), "{err:#}");
                failed_games += 1;
                continue;
            }
        };
        let report = batch::process_game(&config.db_path, &ingested, &config)
            .with_context(|| format!("process game {}", ingested.game.game_key))?;

        println!("Game {}", report.game_key);
        match &report.team_stats {
            Ok(pair) => println!(
                "  {} {} yds ({} TO) | {} {} yds ({} TO)",
                pair.home.team_name,
                pair.home.total_yards,
                pair.home.turnovers,
                pair.away.team_name,
                pair.away.total_yards,
                pair.away.turnovers
            ),
            Err(err) => println!("  team stats failed: {err}"),
        }
        println!(
            "  players: {}/{} updated",
            report.succeeded(),
            report.players.len()
        );
        for (jersey, err) in report.failures() {
            println!("   - #{jersey}: {err}");
        }
    }

    if failed_games > 0 {
        return Err(anyhow!("{failed_games} game file(s) could not be read"));
    }
    Ok(())
}

fn game_file_args(args: &[String]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--db" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        out.push(PathBuf::from(arg));
    }
    out
}
