use anyhow::{Context, Result, anyhow};

use gridiron_stats::config::{EngineConfig, parse_db_path_arg};
use gridiron_stats::logging;
use gridiron_stats::rankings::{self, DEFAULT_SORT, RankingQuery};
use gridiron_stats::store::StatsDb;

const VALUE_FLAGS: &[&str] = &["--position", "--sort", "--db"];

// rankings season <season> <league> [--position QB] [--sort passingYards] [--db path]
// rankings career [--position QB] [--sort totalYards] [--db path]
fn main() -> Result<()> {
    logging::init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut config = EngineConfig::from_env()?;
    if let Some(path) = parse_db_path_arg(&args) {
        config = config.with_db_path(path);
    }
    let db = StatsDb::open(&config.db_path)
        .with_context(|| format!("open {}", config.db_path.display()))?;

    let position = flag_value(&args, "--position");
    let sort_by = flag_value(&args, "--sort").unwrap_or_else(|| DEFAULT_SORT.to_string());
    let query = RankingQuery {
        position: position.as_deref(),
        sort_by: &sort_by,
        limit: config.rankings_limit,
    };

    let positional = args
        .iter()
        .enumerate()
        .filter(|(idx, arg)| {
            !arg.starts_with("--")
                && (*idx == 0 || !VALUE_FLAGS.contains(&args[idx - 1].as_str()))
        })
        .map(|(_, arg)| arg.as_str())
        .collect::<Vec<_>>();

    match positional.as_slice() {
        ["season", season, league] => {
            let rows = rankings::get_season_rankings(&db, season, league, &query)?;
            println!("Season {season} {league} by {sort_by}");
            for row in rows {
                println!(
                    "{:>3}. player {:<6} {:<4} {:>9.1}  ({} games)",
                    row.rank, row.player_id, row.position, row.value, row.record.games_played
                );
            }
        }
        ["career"] => {
            let rows = rankings::get_career_rankings(&db, &query)?;
            println!("Career (active) by {sort_by}");
            for row in rows {
                println!(
                    "{:>3}. player {:<6} {:<4} {:>9.1}  ({} seasons, best {} in {})",
                    row.rank,
                    row.player_id,
                    row.position,
                    row.value,
                    row.record.total_seasons,
                    row.record.best_season_yards,
                    row.record.best_season_year.as_deref().unwrap_or("n/a")
                );
            }
        }
        _ => {
            return Err(anyhow!(
                "usage: rankings season <season> <league> | rankings career [--position P] [--sort METRIC]"
            ));
        }
    }
    Ok(())
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix)
            && !raw.trim().is_empty()
        {
            return Some(raw.trim().to_string());
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
