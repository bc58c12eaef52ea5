use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use gridiron_stats::config::{EngineConfig, parse_db_path_arg};
use gridiron_stats::export;
use gridiron_stats::logging;
use gridiron_stats::rankings::{DEFAULT_SORT, RankingQuery};
use gridiron_stats::store::StatsDb;

// export_rankings <season> <league> [out.xlsx] [--db path]
fn main() -> Result<()> {
    logging::init_tracing();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let mut config = EngineConfig::from_env()?;
    if let Some(path) = parse_db_path_arg(&args) {
        config = config.with_db_path(path);
    }

    let mut positional = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--db" {
            iter.next();
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        positional.push(arg.as_str());
    }
    let (season, league) = match positional.as_slice() {
        [season, league, ..] => (*season, *league),
        _ => return Err(anyhow!("usage: export_rankings <season> <league> [out.xlsx]")),
    };
    let out = positional
        .get(2)
        .map(|p| PathBuf::from(*p))
        .unwrap_or_else(|| PathBuf::from(format!("rankings_{season}_{league}.xlsx")));

    let sort_by = std::env::var("RANKINGS_SORT").unwrap_or_else(|_| DEFAULT_SORT.to_string());
    let query = RankingQuery {
        position: None,
        sort_by: &sort_by,
        limit: config.rankings_limit,
    };

    let db = StatsDb::open(&config.db_path)
        .with_context(|| format!("open {}", config.db_path.display()))?;
    let report = export::export_rankings(&db, &out, season, league, &query)?;

    println!("Wrote {}", out.display());
    println!(
        "Season rows: {}  Career rows: {}",
        report.season_rows, report.career_rows
    );
    Ok(())
}
