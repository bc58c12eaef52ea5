use std::env;
use std::path::PathBuf;

use crate::error::{Result, StatsError};

const DATA_DIR: &str = "gridiron_stats";
const DB_FILE: &str = "stats.sqlite";
const DEFAULT_WORKERS: usize = 8;
pub const DEFAULT_RANKINGS_LIMIT: usize = 50;

/// What to do with a stat delta whose game key is already recorded on the
/// season tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicateGamePolicy {
    /// Keep `gamesPlayed` gated but add the delta again.
    #[default]
    Reaccumulate,
    /// Leave season and career totals untouched for a known game key.
    Skip,
}

impl DuplicateGamePolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reaccumulate" | "accumulate" | "readd" => Some(Self::Reaccumulate),
            "skip" | "ignore" => Some(Self::Skip),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub db_path: PathBuf,
    pub workers: usize,
    pub rankings_limit: usize,
    pub duplicate_policy: DuplicateGamePolicy,
}

impl EngineConfig {
    /// Loads `.env.local` / `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");

        let db_path = match env::var("STATS_DB_PATH") {
            Ok(raw) if !raw.trim().is_empty() => PathBuf::from(raw.trim()),
            _ => default_db_path().ok_or_else(|| {
                StatsError::Config("unable to resolve a data directory for the stats db".into())
            })?,
        };

        let duplicate_policy = match env::var("DUPLICATE_GAME_POLICY") {
            Ok(raw) if !raw.trim().is_empty() => DuplicateGamePolicy::parse(&raw).ok_or_else(
                || StatsError::Config(format!("invalid DUPLICATE_GAME_POLICY: {raw}")),
            )?,
            _ => DuplicateGamePolicy::default(),
        };

        Ok(Self {
            db_path,
            workers: worker_parallelism(),
            rankings_limit: rankings_limit(),
            duplicate_policy,
        })
    }

    pub fn with_db_path(mut self, path: PathBuf) -> Self {
        self.db_path = path;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path().unwrap_or_else(|| PathBuf::from(DB_FILE)),
            workers: DEFAULT_WORKERS,
            rankings_limit: DEFAULT_RANKINGS_LIMIT,
            duplicate_policy: DuplicateGamePolicy::default(),
        }
    }
}

pub fn default_db_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(DB_FILE))
}

pub fn app_data_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_DATA_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(DATA_DIR));
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(DATA_DIR),
    )
}

fn worker_parallelism() -> usize {
    env::var("STATS_WORKERS")
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(DEFAULT_WORKERS)
        .clamp(1, 64)
}

fn rankings_limit() -> usize {
    env::var("RANKINGS_LIMIT")
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(DEFAULT_RANKINGS_LIMIT)
        .clamp(1, 500)
}

/// `--db <path>` or `--db=<path>` from the command line.
pub fn parse_db_path_arg(args: &[String]) -> Option<PathBuf> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_policy_parses_aliases() {
        assert_eq!(
            DuplicateGamePolicy::parse(" Skip "),
            Some(DuplicateGamePolicy::Skip)
        );
        assert_eq!(
            DuplicateGamePolicy::parse("reaccumulate"),
            Some(DuplicateGamePolicy::Reaccumulate)
        );
        assert_eq!(DuplicateGamePolicy::parse("sometimes"), None);
    }

    #[test]
    fn db_arg_accepts_both_forms() {
        let args = vec!["--db=/tmp/a.sqlite".to_string()];
        assert_eq!(parse_db_path_arg(&args), Some(PathBuf::from("/tmp/a.sqlite")));
        let args = vec!["game.json".to_string(), "--db".to_string(), "b.sqlite".to_string()];
        assert_eq!(parse_db_path_arg(&args), Some(PathBuf::from("b.sqlite")));
        assert_eq!(parse_db_path_arg(&["--db".to_string()]), None);
    }
}
