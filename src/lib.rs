pub mod batch;
pub mod classifier;
pub mod config;
pub mod error;
pub mod export;
pub mod fake_game;
pub mod ingest;
pub mod logging;
pub mod play;
pub mod player;
pub mod player_stats;
pub mod rankings;
pub mod stat_fields;
pub mod store;
pub mod team_stats;

pub use error::{Result, StatsError};
