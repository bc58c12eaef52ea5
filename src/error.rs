use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatsError>;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("player not found for jersey number {0}")]
    PlayerNotFound(u32),

    /// A record that a read-only path expects to exist is absent.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unknown ranking metric: {0}")]
    UnknownMetric(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("document encoding error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
