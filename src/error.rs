use std::io;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid tier in stored record: {0}")]
    InvalidTier(String),

    #[error("invalid timestamp in stored record: {0}")]
    InvalidTimestamp(#[from] chrono::ParseError),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum TextError {
    #[error("no embedded word list named {0}")]
    UnknownWordList(String),

    #[error("invalid word list: {0}")]
    Json(#[from] serde_json::Error),
}
