use thiserror::Error;

/// Errors raised by the collaborators around the simulator core.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Claim record not found: {0}")]
    RecordNotFound(String),

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
