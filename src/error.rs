use thiserror::Error;

use crate::models::StoreKind;

/// Main error type for quintet operations
#[derive(Error, Debug)]
pub enum QuintetError {
    #[error("Out of memory while inserting into {store}")]
    OutOfMemory { store: StoreKind },

    #[error("Invalid input token: {0:?}")]
    InvalidInput(String),

    #[error("Key already present: {0}")]
    KeyAlreadyPresent(u64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Result type alias for quintet operations
pub type Result<T> = std::result::Result<T, QuintetError>;

impl QuintetError {
    /// Whether this error aborts an ingestion pass
    pub fn is_fatal(&self) -> bool {
        !matches!(self, QuintetError::KeyAlreadyPresent(_))
    }

    /// Negative errno-style code surfaced to the process
    pub fn errno(&self) -> i32 {
        match self {
            QuintetError::OutOfMemory { .. } => -12,
            QuintetError::KeyAlreadyPresent(_) => -17,
            QuintetError::InvalidInput(_) | QuintetError::InvalidConfig(_) => -22,
            QuintetError::Io(_) => -5,
            QuintetError::Serialization(_) | QuintetError::Metrics(_) => -22,
        }
    }
}
