use std::path::PathBuf;
use thiserror::Error;

/// Failures of the key-value store behind the tracker.
///
/// None of these ever reach the user: a failed read falls back to a fresh
/// day, a failed write is logged and dropped.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse data file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("writer for {path} has stopped")]
    WriterClosed { path: PathBuf },

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt(message.into())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

impl ConfigError {
    pub fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}
