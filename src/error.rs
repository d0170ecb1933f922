//! Error kinds surfaced by the kiosk core. The UI layer wraps these in
//! `anyhow` with context, but the variants stay distinct so callers can tell a
//! fatal load failure apart from a recoverable store or input problem.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias for results produced by the library modules.
pub type KioskResult<T> = Result<T, KioskError>;

#[derive(Debug, Error)]
pub enum KioskError {
    /// The source dataset is missing or malformed. Fatal at startup.
    #[error("failed to load dataset {path}: {reason}")]
    Load { path: PathBuf, reason: String },

    /// Connection failure, constraint violation, or any other SQLite error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Credential mismatch. Never fatal; the gate simply stays locked.
    #[error("{0}")]
    Auth(String),

    /// Operator input that cannot be turned into a valid value.
    #[error("{0}")]
    Input(String),

    /// Configuration file problems.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl KioskError {
    pub(crate) fn load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        KioskError::Load {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn input(message: impl Into<String>) -> Self {
        KioskError::Input(message.into())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Health centre {0} already exists.")]
    Duplicate(String),

    #[error("Health centre {0} not found.")]
    NotFound(String),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
