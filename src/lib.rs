//! # Practica - Practice-Tracking Service
//!
//! Relational schema for musical practice tracking, exposed over a CRUD
//! HTTP API.
//!
//! Practica provides:
//! - Polymorphic instrument and tuning hierarchies (joined base + variant tables)
//! - Exercises with per-exercise rolling state and technique/overload links
//! - Practice sessions with ordered exercise instances and completion logs
//! - SQLite-backed storage with a transactional unit-of-work per operation
//! - axum HTTP server mapping storage errors onto response statuses

pub mod config;
pub mod model;
pub mod server;
pub mod storage;

// Re-exports for convenient access
pub use model::instrument::{Instrument, InstrumentDetail, InstrumentKind};
pub use model::practice::{ExerciseInstance, ExerciseLog, Practice};
pub use model::tuning::{Tuning, TuningDetail};
pub use storage::Store;

/// Result type alias for Practica operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Practica operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Lookup by primary key returned no row. Mapped to 404 by the HTTP layer.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness, foreign-key, or cardinality invariant was rejected by
    /// the storage engine. The enclosing transaction is rolled back in full.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// A stored value could not be mapped back to its in-memory type
    /// (unrecognized enum string, malformed JSON column, orphaned variant row).
    #[error("Decoding failure: {0}")]
    Decoding(String),

    #[error("Storage error: {0}")]
    Storage(rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        // SQLITE_CONSTRAINT covers UNIQUE, FOREIGN KEY and CHECK failures;
        // everything else stays a storage error.
        if let rusqlite::Error::SqliteFailure(code, ref msg) = err {
            if code.code == rusqlite::ErrorCode::ConstraintViolation {
                let detail = msg
                    .clone()
                    .unwrap_or_else(|| "constraint violation".to_string());
                return Error::Constraint(detail);
            }
        }
        Error::Storage(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decoding(err.to_string())
    }
}
