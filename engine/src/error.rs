//! FILENAME: engine/src/error.rs

use thiserror::Error;

/// Errors surfaced by the core. All of them are local and recoverable:
/// the offending row or fragment is skipped and processing continues.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("expression error in row {row}: {message}")]
    Expression { row: usize, message: String },

    #[error("column not found: {0}")]
    UnresolvedColumn(String),

    #[error("malformed interval in group {key}: from {from} > to {to}")]
    MalformedInterval { key: String, from: f64, to: f64 },
}
