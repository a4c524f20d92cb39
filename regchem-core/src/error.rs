//! Structured error types for the regchem workspace.

use thiserror::Error;

/// Unified error type for all regchem operations.
#[derive(Debug, Error)]
pub enum RegchemError {
    /// I/O error (law table not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON in a law table or configuration file
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Parse error (malformed SMILES or SMARTS)
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid input (bad arguments, out-of-range values)
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience alias used throughout the regchem workspace.
pub type Result<T> = std::result::Result<T, RegchemError>;
