//! Error types shared across the retrieval engine.

use thiserror::Error;

/// Errors raised while building, querying or evaluating an index.
#[derive(Debug, Error)]
pub enum IrError {
    /// Invalid combination of options, e.g. pivoting without normalization.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Unknown term, query string or query id during inspection.
    #[error("not found: {0}")]
    NotFound(String),
    /// Precision requested at depth 0.
    #[error("precision depth must be at least 1")]
    ZeroDepth,
    /// Pivot regression could not be solved.
    #[error("calibration failed: {0}")]
    Calibration(String),
    /// Input that could not be parsed at all.
    #[error("parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IrError>;
