// src/error.rs
//! Error taxonomy shared by the analytics engine.
//!
//! Data-sufficiency problems in non-critical aggregates (frequency tables, topics,
//! entities) are *not* errors: those functions return empty values. Only operations
//! that cannot produce any meaningful output return `Err`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// An operation needs lyrics/records for an artist and there are none.
    #[error("insufficient data for '{artist}': {what}")]
    InsufficientData { artist: String, what: String },

    /// Fewer than two distinct artists could be resolved for a comparison.
    #[error("insufficient selection: {0}")]
    InsufficientSelection(String),

    /// A single lyric failed sanitization. Recovered locally by callers.
    #[error("malformed text: {reason}")]
    MalformedText { reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnalysisError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedText {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
