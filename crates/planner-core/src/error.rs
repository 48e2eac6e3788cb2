//! Error types for planner-core operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Invalid UNTIL value '{value}': {source}")]
    InvalidUntil {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Invalid grid parameters: {0}")]
    InvalidGrid(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Expansion error: {0}")]
    Expansion(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
