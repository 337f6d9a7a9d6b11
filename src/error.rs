//! Error types for modroll
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in modroll
#[derive(Debug, Error)]
pub enum RollError {
    /// Invalid run configuration, rejected before a run starts
    #[error("Configuration error: {0}")]
    Config(String),

    /// A run was started while another one is still active
    #[error("An automation loop is already running")]
    LoopActive,

    /// Modifier catalog could not be read or parsed
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// The scripted action collaborator failed
    #[error("Action error: {0}")]
    Action(String),

    /// The text source could not produce a snapshot
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// The background worker task panicked or was aborted
    #[error("Worker error: {0}")]
    Worker(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parse error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for modroll operations
pub type Result<T> = std::result::Result<T, RollError>;
