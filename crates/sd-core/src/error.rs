//! Error types for sd-core

use thiserror::Error;

/// Core error type for sqldeploy
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Required environment variable is missing or blank
    #[error("[C001] Missing environment variable: {name}")]
    MissingEnv { name: String },

    /// C002: Environment variable present but unusable
    #[error("[C002] Invalid value for {name}: '{value}' ({reason})")]
    InvalidEnv {
        name: String,
        value: String,
        reason: String,
    },

    /// P001: SQL path is neither a script file nor a directory
    #[error("[P001] Path not found: {path}")]
    PathNotFound { path: String },

    /// P002: Explicit execution order names files that do not exist
    #[error("[P002] execution_order references missing files: {}", missing.join(", "))]
    MissingOrderEntries { missing: Vec<String> },

    /// P003: Discovery resolved zero script files
    #[error("[P003] No SQL files discovered in {path}")]
    EmptyPlan { path: String },

    /// E001: IO error
    #[error("[E001] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E002: IO error with file path context
    #[error("[E002] Failed to access '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
