//! Error types for sd-sql

use thiserror::Error;

/// Errors raised while preparing a script's SQL text for execution
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlError {
    /// One or more `{{VAR}}` placeholders have no value in the environment (S001)
    #[error("[S001] Missing template variables in environment: {}", names.join(", "))]
    MissingTemplateVariables { names: Vec<String> },

    /// Destructive statement blocked in the protected environment (S002)
    #[error("[S002] Policy block: destructive statements ({keywords}) not allowed in {environment}. Set {override_var}=true to override with deployment approval.")]
    PolicyViolation {
        keywords: String,
        environment: String,
        override_var: String,
    },
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;
