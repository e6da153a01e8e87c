//! Shared utilities for CLI commands

use sd_core::{ScriptResult, ScriptStatus};
use std::fmt;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; nothing user-facing to print.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// One console progress line for a recorded script result.
pub(crate) fn format_result_line(result: &ScriptResult) -> String {
    match result.status {
        ScriptStatus::Success => format!(
            "  \u{2713} {} ({} statements, {} rows) [{}ms]",
            result.file_name, result.statement_count, result.rows_affected_total, result.elapsed_ms
        ),
        ScriptStatus::Skipped => format!("  - {} (skipped)", result.file_name),
        ScriptStatus::Failed => format!("  \u{2717} {} - {}", result.file_name, result.message),
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
