//! Single-script execution: read, substitute, gate, segment, then run each
//! statement on the batch's shared connection.

use anyhow::{Context, Result};
use sd_core::{PolicyContext, ScriptResult};
use sd_db::Database;
use sd_sql::{check_destructive, split_statements, substitute_placeholders};
use std::path::Path;
use std::time::Instant;

/// Name a script is reported under in progress lines and evidence.
pub(crate) fn script_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Execute one script inside the caller's open transaction.
///
/// Template and policy failures abort before any statement is sent. The
/// first statement failure aborts the rest of the file and is returned to
/// the caller; transaction control stays with the caller.
pub(crate) async fn execute_file(
    db: &dyn Database,
    path: &Path,
    policy: &PolicyContext,
    lookup: &dyn Fn(&str) -> Option<String>,
) -> Result<ScriptResult> {
    let name = script_name(path);

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let sql = substitute_placeholders(&raw, lookup)?;
    check_destructive(&sql, policy)?;

    let statements = split_statements(&sql);
    if statements.is_empty() {
        log::debug!("{}: no statements, skipping", name);
        return Ok(ScriptResult::skipped(name));
    }

    let total = statements.len();
    let start = Instant::now();
    let mut rows_affected: u64 = 0;

    for (idx, statement) in statements.iter().enumerate() {
        log::debug!("{}: statement {}/{}", name, idx + 1, total);
        let rows = db
            .execute(statement)
            .await
            .with_context(|| format!("Statement {} of {} failed", idx + 1, total))?;
        rows_affected += rows.unwrap_or(0);
    }

    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(ScriptResult::success(name, total, rows_affected, elapsed_ms))
}

#[cfg(test)]
#[path = "execute_test.rs"]
mod tests;
