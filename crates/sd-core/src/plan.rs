//! Script discovery and execution planning
//!
//! Resolves a user-supplied path into an ordered, non-empty list of script
//! files. Every file is checked for existence and readability here, before
//! any connection is opened, so a bad path never reaches the database.

use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// File extension recognised as a SQL script (compared case-insensitively)
pub const SCRIPT_EXTENSION: &str = ".sql";

/// How the file list of a plan was determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanMode {
    /// The path named one script file
    SingleFile,
    /// A directory plus an explicit comma-separated order
    ExplicitFolderOrder,
    /// A directory scanned and sorted by numeric prefix
    AutoFolderOrder,
}

impl fmt::Display for PlanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanMode::SingleFile => write!(f, "single_file"),
            PlanMode::ExplicitFolderOrder => write!(f, "explicit_folder_order"),
            PlanMode::AutoFolderOrder => write!(f, "auto_folder_order"),
        }
    }
}

/// Ordered set of scripts to run in one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    mode: PlanMode,
    files: Vec<PathBuf>,
}

impl ExecutionPlan {
    /// Build a plan, rejecting an empty file list.
    ///
    /// Each path is made absolute and opened once to prove it is readable.
    pub fn new(mode: PlanMode, files: Vec<PathBuf>, source: &Path) -> CoreResult<Self> {
        if files.is_empty() {
            return Err(CoreError::EmptyPlan {
                path: source.display().to_string(),
            });
        }

        let files = files
            .into_iter()
            .map(|path| {
                fs::File::open(&path)
                    .and_then(|_| fs::canonicalize(&path))
                    .map_err(|source| CoreError::IoWithPath {
                        path: path.display().to_string(),
                        source,
                    })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Self { mode, files })
    }

    pub fn mode(&self) -> PlanMode {
        self.mode
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// True if `name` ends with the script extension, ignoring case.
pub fn is_script_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(SCRIPT_EXTENSION)
}

/// Resolve `sql_path` (and an optional explicit order) into an execution plan.
///
/// - A script file yields a [`PlanMode::SingleFile`] plan.
/// - A directory with a non-blank `execution_order` yields the listed files
///   in the listed order; all missing names are reported together.
/// - A directory without an order is scanned via [`discover_from_folder`].
/// - Anything else is [`CoreError::PathNotFound`].
pub fn plan(sql_path: &str, execution_order: Option<&str>) -> CoreResult<ExecutionPlan> {
    let trimmed = sql_path.trim();
    let path = Path::new(trimmed);

    if path.is_file() && is_script_name(trimmed) {
        return ExecutionPlan::new(PlanMode::SingleFile, vec![path.to_path_buf()], path);
    }

    if !path.is_dir() {
        return Err(CoreError::PathNotFound {
            path: trimmed.to_string(),
        });
    }

    match execution_order.filter(|order| !order.trim().is_empty()) {
        Some(order) => {
            let files = resolve_execution_order(path, order)?;
            ExecutionPlan::new(PlanMode::ExplicitFolderOrder, files, path)
        }
        None => {
            let files = discover_from_folder(path)?;
            ExecutionPlan::new(PlanMode::AutoFolderOrder, files, path)
        }
    }
}

/// Resolve a comma-separated list of file names against `folder`.
///
/// Whitespace around names is trimmed and empty entries are dropped.
pub fn resolve_execution_order(folder: &Path, order_csv: &str) -> CoreResult<Vec<PathBuf>> {
    let names: Vec<&str> = order_csv
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .collect();

    let missing: Vec<String> = names
        .iter()
        .filter(|name| !folder.join(name).is_file())
        .map(|name| name.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(CoreError::MissingOrderEntries { missing });
    }

    Ok(names.into_iter().map(|name| folder.join(name)).collect())
}

/// List script files in `folder`, sorted by numeric prefix then name.
///
/// The numeric prefix is the run of digits before the first `_`
/// (`010_users.sql` -> 10). Files without one sort after every numbered
/// file. Ties are broken by case-insensitive file name.
pub fn discover_from_folder(folder: &Path) -> CoreResult<Vec<PathBuf>> {
    let entries = fs::read_dir(folder).map_err(|source| CoreError::IoWithPath {
        path: folder.display().to_string(),
        source,
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_script_name(&name) && entry.path().is_file() {
            names.push(name);
        } else {
            log::debug!("Skipping non-script entry: {}", name);
        }
    }

    names.sort_by(|a, b| compare_script_names(a, b));
    Ok(names.into_iter().map(|name| folder.join(name)).collect())
}

/// Numeric prefix of a script name, if it has one.
fn numeric_prefix(name: &str) -> Option<u64> {
    let head = name.split('_').next().unwrap_or_default();
    if head.is_empty() || !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Prefixes too large for u64 still count as numbered, sorted last among them.
    Some(head.parse::<u64>().unwrap_or(u64::MAX))
}

fn compare_script_names(a: &str, b: &str) -> Ordering {
    let by_prefix = match (numeric_prefix(a), numeric_prefix(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_prefix.then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
