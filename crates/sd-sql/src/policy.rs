//! Destructive-statement policy gate
//!
//! In the protected environment, and unless the override is set, a script
//! whose fully substituted text contains `DROP` or `TRUNCATE` as a whole word
//! (any case) is rejected before any of its statements run.
//!
//! The scan is a lexical heuristic over the whole text. It matches keywords
//! inside string literals and comments too, and it does not understand
//! statements that hide a keyword behind unusual quoting.

use crate::error::{SqlError, SqlResult};
use regex::Regex;
use sd_core::config::ENV_ALLOW_DESTRUCTIVE;
use sd_core::PolicyContext;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Keywords that denote irreversible schema or data operations
pub const DESTRUCTIVE_KEYWORDS: &[&str] = &["DROP", "TRUNCATE"];

static DESTRUCTIVE_RE: OnceLock<Regex> = OnceLock::new();

fn destructive_re() -> &'static Regex {
    DESTRUCTIVE_RE.get_or_init(|| {
        let pattern = format!(r"(?i)\b({})\b", DESTRUCTIVE_KEYWORDS.join("|"));
        Regex::new(&pattern).expect("valid regex")
    })
}

/// Destructive keywords present in `sql`, upper-cased and deduplicated.
pub fn find_destructive(sql: &str) -> BTreeSet<String> {
    destructive_re()
        .find_iter(sql)
        .map(|m| m.as_str().to_ascii_uppercase())
        .collect()
}

/// Reject `sql` if the policy gates destructive statements and any are present.
///
/// Outside the protected environment, or with the override set, no scan runs.
pub fn check_destructive(sql: &str, ctx: &PolicyContext) -> SqlResult<()> {
    if !ctx.gates_destructive() {
        return Ok(());
    }

    let found = find_destructive(sql);
    if found.is_empty() {
        return Ok(());
    }

    log::debug!("Policy gate matched keywords: {:?}", found);
    Err(SqlError::PolicyViolation {
        keywords: DESTRUCTIVE_KEYWORDS.join("/"),
        environment: ctx.environment_name.clone().unwrap_or_default(),
        override_var: ENV_ALLOW_DESTRUCTIVE.to_string(),
    })
}

#[cfg(test)]
#[path = "policy_test.rs"]
mod tests;
