//! `{{VAR}}` placeholder substitution
//!
//! Placeholders are upper-snake names (`A-Z`, `0-9`, `_`) wrapped in double
//! braces. Values come from a caller-supplied lookup, normally the process
//! environment. Substitution is a single textual pass: substituted values are
//! never rescanned for further placeholders.

use crate::error::{SqlError, SqlResult};
use regex::{Captures, Regex};
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

static PLACEHOLDER_RE: OnceLock<Regex> = OnceLock::new();

fn placeholder_re() -> &'static Regex {
    PLACEHOLDER_RE.get_or_init(|| Regex::new(r"\{\{([A-Z0-9_]+)\}\}").expect("valid regex"))
}

/// Distinct placeholder names referenced in `sql`, sorted.
pub fn referenced_variables(sql: &str) -> BTreeSet<String> {
    placeholder_re()
        .captures_iter(sql)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Replace every `{{VAR}}` in `sql` with `lookup(VAR)`.
///
/// All referenced names are resolved before any replacement happens; if any
/// are missing the error lists every one of them in sorted order. An empty
/// value is a valid substitution.
pub fn substitute_placeholders(
    sql: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> SqlResult<String> {
    let mut values = HashMap::new();
    let mut missing = Vec::new();

    for name in referenced_variables(sql) {
        match lookup(&name) {
            Some(value) => {
                values.insert(name, value);
            }
            None => missing.push(name),
        }
    }

    if !missing.is_empty() {
        return Err(SqlError::MissingTemplateVariables { names: missing });
    }

    let rendered = placeholder_re().replace_all(sql, |caps: &Captures| {
        values.get(&caps[1]).cloned().unwrap_or_default()
    });
    Ok(rendered.into_owned())
}

#[cfg(test)]
#[path = "template_test.rs"]
mod tests;
