//! Statement splitting
//!
//! Splits a script into statements on `;`, ignoring terminators inside
//! single-quoted literals. A backslash escapes the next character's quote
//! handling. This is a lexical split, not a SQL grammar: double-quoted
//! identifiers, dollar-quoted bodies and comments get no special treatment,
//! so a `;` inside any of those still ends a statement.

/// Statement terminator
pub const TERMINATOR: char = ';';

/// Split `sql` into trimmed, non-empty statements, in source order.
///
/// Trailing text without a terminator is returned as a final statement.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_literal = false;
    let mut escaped = false;

    for ch in sql.chars() {
        if ch == '\'' && !escaped {
            in_literal = !in_literal;
        }

        if ch == TERMINATOR && !in_literal {
            push_statement(&mut statements, &current);
            current.clear();
        } else {
            current.push(ch);
        }

        escaped = ch == '\\' && !escaped;
    }

    push_statement(&mut statements, &current);
    statements
}

fn push_statement(statements: &mut Vec<String>, buffer: &str) {
    let stmt = buffer.trim();
    if !stmt.is_empty() {
        statements.push(stmt.to_string());
    }
}

#[cfg(test)]
#[path = "segment_test.rs"]
mod tests;
