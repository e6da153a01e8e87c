use super::*;

fn prod() -> PolicyContext {
    PolicyContext::new(Some("prod"), false)
}

#[test]
fn test_drop_blocked_in_prod() {
    let err = check_destructive("DROP TABLE users;", &prod()).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("ALLOW_DESTRUCTIVE"), "got: {msg}");
    assert!(msg.contains("deployment approval"));
    assert!(matches!(err, SqlError::PolicyViolation { .. }));
}

#[test]
fn test_truncate_blocked_any_case() {
    assert!(check_destructive("truncate table t;", &prod()).is_err());
    assert!(check_destructive("TrUnCaTe t;", &prod()).is_err());
}

#[test]
fn test_environment_name_case_insensitive() {
    let ctx = PolicyContext::new(Some("PROD"), false);
    assert!(check_destructive("drop view v;", &ctx).is_err());
}

#[test]
fn test_override_allows_destructive() {
    let ctx = PolicyContext::new(Some("prod"), true);
    assert!(check_destructive("DROP TABLE users;", &ctx).is_ok());
}

#[test]
fn test_non_protected_environment_not_scanned() {
    let ctx = PolicyContext::new(Some("dev"), false);
    assert!(check_destructive("DROP TABLE users;", &ctx).is_ok());
    assert!(check_destructive("DROP TABLE users;", &PolicyContext::default()).is_ok());
}

#[test]
fn test_whole_word_only() {
    let sql = "CREATE TABLE dropped_rows (backdrop INT); SELECT truncated FROM t;";
    assert!(check_destructive(sql, &prod()).is_ok());
}

#[test]
fn test_keyword_inside_literal_is_still_flagged() {
    // Lexical heuristic: literals are not excluded from the scan.
    let sql = "INSERT INTO audit VALUES ('please drop me');";
    assert!(check_destructive(sql, &prod()).is_err());
}

#[test]
fn test_find_destructive_dedupes_and_uppercases() {
    let found = find_destructive("drop a; DROP b; Truncate c;");
    assert_eq!(
        found.into_iter().collect::<Vec<_>>(),
        vec!["DROP", "TRUNCATE"]
    );
}
