use super::*;
use std::collections::HashMap;

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name: &str| map.get(name).cloned()
}

fn full_connection_env() -> Vec<(&'static str, &'static str)> {
    vec![
        (ENV_HOST, "cluster.example.com"),
        (ENV_DATABASE, "analytics"),
        (ENV_USER, "deployer"),
        (ENV_PASSWORD, "hunter2"),
    ]
}

#[test]
fn test_connection_settings_defaults_port() {
    let settings = ConnectionSettings::from_env(env_of(&full_connection_env())).unwrap();
    assert_eq!(settings.host, "cluster.example.com");
    assert_eq!(settings.port, 5439);
    assert_eq!(settings.database, "analytics");
    assert_eq!(settings.user, "deployer");
}

#[test]
fn test_connection_settings_custom_port() {
    let mut vars = full_connection_env();
    vars.push((ENV_PORT, "5440"));
    let settings = ConnectionSettings::from_env(env_of(&vars)).unwrap();
    assert_eq!(settings.port, 5440);
}

#[test]
fn test_connection_settings_names_first_missing_variable() {
    let vars = vec![(ENV_HOST, "h"), (ENV_USER, "u")];
    let err = ConnectionSettings::from_env(env_of(&vars)).unwrap_err();
    assert!(matches!(err, CoreError::MissingEnv { ref name } if name == ENV_DATABASE));
    assert!(err.to_string().contains("REDSHIFT_DB"), "got: {err}");
}

#[test]
fn test_connection_settings_blank_is_missing() {
    let mut vars = full_connection_env();
    vars.retain(|(k, _)| *k != ENV_PASSWORD);
    vars.push((ENV_PASSWORD, "   "));
    let err = ConnectionSettings::from_env(env_of(&vars)).unwrap_err();
    assert!(err.to_string().contains("REDSHIFT_PASSWORD"));
}

#[test]
fn test_connection_settings_rejects_bad_port() {
    let mut vars = full_connection_env();
    vars.push((ENV_PORT, "not-a-port"));
    let err = ConnectionSettings::from_env(env_of(&vars)).unwrap_err();
    assert!(matches!(err, CoreError::InvalidEnv { ref name, .. } if name == ENV_PORT));
}

#[test]
fn test_connection_settings_debug_redacts_password() {
    let settings = ConnectionSettings::from_env(env_of(&full_connection_env())).unwrap();
    let debug = format!("{:?}", settings);
    assert!(!debug.contains("hunter2"));
    assert!(debug.contains("<redacted>"));
}

#[test]
fn test_retry_policy_defaults() {
    let policy = RetryPolicy::from_env(env_of(&[])).unwrap();
    assert_eq!(policy, RetryPolicy::default());
    assert_eq!(policy.attempts, 3);
    assert_eq!(policy.delay, Duration::from_millis(1500));
}

#[test]
fn test_retry_policy_from_env() {
    let policy = RetryPolicy::from_env(env_of(&[
        (ENV_CONNECT_RETRIES, "5"),
        (ENV_CONNECT_RETRY_DELAY, "0.25"),
    ]))
    .unwrap();
    assert_eq!(policy.attempts, 5);
    assert_eq!(policy.delay, Duration::from_millis(250));
}

#[test]
fn test_retry_policy_clamps_to_one_attempt() {
    let policy = RetryPolicy::from_env(env_of(&[(ENV_CONNECT_RETRIES, "0")])).unwrap();
    assert_eq!(policy.attempts, 1);
}

#[test]
fn test_retry_policy_rejects_negative_delay() {
    let err = RetryPolicy::from_env(env_of(&[(ENV_CONNECT_RETRY_DELAY, "-1")])).unwrap_err();
    assert!(matches!(
        err,
        CoreError::InvalidEnv { ref name, .. } if name == ENV_CONNECT_RETRY_DELAY
    ));
}

#[test]
fn test_policy_context_protected_case_insensitive() {
    let ctx = PolicyContext::from_env(env_of(&[(ENV_ENVIRONMENT, "PROD")]));
    assert!(ctx.is_protected());
    assert!(ctx.gates_destructive());
}

#[test]
fn test_policy_context_override() {
    let ctx = PolicyContext::from_env(env_of(&[
        (ENV_ENVIRONMENT, "prod"),
        (ENV_ALLOW_DESTRUCTIVE, "True"),
    ]));
    assert!(ctx.allow_destructive);
    assert!(!ctx.gates_destructive());
}

#[test]
fn test_policy_context_override_requires_literal_true() {
    let ctx = PolicyContext::from_env(env_of(&[
        (ENV_ENVIRONMENT, "prod"),
        (ENV_ALLOW_DESTRUCTIVE, "yes"),
    ]));
    assert!(!ctx.allow_destructive);
    assert!(ctx.gates_destructive());
}

#[test]
fn test_policy_context_non_prod_never_gates() {
    assert!(!PolicyContext::new(Some("dev"), false).gates_destructive());
    assert!(!PolicyContext::new(None, false).gates_destructive());
    assert!(!PolicyContext::new(Some("production"), false).gates_destructive());
}

#[test]
fn test_target_kind_parse() {
    assert_eq!("duckdb".parse::<TargetKind>(), Ok(TargetKind::DuckDb));
    assert_eq!("Redshift".parse::<TargetKind>(), Ok(TargetKind::Redshift));
    assert!("postgres".parse::<TargetKind>().is_err());
}

#[test]
fn test_duckdb_path_default() {
    assert_eq!(duckdb_path(env_of(&[])), ":memory:");
    assert_eq!(
        duckdb_path(env_of(&[(ENV_DUCKDB_PATH, "/tmp/w.duckdb")])),
        "/tmp/w.duckdb"
    );
}

#[test]
fn test_env_summary_redacts_and_truncates() {
    let summary = env_summary(
        env_of(&[
            (ENV_ENVIRONMENT, "prod"),
            (ENV_SCHEMA_NAME, "analytics"),
            (ENV_PASSWORD, "hunter2"),
            ("GITHUB_SHA", "0123456789abcdef0123"),
        ]),
        TargetKind::Redshift,
    );
    assert_eq!(summary.get("ENVIRONMENT").map(String::as_str), Some("prod"));
    assert_eq!(
        summary.get("SCHEMA_NAME").map(String::as_str),
        Some("analytics")
    );
    assert_eq!(
        summary.get("git_sha").map(String::as_str),
        Some("0123456789ab")
    );
    assert_eq!(summary.get("target").map(String::as_str), Some("redshift"));
    assert!(summary.values().all(|v| v != "hunter2"));
}

#[test]
fn test_env_summary_falls_back_to_other_ci_revision() {
    let summary = env_summary(env_of(&[("CI_COMMIT_SHA", "abc")]), TargetKind::DuckDb);
    assert_eq!(summary.get("git_sha").map(String::as_str), Some("abc"));
    assert!(!summary.contains_key("ENVIRONMENT"));
}

// This test reads the real process environment and must run serially
use serial_test::serial;

#[test]
#[serial]
fn test_process_env_reads_real_environment() {
    let original = std::env::var(ENV_SCHEMA_NAME).ok();
    std::env::set_var(ENV_SCHEMA_NAME, "from_process");
    assert_eq!(
        process_env(ENV_SCHEMA_NAME).as_deref(),
        Some("from_process")
    );
    match original {
        Some(v) => std::env::set_var(ENV_SCHEMA_NAME, v),
        None => std::env::remove_var(ENV_SCHEMA_NAME),
    }
}

#[test]
fn test_target_config_duckdb_needs_no_credentials() {
    let target = TargetConfig::from_env(TargetKind::DuckDb, env_of(&[])).unwrap();
    assert_eq!(
        target,
        TargetConfig::DuckDb {
            path: ":memory:".to_string()
        }
    );
    assert_eq!(target.kind(), TargetKind::DuckDb);
}

#[test]
fn test_target_config_redshift_requires_credentials() {
    let err = TargetConfig::from_env(TargetKind::Redshift, env_of(&[])).unwrap_err();
    assert!(err.to_string().contains("REDSHIFT_HOST"));

    let target =
        TargetConfig::from_env(TargetKind::Redshift, env_of(&full_connection_env())).unwrap();
    assert_eq!(target.kind(), TargetKind::Redshift);
}
