//! Runtime configuration for sqldeploy
//!
//! Every setting is read from the process environment. Parsers take an
//! injectable lookup function instead of calling `std::env::var` directly so
//! callers (and tests) decide where values come from; [`process_env`] is the
//! lookup used by the binary.

use crate::error::{CoreError, CoreResult};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_HOST: &str = "REDSHIFT_HOST";
pub const ENV_PORT: &str = "REDSHIFT_PORT";
pub const ENV_DATABASE: &str = "REDSHIFT_DB";
pub const ENV_USER: &str = "REDSHIFT_USER";
pub const ENV_PASSWORD: &str = "REDSHIFT_PASSWORD";
pub const ENV_CONNECT_RETRIES: &str = "CONNECT_RETRIES";
pub const ENV_CONNECT_RETRY_DELAY: &str = "CONNECT_RETRY_DELAY";
pub const ENV_ENVIRONMENT: &str = "ENVIRONMENT";
pub const ENV_ALLOW_DESTRUCTIVE: &str = "ALLOW_DESTRUCTIVE";
pub const ENV_SCHEMA_NAME: &str = "SCHEMA_NAME";
pub const ENV_DUCKDB_PATH: &str = "DUCKDB_PATH";

/// CI revision variables, checked in order.
pub const REVISION_ENV_VARS: &[&str] = &["GITHUB_SHA", "CI_COMMIT_SHA", "GIT_COMMIT"];

pub const DEFAULT_PORT: u16 = 5439;
pub const DEFAULT_CONNECT_RETRIES: u32 = 3;
pub const DEFAULT_CONNECT_RETRY_DELAY_SECS: f64 = 1.5;
pub const DEFAULT_DUCKDB_PATH: &str = ":memory:";

/// Environment name subject to the destructive-statement gate.
pub const PROTECTED_ENVIRONMENT: &str = "prod";

/// Length of the revision id echoed into evidence.
const REVISION_PREFIX_LEN: usize = 12;

/// Lookup backed by the real process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn non_blank(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.trim().is_empty())
}

fn require(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> CoreResult<String> {
    non_blank(lookup, name).ok_or_else(|| CoreError::MissingEnv {
        name: name.to_string(),
    })
}

fn invalid(name: &str, value: &str, reason: &str) -> CoreError {
    CoreError::InvalidEnv {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Which transport a run talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetKind {
    /// Amazon Redshift over the Postgres wire protocol (default)
    #[default]
    Redshift,
    /// Local DuckDB database file or `:memory:`
    DuckDb,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Redshift => write!(f, "redshift"),
            TargetKind::DuckDb => write!(f, "duckdb"),
        }
    }
}

impl FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redshift" => Ok(TargetKind::Redshift),
            "duckdb" => Ok(TargetKind::DuckDb),
            other => Err(format!(
                "unknown target '{}', expected 'redshift' or 'duckdb'",
                other
            )),
        }
    }
}

/// Connection parameters for the Redshift target
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl ConnectionSettings {
    /// Read connection settings, failing on the first missing required variable.
    ///
    /// Required variables are checked in the order host, database, user,
    /// password. The port is optional and defaults to [`DEFAULT_PORT`].
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let host = require(&lookup, ENV_HOST)?;
        let port = match non_blank(&lookup, ENV_PORT) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| invalid(ENV_PORT, &raw, &e.to_string()))?,
            None => DEFAULT_PORT,
        };
        let database = require(&lookup, ENV_DATABASE)?;
        let user = require(&lookup, ENV_USER)?;
        let password = require(&lookup, ENV_PASSWORD)?;

        Ok(Self {
            host,
            port,
            database,
            user,
            password,
        })
    }
}

/// Bounded retry schedule for initial connection establishment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total connection attempts, always at least one
    pub attempts: u32,
    /// Fixed pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_CONNECT_RETRIES,
            delay: Duration::from_secs_f64(DEFAULT_CONNECT_RETRY_DELAY_SECS),
        }
    }
}

impl RetryPolicy {
    /// Read `CONNECT_RETRIES` and `CONNECT_RETRY_DELAY` (seconds).
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        let attempts = match non_blank(&lookup, ENV_CONNECT_RETRIES) {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|e| invalid(ENV_CONNECT_RETRIES, &raw, &e.to_string()))?
                .clamp(1, i64::from(u32::MAX)) as u32,
            None => DEFAULT_CONNECT_RETRIES,
        };

        let delay_secs = match non_blank(&lookup, ENV_CONNECT_RETRY_DELAY) {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| invalid(ENV_CONNECT_RETRY_DELAY, &raw, &e.to_string()))?;
                if !secs.is_finite() || secs < 0.0 {
                    return Err(invalid(
                        ENV_CONNECT_RETRY_DELAY,
                        &raw,
                        "must be a non-negative number of seconds",
                    ));
                }
                secs
            }
            None => DEFAULT_CONNECT_RETRY_DELAY_SECS,
        };

        Ok(Self {
            attempts,
            delay: Duration::from_secs_f64(delay_secs),
        })
    }
}

/// Destructive-statement policy inputs, fixed for the lifetime of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyContext {
    /// Active deployment environment (e.g. `dev`, `prod`)
    pub environment_name: Option<String>,
    /// Explicit override that lets destructive statements through the gate
    pub allow_destructive: bool,
}

impl PolicyContext {
    pub fn new(environment_name: Option<&str>, allow_destructive: bool) -> Self {
        Self {
            environment_name: environment_name.map(String::from),
            allow_destructive,
        }
    }

    /// Read `ENVIRONMENT` and `ALLOW_DESTRUCTIVE`.
    ///
    /// Only the literal `true` (any case) enables the override.
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment_name = non_blank(&lookup, ENV_ENVIRONMENT).map(|v| v.trim().to_string());
        let allow_destructive = lookup(ENV_ALLOW_DESTRUCTIVE)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self {
            environment_name,
            allow_destructive,
        }
    }

    /// True when the active environment is the protected one.
    pub fn is_protected(&self) -> bool {
        self.environment_name
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case(PROTECTED_ENVIRONMENT))
    }

    /// True when destructive statements must be scanned for and rejected.
    pub fn gates_destructive(&self) -> bool {
        self.is_protected() && !self.allow_destructive
    }
}

/// DuckDB database path for the local target.
pub fn duckdb_path(lookup: impl Fn(&str) -> Option<String>) -> String {
    non_blank(&lookup, ENV_DUCKDB_PATH).unwrap_or_else(|| DEFAULT_DUCKDB_PATH.to_string())
}

/// Everything needed to open a connection to the selected target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetConfig {
    Redshift(ConnectionSettings),
    DuckDb { path: String },
}

impl TargetConfig {
    /// Read the settings the given target needs. Only the Redshift target
    /// has required variables.
    pub fn from_env(kind: TargetKind, lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        match kind {
            TargetKind::Redshift => Ok(TargetConfig::Redshift(ConnectionSettings::from_env(
                lookup,
            )?)),
            TargetKind::DuckDb => Ok(TargetConfig::DuckDb {
                path: duckdb_path(lookup),
            }),
        }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            TargetConfig::Redshift(_) => TargetKind::Redshift,
            TargetConfig::DuckDb { .. } => TargetKind::DuckDb,
        }
    }
}

/// Non-secret context echoed into run evidence.
pub fn env_summary(
    lookup: impl Fn(&str) -> Option<String>,
    target: TargetKind,
) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for key in [ENV_ENVIRONMENT, ENV_SCHEMA_NAME] {
        if let Some(v) = non_blank(&lookup, key) {
            out.insert(key.to_string(), v);
        }
    }
    if let Some(sha) = REVISION_ENV_VARS
        .iter()
        .find_map(|key| non_blank(&lookup, key))
    {
        out.insert(
            "git_sha".to_string(),
            sha.chars().take(REVISION_PREFIX_LEN).collect(),
        );
    }
    out.insert("target".to_string(), target.to_string());
    out
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
