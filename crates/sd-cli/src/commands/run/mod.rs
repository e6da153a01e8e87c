//! Run command implementation
//!
//! Split into submodules:
//! - `execute` - single-script execution on the shared connection
//!
//! This module holds the batch runner: plan, connect once, run every script
//! inside one transaction, then commit or roll back. Evidence is finalized
//! on every path, including planning and connection failures.

mod execute;

use anyhow::{Context, Result};
use sd_core::config::{env_summary, process_env};
use sd_core::{
    plan, EvidenceRecorder, PolicyContext, RetryPolicy, ScriptResult, TargetConfig, TargetKind,
};
use sd_db::Database;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::cli::{Cli, OutputFormat};
use crate::commands::common::{format_result_line, ExitCode};

use execute::{execute_file, script_name};

/// Batch runner state. `Finalized` is reached exactly once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunPhase {
    Planning,
    Connecting,
    Executing(usize),
    Committing,
    RollingBack,
    Finalized,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Planning => write!(f, "planning"),
            RunPhase::Connecting => write!(f, "connecting"),
            RunPhase::Executing(i) => write!(f, "executing({})", i),
            RunPhase::Committing => write!(f, "committing"),
            RunPhase::RollingBack => write!(f, "rolling_back"),
            RunPhase::Finalized => write!(f, "finalized"),
        }
    }
}

/// How a batch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunOutcome {
    /// Every script ran and the transaction committed
    Committed,
    /// Nothing was executed: planning, configuration or connection failed
    PreflightFailed,
    /// A script or the commit failed and the transaction was rolled back
    BatchFailed,
}

impl RunOutcome {
    pub(crate) fn is_ok(self) -> bool {
        self == RunOutcome::Committed
    }

    pub(crate) fn exit_code(self) -> i32 {
        match self {
            RunOutcome::Committed => 0,
            RunOutcome::BatchFailed => 1,
            RunOutcome::PreflightFailed => 2,
        }
    }
}

/// Inputs to one batch run
pub(crate) struct BatchRequest<'a> {
    pub(crate) sql_path: &'a str,
    pub(crate) execution_order: Option<&'a str>,
    pub(crate) policy: &'a PolicyContext,
    /// Variable source for `{{VAR}}` placeholders
    pub(crate) lookup: &'a dyn Fn(&str) -> Option<String>,
    /// Suppress per-file progress lines on stdout
    pub(crate) quiet: bool,
}

struct PhaseTracker {
    current: RunPhase,
}

impl PhaseTracker {
    fn new() -> Self {
        log::debug!("Run phase: {}", RunPhase::Planning);
        Self {
            current: RunPhase::Planning,
        }
    }

    fn advance(&mut self, next: RunPhase) {
        log::debug!("Run phase: {} -> {}", self.current, next);
        self.current = next;
    }
}

/// Execute the run command
pub async fn execute(cli: &Cli) -> Result<()> {
    let json_mode = cli.output == OutputFormat::Json;
    let target_kind = cli.target;

    let mut recorder = match EvidenceRecorder::start(&cli.output_dir) {
        Ok(recorder) => recorder,
        Err(e) => {
            eprintln!("Error: failed to start run evidence: {}", e);
            return Err(ExitCode(RunOutcome::PreflightFailed.exit_code()).into());
        }
    };
    recorder.set_env_summary(env_summary(process_env, target_kind));

    let policy = PolicyContext::from_env(process_env);
    let request = BatchRequest {
        sql_path: &cli.sql_path,
        execution_order: cli.execution_order.as_deref(),
        policy: &policy,
        lookup: &process_env,
        quiet: json_mode,
    };

    let outcome = run_batch(&request, &mut recorder, || connect_target(target_kind)).await;

    let run_dir = recorder.run_dir().to_path_buf();
    let (evidence, _) = match recorder.finalize(outcome.is_ok()) {
        Ok(finalized) => finalized,
        Err(e) => {
            eprintln!(
                "Error: failed to write run evidence to {}: {}",
                run_dir.display(),
                e
            );
            return Err(ExitCode(outcome.exit_code().max(1)).into());
        }
    };

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&evidence)?);
    } else {
        if let Some(error) = &evidence.error {
            eprintln!("Error: {}", error);
        }
        println!();
        println!(
            "Completed: {} succeeded, {} failed, {} skipped",
            evidence.summary.succeeded, evidence.summary.failed, evidence.summary.skipped
        );
        println!("Evidence saved to: {}", run_dir.display());
    }

    match outcome.exit_code() {
        0 => Ok(()),
        code => Err(ExitCode(code).into()),
    }
}

/// Read the target's connection settings and open it with bounded retry.
async fn connect_target(kind: TargetKind) -> Result<Arc<dyn Database>> {
    let target = TargetConfig::from_env(kind, process_env)?;
    let retry = RetryPolicy::from_env(process_env)?;
    let db = sd_db::connect(&target, &retry)
        .await
        .with_context(|| format!("Failed to connect to {} target", kind))?;
    Ok(db)
}

/// Run the batch described by `request`, recording into `recorder`.
///
/// `connect` is called at most once, after planning succeeds. The recorder
/// is left for the caller to finalize.
pub(crate) async fn run_batch<C, Fut>(
    request: &BatchRequest<'_>,
    recorder: &mut EvidenceRecorder,
    connect: C,
) -> RunOutcome
where
    C: FnOnce() -> Fut,
    Fut: Future<Output = Result<Arc<dyn Database>>>,
{
    let mut phase = PhaseTracker::new();

    let plan = match plan(request.sql_path, request.execution_order) {
        Ok(plan) => plan,
        Err(e) => {
            recorder.record_error(e.to_string());
            phase.advance(RunPhase::Finalized);
            return RunOutcome::PreflightFailed;
        }
    };
    recorder.set_plan(&plan);
    log::debug!("Planned {} script(s) ({})", plan.len(), plan.mode());
    if !request.quiet {
        println!("Running {} script(s)...\n", plan.len());
    }

    phase.advance(RunPhase::Connecting);
    let db = match connect().await {
        Ok(db) => db,
        Err(e) => {
            recorder.record_error(format!("{:#}", e));
            phase.advance(RunPhase::Finalized);
            return RunOutcome::PreflightFailed;
        }
    };

    if let Err(e) = db.begin().await {
        recorder.record_error(format!("Failed to open transaction: {}", e));
        close_quietly(db.as_ref()).await;
        phase.advance(RunPhase::Finalized);
        return RunOutcome::PreflightFailed;
    }

    let mut failed = false;
    for (idx, path) in plan.files().iter().enumerate() {
        phase.advance(RunPhase::Executing(idx));
        let result = match execute_file(db.as_ref(), path, request.policy, request.lookup).await {
            Ok(result) => result,
            Err(e) => {
                let message = format!("{:#}", e);
                recorder.record_error(format!("{}: {}", script_name(path), message));
                failed = true;
                ScriptResult::failed(script_name(path), message)
            }
        };
        record_result(recorder, result, request.quiet);
        if failed {
            break;
        }
    }

    let outcome = if failed {
        RunOutcome::BatchFailed
    } else {
        phase.advance(RunPhase::Committing);
        match db.commit().await {
            Ok(()) => RunOutcome::Committed,
            Err(e) => {
                recorder.record_error(format!("Commit failed: {}", e));
                RunOutcome::BatchFailed
            }
        }
    };

    if !outcome.is_ok() {
        phase.advance(RunPhase::RollingBack);
        if let Err(e) = db.rollback().await {
            log::debug!("Rollback failed (ignored): {}", e);
        }
    }

    close_quietly(db.as_ref()).await;
    phase.advance(RunPhase::Finalized);
    outcome
}

fn record_result(recorder: &mut EvidenceRecorder, result: ScriptResult, quiet: bool) {
    if quiet {
        log::info!("{}", format_result_line(&result).trim_start());
    } else {
        println!("{}", format_result_line(&result));
    }
    if let Err(e) = recorder.record(result) {
        log::warn!("Failed to write script log: {}", e);
    }
}

async fn close_quietly(db: &dyn Database) {
    if let Err(e) = db.close().await {
        log::debug!("Connection close failed (ignored): {}", e);
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
