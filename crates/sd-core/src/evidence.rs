//! Run evidence: the durable record of what a batch attempted and how it ended
//!
//! An [`EvidenceRecorder`] owns a run directory under the output root. Each
//! script result is appended in order and mirrored to a per-file `.log`
//! artifact as soon as it is recorded. [`EvidenceRecorder::finalize`] consumes
//! the recorder and writes `summary.json`, so a run can be finalized at most
//! once.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::plan::{ExecutionPlan, PlanMode};

/// Name of the run-level evidence document inside the run directory
pub const SUMMARY_FILE: &str = "summary.json";

/// Default output root when none is configured
pub const DEFAULT_OUTPUT_DIR: &str = "artifacts";

/// Outcome of one script in the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptStatus {
    Success,
    Failed,
    Skipped,
}

impl fmt::Display for ScriptStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptStatus::Success => write!(f, "success"),
            ScriptStatus::Failed => write!(f, "failed"),
            ScriptStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// Result of executing one script file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptResult {
    /// Base name of the script file
    #[serde(rename = "file")]
    pub file_name: String,
    pub status: ScriptStatus,
    pub statement_count: usize,
    pub rows_affected_total: u64,
    pub elapsed_ms: u64,
    pub message: String,
}

impl ScriptResult {
    pub fn success(
        file_name: impl Into<String>,
        statement_count: usize,
        rows_affected_total: u64,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            status: ScriptStatus::Success,
            statement_count,
            rows_affected_total,
            elapsed_ms,
            message: format!("OK ({} statements)", statement_count),
        }
    }

    /// A script that segmented into zero statements.
    pub fn skipped(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            status: ScriptStatus::Skipped,
            statement_count: 0,
            rows_affected_total: 0,
            elapsed_ms: 0,
            message: "SKIPPED (empty file)".to_string(),
        }
    }

    pub fn failed(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            status: ScriptStatus::Failed,
            statement_count: 0,
            rows_affected_total: 0,
            elapsed_ms: 0,
            message: message.into(),
        }
    }
}

/// Aggregate counters over all recorded results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvidenceSummary {
    pub files_planned: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub statements_total: usize,
    pub rows_affected_total: u64,
}

impl EvidenceSummary {
    fn from_results(files_planned: usize, results: &[ScriptResult]) -> Self {
        let count = |status| results.iter().filter(|r| r.status == status).count();
        Self {
            files_planned,
            succeeded: count(ScriptStatus::Success),
            failed: count(ScriptStatus::Failed),
            skipped: count(ScriptStatus::Skipped),
            statements_total: results.iter().map(|r| r.statement_count).sum(),
            rows_affected_total: results.iter().map(|r| r.rows_affected_total).sum(),
        }
    }
}

/// The run-level evidence document written to `summary.json`
#[derive(Debug, Clone, Serialize)]
pub struct RunEvidence {
    pub ok: bool,
    pub run_id: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(serialize_with = "serialize_optional_timestamp")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<PlanMode>,
    pub files: Vec<String>,
    pub env_summary: BTreeMap<String, String>,
    pub summary: EvidenceSummary,
    pub results: Vec<ScriptResult>,
    /// Run-level failure that is not tied to a single script
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Format a timestamp as RFC 3339 UTC with second precision.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(ts))
}

fn serialize_optional_timestamp<S: Serializer>(
    ts: &Option<DateTime<Utc>>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => serialize_timestamp(ts, s),
        None => s.serialize_none(),
    }
}

/// Build a run id from the start time plus a short random suffix.
pub fn generate_run_id(started_at: &DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("run-{}-{}", started_at.format("%Y%m%d-%H%M%S"), &suffix[..8])
}

/// Per-file log artifact name with path separators flattened.
pub fn log_file_name(file_name: &str) -> String {
    format!("{}.log", file_name.replace(['/', '\\'], "_"))
}

/// Accumulates results for one run and writes its artifacts
#[derive(Debug)]
pub struct EvidenceRecorder {
    run_dir: PathBuf,
    evidence: RunEvidence,
}

impl EvidenceRecorder {
    /// Start a run: generate its id and create `<output_root>/<run_id>/`.
    pub fn start(output_root: &Path) -> CoreResult<Self> {
        let started_at = Utc::now();
        let run_id = generate_run_id(&started_at);
        let run_dir = output_root.join(&run_id);
        fs::create_dir_all(&run_dir).map_err(|source| CoreError::IoWithPath {
            path: run_dir.display().to_string(),
            source,
        })?;

        Ok(Self {
            run_dir,
            evidence: RunEvidence {
                ok: false,
                run_id,
                started_at,
                finished_at: None,
                mode: None,
                files: Vec::new(),
                env_summary: BTreeMap::new(),
                summary: EvidenceSummary::default(),
                results: Vec::new(),
                error: None,
            },
        })
    }

    pub fn run_id(&self) -> &str {
        &self.evidence.run_id
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn results(&self) -> &[ScriptResult] {
        &self.evidence.results
    }

    pub fn set_env_summary(&mut self, env_summary: BTreeMap<String, String>) {
        self.evidence.env_summary = env_summary;
    }

    /// Record the resolved plan (mode and file list).
    pub fn set_plan(&mut self, plan: &ExecutionPlan) {
        self.evidence.mode = Some(plan.mode());
        self.evidence.files = plan
            .files()
            .iter()
            .map(|p| p.display().to_string())
            .collect();
    }

    /// Record a run-level failure message. The first message wins.
    pub fn record_error(&mut self, message: impl Into<String>) {
        if self.evidence.error.is_none() {
            self.evidence.error = Some(message.into());
        }
    }

    /// Append a script result and write its per-file log artifact.
    ///
    /// The result is kept in memory even if the log write fails.
    pub fn record(&mut self, result: ScriptResult) -> CoreResult<()> {
        let log_path = self.run_dir.join(log_file_name(&result.file_name));
        let body = serde_json::to_string_pretty(&result)?;
        self.evidence.results.push(result);
        fs::write(&log_path, body).map_err(|source| CoreError::IoWithPath {
            path: log_path.display().to_string(),
            source,
        })
    }

    /// Stamp the finish time and outcome, then write `summary.json`.
    ///
    /// Returns the finalized evidence along with the summary path.
    pub fn finalize(mut self, ok: bool) -> CoreResult<(RunEvidence, PathBuf)> {
        self.evidence.ok = ok;
        self.evidence.finished_at = Some(Utc::now());
        self.evidence.summary =
            EvidenceSummary::from_results(self.evidence.files.len(), &self.evidence.results);

        let path = self.run_dir.join(SUMMARY_FILE);
        write_json_atomic(&path, &self.evidence)?;
        log::debug!("Wrote run summary to {}", path.display());
        Ok((self.evidence, path))
    }
}

/// Write JSON via a temporary file and rename so readers never see a partial file.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> CoreResult<()> {
    let temp_path = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(value)?;
    fs::write(&temp_path, json).map_err(|source| CoreError::IoWithPath {
        path: temp_path.display().to_string(),
        source,
    })?;
    fs::rename(&temp_path, path).map_err(|source| CoreError::IoWithPath {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
#[path = "evidence_test.rs"]
mod tests;
