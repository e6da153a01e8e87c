//! sd-core - Core library for sqldeploy
//!
//! This crate provides script discovery and execution planning, runtime
//! configuration read from the environment, and the run evidence recorder
//! shared by the transport and CLI crates.

pub mod config;
pub mod error;
pub mod evidence;
pub mod plan;

pub use config::{ConnectionSettings, PolicyContext, RetryPolicy, TargetConfig, TargetKind};
pub use error::{CoreError, CoreResult};
pub use evidence::{EvidenceRecorder, RunEvidence, ScriptResult, ScriptStatus};
pub use plan::{plan, ExecutionPlan, PlanMode};
