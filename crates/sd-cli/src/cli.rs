//! CLI argument definitions using clap derive API

use clap::{Parser, ValueEnum};
use sd_core::evidence::DEFAULT_OUTPUT_DIR;
use sd_core::TargetKind;
use std::path::PathBuf;

/// sqldeploy - apply an ordered batch of SQL scripts in one transaction
#[derive(Parser, Debug)]
#[command(name = "sqldeploy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// SQL script file, or directory of scripts
    #[arg(short = 's', long, env = "SQL_PATH")]
    pub sql_path: String,

    /// Comma-separated script names to run, in order (directory mode only)
    #[arg(short, long, env = "EXECUTION_ORDER")]
    pub execution_order: Option<String>,

    /// Directory that receives run evidence
    #[arg(long, env = "SQLDEPLOY_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Database to run against (redshift, duckdb)
    #[arg(short, long, env = "SQLDEPLOY_TARGET", default_value = "redshift")]
    pub target: TargetKind,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Console output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Per-file progress lines
    #[default]
    Text,
    /// Finalized evidence document as JSON
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
