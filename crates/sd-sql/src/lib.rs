//! sd-sql - SQL text layer for sqldeploy
//!
//! This crate turns a script's raw text into executable statements:
//! `{{VAR}}` placeholder substitution, the destructive-statement policy gate,
//! and a quote-aware statement splitter.

pub mod error;
pub mod policy;
pub mod segment;
pub mod template;

pub use error::{SqlError, SqlResult};
pub use policy::check_destructive;
pub use segment::split_statements;
pub use template::{referenced_variables, substitute_placeholders};
