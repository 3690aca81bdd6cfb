//! Shared types for the kata test harness.
//!
//! This crate defines the AST node types, source spans, structured
//! compile errors, and the run-report data model shared by every
//! stage of the harness pipeline.

mod error;
mod report;
mod span;
pub mod ast;

pub use error::{CompileError, CompileErrors, ErrorCategory, ErrorCode, Severity, MAX_ERRORS};
pub use report::{RunReport, TestCase, TestResult, FN_INPUT_KEY};
pub use span::{SourceFile, Span};
