//! Test harness for kata exercises.
//!
//! Takes a student's snippet plus declarative test cases and produces
//! a single run report: the snippet is transpiled, its top-level
//! functions extracted and evaluated in a sandbox, and each case is
//! matched to a candidate function, invoked, and deep-compared against
//! its expected output.

mod compare;
mod resolver;
mod runner;
mod validate;

pub use compare::deep_eq;
pub use resolver::{resolve, Candidate};
pub use runner::run_tests;

// Extraction is part of the harness surface so callers can list a
// snippet's entry points without invoking anything.
pub use kata_transpile::extract_function_names;
pub use validate::{validate_solutions, ReferenceSolution, ValidationResult, ValidationSummary};

// The shared data model is part of this crate's public surface.
pub use kata_types::{RunReport, TestCase, TestResult, FN_INPUT_KEY};
