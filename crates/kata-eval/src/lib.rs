//! Sandboxed interpreter for transpiled snippets.
//!
//! Programs run under a gas budget instead of wall-clock timers, so
//! runaway loops stop deterministically. Console output is captured,
//! host-platform APIs resolve to recognizable sandbox errors, and
//! `Math.random` is seeded for reproducible runs.

mod builtins;
mod env;
mod error;
mod evaluator;
mod sandbox;
mod value;

pub use env::Environment;
pub use error::{EvalError, EvalResult};
pub use evaluator::Interpreter;
pub use sandbox::{Evaluation, Sandbox, DEFAULT_GAS_LIMIT};
pub use value::{Closure, PromiseState, Value};
