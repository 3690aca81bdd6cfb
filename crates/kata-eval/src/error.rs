//! Runtime error types for the evaluator.

use thiserror::Error;

use crate::value::Value;

/// Evaluation error: runtime failures, sandbox limits, and the
/// control-flow signals (`Return`, `Break`, `Continue`) that unwind
/// through `?` until a function or loop absorbs them.
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    /// Reference to an unbound name.
    #[error("{0} is not defined")]
    Undefined(String),
    /// Operation applied to a value of the wrong shape.
    #[error("TypeError: {0}")]
    Type(String),
    /// Calling something that is not callable.
    #[error("{0} is not a function")]
    NotCallable(String),
    /// A `throw` statement or a rejected promise.
    #[error("{message}")]
    Thrown { value: Value, message: String },
    /// Step budget exhausted; the snippet ran too long.
    #[error("execution timed out")]
    GasExhausted,
    /// Awaiting a promise that will never settle.
    #[error("timed out waiting for promise to settle")]
    AwaitTimeout,
    /// Capability the sandbox deliberately does not provide.
    #[error("'{0}' is not available in the sandbox")]
    HostApi(String),
    /// Generic runtime failure.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// `return` unwinding to the nearest call frame.
    #[error("return outside function")]
    Return(Value),
    /// `break` unwinding to the nearest loop.
    #[error("break outside loop")]
    Break,
    /// `continue` unwinding to the nearest loop.
    #[error("continue outside loop")]
    Continue,
}

impl EvalError {
    /// Errors a user-level `try`/`catch` can intercept. Sandbox limits
    /// and control-flow signals always propagate.
    pub fn is_catchable(&self) -> bool {
        !matches!(
            self,
            EvalError::GasExhausted
                | EvalError::AwaitTimeout
                | EvalError::Return(_)
                | EvalError::Break
                | EvalError::Continue
        )
    }

    /// The value a `catch (e)` binding receives.
    pub fn to_caught_value(&self) -> Value {
        match self {
            EvalError::Thrown { value, .. } => value.clone(),
            other => crate::builtins::make_error_object("Error", &other.to_string()),
        }
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, EvalError>;
