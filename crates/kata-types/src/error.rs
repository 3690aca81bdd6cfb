use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of errors reported before fail-fast.
pub const MAX_ERRORS: usize = 20;

/// Error severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Error category, determined by error code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    /// Lexical or grammatical problems in the snippet.
    Syntax,
    /// Constructs the transpiler deliberately refuses (decorators, namespaces).
    Unsupported,
}

/// Numeric error code (E100–E299).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Syntax errors (E100–E199) ──
    pub const UNEXPECTED_CHAR: Self = Self(100);
    pub const UNTERMINATED_STRING: Self = Self(101);
    pub const UNTERMINATED_TEMPLATE: Self = Self(102);
    pub const UNTERMINATED_COMMENT: Self = Self(103);
    pub const INVALID_NUMBER: Self = Self(104);
    pub const UNEXPECTED_TOKEN: Self = Self(110);
    pub const EXPECTED_EXPRESSION: Self = Self(111);
    pub const UNCLOSED_DELIMITER: Self = Self(112);
    pub const INVALID_ASSIGNMENT_TARGET: Self = Self(113);

    // ── Unsupported constructs (E200–E299) ──
    pub const DECORATOR_USED: Self = Self(200);
    pub const NAMESPACE_USED: Self = Self(201);
    pub const IMPORT_USED: Self = Self(202);
    pub const MALFORMED_ENUM: Self = Self(203);
    pub const MALFORMED_TYPE: Self = Self(204);

    /// Get the category for this error code.
    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Syntax,
            200..=299 => ErrorCategory::Unsupported,
            _ => ErrorCategory::Syntax, // fallback
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A structured compile error for a snippet.
///
/// The editor renders these directly — it must not parse free-form
/// strings, so every field it needs is explicit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileError {
    /// Source name (usually "snippet").
    pub file: String,
    /// Error code (e.g., E110).
    pub code: ErrorCode,
    /// Error severity.
    pub severity: Severity,
    /// Error category (derived from code).
    pub category: ErrorCategory,
    /// Human-readable error message.
    pub message: String,
    /// Source location.
    #[serde(flatten)]
    pub span: Span,
    /// The exact source line for context.
    pub source_line: String,
    /// Optional hint shown to the learner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl CompileError {
    /// Create a new error.
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            severity: Severity::Error,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            hint: None,
        }
    }

    /// Attach a hint for the learner.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for CompileError {}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax => write!(f, "syntax"),
            Self::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Collected errors from the transpile/parse front end.
///
/// The harness turns a non-empty collection into a single run-level
/// "compilation error" message; callers pattern-match on that prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileErrors {
    pub errors: Vec<CompileError>,
    pub total_errors: usize,
}

impl CompileErrors {
    /// Create an empty result (no errors).
    pub fn empty() -> Self {
        Self {
            errors: Vec::new(),
            total_errors: 0,
        }
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// Add an error, respecting the MAX_ERRORS limit.
    pub fn push_error(&mut self, error: CompileError) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push(error);
        }
        self.total_errors += 1;
    }

    /// Fold another collection into this one.
    pub fn extend(&mut self, other: CompileErrors) {
        let stored = other.errors.len();
        for err in other.errors {
            self.push_error(err);
        }
        // push_error counted the stored ones; account for any overflow.
        self.total_errors += other.total_errors.saturating_sub(stored);
    }

    /// The message of the first (primary) error, if any.
    pub fn primary_message(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }
}

impl fmt::Display for CompileErrors {
    /// Single-line summary. The "compilation error" prefix is a stable
    /// marker that callers grep for to distinguish this failure tier.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.first() {
            Some(first) => {
                write!(
                    f,
                    "compilation error ({}): {} at {}",
                    first.category, first.message, first.span
                )?;
                if self.total_errors > 1 {
                    write!(f, " (+{} more)", self.total_errors - 1)?;
                }
                Ok(())
            }
            None => write!(f, "compilation error (syntax)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::UNEXPECTED_TOKEN.category(), ErrorCategory::Syntax);
        assert_eq!(
            ErrorCode::DECORATOR_USED.category(),
            ErrorCategory::Unsupported
        );
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(format!("{}", ErrorCode::UNEXPECTED_CHAR), "E100");
        assert_eq!(format!("{}", ErrorCode::NAMESPACE_USED), "E201");
    }

    #[test]
    fn test_compile_error_creation() {
        let err = CompileError::new(
            "snippet",
            ErrorCode::UNTERMINATED_STRING,
            "unterminated string literal",
            Span::new(10, 18, 2, 3),
            "  const s = \"oops",
        );
        assert_eq!(err.code, ErrorCode::UNTERMINATED_STRING);
        assert_eq!(err.severity, Severity::Error);
        assert_eq!(err.category, ErrorCategory::Syntax);
    }

    #[test]
    fn test_compile_error_with_hint() {
        let err = CompileError::new(
            "snippet",
            ErrorCode::DECORATOR_USED,
            "decorators are not supported",
            Span::point(0, 1, 1),
            "@sealed",
        )
        .with_hint("Remove the decorator; exercises use plain functions");
        assert!(err.hint.as_deref().unwrap().starts_with("Remove"));
    }

    #[test]
    fn test_compile_error_json_serialization() {
        let err = CompileError::new(
            "snippet",
            ErrorCode::UNEXPECTED_TOKEN,
            "unexpected token '}'",
            Span::new(42, 43, 5, 1),
            "}",
        );
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"code\""));
        assert!(json.contains("\"message\""));
        assert!(json.contains("\"source_line\""));
        assert!(json.contains("\"line\""));

        let back: CompileError = serde_json::from_str(&json).unwrap();
        assert_eq!(back.code, err.code);
        assert_eq!(back.message, err.message);
    }

    #[test]
    fn test_compile_errors_max_limit() {
        let mut errs = CompileErrors::empty();
        for i in 0..25 {
            errs.push_error(CompileError::new(
                "snippet",
                ErrorCode::UNEXPECTED_CHAR,
                format!("error {i}"),
                Span::point(i, i as u32 + 1, 1),
                "",
            ));
        }
        // Only 20 stored, but total count is 25
        assert_eq!(errs.errors.len(), 20);
        assert_eq!(errs.total_errors, 25);
        assert!(errs.has_errors());
    }

    #[test]
    fn test_compile_errors_extend_preserves_total_count() {
        let snippet_err = |i: usize| {
            CompileError::new(
                "snippet",
                ErrorCode::UNEXPECTED_CHAR,
                format!("error {i}"),
                Span::point(i, i as u32 + 1, 1),
                "",
            )
        };
        let mut base = CompileErrors::empty();
        for i in 0..18 {
            base.push_error(snippet_err(i));
        }
        let mut other = CompileErrors::empty();
        for i in 0..25 {
            other.push_error(snippet_err(100 + i));
        }
        // `other` holds 20 stored / 25 total; folding it in keeps the
        // storage cap while carrying the untruncated count across.
        base.extend(other);
        assert_eq!(base.errors.len(), MAX_ERRORS);
        assert_eq!(base.total_errors, 18 + 25);
    }

    #[test]
    fn test_compile_errors_display_contains_marker() {
        let mut errs = CompileErrors::empty();
        errs.push_error(CompileError::new(
            "snippet",
            ErrorCode::UNTERMINATED_STRING,
            "unterminated string literal",
            Span::new(0, 4, 1, 1),
            "\"abc",
        ));
        let msg = errs.to_string();
        assert!(msg.contains("compilation error"));
        assert!(msg.contains("syntax"));
        assert!(msg.contains("unterminated string literal"));
    }

    #[test]
    fn test_compile_errors_empty() {
        let errs = CompileErrors::empty();
        assert!(!errs.has_errors());
        assert_eq!(errs.total_errors, 0);
        assert!(errs.primary_message().is_none());
    }
}
