//! Offline validation of bundled reference solutions.
//!
//! Exercise content ships with a reference solution and its test
//! cases. Running every solution against its own cases catches
//! regressions in the dataset (and in the harness) before students do.

use serde::{Deserialize, Serialize};

use kata_types::{RunReport, TestCase};

use crate::runner::run_tests;

/// One bundled exercise: its reference solution plus its test cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceSolution {
    /// Exercise identifier, shown in the validation summary.
    pub name: String,
    /// The reference solution source, pre-transpilation.
    pub code: String,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

/// Outcome of validating a single reference solution.
#[derive(Debug)]
pub struct ValidationResult {
    pub name: String,
    pub passed: bool,
    pub report: RunReport,
}

impl std::fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.passed {
            write!(f, "  ✓ {}", self.name)
        } else {
            let detail = self
                .report
                .error
                .clone()
                .unwrap_or_else(|| {
                    let failed = self.report.results.iter().filter(|r| !r.passed).count();
                    format!("{failed} of {} cases failed", self.report.results.len())
                });
            write!(f, "  ✗ {} — {}", self.name, detail)
        }
    }
}

/// Summary of a full validation pass.
#[derive(Debug)]
pub struct ValidationSummary {
    pub results: Vec<ValidationResult>,
    pub passed: usize,
    pub failed: usize,
}

impl ValidationSummary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

impl std::fmt::Display for ValidationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for r in &self.results {
            writeln!(f, "{r}")?;
        }
        writeln!(f, "\n{} passed, {} failed", self.passed, self.failed)
    }
}

/// Run every reference solution against its own test cases.
///
/// A solution with no test cases counts as a failure: dataset entries
/// are expected to be testable.
pub fn validate_solutions(solutions: &[ReferenceSolution]) -> ValidationSummary {
    let mut results = Vec::with_capacity(solutions.len());

    for solution in solutions {
        let report = if solution.test_cases.is_empty() {
            RunReport::structural_failure("no test cases defined")
        } else {
            run_tests(&solution.code, &solution.test_cases)
        };
        results.push(ValidationResult {
            name: solution.name.clone(),
            passed: report.all_passed,
            report,
        });
    }

    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.len() - passed;

    ValidationSummary {
        results,
        passed,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn solution(name: &str, code: &str, cases: Vec<TestCase>) -> ReferenceSolution {
        ReferenceSolution {
            name: name.to_string(),
            code: code.to_string(),
            test_cases: cases,
        }
    }

    #[test]
    fn passing_and_failing_solutions_are_counted() {
        let solutions = vec![
            solution(
                "add",
                "function add(a, b) { return a + b; }",
                vec![TestCase::new(vec![json!(2), json!(3)], json!(5))],
            ),
            solution(
                "broken",
                "function broken() { return 1; }",
                vec![TestCase::new(vec![], json!(2))],
            ),
        ];
        let summary = validate_solutions(&solutions);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert!(!summary.all_passed());
    }

    #[test]
    fn missing_test_cases_fail_validation() {
        let solutions = vec![solution("empty", "function f() {}", vec![])];
        let summary = validate_solutions(&solutions);
        assert_eq!(summary.failed, 1);
        assert_eq!(
            summary.results[0].report.error.as_deref(),
            Some("no test cases defined")
        );
    }

    #[test]
    fn summary_display_lists_each_solution() {
        let solutions = vec![solution(
            "identity",
            "const identity = (x) => x;",
            vec![TestCase::new(vec![json!(7)], json!(7))],
        )];
        let summary = validate_solutions(&solutions);
        let rendered = summary.to_string();
        assert!(rendered.contains("✓ identity"));
        assert!(rendered.contains("1 passed, 0 failed"));
    }

    #[test]
    fn reference_solution_deserializes_from_dataset_shape() {
        let solution: ReferenceSolution = serde_json::from_str(
            r#"{"name": "sum", "code": "function sum(a, b) { return a + b; }",
                "testCases": [{"input": [1, 2], "expectedOutput": 3}]}"#,
        )
        .unwrap();
        assert_eq!(solution.test_cases.len(), 1);
    }
}
