//! The harness data model: test cases in, run reports out.
//!
//! Everything here is plain serde data. Field names serialize in
//! camelCase because the editor front end consumes these verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// Key marking a function-valued test input.
///
/// A test case argument written as `{"$fn": "x => x * 2"}` is compiled
/// inside the snippet's sandbox and passed as a callable. This is how
/// the exercise dataset expresses "this argument is a function".
pub const FN_INPUT_KEY: &str = "$fn";

/// One declarative test case for an exercise, supplied by the dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Ordered positional arguments for the function under test.
    #[serde(default)]
    pub input: Vec<Json>,
    /// The value the function is expected to produce.
    pub expected_output: Json,
    /// Optional human description; also drives function resolution
    /// when a snippet defines several functions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TestCase {
    /// Convenience constructor for tests and tooling.
    pub fn new(input: Vec<Json>, expected_output: Json) -> Self {
        Self {
            input,
            expected_output,
            description: None,
        }
    }

    /// Attach a description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Outcome of a single test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    /// The inputs this case was invoked with (echoed from the case).
    pub input: Vec<Json>,
    /// The expected value (echoed from the case).
    pub expected_output: Json,
    /// What the snippet actually produced. Present whenever the
    /// callable returned a settled value; absent on throw or timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_output: Option<Json>,
    /// Whether actual matched expected.
    pub passed: bool,
    /// Failure detail. Always paired with `passed == false`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Echoed description, if the case had one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TestResult {
    /// A failed result carrying an error and no actual output.
    pub fn failed(case: &TestCase, error: impl Into<String>) -> Self {
        Self {
            input: case.input.clone(),
            expected_output: case.expected_output.clone(),
            actual_output: None,
            passed: false,
            error: Some(error.into()),
            description: case.description.clone(),
        }
    }
}

/// The sole output of a harness run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Conjunction of every per-case `passed` flag; `false` whenever
    /// a run-level error is set.
    pub all_passed: bool,
    /// One entry per test case, in case order. Empty when `error` is set.
    pub results: Vec<TestResult>,
    /// Run-level (structural) failure: nothing could be tested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunReport {
    /// A run that failed before any test case could be attempted.
    pub fn structural_failure(error: impl Into<String>) -> Self {
        Self {
            all_passed: false,
            results: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Aggregate per-case results into a report.
    pub fn from_results(results: Vec<TestResult>) -> Self {
        let all_passed = !results.is_empty() && results.iter().all(|r| r.passed);
        Self {
            all_passed,
            results,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_structural_failure_invariants() {
        let report = RunReport::structural_failure("No code provided");
        assert!(!report.all_passed);
        assert!(report.results.is_empty());
        assert_eq!(report.error.as_deref(), Some("No code provided"));
    }

    #[test]
    fn test_from_results_conjunction() {
        let case = TestCase::new(vec![json!(1)], json!(2));
        let ok = TestResult {
            input: case.input.clone(),
            expected_output: case.expected_output.clone(),
            actual_output: Some(json!(2)),
            passed: true,
            error: None,
            description: None,
        };
        let bad = TestResult::failed(&case, "boom");

        assert!(RunReport::from_results(vec![ok.clone()]).all_passed);
        assert!(!RunReport::from_results(vec![ok, bad]).all_passed);
        assert!(!RunReport::from_results(vec![]).all_passed);
    }

    #[test]
    fn test_failed_result_shape() {
        let case = TestCase::new(vec![json!([1, 2])], json!(3)).with_description("sum of a list");
        let result = TestResult::failed(&case, "thrown: x");
        assert!(!result.passed);
        assert!(result.actual_output.is_none());
        assert_eq!(result.error.as_deref(), Some("thrown: x"));
        assert_eq!(result.description.as_deref(), Some("sum of a list"));
    }

    #[test]
    fn test_camel_case_wire_format() {
        let case = TestCase::new(vec![json!(2), json!(3)], json!(5));
        let json = serde_json::to_string(&case).unwrap();
        assert!(json.contains("\"expectedOutput\""));

        let report = RunReport::structural_failure("No code provided");
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"allPassed\""));
        assert!(json.contains("\"results\""));
    }

    #[test]
    fn test_test_case_deserializes_from_dataset_shape() {
        let case: TestCase = serde_json::from_str(
            r#"{"input": [[1, [2, 3]]], "expectedOutput": [1, 2, 3],
                "description": "flattenDeep should completely flatten"}"#,
        )
        .unwrap();
        assert_eq!(case.input.len(), 1);
        assert_eq!(
            case.description.as_deref(),
            Some("flattenDeep should completely flatten")
        );
    }
}
