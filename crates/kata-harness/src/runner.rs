//! The run pipeline: transpile, extract, evaluate, then resolve and
//! invoke once per test case.
//!
//! Failure handling is tiered. Structural failures (blank input,
//! compile errors, no callable functions) abort the run with a
//! report-level error and no results. Per-case failures (throws,
//! rejections, timeouts, failed resolution) mark that case and never
//! touch its siblings. Sandbox-capability errors surface through the
//! same per-case channel with a recognizable message.

use kata_eval::{Evaluation, Sandbox, Value};
use kata_types::{RunReport, TestCase, TestResult, FN_INPUT_KEY};
use serde_json::Value as Json;

use crate::compare::deep_eq;
use crate::resolver::{resolve, Candidate};

/// Run every test case against `source` and report the outcome.
///
/// Never panics and never returns an error: every failure mode is
/// represented inside the report.
pub fn run_tests(source: &str, cases: &[TestCase]) -> RunReport {
    if source.trim().is_empty() {
        return RunReport::structural_failure("No code provided");
    }

    let executable = match kata_transpile::transpile(source) {
        Ok(output) => output,
        Err(errors) => return RunReport::structural_failure(errors.to_string()),
    };

    let names = kata_transpile::extract_function_names(source);
    if names.is_empty() {
        return RunReport::structural_failure("No functions found in the provided code");
    }

    let mut eval = match Sandbox::new().evaluate(&executable, &names) {
        Ok(eval) => eval,
        Err(errors) => return RunReport::structural_failure(errors.to_string()),
    };

    let candidates: Vec<Candidate> = eval
        .callables
        .drain(..)
        .map(|(name, value)| Candidate::new(name, value))
        .collect();
    if candidates.is_empty() {
        return RunReport::structural_failure("No functions found in the provided code");
    }

    // Cases run sequentially on the same interpreter because snippets
    // may share mutable closure state across cases.
    let results = cases
        .iter()
        .map(|case| run_case(&mut eval, &candidates, case))
        .collect();
    RunReport::from_results(results)
}

fn run_case(eval: &mut Evaluation, candidates: &[Candidate], case: &TestCase) -> TestResult {
    let Some(candidate) = resolve(candidates, case) else {
        return TestResult::failed(case, "No matching function found for this test case");
    };

    let mut args = Vec::with_capacity(case.input.len());
    for input in &case.input {
        match convert_input(eval, input) {
            Ok(value) => args.push(value),
            Err(message) => return TestResult::failed(case, message),
        }
    }

    // Each case gets a fresh step budget.
    eval.interp.reset_gas();
    let outcome = eval
        .interp
        .call_value(&candidate.value, args, &candidate.name)
        .and_then(|returned| eval.interp.force(returned));

    match outcome {
        Ok(actual) => {
            let expected = Value::from_json(&case.expected_output);
            let passed = deep_eq(&actual, &expected);
            TestResult {
                input: case.input.clone(),
                expected_output: case.expected_output.clone(),
                actual_output: Some(actual.to_json()),
                passed,
                error: None,
                description: case.description.clone(),
            }
        }
        Err(err) => TestResult::failed(case, err.to_string()),
    }
}

/// Translate one declarative input into a runtime value.
///
/// An object of the shape `{"$fn": "x => x * 2"}` is compiled inside
/// the snippet's own environment so the callee can invoke it.
fn convert_input(eval: &mut Evaluation, input: &Json) -> Result<Value, String> {
    let Some(fn_source) = fn_input_source(input) else {
        return Ok(Value::from_json(input));
    };
    compile_fn_input(eval, fn_source)
        .map_err(|detail| format!("invalid function argument: {detail}"))
}

fn fn_input_source(input: &Json) -> Option<&str> {
    let object = input.as_object()?;
    if object.len() != 1 {
        return None;
    }
    object.get(FN_INPUT_KEY)?.as_str()
}

fn compile_fn_input(eval: &mut Evaluation, fn_source: &str) -> Result<Value, String> {
    let wrapped = format!("({fn_source})");
    let program = kata_parser::parse_source(&wrapped).map_err(|errors| errors.to_string())?;
    let Some(kata_types::ast::Stmt::Expr(stmt)) = program.stmts.first() else {
        return Err("not a function expression".to_string());
    };
    let env = eval.interp.env.clone();
    let value = eval
        .interp
        .eval_expr(&stmt.expr, &env)
        .map_err(|e| e.to_string())?;
    if value.is_callable() {
        Ok(value)
    } else {
        Err("not a function expression".to_string())
    }
}
