//! Kata test harness as a WASM module for browser environments.
//!
//! The editor runs snippets inside a Web Worker: the WASM boundary
//! keeps untrusted code out of the page's JS realm, and the gas-based
//! interpreter inside bounds CPU use without wall-clock timers.
//!
//! # Usage (JavaScript)
//!
//! ```js
//! import init, { run_tests } from 'kata-wasm';
//!
//! await init();
//!
//! const report = JSON.parse(run_tests(code, [
//!   { input: [2, 3], expectedOutput: 5 },
//! ]));
//! // { allPassed: true, results: [{ passed: true, actualOutput: 5, ... }] }
//! ```

use wasm_bindgen::prelude::*;

use kata_types::{RunReport, TestCase};

/// Run `test_cases` (an array of `{input, expectedOutput, description?}`
/// objects) against `code` and return the `RunReport` as a JSON string.
///
/// Every failure mode is represented inside the report; this function
/// never throws into JS.
#[wasm_bindgen]
pub fn run_tests(code: &str, test_cases: JsValue) -> String {
    let report = match serde_wasm_bindgen::from_value::<Vec<TestCase>>(test_cases) {
        Ok(cases) => kata_harness::run_tests(code, &cases),
        Err(e) => RunReport::structural_failure(format!("invalid test cases: {e}")),
    };
    serde_json::to_string(&report).unwrap_or_else(|e| {
        format!(
            r#"{{"allPassed":false,"results":[],"error":"Serialization error: {e}"}}"#
        )
    })
}

/// Transpile a snippet without running it, for editor diagnostics.
///
/// Returns `{"success": true, "output": "..."}` or
/// `{"success": false, "error": "compilation error ..."}` as JSON.
#[wasm_bindgen]
pub fn transpile(source: &str) -> String {
    let json = match kata_transpile::transpile(source) {
        Ok(output) => serde_json::json!({ "success": true, "output": output }),
        Err(errors) => serde_json::json!({ "success": false, "error": errors.to_string() }),
    };
    json.to_string()
}

/// Extract top-level function names from a snippet, as a JS array.
#[wasm_bindgen]
pub fn extract_function_names(source: &str) -> JsValue {
    let names = kata_transpile::extract_function_names(source);
    serde_wasm_bindgen::to_value(&names).unwrap_or(JsValue::NULL)
}

/// Return the harness version string.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
