//! Program loading: parse a snippet, run its top-level statements
//! once, and harvest the callable bindings the test runner will
//! invoke. The interpreter stays alive across invocations so closures
//! over top-level state keep working.

use kata_parser::parse_source;
use kata_types::CompileErrors;

use crate::evaluator::Interpreter;
use crate::value::Value;

/// Steps allowed per run segment (top-level, or one test invocation).
pub const DEFAULT_GAS_LIMIT: u64 = 5_000_000;

pub struct Sandbox {
    gas_limit: u64,
}

/// A loaded program, ready for repeated function invocations.
pub struct Evaluation {
    pub interp: Interpreter,
    /// Candidate bindings that resolved to callable values, in the
    /// order the caller listed them.
    pub callables: Vec<(String, Value)>,
    /// Error raised while running top-level statements. Bindings made
    /// before the failure point are still harvested.
    pub top_level_error: Option<String>,
}

impl Evaluation {
    pub fn callable(&self, name: &str) -> Option<&Value> {
        self.callables
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            gas_limit: DEFAULT_GAS_LIMIT,
        }
    }

    pub fn with_gas_limit(gas_limit: u64) -> Self {
        Self { gas_limit }
    }

    /// Parse and execute `source`, then look up each candidate name.
    ///
    /// Syntax errors are the only hard failure; a runtime error at the
    /// top level is recorded but does not discard functions that were
    /// already defined (hoisting usually defines all of them).
    pub fn evaluate(
        &self,
        source: &str,
        candidate_names: &[String],
    ) -> Result<Evaluation, CompileErrors> {
        let program = parse_source(source)?;
        let mut interp = Interpreter::new(self.gas_limit);
        let top_level_error = interp.run_program(&program).err().map(|e| e.to_string());

        let mut callables = Vec::new();
        for name in candidate_names {
            if let Some(value) = interp.env.get(name) {
                if value.is_callable() {
                    callables.push((name.clone(), value));
                }
            }
        }

        Ok(Evaluation {
            interp,
            callables,
            top_level_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn harvests_callables_in_listed_order() {
        let source = "function b() { return 2; }\nfunction a() { return 1; }";
        let eval = Sandbox::new()
            .evaluate(source, &names(&["b", "a"]))
            .unwrap();
        let got: Vec<&str> = eval.callables.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(got, vec!["b", "a"]);
        assert!(eval.top_level_error.is_none());
    }

    #[test]
    fn non_callable_bindings_are_skipped() {
        let source = "const x = 5;\nconst f = () => x;";
        let eval = Sandbox::new()
            .evaluate(source, &names(&["x", "f"]))
            .unwrap();
        assert!(eval.callable("x").is_none());
        assert!(eval.callable("f").is_some());
    }

    #[test]
    fn top_level_error_keeps_hoisted_functions() {
        let source = "function f() { return 1; }\nmissing();";
        let eval = Sandbox::new().evaluate(source, &names(&["f"])).unwrap();
        assert!(eval.callable("f").is_some());
        assert_eq!(
            eval.top_level_error.as_deref(),
            Some("missing is not defined")
        );
    }

    #[test]
    fn syntax_errors_are_hard_failures() {
        match Sandbox::new().evaluate("function ( {", &names(&[])) {
            Err(errors) => assert!(errors.has_errors()),
            Ok(_) => panic!("expected a compile failure"),
        }
    }

    #[test]
    fn infinite_top_level_loop_is_cut_off() {
        let eval = Sandbox::with_gas_limit(10_000)
            .evaluate("let n = 0; while (true) { n = n + 1; }", &names(&[]))
            .unwrap();
        assert_eq!(eval.top_level_error.as_deref(), Some("execution timed out"));
    }
}
