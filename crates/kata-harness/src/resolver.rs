//! Picks which candidate function answers a given test case.
//!
//! Snippets often define more than one top-level function (helpers,
//! alternates, the exercise entry point). The policy below is ordered
//! and deterministic so a result never depends on map iteration order:
//!
//! 1. A single candidate answers everything.
//! 2. A case with a description picks the candidate whose name is a
//!    case-insensitive prefix of it, preferring the longest name and
//!    breaking remaining ties by source order.
//! 3. Otherwise the first candidate whose arity matches the input
//!    count wins.
//! 4. Otherwise resolution fails for this case only.

use kata_eval::Value;
use kata_types::TestCase;

/// A top-level callable harvested from the snippet, in source order.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub name: String,
    pub arity: usize,
    pub value: Value,
}

impl Candidate {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        let arity = match &value {
            Value::Function(closure) => closure.func.arity(),
            _ => 0,
        };
        Self {
            name: name.into(),
            arity,
            value,
        }
    }
}

/// Apply the resolution policy. `None` means no candidate fits.
pub fn resolve<'a>(candidates: &'a [Candidate], case: &TestCase) -> Option<&'a Candidate> {
    match candidates {
        [] => None,
        [only] => Some(only),
        _ => by_description(candidates, case)
            .or_else(|| by_arity(candidates, case)),
    }
}

fn by_description<'a>(candidates: &'a [Candidate], case: &TestCase) -> Option<&'a Candidate> {
    let description = case.description.as_deref()?.to_lowercase();
    candidates
        .iter()
        .filter(|c| description.starts_with(&c.name.to_lowercase()))
        // max_by_key keeps the LAST maximum; reversed enumeration
        // makes earliest source order win ties on name length.
        .rev()
        .max_by_key(|c| c.name.len())
}

fn by_arity<'a>(candidates: &'a [Candidate], case: &TestCase) -> Option<&'a Candidate> {
    candidates.iter().find(|c| c.arity == case.input.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kata_eval::Sandbox;
    use serde_json::json;

    fn candidates_from(source: &str, names: &[&str]) -> Vec<Candidate> {
        let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        let eval = Sandbox::new().evaluate(source, &names).unwrap();
        eval.callables
            .into_iter()
            .map(|(name, value)| Candidate::new(name, value))
            .collect()
    }

    #[test]
    fn single_candidate_answers_any_case() {
        let candidates = candidates_from("function add(a, b) { return a + b; }", &["add"]);
        let case = TestCase::new(vec![], json!(null)).with_description("something unrelated");
        assert_eq!(resolve(&candidates, &case).unwrap().name, "add");
    }

    #[test]
    fn description_prefix_beats_arity() {
        let source = "
            function flattenDeep(a) { return a; }
            function flattenToDepth(a, d) { return a; }
            function expandAndFlatten(a) { return a; }
        ";
        let candidates =
            candidates_from(source, &["flattenDeep", "flattenToDepth", "expandAndFlatten"]);
        let case = TestCase::new(vec![json!([1, [2]])], json!([1, 2]))
            .with_description("flattenDeep should completely flatten");
        assert_eq!(resolve(&candidates, &case).unwrap().name, "flattenDeep");
    }

    #[test]
    fn prefix_match_is_case_insensitive() {
        let source = "
            function sumall(a) { return a; }
            function product(a) { return a; }
        ";
        let candidates = candidates_from(source, &["sumall", "product"]);
        let case = TestCase::new(vec![json!(1), json!(2)], json!(3))
            .with_description("sumAll adds every argument");
        assert_eq!(resolve(&candidates, &case).unwrap().name, "sumall");
    }

    #[test]
    fn longest_matching_name_wins() {
        let source = "
            function flatten(a) { return a; }
            function flattenDeep(a) { return a; }
        ";
        let candidates = candidates_from(source, &["flatten", "flattenDeep"]);
        let case = TestCase::new(vec![json!([])], json!([]))
            .with_description("flattenDeep should completely flatten");
        assert_eq!(resolve(&candidates, &case).unwrap().name, "flattenDeep");
    }

    #[test]
    fn equal_length_prefix_tie_goes_to_source_order() {
        let source = "
            function aaab(x) { return x; }
            function aaaB(x) { return x; }
        ";
        let candidates = candidates_from(source, &["aaab", "aaaB"]);
        let case =
            TestCase::new(vec![json!(1)], json!(1)).with_description("aaab does something");
        assert_eq!(resolve(&candidates, &case).unwrap().name, "aaab");
    }

    #[test]
    fn arity_breaks_ties_without_description() {
        let source = "
            function one(a) { return a; }
            function two(a, b) { return a + b; }
        ";
        let candidates = candidates_from(source, &["one", "two"]);
        let case = TestCase::new(vec![json!(1), json!(2)], json!(3));
        assert_eq!(resolve(&candidates, &case).unwrap().name, "two");
    }

    #[test]
    fn unresolvable_case_returns_none() {
        let source = "
            function one(a) { return a; }
            function two(a, b) { return a + b; }
        ";
        let candidates = candidates_from(source, &["one", "two"]);
        let case = TestCase::new(vec![json!(1), json!(2), json!(3)], json!(6));
        assert!(resolve(&candidates, &case).is_none());
    }

    #[test]
    fn default_params_do_not_count_toward_arity() {
        let source = "function greet(name, punct = '!') { return name + punct; }";
        let candidates = candidates_from(source, &["greet"]);
        assert_eq!(candidates[0].arity, 1);
    }
}
