//! Function extractor tests: recognized binding shapes, source order,
//! duplicate collapsing, and annotation blindness.

use kata_transpile::extract_function_names;

fn names(source: &str) -> Vec<String> {
    extract_function_names(source)
}

// ─────────────────────────────────────────────────────────────────────
// Recognized shapes
// ─────────────────────────────────────────────────────────────────────

#[test]
fn named_function_statements() {
    assert_eq!(names("function add(a, b) { return a + b; }"), vec!["add"]);
}

#[test]
fn async_function_statements() {
    assert_eq!(
        names("async function fetchSum(a, b) { return a + b; }"),
        vec!["fetchSum"]
    );
}

#[test]
fn const_bound_arrow_functions() {
    assert_eq!(names("const double = (x) => x * 2;"), vec!["double"]);
    assert_eq!(names("const triple = x => x * 3;"), vec!["triple"]);
}

#[test]
fn let_and_var_bound_functions() {
    assert_eq!(names("let f = () => 1;"), vec!["f"]);
    assert_eq!(names("var g = function (x) { return x; };"), vec!["g"]);
}

#[test]
fn async_arrow_bindings() {
    assert_eq!(names("const load = async (id) => id;"), vec!["load"]);
}

#[test]
fn shorthand_object_bindings() {
    assert_eq!(
        names("const api = { get: (url) => url, post: function (url) { return url; } };"),
        vec!["get", "post"]
    );
}

#[test]
fn annotated_bindings_are_recognized() {
    assert_eq!(
        names("const pick: (xs: number[]) => number = (xs) => xs[0];"),
        vec!["pick"]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Order, duplicates, and non-matches
// ─────────────────────────────────────────────────────────────────────

#[test]
fn names_come_back_in_source_order() {
    let source = "
        function zulu() { return 1; }
        const alpha = () => 2;
        function mike() { return 3; }
    ";
    assert_eq!(names(source), vec!["zulu", "alpha", "mike"]);
}

#[test]
fn duplicates_collapse_to_first_occurrence() {
    let source = "
        function f() { return 1; }
        const f = () => 2;
        function g() { return 3; }
    ";
    assert_eq!(names(source), vec!["f", "g"]);
}

#[test]
fn extraction_is_idempotent() {
    let source = "function a() {}\nconst b = () => 1;";
    assert_eq!(names(source), names(source));
}

#[test]
fn non_function_bindings_are_ignored() {
    assert_eq!(names("const x = 1;\nlet s = \"f\";"), Vec::<String>::new());
}

#[test]
fn empty_source_yields_no_names() {
    assert_eq!(names(""), Vec::<String>::new());
}

#[test]
fn function_expressions_as_arguments_are_not_top_level_bindings() {
    // The callback is anonymous; only `run` is a binding.
    assert_eq!(
        names("const run = (cb) => cb();\nrun(function () { return 1; });"),
        vec!["run"]
    );
}

// ─────────────────────────────────────────────────────────────────────
// Annotation blindness
// ─────────────────────────────────────────────────────────────────────

#[test]
fn parameter_type_annotations_produce_no_phantom_names() {
    // `cb: () => void` looks like a shorthand binding in raw tokens;
    // extraction runs over the type-erased form, so it is invisible.
    assert_eq!(
        names("function apply(cb: () => void): void { cb(); }"),
        vec!["apply"]
    );
}

#[test]
fn typed_functions_extract_after_erasure() {
    let source = "
        function sum(xs: number[]): number { return xs.length; }
        const head = <T>(xs: T[]): T => xs[0];
    ";
    let got = names(source);
    assert!(got.contains(&"sum".to_string()));
}

#[test]
fn untranspilable_source_falls_back_to_raw_scan() {
    // The namespace makes transpilation fail; extraction still finds
    // the function in raw tokens.
    assert_eq!(
        names("namespace N {}\nfunction f() { return 1; }"),
        vec!["f"]
    );
}
