//! Evaluator tests: a snippet is loaded once through the sandbox, then
//! its functions are invoked the way the test runner invokes them.

use kata_eval::{Evaluation, EvalError, Sandbox, Value};
use serde_json::{json, Value as Json};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

fn load(source: &str, names: &[&str]) -> Evaluation {
    let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    Sandbox::new()
        .evaluate(source, &names)
        .expect("snippet should compile")
}

/// Load a one-function snippet and invoke it with JSON arguments,
/// returning the settled result as JSON.
fn call(source: &str, func: &str, args: &[Json]) -> Result<Json, EvalError> {
    let mut eval = load(source, &[func]);
    call_in(&mut eval, func, args)
}

fn call_in(eval: &mut Evaluation, func: &str, args: &[Json]) -> Result<Json, EvalError> {
    let callee = eval.callable(func).cloned().expect("function not found");
    let args: Vec<Value> = args.iter().map(Value::from_json).collect();
    eval.interp.reset_gas();
    let result = eval.interp.call_value(&callee, args, func)?;
    eval.interp.force(result).map(|v| v.to_json())
}

fn ok(source: &str, func: &str, args: &[Json]) -> Json {
    call(source, func, args).expect("call should succeed")
}

// ─────────────────────────────────────────────────────────────────────
// Arithmetic & coercion
// ─────────────────────────────────────────────────────────────────────

#[test]
fn basic_arithmetic() {
    let src = "function add(a, b) { return a + b; }";
    assert_eq!(ok(src, "add", &[json!(2.0), json!(3.0)]), json!(5.0));
    assert_eq!(ok(src, "add", &[json!(-1.5), json!(0.5)]), json!(-1.0));
}

#[test]
fn plus_concatenates_when_either_side_is_a_string() {
    let src = "function glue(a, b) { return a + b; }";
    assert_eq!(ok(src, "glue", &[json!("a"), json!("b")]), json!("ab"));
    assert_eq!(ok(src, "glue", &[json!(1.0), json!("x")]), json!("1x"));
}

#[test]
fn arithmetic_coerces_non_numbers() {
    let src = "function mul(a, b) { return a * b; }";
    assert_eq!(ok(src, "mul", &[json!("5"), json!("2")]), json!(10.0));
    assert_eq!(ok(src, "mul", &[json!(true), json!(3.0)]), json!(3.0));
}

#[test]
fn division_by_zero_is_infinity_and_has_no_json_form() {
    // Infinity collapses to null in the JSON report.
    assert_eq!(
        ok("function f(a) { return a / 0; }", "f", &[json!(1.0)]),
        Json::Null
    );
}

#[test]
fn exponent_and_modulo() {
    assert_eq!(
        ok("function f(a, b) { return a ** b; }", "f", &[json!(2.0), json!(10.0)]),
        json!(1024.0)
    );
    assert_eq!(
        ok("function f(a, b) { return a % b; }", "f", &[json!(7.0), json!(3.0)]),
        json!(1.0)
    );
}

#[test]
fn loose_and_strict_equality_differ() {
    let src = "function check(a, b) { return [a == b, a === b]; }";
    assert_eq!(
        ok(src, "check", &[json!("1"), json!(1.0)]),
        json!([true, false])
    );
    assert_eq!(
        ok(src, "check", &[json!(null), json!(null)]),
        json!([true, true])
    );
}

#[test]
fn coalesce_skips_null_but_not_zero() {
    let src = "function pick(a, b) { return a ?? b; }";
    assert_eq!(ok(src, "pick", &[json!(null), json!(7.0)]), json!(7.0));
    assert_eq!(ok(src, "pick", &[json!(0.0), json!(7.0)]), json!(0.0));
}

#[test]
fn typeof_reports_runtime_types() {
    let src = "function kind(x) { return typeof x; }";
    assert_eq!(ok(src, "kind", &[json!(1.0)]), json!("number"));
    assert_eq!(ok(src, "kind", &[json!("s")]), json!("string"));
    assert_eq!(ok(src, "kind", &[json!(true)]), json!("boolean"));
    assert_eq!(ok(src, "kind", &[json!([1, 2])]), json!("object"));
    assert_eq!(ok(src, "kind", &[json!(null)]), json!("object"));
}

#[test]
fn template_literals_interpolate() {
    let src = "function greet(name, n) { return `hi ${name}, you have ${n + 1} items`; }";
    assert_eq!(
        ok(src, "greet", &[json!("ana"), json!(2.0)]),
        json!("hi ana, you have 3 items")
    );
}

// ─────────────────────────────────────────────────────────────────────
// Control flow & loops
// ─────────────────────────────────────────────────────────────────────

#[test]
fn c_style_loop_accumulates() {
    let src = "function sumTo(n) { let t = 0; for (let i = 1; i <= n; i++) { t += i; } return t; }";
    assert_eq!(ok(src, "sumTo", &[json!(100.0)]), json!(5050.0));
}

#[test]
fn for_of_iterates_values_and_for_in_iterates_keys() {
    let src = r#"
        function sum(xs) { let t = 0; for (const x of xs) { t += x; } return t; }
        function keys(o) { const out = []; for (const k in o) { out.push(k); } return out; }
    "#;
    assert_eq!(ok(src, "sum", &[json!([1, 2, 3])]), json!(6.0));
    assert_eq!(
        ok(src, "keys", &[json!({"a": 1, "b": 2})]),
        json!(["a", "b"])
    );
}

#[test]
fn break_and_continue() {
    let src = r#"
        function firstEven(xs) {
            for (const x of xs) {
                if (x % 2 !== 0) { continue; }
                return x;
            }
            return -1;
        }
    "#;
    assert_eq!(ok(src, "firstEven", &[json!([1, 3, 4, 6])]), json!(4.0));
    assert_eq!(ok(src, "firstEven", &[json!([1, 3])]), json!(-1.0));
}

#[test]
fn while_loop_with_early_break() {
    let src = r#"
        function collatzSteps(n) {
            let steps = 0;
            while (true) {
                if (n === 1) { break; }
                n = n % 2 === 0 ? n / 2 : 3 * n + 1;
                steps++;
            }
            return steps;
        }
    "#;
    assert_eq!(ok(src, "collatzSteps", &[json!(6.0)]), json!(8.0));
}

// ─────────────────────────────────────────────────────────────────────
// Functions, closures, recursion
// ─────────────────────────────────────────────────────────────────────

#[test]
fn parameters_and_locals_shadow_outer_bindings() {
    // Resolution must start at the innermost scope: the parameter `x`
    // and the block-local `y` hide the top-level names, and shorthand
    // object fields read from the active scope too.
    let src = r#"
        const x = 100;
        let y = 200;
        function innerView(x) {
            let y = x + 1;
            if (true) { let y = 0; }
            return { x, y };
        }
    "#;
    assert_eq!(
        ok(src, "innerView", &[json!(5.0)]),
        json!({"x": 5.0, "y": 6.0})
    );
}

#[test]
fn closures_capture_top_level_state_across_calls() {
    let src = "let count = 0; function next() { count += 1; return count; }";
    let mut eval = load(src, &["next"]);
    assert_eq!(call_in(&mut eval, "next", &[]).unwrap(), json!(1.0));
    assert_eq!(call_in(&mut eval, "next", &[]).unwrap(), json!(2.0));
    assert_eq!(call_in(&mut eval, "next", &[]).unwrap(), json!(3.0));
}

#[test]
fn default_and_rest_parameters() {
    let src = r#"
        function pad(s, width = 4) { return s.padStart(width, "0"); }
        function gather(first, ...rest) { return [first, rest.length]; }
    "#;
    assert_eq!(ok(src, "pad", &[json!("7")]), json!("0007"));
    assert_eq!(
        ok(src, "gather", &[json!(1.0), json!(2.0), json!(3.0)]),
        json!([1.0, 2.0])
    );
}

#[test]
fn higher_order_functions_and_arrows() {
    let src = r#"
        const twice = f => x => f(f(x));
        function applyTwice(n) { return twice(m => m * 3)(n); }
    "#;
    assert_eq!(ok(src, "applyTwice", &[json!(2.0)]), json!(18.0));
}

#[test]
fn mutual_recursion_via_hoisting() {
    let src = r#"
        function isEven(n) { return n === 0 ? true : isOdd(n - 1); }
        function isOdd(n) { return n === 0 ? false : isEven(n - 1); }
    "#;
    assert_eq!(ok(src, "isEven", &[json!(10.0)]), json!(true));
    assert_eq!(ok(src, "isEven", &[json!(7.0)]), json!(false));
}

#[test]
fn runaway_recursion_hits_the_depth_ceiling() {
    let err = call("function f(n) { return f(n + 1); }", "f", &[json!(0.0)]).unwrap_err();
    assert!(err.to_string().contains("maximum call stack size exceeded"));
}

#[test]
fn named_function_expression_can_recurse() {
    let src = "const fact = function go(n) { return n <= 1 ? 1 : n * go(n - 1); };";
    assert_eq!(ok(src, "fact", &[json!(10.0)]), json!(3628800.0));
}

#[test]
fn array_and_object_arguments_alias_within_a_call() {
    let src = r#"
        function touchBoth(pair) {
            const a = pair[0];
            a.push(9);
            return pair[0];
        }
    "#;
    // `a` and `pair[0]` are the same array.
    assert_eq!(
        ok(src, "touchBoth", &[json!([[1, 2]])]),
        json!([1.0, 2.0, 9.0])
    );
}

// ─────────────────────────────────────────────────────────────────────
// Builtin methods
// ─────────────────────────────────────────────────────────────────────

#[test]
fn map_filter_reduce_chain() {
    let src = r#"
        function total(xs) {
            return xs.map(x => x * 2).filter(x => x > 2).reduce((a, b) => a + b, 0);
        }
    "#;
    assert_eq!(ok(src, "total", &[json!([1, 2, 3])]), json!(10.0));
}

#[test]
fn sort_is_lexicographic_without_a_comparator() {
    let src = "function s(xs) { return xs.sort(); }";
    assert_eq!(
        ok(src, "s", &[json!([10, 9, 1])]),
        json!([1.0, 10.0, 9.0])
    );
    let src = "function s(xs) { return xs.sort((a, b) => a - b); }";
    assert_eq!(
        ok(src, "s", &[json!([10, 9, 1])]),
        json!([1.0, 9.0, 10.0])
    );
}

#[test]
fn flat_with_depth() {
    let src = "function f(xs, d) { return xs.flat(d); }";
    assert_eq!(
        ok(src, "f", &[json!([1, [2, [3, [4]]]]), json!(1.0)]),
        json!([1.0, 2.0, [3.0, [4.0]]])
    );
    // Infinity flattens completely.
    let src = "function f(xs) { return xs.flat(Infinity); }";
    assert_eq!(
        ok(src, "f", &[json!([1, [2, [3, [4]]]])]),
        json!([1.0, 2.0, 3.0, 4.0])
    );
}

#[test]
fn includes_uses_same_value_zero() {
    let src = "function has(xs) { return xs.includes(NaN); }";
    let mut eval = load(src, &["has"]);
    let callee = eval.callable("has").cloned().unwrap();
    let arg = Value::array(vec![Value::Number(1.0), Value::Number(f64::NAN)]);
    let got = eval.interp.call_value(&callee, vec![arg], "has").unwrap();
    assert!(matches!(got, Value::Bool(true)));
}

#[test]
fn string_methods() {
    let src = r#"
        function shout(s) { return s.trim().toUpperCase(); }
        function initials(s) { return s.split(" ").map(w => w[0]).join(""); }
    "#;
    assert_eq!(ok(src, "shout", &[json!("  hey  ")]), json!("HEY"));
    assert_eq!(ok(src, "initials", &[json!("ada lovelace")]), json!("al"));
}

#[test]
fn object_statics() {
    let src = r#"
        function shape(o) { return [Object.keys(o), Object.values(o)]; }
    "#;
    assert_eq!(
        ok(src, "shape", &[json!({"x": 1, "y": 2})]),
        json!([["x", "y"], [1.0, 2.0]])
    );
}

#[test]
fn math_and_number_builtins() {
    let src = r#"
        function f(x) { return Math.max(Math.abs(x), Math.floor(2.9)); }
        function near(x) { return Number(x.toFixed(2)); }
    "#;
    assert_eq!(ok(src, "f", &[json!(-5.0)]), json!(5.0));
    assert_eq!(ok(src, "near", &[json!(1.0 / 3.0)]), json!(0.33));
}

#[test]
fn math_random_is_deterministic_and_bounded() {
    let src = "function r() { return Math.random(); }";
    let first: Vec<Json> = {
        let mut eval = load(src, &["r"]);
        (0..5).map(|_| call_in(&mut eval, "r", &[]).unwrap()).collect()
    };
    let second: Vec<Json> = {
        let mut eval = load(src, &["r"]);
        (0..5).map(|_| call_in(&mut eval, "r", &[]).unwrap()).collect()
    };
    assert_eq!(first, second);
    for v in &first {
        let n = v.as_f64().unwrap();
        assert!((0.0..1.0).contains(&n));
    }
}

#[test]
fn json_roundtrip_inside_the_snippet() {
    let src = "function clone(o) { return JSON.parse(JSON.stringify(o)); }";
    assert_eq!(
        ok(src, "clone", &[json!({"a": [1, 2], "b": "x"})]),
        json!({"a": [1.0, 2.0], "b": "x"})
    );
}

#[test]
fn spread_in_calls_and_literals() {
    let src = r#"
        function widest(xs) { return Math.max(...xs); }
        function merged(a, b) { return { ...a, ...b }; }
    "#;
    assert_eq!(ok(src, "widest", &[json!([3, 9, 4])]), json!(9.0));
    assert_eq!(
        ok(src, "merged", &[json!({"x": 1}), json!({"x": 2, "y": 3})]),
        json!({"x": 2.0, "y": 3.0})
    );
}

// ─────────────────────────────────────────────────────────────────────
// Errors, throw, try/catch
// ─────────────────────────────────────────────────────────────────────

#[test]
fn uncaught_error_object_reports_name_and_message() {
    let err = call(
        "function f() { throw new Error(\"boom\"); }",
        "f",
        &[],
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Error: boom");
}

#[test]
fn typed_error_constructors_keep_their_names() {
    let err = call(
        "function f() { throw new TypeError(\"bad shape\"); }",
        "f",
        &[],
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "TypeError: bad shape");
}

#[test]
fn thrown_strings_surface_as_is() {
    let err = call("function f() { throw \"plain\"; }", "f", &[]).unwrap_err();
    assert_eq!(err.to_string(), "plain");
}

#[test]
fn catch_receives_the_error_and_recovers() {
    let src = r#"
        function safe(x) {
            try {
                if (x < 0) { throw new Error("negative"); }
                return x;
            } catch (e) {
                return e.message;
            }
        }
    "#;
    assert_eq!(ok(src, "safe", &[json!(5.0)]), json!(5.0));
    assert_eq!(ok(src, "safe", &[json!(-1.0)]), json!("negative"));
}

#[test]
fn finally_runs_on_both_paths() {
    let src = r#"
        function trace(fail) {
            const log = [];
            try {
                log.push("try");
                if (fail) { throw "x"; }
            } catch {
                log.push("catch");
            } finally {
                log.push("finally");
            }
            return log;
        }
    "#;
    assert_eq!(
        ok(src, "trace", &[json!(false)]),
        json!(["try", "finally"])
    );
    assert_eq!(
        ok(src, "trace", &[json!(true)]),
        json!(["try", "catch", "finally"])
    );
}

#[test]
fn gas_exhaustion_is_not_catchable() {
    let src = r#"
        function spin() {
            try {
                while (true) {}
            } catch (e) {
                return "caught";
            }
        }
    "#;
    let mut eval = Sandbox::with_gas_limit(10_000)
        .evaluate(src, &["spin".to_string()])
        .unwrap();
    let err = call_in(&mut eval, "spin", &[]).unwrap_err();
    assert_eq!(err.to_string(), "execution timed out");
}

#[test]
fn reset_gas_gives_each_invocation_a_fresh_budget() {
    let src =
        "function work() { let t = 0; for (let i = 0; i < 1000; i++) { t += i; } return t; }";
    let mut eval = Sandbox::with_gas_limit(100_000)
        .evaluate(src, &["work".to_string()])
        .unwrap();
    for _ in 0..20 {
        assert_eq!(call_in(&mut eval, "work", &[]).unwrap(), json!(499500.0));
    }
}

#[test]
fn undefined_reference_error() {
    let err = call("function f() { return missing + 1; }", "f", &[]).unwrap_err();
    assert_eq!(err.to_string(), "missing is not defined");
}

#[test]
fn calling_a_non_function_errors() {
    let err = call("function f(x) { return x(); }", "f", &[json!(3.0)]).unwrap_err();
    assert!(err.to_string().contains("is not a function"));
}

#[test]
fn host_apis_are_refused_with_a_sandbox_error() {
    let err = call(
        "function f(url) { return fetch(url); }",
        "f",
        &[json!("http://x")],
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "'fetch' is not available in the sandbox");

    let err = call("function f() { return new Date(); }", "f", &[]).unwrap_err();
    assert_eq!(err.to_string(), "'Date' is not available in the sandbox");
}

// ─────────────────────────────────────────────────────────────────────
// Promises & async
// ─────────────────────────────────────────────────────────────────────

#[test]
fn async_function_result_settles_eagerly() {
    let src = "async function f(n) { return n * 2; }";
    assert_eq!(ok(src, "f", &[json!(4.0)]), json!(8.0));
}

#[test]
fn await_unwraps_resolved_promises() {
    let src = r#"
        async function inner(n) { return n + 1; }
        async function outer(n) { const v = await inner(n); return v * 10; }
    "#;
    assert_eq!(ok(src, "outer", &[json!(2.0)]), json!(30.0));
}

#[test]
fn rejected_async_function_surfaces_the_error() {
    let src = "async function f() { throw new Error(\"nope\"); }";
    let err = call(src, "f", &[]).unwrap_err();
    assert_eq!(err.to_string(), "Error: nope");
}

#[test]
fn promise_executor_runs_eagerly() {
    let src = r#"
        function f(n) {
            return new Promise((resolve, reject) => {
                if (n > 0) { resolve(n); } else { reject(new Error("neg")); }
            });
        }
    "#;
    assert_eq!(ok(src, "f", &[json!(3.0)]), json!(3.0));
    let err = call(src, "f", &[json!(-1.0)]).unwrap_err();
    assert_eq!(err.to_string(), "Error: neg");
}

#[test]
fn then_and_catch_chain() {
    let src = r#"
        function f(n) {
            return Promise.resolve(n)
                .then(x => x * 2)
                .then(x => { if (x > 10) { throw "big"; } return x; })
                .catch(e => -1);
        }
    "#;
    assert_eq!(ok(src, "f", &[json!(3.0)]), json!(6.0));
    assert_eq!(ok(src, "f", &[json!(9.0)]), json!(-1.0));
}

#[test]
fn promise_all_collects_in_order() {
    let src = r#"
        async function double(n) { return n * 2; }
        async function f(xs) { return await Promise.all(xs.map(double)); }
    "#;
    assert_eq!(
        ok(src, "f", &[json!([1, 2, 3])]),
        json!([2.0, 4.0, 6.0])
    );
}

#[test]
fn awaiting_a_never_settled_promise_times_out() {
    let src = "function f() { return new Promise((resolve) => {}); }";
    let err = call(src, "f", &[]).unwrap_err();
    assert_eq!(err.to_string(), "timed out waiting for promise to settle");
}

#[test]
fn try_catch_wrapped_await_catches_rejection() {
    let src = r#"
        async function boom() { throw new Error("deep"); }
        async function f() {
            try {
                return await boom();
            } catch (e) {
                return e.message;
            }
        }
    "#;
    assert_eq!(ok(src, "f", &[]), json!("deep"));
}

// ─────────────────────────────────────────────────────────────────────
// Console capture
// ─────────────────────────────────────────────────────────────────────

#[test]
fn console_output_is_captured_per_line() {
    let src = r#"
        function f(xs) {
            console.log("start", xs.length);
            console.warn(xs);
            return xs.length;
        }
    "#;
    let mut eval = load(src, &["f"]);
    call_in(&mut eval, "f", &[json!([1, 2])]).unwrap();
    let lines = eval.interp.take_console();
    assert_eq!(lines, vec!["start 2", "[1, 2]"]);
    // Drained: the next read starts empty.
    assert!(eval.interp.take_console().is_empty());
}

// ─────────────────────────────────────────────────────────────────────
// Transpiled snippets
// ─────────────────────────────────────────────────────────────────────

#[test]
fn typed_source_runs_after_transpilation() {
    let typed = r#"
        function clampAll(xs: number[], lo: number, hi: number): number[] {
            return xs.map((x: number): number => Math.min(hi, Math.max(lo, x)));
        }
    "#;
    let plain = kata_transpile::transpile(typed).expect("transpile");
    assert_eq!(
        ok(&plain, "clampAll", &[json!([-5, 3, 99]), json!(0.0), json!(10.0)]),
        json!([0.0, 3.0, 10.0])
    );
}

#[test]
fn lowered_enums_work_in_both_directions() {
    let typed = r#"
        enum Color { Red, Green, Blue }
        function describe(n: number): string {
            return `${Color[n]} = ${Color.Green}`;
        }
    "#;
    let plain = kata_transpile::transpile(typed).expect("transpile");
    assert_eq!(ok(&plain, "describe", &[json!(2.0)]), json!("Blue = 1"));
}
