//! Runtime values.
//!
//! Arrays and objects are reference types shared through `Rc<RefCell<..>>`
//! so that mutation inside one call is visible to later calls through the
//! same binding, matching the host language's aliasing semantics.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use kata_types::ast::FunctionExpr;
use serde_json::Value as Json;

use crate::env::Environment;

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    Str(String),
    Bool(bool),
    Null,
    Undefined,
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<BTreeMap<String, Value>>>),
    /// A user-defined function with its captured environment.
    Function(Rc<Closure>),
    /// A host-provided function or namespace, addressed by dotted name
    /// (`"parseInt"`, `"Math.max"`, `"console"`).
    Native(Rc<str>),
    Promise(Rc<RefCell<PromiseState>>),
    /// The `resolve` / `reject` callback handed to a `Promise` executor.
    Resolver {
        state: Rc<RefCell<PromiseState>>,
        reject: bool,
    },
}

/// A user-defined callable: parameters, body, captured scope.
#[derive(Debug)]
pub struct Closure {
    pub func: Rc<FunctionExpr>,
    pub env: Environment,
}

impl Closure {
    pub fn name(&self) -> &str {
        self.func.name.as_deref().unwrap_or("")
    }
}

/// Settlement state of a promise.
///
/// Execution is single-threaded and eager: async bodies and executor
/// callbacks run at creation time, so a promise that is still pending
/// when awaited will never settle.
#[derive(Debug, Clone)]
pub enum PromiseState {
    Pending,
    Resolved(Value),
    Rejected(Value),
}

impl Value {
    pub fn array(values: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(values)))
    }

    pub fn object(fields: BTreeMap<String, Value>) -> Value {
        Value::Object(Rc::new(RefCell::new(fields)))
    }

    pub fn resolved(value: Value) -> Value {
        Value::Promise(Rc::new(RefCell::new(PromiseState::Resolved(value))))
    }

    pub fn rejected(value: Value) -> Value {
        Value::Promise(Rc::new(RefCell::new(PromiseState::Rejected(value))))
    }

    /// `true` for values that can be invoked.
    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_) | Value::Native(_) | Value::Resolver { .. }
        )
    }

    /// Truthiness: `false`, `0`, `NaN`, `""`, `null`, `undefined` are
    /// falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Null | Value::Undefined => false,
            _ => true,
        }
    }

    /// `typeof` result.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Undefined => "undefined",
            Value::Function(_) | Value::Resolver { .. } => "function",
            Value::Native(name) => {
                if crate::builtins::is_namespace(name) {
                    "object"
                } else {
                    "function"
                }
            }
            // `typeof null` is famously "object".
            Value::Null | Value::Array(_) | Value::Object(_) | Value::Promise(_) => "object",
        }
    }

    /// Strict equality (`===`): by value for primitives, by reference
    /// for arrays, objects, and functions.
    pub fn strict_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Promise(a), Value::Promise(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a == b,
            _ => false,
        }
    }

    /// Loose equality (`==`): strict equality plus `null == undefined`
    /// and number/string/boolean coercion.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null | Value::Undefined, Value::Null | Value::Undefined) => true,
            (Value::Number(n), Value::Str(s)) | (Value::Str(s), Value::Number(n)) => {
                str_to_number(s) == *n
            }
            (Value::Bool(b), v) | (v, Value::Bool(b)) => {
                Value::Number(if *b { 1.0 } else { 0.0 }).loose_eq(v)
            }
            _ => self.strict_eq(other),
        }
    }

    /// Numeric coercion (`+x`, arithmetic on non-numbers).
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Number(n) => *n,
            Value::Bool(true) => 1.0,
            Value::Bool(false) => 0.0,
            Value::Null => 0.0,
            Value::Str(s) => str_to_number(s),
            Value::Array(items) => {
                let items = items.borrow();
                match items.len() {
                    0 => 0.0,
                    1 => items[0].to_number(),
                    _ => f64::NAN,
                }
            }
            _ => f64::NAN,
        }
    }

    /// String coercion, matching the host `String(x)` conversion.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Null => "null".to_string(),
            Value::Undefined => "undefined".to_string(),
            Value::Array(items) => items
                .borrow()
                .iter()
                .map(|v| match v {
                    Value::Null | Value::Undefined => String::new(),
                    other => other.to_display_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Function(closure) => match closure.func.name.as_deref() {
                Some(name) => format!("function {name}() {{ ... }}"),
                None => "function () { ... }".to_string(),
            },
            Value::Native(name) => format!("function {name}() {{ [native code] }}"),
            Value::Resolver { .. } => "function () { [native code] }".to_string(),
            Value::Promise(_) => "[object Promise]".to_string(),
        }
    }

    /// Console rendering: like display, but strings keep no quotes at
    /// the top level while arrays and objects print structurally.
    pub fn to_console_string(&self) -> String {
        match self {
            Value::Str(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => self.inspect(),
            other => other.to_display_string(),
        }
    }

    /// Structural rendering used inside logged arrays/objects.
    fn inspect(&self) -> String {
        match self {
            Value::Str(s) => format!("\"{s}\""),
            Value::Array(items) => {
                let inner = items
                    .borrow()
                    .iter()
                    .map(|v| v.inspect())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{inner}]")
            }
            Value::Object(fields) => {
                let inner = fields
                    .borrow()
                    .iter()
                    .map(|(k, v)| format!("{k}: {}", v.inspect()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{{ {inner} }}")
            }
            other => other.to_display_string(),
        }
    }

    /// Convert a JSON value (test-case input / expected output) into a
    /// runtime value.
    pub fn from_json(json: &Json) -> Value {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(*b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::Str(s.clone()),
            Json::Array(items) => Value::array(items.iter().map(Value::from_json).collect()),
            Json::Object(fields) => Value::object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert back to JSON for reporting. Functions and promises have
    /// no JSON form and collapse to `null`; `undefined` does too.
    pub fn to_json(&self) -> Json {
        match self {
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Str(s) => Json::String(s.clone()),
            Value::Bool(b) => Json::Bool(*b),
            Value::Array(items) => Json::Array(items.borrow().iter().map(Value::to_json).collect()),
            Value::Object(fields) => Json::Object(
                fields
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            _ => Json::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

/// Format a number the way the host language prints it: integral
/// values without a fractional part.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// `Number("...")` coercion: trimmed empty string is 0, otherwise a
/// full-string parse or NaN.
pub fn str_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}
