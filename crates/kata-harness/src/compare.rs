//! Structural deep equality between a produced value and an expected
//! value. Arrays compare in order, objects by key set regardless of
//! order, and NaN equals NaN so numeric exercises can expect it.

use kata_eval::Value;

pub fn deep_eq(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => (a.is_nan() && b.is_nan()) || a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Null, Value::Null) => true,
        (Value::Undefined, Value::Undefined) => true,
        (Value::Array(a), Value::Array(b)) => {
            let (a, b) = (a.borrow(), b.borrow());
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| deep_eq(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            let (a, b) = (a.borrow(), b.borrow());
            a.len() == b.len()
                && a.iter().all(|(key, value)| {
                    b.get(key).map(|other| deep_eq(value, other)).unwrap_or(false)
                })
        }
        _ => actual.strict_eq(expected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from_json(&json)
    }

    #[test]
    fn object_key_order_is_irrelevant() {
        assert!(deep_eq(&v(json!({"a": 1, "b": 2})), &v(json!({"b": 2, "a": 1}))));
    }

    #[test]
    fn nested_arrays_are_not_flattened() {
        assert!(!deep_eq(&v(json!([1, [2, 3]])), &v(json!([1, 2, 3]))));
        assert!(deep_eq(&v(json!([1, [2, 3]])), &v(json!([1, [2, 3]]))));
    }

    #[test]
    fn array_length_must_match() {
        assert!(!deep_eq(&v(json!([1, 2])), &v(json!([1, 2, 2]))));
    }

    #[test]
    fn missing_and_extra_keys_fail() {
        assert!(!deep_eq(&v(json!({"a": 1})), &v(json!({"a": 1, "b": 2}))));
        assert!(!deep_eq(&v(json!({"a": 1, "b": 2})), &v(json!({"a": 1}))));
    }

    #[test]
    fn nan_equals_nan() {
        assert!(deep_eq(&Value::Number(f64::NAN), &Value::Number(f64::NAN)));
    }

    #[test]
    fn null_is_not_undefined() {
        assert!(!deep_eq(&Value::Undefined, &Value::Null));
    }

    #[test]
    fn numbers_do_not_coerce_to_strings() {
        assert!(!deep_eq(&v(json!(5)), &v(json!("5"))));
    }

    #[test]
    fn deep_nesting_recurses() {
        let a = json!({"user": {"tags": ["a", "b"], "meta": {"n": 1}}});
        let b = json!({"user": {"meta": {"n": 1}, "tags": ["a", "b"]}});
        assert!(deep_eq(&v(a), &v(b)));
    }
}
