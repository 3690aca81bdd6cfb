//! Scoped variable environment.
//!
//! Scopes form a parent chain behind `Rc` so closures can capture their
//! defining scope and keep mutating it across separate invocations;
//! a counter built in one test case must still tick in the next.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::value::Value;

#[derive(Debug)]
struct Scope {
    bindings: RefCell<BTreeMap<String, Value>>,
    parent: Option<Environment>,
}

/// A handle to one scope in the chain. Cloning shares the scope.
#[derive(Debug, Clone)]
pub struct Environment(Rc<Scope>);

impl Environment {
    /// Create a fresh global scope.
    pub fn global() -> Self {
        Environment(Rc::new(Scope {
            bindings: RefCell::new(BTreeMap::new()),
            parent: None,
        }))
    }

    /// Create a child scope with `self` as parent.
    pub fn child(&self) -> Self {
        Environment(Rc::new(Scope {
            bindings: RefCell::new(BTreeMap::new()),
            parent: Some(self.clone()),
        }))
    }

    /// Define a variable in this scope, shadowing any outer binding.
    pub fn define(&self, name: &str, value: Value) {
        self.0
            .bindings
            .borrow_mut()
            .insert(name.to_string(), value);
    }

    /// Look up a variable, searching from this scope outward.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.0.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.0.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Update a variable in the nearest scope where it exists.
    /// Returns `false` if no scope defines it.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        if self.0.bindings.borrow().contains_key(name) {
            self.0
                .bindings
                .borrow_mut()
                .insert(name.to_string(), value);
            return true;
        }
        match &self.0.parent {
            Some(parent) => parent.assign(name, value),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_sees_parent_bindings() {
        let global = Environment::global();
        global.define("x", Value::Number(1.0));
        let inner = global.child();
        assert!(matches!(inner.get("x"), Some(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn define_shadows_without_clobbering() {
        let global = Environment::global();
        global.define("x", Value::Number(1.0));
        let inner = global.child();
        inner.define("x", Value::Number(2.0));
        assert!(matches!(inner.get("x"), Some(Value::Number(n)) if n == 2.0));
        assert!(matches!(global.get("x"), Some(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn assign_walks_to_defining_scope() {
        let global = Environment::global();
        global.define("count", Value::Number(0.0));
        let inner = global.child();
        assert!(inner.assign("count", Value::Number(5.0)));
        assert!(matches!(global.get("count"), Some(Value::Number(n)) if n == 5.0));
    }

    #[test]
    fn assign_to_unknown_fails() {
        let global = Environment::global();
        assert!(!global.assign("nope", Value::Null));
    }

    #[test]
    fn sibling_closures_share_captured_scope() {
        let global = Environment::global();
        let shared = global.child();
        shared.define("n", Value::Number(0.0));
        let a = shared.clone();
        let b = shared.clone();
        a.assign("n", Value::Number(3.0));
        assert!(matches!(b.get("n"), Some(Value::Number(n)) if n == 3.0));
    }
}
