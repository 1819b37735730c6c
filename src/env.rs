//! The local environment: a chain of name → value frames representing
//! *local parameters only*. The interpreter keeps the process-global
//! `functions`/`macros`/`bindings` tables separately (see
//! `crate::interpreter::Interpreter`); this type never sees them.
//!
//! Frames use `Arc`/`RwLock` rather than `Rc`/`RefCell`: a spawned
//! process runs its forked interpreter on its own OS thread (see
//! `crate::process`), and closures can in principle cross that boundary
//! by value, so every piece of interpreter state needs to be `Send`.

use crate::value::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug)]
pub struct Environment {
    bindings: RwLock<HashMap<String, Value>>,
    parent: Option<Arc<Environment>>,
}

impl Environment {
    /// Creates a new global environment with no parent
    pub fn new() -> Arc<Self> {
        Arc::new(Environment {
            bindings: RwLock::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a new child environment with a parent
    pub fn with_parent(parent: Arc<Environment>) -> Arc<Self> {
        Arc::new(Environment {
            bindings: RwLock::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Defines a binding in THIS scope (doesn't walk parent chain)
    pub fn define(&self, name: String, value: Value) {
        self.bindings.write().unwrap().insert(name, value);
    }

    /// Looks up a symbol in THIS scope and parent scopes recursively
    pub fn get(&self, name: &str) -> Option<Value> {
        // First check this scope
        if let Some(value) = self.bindings.read().unwrap().get(name) {
            return Some(value.clone());
        }

        // Then check parent scope
        if let Some(ref parent) = self.parent {
            return parent.get(name);
        }

        None
    }

    /// Updates an existing binding in the innermost scope that already
    /// binds `name`. Returns `false` (rather than erroring) when `name`
    /// is not bound anywhere in this chain, so that callers (the
    /// interpreter's `set!`) can fall back to the global `bindings`
    /// table before raising an undefined-symbol error.
    pub fn set(&self, name: &str, value: Value) -> bool {
        if self.bindings.read().unwrap().contains_key(name) {
            self.bindings.write().unwrap().insert(name.to_string(), value);
            return true;
        }

        if let Some(ref parent) = self.parent {
            return parent.set(name, value);
        }

        false
    }

    /// True if `name` is bound somewhere in this chain.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Clones out every binding defined directly on this frame (not its
    /// parents). Used once, at startup, to drain the scratch environment
    /// that builtin `register_*` functions populate into the flat
    /// `HashMap` `Interpreter::new` expects.
    pub fn take_bindings(&self) -> HashMap<String, Value> {
        self.bindings.read().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_get() {
        let env = Environment::new();
        env.define("x".to_string(), Value::Number(42.0));

        match env.get("x") {
            Some(Value::Number(n)) => assert_eq!(n, 42.0),
            _ => panic!("Expected Number(42.0)"),
        }
    }

    #[test]
    fn test_undefined_symbol() {
        let env = Environment::new();
        assert!(env.get("undefined").is_none());
    }

    #[test]
    fn test_shadowing() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Number(42.0));

        let child = Environment::with_parent(parent);
        child.define("x".to_string(), Value::Number(100.0));

        // Child should see its own value
        match child.get("x") {
            Some(Value::Number(n)) => assert_eq!(n, 100.0),
            _ => panic!("Expected Number(100.0)"),
        }
    }

    #[test]
    fn test_parent_lookup() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Number(42.0));

        let child = Environment::with_parent(parent);

        // Child should see parent's value
        match child.get("x") {
            Some(Value::Number(n)) => assert_eq!(n, 42.0),
            _ => panic!("Expected Number(42.0)"),
        }
    }

    #[test]
    fn test_multiple_levels() {
        // Grandparent
        let grandparent = Environment::new();
        grandparent.define("a".to_string(), Value::Number(1.0));

        // Parent
        let parent = Environment::with_parent(grandparent);
        parent.define("b".to_string(), Value::Number(2.0));

        // Child
        let child = Environment::with_parent(parent);
        child.define("c".to_string(), Value::Number(3.0));

        // Child can see all three levels
        match child.get("a") {
            Some(Value::Number(n)) => assert_eq!(n, 1.0),
            _ => panic!("Expected Number(1.0)"),
        }

        match child.get("b") {
            Some(Value::Number(n)) => assert_eq!(n, 2.0),
            _ => panic!("Expected Number(2.0)"),
        }

        match child.get("c") {
            Some(Value::Number(n)) => assert_eq!(n, 3.0),
            _ => panic!("Expected Number(3.0)"),
        }
    }
}
