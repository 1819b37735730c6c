//! The runtime-inhabited `Value` type and its insertion-ordered `Map`.
//!
//! Like [`crate::ast::Ast`], `Value` is a flat tagged enum dispatched by
//! `match`, never by inheritance.

use crate::ast::Ast;
use crate::env::Environment;
use crate::error::CoreError;
use std::fmt;
use std::sync::Arc;

pub type BuiltinFn = fn(&[Value]) -> Result<Value, CoreError>;

#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
    Nil,
    /// The empty list prints the same as `Nil` but is its own variant;
    /// `type/of` reports `NIL` for an empty list regardless.
    List(Vec<Value>),
    /// A user function or closure. Closures carry a captured
    /// environment snapshot; plain (top-level) functions do not.
    /// `Arc` rather than `Rc`: function values cross OS-thread
    /// boundaries when `spawn` hands a named function to a child
    /// process (see `crate::process`).
    Function {
        params: Vec<String>,
        body: Arc<Vec<Ast>>,
        captured_env: Option<Arc<Environment>>,
    },
    Builtin(BuiltinFn),
    Map(OrderedMap),
    /// The runtime representation of a thrown value when it is not
    /// already a string.
    Error {
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },
}

impl Value {
    /// Name reported by the `type/of` builtin.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Number(_) => "NUMBER",
            Value::String(_) => "STRING",
            Value::Boolean(_) => "BOOLEAN",
            Value::Nil => "NIL",
            Value::List(items) if items.is_empty() => "NIL",
            Value::List(_) => "LIST",
            Value::Function { .. } => "FUNCTION",
            Value::Builtin(_) => "BUILTIN",
            Value::Map(_) => "MAP",
            Value::Error { .. } => "ERROR",
        }
    }

    /// Short name used inside error messages (lowercase, human phrasing).
    pub fn type_name(&self) -> String {
        self.type_of().to_lowercase()
    }

    /// Truthiness used by `cond`/`and`/`or`/`not`: everything is truthy
    /// except `Boolean(false)` — only an explicit `false` is falsy,
    /// matching this dialect's `true`/`false` booleans.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error { .. })
    }
}

/// Structural equality used by the `==`/`!=` builtins and by map key
/// lookups. Functions and builtins are never equal to anything here.
pub fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Nil, Value::Nil) => true,
        (Value::Nil, Value::List(items)) | (Value::List(items), Value::Nil) => items.is_empty(),
        (Value::List(x), Value::List(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(a, b)| value_eq(a, b))
        }
        (Value::Map(x), Value::Map(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|ov| value_eq(v, ov)))
        }
        (
            Value::Error {
                message: m1,
                line: l1,
                column: c1,
            },
            Value::Error {
                message: m2,
                line: l2,
                column: c2,
            },
        ) => m1 == m2 && l1 == l2 && c1 == c2,
        _ => false,
    }
}

/// Delegates to [`value_eq`] so `assert_eq!` works in tests; functions
/// and builtins are never equal to anything, themselves included.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        value_eq(self, other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Nil => write!(f, "()"),
            Value::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Value::Function {
                captured_env: Some(_),
                ..
            } => write!(f, "#<closure>"),
            Value::Function { .. } => write!(f, "#<function>"),
            Value::Builtin(_) => write!(f, "#<builtin>"),
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{} {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Error {
                message,
                line,
                column,
            } => match (line, column) {
                (Some(l), Some(c)) => write!(f, "#<error: {} at {}:{}>", message, l, c),
                _ => write!(f, "#<error: {}>", message),
            },
        }
    }
}

/// A mapping from `Value` to `Value` that preserves insertion order.
/// `Value` cannot derive `Hash`/`Eq` cleanly (it embeds `f64`), so
/// lookups are a linear scan using [`value_eq`]. Map sizes in practice
/// are small (interpreter configuration, small records), so this trades
/// a little lookup speed for straightforward, correct semantics.
#[derive(Debug, Clone, Default)]
pub struct OrderedMap(Vec<(Value, Value)>);

impl OrderedMap {
    pub fn new() -> Self {
        OrderedMap(Vec::new())
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.0.iter().find(|(k, _)| value_eq(k, key)).map(|(_, v)| v)
    }

    /// Insert or update a key, preserving the position of an existing
    /// key and appending new keys at the end.
    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        if let Some(slot) = self.0.iter_mut().find(|(k, _)| value_eq(k, &key)) {
            let old = std::mem::replace(&mut slot.1, value);
            Some(old)
        } else {
            self.0.push((key, value));
            None
        }
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        if let Some(pos) = self.0.iter().position(|(k, _)| value_eq(k, key)) {
            Some(self.0.remove(pos).1)
        } else {
            None
        }
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_display_whole_vs_fractional() {
        assert_eq!(Value::Number(4.0).to_string(), "4");
        assert_eq!(Value::Number(4.5).to_string(), "4.5");
    }

    #[test]
    fn boolean_display() {
        assert_eq!(Value::Boolean(true).to_string(), "true");
        assert_eq!(Value::Boolean(false).to_string(), "false");
    }

    #[test]
    fn nil_and_empty_list_display_the_same() {
        assert_eq!(Value::Nil.to_string(), "()");
        assert_eq!(Value::List(vec![]).to_string(), "()");
    }

    #[test]
    fn nil_and_empty_list_type_of_match() {
        assert_eq!(Value::Nil.type_of(), "NIL");
        assert_eq!(Value::List(vec![]).type_of(), "NIL");
        assert_eq!(Value::List(vec![Value::Number(1.0)]).type_of(), "LIST");
    }

    #[test]
    fn ordered_map_preserves_insertion_order() {
        let mut m = OrderedMap::new();
        m.insert(Value::String("b".into()), Value::Number(2.0));
        m.insert(Value::String("a".into()), Value::Number(1.0));
        let keys: Vec<String> = m
            .keys()
            .map(|k| match k {
                Value::String(s) => s.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(keys, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn ordered_map_update_keeps_position() {
        let mut m = OrderedMap::new();
        m.insert(Value::String("a".into()), Value::Number(1.0));
        m.insert(Value::String("b".into()), Value::Number(2.0));
        m.insert(Value::String("a".into()), Value::Number(99.0));
        let entries: Vec<(String, f64)> = m
            .iter()
            .map(|(k, v)| match (k, v) {
                (Value::String(s), Value::Number(n)) => (s.clone(), *n),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(
            entries,
            vec![("a".to_string(), 99.0), ("b".to_string(), 2.0)]
        );
    }

    #[test]
    fn value_eq_treats_nil_and_empty_list_as_equal() {
        assert!(value_eq(&Value::Nil, &Value::List(vec![])));
    }
}
