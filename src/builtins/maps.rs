//! Map operations: `make-map map-get map-set! map-has? map-delete!
//! map-keys map-values map-size`.
//!
//! Keys are any `Value` compared with `value_eq` (see
//! `crate::value::OrderedMap`), not a separate keyword type — this
//! dialect has no reader syntax for keywords, so string keys do the
//! job. `map-set!`/`map-delete!` return a *new* map rather than
//! mutating in place: `Value` is freely shared (cloned, passed across
//! `spawn`), so there is no single mutable map to mutate in place.

use crate::error::CoreError;
use crate::value::{OrderedMap, Value};
use lisp_macros::builtin;

fn expect_map<'a>(v: &'a Value, fn_name: &str, position: usize) -> Result<&'a OrderedMap, CoreError> {
    match v {
        Value::Map(m) => Ok(m),
        other => Err(CoreError::type_error(fn_name, "map", &other.type_name(), position)),
    }
}

/// Creates a new, empty map.
///
/// # Examples
/// ```lisp
/// (make-map) => {}
/// ```
///
/// # See Also
/// map_set_bang, map_get
#[builtin(name = "make-map", category = "Map operations", related(map_set_bang, map_get))]
pub fn make_map(args: &[Value]) -> Result<Value, CoreError> {
    if !args.is_empty() {
        return Err(CoreError::arity("make-map", "0", args.len()));
    }
    Ok(crate::interpreter::empty_map())
}

/// Looks up a key, returning `nil` if absent.
///
/// # Examples
/// ```lisp
/// (map-get (map-set! (make-map) "name" "Alice") "name") => "Alice"
/// ```
///
/// # See Also
/// map_set_bang, map_has_q
#[builtin(name = "map-get", category = "Map operations", related(map_set_bang, map_has_q))]
pub fn map_get(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 2 {
        return Err(CoreError::arity("map-get", "2", args.len()));
    }
    let map = expect_map(&args[0], "map-get", 1)?;
    Ok(map.get(&args[1]).cloned().unwrap_or(Value::Nil))
}

/// Returns a new map with `key` bound to `value`.
///
/// # Examples
/// ```lisp
/// (map-set! (make-map) "x" 1) => {"x" 1}
/// ```
///
/// # See Also
/// map_get, map_delete_bang
#[builtin(name = "map-set!", category = "Map operations", related(map_get, map_delete_bang))]
pub fn map_set_bang(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 3 {
        return Err(CoreError::arity("map-set!", "3", args.len()));
    }
    let mut map = expect_map(&args[0], "map-set!", 1)?.clone();
    map.insert(args[1].clone(), args[2].clone());
    Ok(Value::Map(map))
}

/// True if `key` is bound in the map.
///
/// # See Also
/// map_get
#[builtin(name = "map-has?", category = "Map operations", related(map_get))]
pub fn map_has_q(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 2 {
        return Err(CoreError::arity("map-has?", "2", args.len()));
    }
    let map = expect_map(&args[0], "map-has?", 1)?;
    Ok(Value::Boolean(map.contains_key(&args[1])))
}

/// Returns a new map with `key` removed.
///
/// # See Also
/// map_set_bang
#[builtin(name = "map-delete!", category = "Map operations", related(map_set_bang))]
pub fn map_delete_bang(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 2 {
        return Err(CoreError::arity("map-delete!", "2", args.len()));
    }
    let mut map = expect_map(&args[0], "map-delete!", 1)?.clone();
    map.remove(&args[1]);
    Ok(Value::Map(map))
}

/// Returns the map's keys as a list, in insertion order.
///
/// # See Also
/// map_values
#[builtin(name = "map-keys", category = "Map operations", related(map_values))]
pub fn map_keys(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("map-keys", "1", args.len()));
    }
    let map = expect_map(&args[0], "map-keys", 1)?;
    Ok(Value::List(map.keys().cloned().collect()))
}

/// Returns the map's values as a list, in insertion order.
///
/// # See Also
/// map_keys
#[builtin(name = "map-values", category = "Map operations", related(map_keys))]
pub fn map_values(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("map-values", "1", args.len()));
    }
    let map = expect_map(&args[0], "map-values", 1)?;
    Ok(Value::List(map.values().cloned().collect()))
}

/// Returns the number of key/value pairs in the map.
///
/// # See Also
/// map_keys
#[builtin(name = "map-size", category = "Map operations", related(map_keys))]
pub fn map_size(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("map-size", "1", args.len()));
    }
    let map = expect_map(&args[0], "map-size", 1)?;
    Ok(Value::Number(map.len() as f64))
}

pub fn register(table: &mut std::collections::HashMap<String, crate::value::Value>) {
    register_make_map(table);
    register_help_make_map();
    register_map_get(table);
    register_help_map_get();
    register_map_set_bang(table);
    register_help_map_set_bang();
    register_map_has_q(table);
    register_help_map_has_q();
    register_map_delete_bang(table);
    register_help_map_delete_bang();
    register_map_keys(table);
    register_help_map_keys();
    register_map_values(table);
    register_help_map_values();
    register_map_size(table);
    register_help_map_size();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_map_is_empty() {
        assert_eq!(map_size(&[make_map(&[]).unwrap()]).unwrap(), Value::Number(0.0));
    }

    #[test]
    fn set_then_get_roundtrips() {
        let m = make_map(&[]).unwrap();
        let m = map_set_bang(&[m, Value::String("x".into()), Value::Number(1.0)]).unwrap();
        assert_eq!(
            map_get(&[m, Value::String("x".into())]).unwrap(),
            Value::Number(1.0)
        );
    }

    #[test]
    fn get_of_missing_key_is_nil() {
        let m = make_map(&[]).unwrap();
        assert_eq!(map_get(&[m, Value::String("missing".into())]).unwrap(), Value::Nil);
    }

    #[test]
    fn delete_removes_key() {
        let m = make_map(&[]).unwrap();
        let m = map_set_bang(&[m, Value::String("x".into()), Value::Number(1.0)]).unwrap();
        let m = map_delete_bang(&[m, Value::String("x".into())]).unwrap();
        assert_eq!(
            map_has_q(&[m, Value::String("x".into())]).unwrap(),
            Value::Boolean(false)
        );
    }

    #[test]
    fn keys_and_values_preserve_insertion_order() {
        let m = make_map(&[]).unwrap();
        let m = map_set_bang(&[m, Value::String("b".into()), Value::Number(2.0)]).unwrap();
        let m = map_set_bang(&[m, Value::String("a".into()), Value::Number(1.0)]).unwrap();
        assert_eq!(
            map_keys(&[m.clone()]).unwrap(),
            Value::List(vec![Value::String("b".into()), Value::String("a".into())])
        );
        assert_eq!(
            map_values(&[m]).unwrap(),
            Value::List(vec![Value::Number(2.0), Value::Number(1.0)])
        );
    }
}
