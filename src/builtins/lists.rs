//! List operations: `list head tail cons empty?`.

use crate::error::CoreError;
use crate::value::Value;
use lisp_macros::builtin;

/// Prepends an element to a list.
///
/// # Examples
/// ```lisp
/// (cons 1 (list 2 3)) => (1 2 3)
/// (cons 1 nil) => (1)
/// ```
///
/// # See Also
/// head, tail, list
#[builtin(name = "cons", category = "List operations", related(head, tail, list))]
pub fn cons(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 2 {
        return Err(CoreError::arity("cons", "2", args.len()));
    }
    let mut result = vec![args[0].clone()];
    match &args[1] {
        Value::List(items) => result.extend(items.clone()),
        Value::Nil => (),
        other => return Err(CoreError::type_error("cons", "list", &other.type_name(), 2)),
    }
    Ok(Value::List(result))
}

/// Returns the first element of a list.
///
/// # Examples
/// ```lisp
/// (head (list 1 2 3)) => 1
/// ```
///
/// # See Also
/// tail, cons
#[builtin(name = "head", category = "List operations", related(tail, cons))]
pub fn head(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("head", "1", args.len()));
    }
    match &args[0] {
        Value::List(items) if !items.is_empty() => Ok(items[0].clone()),
        Value::List(_) | Value::Nil => Err(CoreError::runtime_error("head", "empty list")),
        other => Err(CoreError::type_error("head", "list", &other.type_name(), 1)),
    }
}

/// Returns every element but the first.
///
/// # Examples
/// ```lisp
/// (tail (list 1 2 3)) => (2 3)
/// (tail (list 1)) => ()
/// ```
///
/// # See Also
/// head, cons
#[builtin(name = "tail", category = "List operations", related(head, cons))]
pub fn tail(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("tail", "1", args.len()));
    }
    match &args[0] {
        Value::List(items) if !items.is_empty() => Ok(Value::List(items[1..].to_vec())),
        Value::List(_) | Value::Nil => Err(CoreError::runtime_error("tail", "empty list")),
        other => Err(CoreError::type_error("tail", "list", &other.type_name(), 1)),
    }
}

/// Builds a list from its arguments.
///
/// # Examples
/// ```lisp
/// (list 1 2 3) => (1 2 3)
/// (list) => ()
/// ```
///
/// # See Also
/// cons
#[builtin(name = "list", category = "List operations", related(cons))]
pub fn list(args: &[Value]) -> Result<Value, CoreError> {
    Ok(Value::List(args.to_vec()))
}

/// True if a list (or nil) is empty.
///
/// # Examples
/// ```lisp
/// (empty? nil) => true
/// (empty? (list 1)) => false
/// ```
#[builtin(name = "empty?", category = "List operations")]
pub fn empty_p(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("empty?", "1", args.len()));
    }
    match &args[0] {
        Value::List(items) => Ok(Value::Boolean(items.is_empty())),
        Value::Nil => Ok(Value::Boolean(true)),
        other => Err(CoreError::type_error("empty?", "list", &other.type_name(), 1)),
    }
}

pub fn register(table: &mut std::collections::HashMap<String, crate::value::Value>) {
    register_cons(table);
    register_help_cons();
    register_head(table);
    register_help_head();
    register_tail(table);
    register_help_tail();
    register_list(table);
    register_help_list();
    register_empty_p(table);
    register_help_empty_p();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cons_prepends_onto_list_and_nil() {
        assert_eq!(
            cons(&[Value::Number(1.0), Value::List(vec![Value::Number(2.0)])]).unwrap(),
            Value::List(vec![Value::Number(1.0), Value::Number(2.0)])
        );
        assert_eq!(
            cons(&[Value::Number(1.0), Value::Nil]).unwrap(),
            Value::List(vec![Value::Number(1.0)])
        );
    }

    #[test]
    fn head_and_tail_split_a_list() {
        let l = Value::List(vec![Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]);
        assert_eq!(head(&[l.clone()]).unwrap(), Value::Number(1.0));
        assert_eq!(
            tail(&[l]).unwrap(),
            Value::List(vec![Value::Number(2.0), Value::Number(3.0)])
        );
    }

    #[test]
    fn head_of_empty_list_is_an_error() {
        assert!(head(&[Value::Nil]).is_err());
    }

    #[test]
    fn empty_p_covers_nil_and_empty_list() {
        assert_eq!(empty_p(&[Value::Nil]).unwrap(), Value::Boolean(true));
        assert_eq!(
            empty_p(&[Value::List(vec![Value::Number(1.0)])]).unwrap(),
            Value::Boolean(false)
        );
    }
}
