//! Type predicates and introspection: `number? string? list? nil?
//! symbol? bool? map? function? error?` plus `type/of`.
//!
//! `symbol?` is defined identically to `string?`: quoting a symbol
//! produces a plain `Value::String` (see `interpreter::ast_to_value`) —
//! there is no separate `Value::Symbol` runtime tag to distinguish them
//! by, a deliberate simplification (see DESIGN.md).

use crate::error::CoreError;
use crate::value::Value;
use lisp_macros::builtin;

/// True if `val` is a number.
///
/// # Examples
/// ```lisp
/// (number? 42) => true
/// (number? "42") => false
/// ```
///
/// # See Also
/// string_p, type_of
#[builtin(name = "number?", category = "Type predicates", related(string_p, type_of))]
pub fn number_p(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("number?", "1", args.len()));
    }
    Ok(Value::Boolean(matches!(args[0], Value::Number(_))))
}

/// True if `val` is a string.
///
/// # See Also
/// number_p, symbol_p
#[builtin(name = "string?", category = "Type predicates", related(number_p, symbol_p))]
pub fn string_p(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("string?", "1", args.len()));
    }
    Ok(Value::Boolean(matches!(args[0], Value::String(_))))
}

/// True if `val` is a list, including the empty list.
///
/// # See Also
/// nil_p
#[builtin(name = "list?", category = "Type predicates", related(nil_p))]
pub fn list_p(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("list?", "1", args.len()));
    }
    Ok(Value::Boolean(matches!(args[0], Value::List(_) | Value::Nil)))
}

/// True if `val` is nil or the empty list — the two print and compare
/// equal (`value_eq`) and are treated as one case here.
///
/// # See Also
/// list_p, empty_p
#[builtin(name = "nil?", category = "Type predicates", related(list_p))]
pub fn nil_p(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("nil?", "1", args.len()));
    }
    let is_nil = matches!(&args[0], Value::Nil) || matches!(&args[0], Value::List(items) if items.is_empty());
    Ok(Value::Boolean(is_nil))
}

/// True if `val` is a quoted symbol. Equivalent to `string?`: quoted
/// symbols have no distinct runtime representation.
///
/// # See Also
/// string_p
#[builtin(name = "symbol?", category = "Type predicates", related(string_p))]
pub fn symbol_p(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("symbol?", "1", args.len()));
    }
    Ok(Value::Boolean(matches!(args[0], Value::String(_))))
}

/// True if `val` is `true` or `false`.
///
/// # See Also
/// number_p
#[builtin(name = "bool?", category = "Type predicates", related(number_p))]
pub fn bool_p(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("bool?", "1", args.len()));
    }
    Ok(Value::Boolean(matches!(args[0], Value::Boolean(_))))
}

/// True if `val` is a map.
///
/// # See Also
/// list_p
#[builtin(name = "map?", category = "Type predicates", related(list_p))]
pub fn map_p(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("map?", "1", args.len()));
    }
    Ok(Value::Boolean(matches!(args[0], Value::Map(_))))
}

/// True if `val` is callable — a user function, closure, or builtin.
///
/// # See Also
/// map_p
#[builtin(name = "function?", category = "Type predicates", related(map_p))]
pub fn function_p(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("function?", "1", args.len()));
    }
    Ok(Value::Boolean(matches!(
        args[0],
        Value::Function { .. } | Value::Builtin(_)
    )))
}

/// True if `val` is an error value (the kind bound inside a `catch`).
///
/// # See Also
/// function_p
#[builtin(name = "error?", category = "Type predicates", related(function_p))]
pub fn error_p(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("error?", "1", args.len()));
    }
    Ok(Value::Boolean(args[0].is_error()))
}

/// Returns `val`'s runtime type tag as an uppercase string: one of
/// `NUMBER STRING BOOLEAN NIL LIST FUNCTION BUILTIN MAP ERROR`.
///
/// # Examples
/// ```lisp
/// (type/of 42) => "NUMBER"
/// (type/of '()) => "NIL"
/// ```
#[builtin(name = "type/of", category = "Type predicates")]
pub fn type_of(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("type/of", "1", args.len()));
    }
    Ok(Value::String(args[0].type_of().to_string()))
}

pub fn register(table: &mut std::collections::HashMap<String, crate::value::Value>) {
    register_number_p(table);
    register_help_number_p();
    register_string_p(table);
    register_help_string_p();
    register_list_p(table);
    register_help_list_p();
    register_nil_p(table);
    register_help_nil_p();
    register_symbol_p(table);
    register_help_symbol_p();
    register_bool_p(table);
    register_help_bool_p();
    register_map_p(table);
    register_help_map_p();
    register_function_p(table);
    register_help_function_p();
    register_error_p(table);
    register_help_error_p();
    register_type_of(table);
    register_help_type_of();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::OrderedMap;

    #[test]
    fn number_p_only_matches_numbers() {
        assert_eq!(number_p(&[Value::Number(1.0)]).unwrap(), Value::Boolean(true));
        assert_eq!(number_p(&[Value::String("1".into())]).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn symbol_p_matches_strings_like_string_p() {
        let v = Value::String("hello".into());
        assert_eq!(symbol_p(&[v.clone()]).unwrap(), string_p(&[v]).unwrap());
    }

    #[test]
    fn nil_p_matches_nil_and_empty_list() {
        assert_eq!(nil_p(&[Value::Nil]).unwrap(), Value::Boolean(true));
        assert_eq!(nil_p(&[Value::List(vec![])]).unwrap(), Value::Boolean(true));
        assert_eq!(nil_p(&[Value::List(vec![Value::Number(1.0)])]).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn function_p_covers_builtins_and_user_functions() {
        assert_eq!(function_p(&[Value::Builtin(number_p)]).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn type_of_reports_uppercase_tags() {
        assert_eq!(type_of(&[Value::Number(1.0)]).unwrap(), Value::String("NUMBER".to_string()));
        assert_eq!(type_of(&[Value::Map(OrderedMap::new())]).unwrap(), Value::String("MAP".to_string()));
    }
}
