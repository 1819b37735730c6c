//! Logic operations: `and or not`.
//!
//! Everything but `Boolean(false)` is truthy (`Value::is_truthy`), so
//! these operate over any value, not just booleans. Arguments arrive
//! already evaluated (the interpreter evaluates every call argument
//! before applying a builtin), so there is no short-circuiting here —
//! only the result-selection rule a real `and`/`or` special form would
//! also apply.

use crate::error::CoreError;
use crate::value::Value;
use lisp_macros::builtin;

/// Returns `false` if any argument is falsy, else the last argument.
/// Vacuously `true` with no arguments.
///
/// # Examples
/// ```lisp
/// (and true true true) => true
/// (and true false true) => false
/// (and) => true
/// ```
///
/// # See Also
/// or, not
#[builtin(name = "and", category = "Logic", related(or, not))]
pub fn and(args: &[Value]) -> Result<Value, CoreError> {
    if args.iter().any(|v| !v.is_truthy()) {
        return Ok(Value::Boolean(false));
    }
    Ok(args.last().cloned().unwrap_or(Value::Boolean(true)))
}

/// Returns the first truthy argument, else `false`. Vacuously `false`
/// with no arguments.
///
/// # Examples
/// ```lisp
/// (or false false true) => true
/// (or) => false
/// ```
///
/// # See Also
/// and, not
#[builtin(name = "or", category = "Logic", related(and, not))]
pub fn or(args: &[Value]) -> Result<Value, CoreError> {
    Ok(args
        .iter()
        .find(|v| v.is_truthy())
        .cloned()
        .unwrap_or(Value::Boolean(false)))
}

/// Logical negation of truthiness.
///
/// # Examples
/// ```lisp
/// (not false) => true
/// (not 5) => false
/// ```
///
/// # See Also
/// and, or
#[builtin(name = "not", category = "Logic", related(and, or))]
pub fn not(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("not", "1", args.len()));
    }
    Ok(Value::Boolean(!args[0].is_truthy()))
}

pub fn register(table: &mut std::collections::HashMap<String, crate::value::Value>) {
    register_and(table);
    register_help_and();
    register_or(table);
    register_help_or();
    register_not(table);
    register_help_not();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_returns_last_when_all_truthy() {
        assert_eq!(
            and(&[Value::Number(1.0), Value::Number(2.0)]).unwrap(),
            Value::Number(2.0)
        );
    }

    #[test]
    fn and_short_circuits_to_false_on_falsy() {
        assert_eq!(
            and(&[Value::Boolean(true), Value::Boolean(false), Value::Number(1.0)]).unwrap(),
            Value::Boolean(false)
        );
    }

    #[test]
    fn or_returns_first_truthy() {
        assert_eq!(
            or(&[Value::Boolean(false), Value::Number(2.0)]).unwrap(),
            Value::Number(2.0)
        );
    }

    #[test]
    fn vacuous_identities() {
        assert_eq!(and(&[]).unwrap(), Value::Boolean(true));
        assert_eq!(or(&[]).unwrap(), Value::Boolean(false));
    }

    #[test]
    fn not_negates_truthiness_not_just_booleans() {
        assert_eq!(not(&[Value::Number(5.0)]).unwrap(), Value::Boolean(false));
        assert_eq!(not(&[Value::Nil]).unwrap(), Value::Boolean(false));
    }
}
