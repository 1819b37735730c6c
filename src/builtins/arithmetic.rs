//! Arithmetic operations: `+ - * / mod`.
//!
//! Variadic where it makes sense, with the usual identities: `(+)` is 0,
//! `(*)` is 1. `/` is always floating division — a zero divisor produces
//! IEEE infinity or NaN, never an error.

use crate::error::CoreError;
use crate::value::Value;
use lisp_macros::builtin;

fn expect_number(v: &Value, fn_name: &str, position: usize) -> Result<f64, CoreError> {
    match v {
        Value::Number(n) => Ok(*n),
        other => Err(CoreError::type_error(fn_name, "number", &other.type_name(), position)),
    }
}

/// Returns the sum of all arguments.
///
/// # Examples
/// ```lisp
/// (+ 1 2 3) => 6
/// (+) => 0
/// ```
///
/// # See Also
/// sub, mul, div
#[builtin(name = "+", category = "Arithmetic", related(sub, mul, div))]
pub fn add(args: &[Value]) -> Result<Value, CoreError> {
    let mut sum = 0.0;
    for (i, arg) in args.iter().enumerate() {
        sum += expect_number(arg, "+", i + 1)?;
    }
    Ok(Value::Number(sum))
}

/// Subtracts the remaining arguments from the first. With a single
/// argument, returns its negation.
///
/// # Examples
/// ```lisp
/// (- 10 3 2) => 5
/// (- 5) => -5
/// ```
///
/// # See Also
/// add, mul, div
#[builtin(name = "-", category = "Arithmetic", related(add, mul, div))]
pub fn sub(args: &[Value]) -> Result<Value, CoreError> {
    if args.is_empty() {
        return Err(CoreError::arity("-", "at least 1", 0));
    }
    let first = expect_number(&args[0], "-", 1)?;
    if args.len() == 1 {
        return Ok(Value::Number(-first));
    }
    let mut result = first;
    for (i, arg) in args[1..].iter().enumerate() {
        result -= expect_number(arg, "-", i + 2)?;
    }
    Ok(Value::Number(result))
}

/// Returns the product of all arguments.
///
/// # Examples
/// ```lisp
/// (* 2 3 4) => 24
/// (*) => 1
/// ```
///
/// # See Also
/// add, sub, div
#[builtin(name = "*", category = "Arithmetic", related(add, sub, div))]
pub fn mul(args: &[Value]) -> Result<Value, CoreError> {
    let mut product = 1.0;
    for (i, arg) in args.iter().enumerate() {
        product *= expect_number(arg, "*", i + 1)?;
    }
    Ok(Value::Number(product))
}

/// Divides the first argument by the rest, left to right. A zero divisor
/// produces IEEE infinity or NaN rather than an error.
///
/// # Examples
/// ```lisp
/// (/ 20 4) => 5
/// (/ 1 0) => inf
/// ```
///
/// # See Also
/// add, sub, mul, r#mod
#[builtin(name = "/", category = "Arithmetic", related(add, sub, mul))]
pub fn div(args: &[Value]) -> Result<Value, CoreError> {
    if args.is_empty() {
        return Err(CoreError::arity("/", "at least 1", 0));
    }
    let first = expect_number(&args[0], "/", 1)?;
    if args.len() == 1 {
        return Ok(Value::Number(1.0 / first));
    }
    let mut result = first;
    for (i, arg) in args[1..].iter().enumerate() {
        result /= expect_number(arg, "/", i + 2)?;
    }
    Ok(Value::Number(result))
}

/// Remainder of dividing the first argument by the second.
///
/// # Examples
/// ```lisp
/// (mod 17 5) => 2
/// ```
///
/// # See Also
/// div
#[builtin(name = "mod", category = "Arithmetic", related(div))]
pub fn modulo(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 2 {
        return Err(CoreError::arity("mod", "2", args.len()));
    }
    let a = expect_number(&args[0], "mod", 1)?;
    let b = expect_number(&args[1], "mod", 2)?;
    Ok(Value::Number(a % b))
}

pub fn register(table: &mut std::collections::HashMap<String, crate::value::Value>) {
    register_add(table);
    register_help_add();
    register_sub(table);
    register_help_sub();
    register_mul(table);
    register_help_mul();
    register_div(table);
    register_help_div();
    register_modulo(table);
    register_help_modulo();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_variadic_with_zero_identity() {
        assert_eq!(add(&[]).unwrap(), Value::Number(0.0));
        assert_eq!(
            add(&[Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]).unwrap(),
            Value::Number(6.0)
        );
    }

    #[test]
    fn mul_is_variadic_with_one_identity() {
        assert_eq!(mul(&[]).unwrap(), Value::Number(1.0));
    }

    #[test]
    fn sub_with_one_arg_negates() {
        assert_eq!(sub(&[Value::Number(5.0)]).unwrap(), Value::Number(-5.0));
    }

    #[test]
    fn div_by_zero_is_infinity_not_an_error() {
        let result = div(&[Value::Number(1.0), Value::Number(0.0)]).unwrap();
        match result {
            Value::Number(n) => assert!(n.is_infinite()),
            other => panic!("expected Number, got {:?}", other),
        }
    }

    #[test]
    fn zero_div_zero_is_nan() {
        let result = div(&[Value::Number(0.0), Value::Number(0.0)]).unwrap();
        match result {
            Value::Number(n) => assert!(n.is_nan()),
            other => panic!("expected Number, got {:?}", other),
        }
    }

    #[test]
    fn mod_by_zero_is_nan_not_an_error() {
        let result = modulo(&[Value::Number(5.0), Value::Number(0.0)]).unwrap();
        match result {
            Value::Number(n) => assert!(n.is_nan()),
            other => panic!("expected Number, got {:?}", other),
        }
    }
}
