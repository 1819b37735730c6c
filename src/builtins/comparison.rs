//! Comparison operations: `== != < > <= >=`.
//!
//! `==`/`!=` use structural equality (`value_eq`) across every pair of
//! adjacent arguments; `< > <= >=` require numbers and likewise chain
//! across the whole argument list (`(< 1 2 3)` is `1 < 2 < 3`).

use crate::error::CoreError;
use crate::interpreter::values_equal;
use crate::value::Value;
use lisp_macros::builtin;

fn numbers(args: &[Value], fn_name: &str) -> Result<Vec<f64>, CoreError> {
    args.iter()
        .enumerate()
        .map(|(i, v)| match v {
            Value::Number(n) => Ok(*n),
            other => Err(CoreError::type_error(fn_name, "number", &other.type_name(), i + 1)),
        })
        .collect()
}

fn chain(nums: &[f64], cmp: impl Fn(f64, f64) -> bool) -> bool {
    nums.windows(2).all(|w| cmp(w[0], w[1]))
}

/// Structural equality across every argument.
///
/// # Examples
/// ```lisp
/// (== 1 1 1) => true
/// (== "a" "b") => false
/// ```
///
/// # See Also
/// neq
#[builtin(name = "==", category = "Comparison", related(neq))]
pub fn eq(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() < 2 {
        return Ok(Value::Boolean(true));
    }
    Ok(Value::Boolean(values_equal(args)))
}

/// True when any two adjacent arguments are structurally unequal.
///
/// # Examples
/// ```lisp
/// (!= 1 2) => true
/// ```
///
/// # See Also
/// eq
#[builtin(name = "!=", category = "Comparison", related(eq))]
pub fn neq(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() < 2 {
        return Ok(Value::Boolean(false));
    }
    Ok(Value::Boolean(!values_equal(args)))
}

/// True when each argument is strictly less than the next.
///
/// # Examples
/// ```lisp
/// (< 1 2 3) => true
/// ```
///
/// # See Also
/// gt, lte, gte
#[builtin(name = "<", category = "Comparison", related(gt, lte, gte))]
pub fn lt(args: &[Value]) -> Result<Value, CoreError> {
    Ok(Value::Boolean(chain(&numbers(args, "<")?, |a, b| a < b)))
}

/// True when each argument is strictly greater than the next.
///
/// # Examples
/// ```lisp
/// (> 3 2 1) => true
/// ```
///
/// # See Also
/// lt, lte, gte
#[builtin(name = ">", category = "Comparison", related(lt, lte, gte))]
pub fn gt(args: &[Value]) -> Result<Value, CoreError> {
    Ok(Value::Boolean(chain(&numbers(args, ">")?, |a, b| a > b)))
}

/// True when each argument is less than or equal to the next.
///
/// # See Also
/// lt, gt, gte
#[builtin(name = "<=", category = "Comparison", related(lt, gt, gte))]
pub fn lte(args: &[Value]) -> Result<Value, CoreError> {
    Ok(Value::Boolean(chain(&numbers(args, "<=")?, |a, b| a <= b)))
}

/// True when each argument is greater than or equal to the next.
///
/// # See Also
/// lt, gt, lte
#[builtin(name = ">=", category = "Comparison", related(lt, gt, lte))]
pub fn gte(args: &[Value]) -> Result<Value, CoreError> {
    Ok(Value::Boolean(chain(&numbers(args, ">=")?, |a, b| a >= b)))
}

pub fn register(table: &mut std::collections::HashMap<String, crate::value::Value>) {
    register_eq(table);
    register_help_eq();
    register_neq(table);
    register_help_neq();
    register_lt(table);
    register_help_lt();
    register_gt(table);
    register_help_gt();
    register_lte(table);
    register_help_lte();
    register_gte(table);
    register_help_gte();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_is_structural_across_all_args() {
        assert_eq!(
            eq(&[Value::Number(1.0), Value::Number(1.0), Value::Number(1.0)]).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            eq(&[Value::String("a".into()), Value::String("b".into())]).unwrap(),
            Value::Boolean(false)
        );
    }

    #[test]
    fn lt_chains_across_arguments() {
        assert_eq!(
            lt(&[Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            lt(&[Value::Number(1.0), Value::Number(3.0), Value::Number(2.0)]).unwrap(),
            Value::Boolean(false)
        );
    }

    #[test]
    fn neq_is_negation_of_eq() {
        assert_eq!(
            neq(&[Value::Number(1.0), Value::Number(2.0)]).unwrap(),
            Value::Boolean(true)
        );
    }
}
