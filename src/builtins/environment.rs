//! Process environment access: `env/get env/set!`.

use crate::error::CoreError;
use crate::value::Value;
use lisp_macros::builtin;

fn expect_string<'a>(v: &'a Value, fn_name: &str, position: usize) -> Result<&'a str, CoreError> {
    match v {
        Value::String(s) => Ok(s),
        other => Err(CoreError::type_error(fn_name, "string", &other.type_name(), position)),
    }
}

/// Reads an environment variable, returning `nil` if it is unset or not
/// valid UTF-8.
///
/// # Examples
/// ```lisp
/// (env/get "HOME") => "/home/alice"
/// ```
///
/// # See Also
/// env_set_bang
#[builtin(name = "env/get", category = "Environment", related(env_set_bang))]
pub fn env_get(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("env/get", "1", args.len()));
    }
    let name = expect_string(&args[0], "env/get", 1)?;
    match std::env::var(name) {
        Ok(value) => Ok(Value::String(value)),
        Err(_) => Ok(Value::Nil),
    }
}

/// Sets an environment variable for the current process.
///
/// # Examples
/// ```lisp
/// (env/set! "LEVEL" "debug")
/// ```
///
/// # See Also
/// env_get
#[builtin(name = "env/set!", category = "Environment", related(env_get))]
pub fn env_set_bang(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 2 {
        return Err(CoreError::arity("env/set!", "2", args.len()));
    }
    let name = expect_string(&args[0], "env/set!", 1)?;
    let value = expect_string(&args[1], "env/set!", 2)?;
    // SAFETY: builtins run single-threaded with respect to each other
    // within a process (spawned children get their own OS thread), so
    // no other thread in this process observes a torn write.
    unsafe {
        std::env::set_var(name, value);
    }
    Ok(Value::Nil)
}

pub fn register(table: &mut std::collections::HashMap<String, crate::value::Value>) {
    register_env_get(table);
    register_help_env_get();
    register_env_set_bang(table);
    register_help_env_set_bang();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_roundtrips() {
        env_set_bang(&[
            Value::String("SLIGHT_TEST_VAR".into()),
            Value::String("42".into()),
        ])
        .unwrap();
        assert_eq!(
            env_get(&[Value::String("SLIGHT_TEST_VAR".into())]).unwrap(),
            Value::String("42".into())
        );
    }

    #[test]
    fn get_of_unset_var_is_nil() {
        assert_eq!(
            env_get(&[Value::String("SLIGHT_TEST_VAR_NOT_SET".into())]).unwrap(),
            Value::Nil
        );
    }
}
