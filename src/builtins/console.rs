//! Console output: `print say log/info log/warn log/error log/debug`.
//!
//! `print`/`say` write straight to stdout with no channel tag — they are
//! the raw-text primitives. The `log/*` family routes through whichever
//! [`crate::sink::Sink`] is installed for the current interpreter (see
//! `super::set_sink_storage`), so a spawned process's `log/info` lands
//! on its `SilentSink` rather than the parent's terminal.

use crate::error::CoreError;
use crate::value::Value;
use lisp_macros::builtin;
use std::io::Write;

fn joined(args: &[Value]) -> String {
    args.iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Writes its arguments to stdout, space-separated, with no trailing
/// newline.
///
/// # Examples
/// ```lisp
/// (print "hello") => outputs: hello
/// ```
///
/// # See Also
/// say
#[builtin(name = "print", category = "Console I/O", related(say))]
pub fn print(args: &[Value]) -> Result<Value, CoreError> {
    print!("{}", joined(args));
    let _ = std::io::stdout().flush();
    Ok(Value::Nil)
}

/// Writes its arguments to stdout, space-separated, with a trailing
/// newline.
///
/// # Examples
/// ```lisp
/// (say "hello") => outputs: hello\n
/// ```
///
/// # See Also
/// print
#[builtin(name = "say", category = "Console I/O", related(print))]
pub fn say(args: &[Value]) -> Result<Value, CoreError> {
    println!("{}", joined(args));
    Ok(Value::Nil)
}

/// Emits on the `INFO` channel of the current output sink.
///
/// # See Also
/// log_warn
#[builtin(name = "log/info", category = "Console I/O", related(log_warn))]
pub fn log_info(args: &[Value]) -> Result<Value, CoreError> {
    super::current_sink().emit(crate::interpreter::Channel::Info, &joined(args));
    Ok(Value::Nil)
}

/// Emits on the `WARN` channel of the current output sink.
///
/// # See Also
/// log_info, log_error
#[builtin(name = "log/warn", category = "Console I/O", related(log_info, log_error))]
pub fn log_warn(args: &[Value]) -> Result<Value, CoreError> {
    super::current_sink().emit(crate::interpreter::Channel::Warn, &joined(args));
    Ok(Value::Nil)
}

/// Emits on the `ERROR` channel of the current output sink.
///
/// # See Also
/// log_warn
#[builtin(name = "log/error", category = "Console I/O", related(log_warn))]
pub fn log_error(args: &[Value]) -> Result<Value, CoreError> {
    super::current_sink().emit(crate::interpreter::Channel::Error, &joined(args));
    Ok(Value::Nil)
}

/// Emits on the `DEBUG` channel of the current output sink.
///
/// # See Also
/// log_info
#[builtin(name = "log/debug", category = "Console I/O", related(log_info))]
pub fn log_debug(args: &[Value]) -> Result<Value, CoreError> {
    super::current_sink().emit(crate::interpreter::Channel::Debug, &joined(args));
    Ok(Value::Nil)
}

pub fn register(table: &mut std::collections::HashMap<String, crate::value::Value>) {
    register_print(table);
    register_help_print();
    register_say(table);
    register_help_say();
    register_log_info(table);
    register_help_log_info();
    register_log_warn(table);
    register_help_log_warn();
    register_log_error(table);
    register_help_log_error();
    register_log_debug(table);
    register_help_log_debug();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_and_say_return_nil() {
        assert_eq!(print(&[Value::String("x".into())]).unwrap(), Value::Nil);
        assert_eq!(say(&[Value::String("x".into())]).unwrap(), Value::Nil);
    }

    #[test]
    fn joined_unquotes_strings_but_not_other_values() {
        assert_eq!(joined(&[Value::String("a".into()), Value::Number(1.0)]), "a 1");
    }
}
