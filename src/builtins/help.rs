//! The `help` builtin: prints the quick reference with no arguments, or
//! the detailed entry for one function name.

use crate::error::CoreError;
use crate::value::Value;
use lisp_macros::builtin;

/// Prints documentation. With no arguments, a categorized quick
/// reference of every builtin; with one string argument, the detailed
/// entry for that name.
///
/// # Examples
/// ```lisp
/// (help)
/// (help "cons")
/// ```
#[builtin(name = "help", category = "Help system")]
pub fn help(args: &[Value]) -> Result<Value, CoreError> {
    match args {
        [] => {
            println!("{}", crate::help::format_quick_reference());
            Ok(Value::Nil)
        }
        [Value::String(name)] => match crate::help::get_help(name) {
            Some(entry) => {
                println!("{}", crate::help::format_help_entry(&entry));
                Ok(Value::Nil)
            }
            None => Err(CoreError::runtime_error("help", format!("no help found for '{}'", name))),
        },
        [other] => Err(CoreError::type_error("help", "string", &other.type_name(), 1)),
        _ => Err(CoreError::arity("help", "0 or 1", args.len())),
    }
}

pub fn register(table: &mut std::collections::HashMap<String, crate::value::Value>) {
    register_help(table);
    register_help_help();
}
