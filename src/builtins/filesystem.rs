//! Sandboxed filesystem I/O: `read-file write-file file-exists?`.
//! All three go through the capability-scoped [`crate::sandbox::Sandbox`]
//! installed via `super::set_sandbox_storage`.

use crate::error::CoreError;
use crate::value::Value;
use lisp_macros::builtin;

fn expect_string(v: &Value, fn_name: &str, position: usize) -> Result<String, CoreError> {
    match v {
        Value::String(s) => Ok(s.clone()),
        other => Err(CoreError::type_error(fn_name, "string", &other.type_name(), position)),
    }
}

fn with_sandbox<T>(
    fn_name: &str,
    f: impl FnOnce(&crate::sandbox::Sandbox) -> Result<T, crate::sandbox::SandboxError>,
) -> Result<T, CoreError> {
    super::with_sandbox_ref(|sandbox| {
        let sandbox = sandbox
            .ok_or_else(|| CoreError::runtime_error(fn_name, "filesystem sandbox not initialized"))?;
        f(sandbox).map_err(|e| CoreError::runtime_error(fn_name, e.to_string()))
    })
}

/// Reads a file's contents as a string. The path is resolved against
/// the sandbox's allowed roots, not the process's working directory.
///
/// # See Also
/// write_file, file_exists_p
#[builtin(name = "read-file", category = "Filesystem I/O", related(write_file, file_exists_p))]
pub fn read_file(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("read-file", "1", args.len()));
    }
    let path = expect_string(&args[0], "read-file", 1)?;
    with_sandbox("read-file", |s| s.read_file(&path)).map(Value::String)
}

/// Writes a string to a file, creating it if needed.
///
/// # See Also
/// read_file, file_exists_p
#[builtin(name = "write-file", category = "Filesystem I/O", related(read_file, file_exists_p))]
pub fn write_file(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 2 {
        return Err(CoreError::arity("write-file", "2", args.len()));
    }
    let path = expect_string(&args[0], "write-file", 1)?;
    let contents = expect_string(&args[1], "write-file", 2)?;
    with_sandbox("write-file", |s| s.write_file(&path, &contents))?;
    Ok(Value::Boolean(true))
}

/// True if a path exists within the sandbox.
///
/// # See Also
/// read_file
#[builtin(name = "file-exists?", category = "Filesystem I/O", related(read_file))]
pub fn file_exists_p(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("file-exists?", "1", args.len()));
    }
    let path = expect_string(&args[0], "file-exists?", 1)?;
    with_sandbox("file-exists?", |s| s.file_exists(&path)).map(Value::Boolean)
}

pub fn register(table: &mut std::collections::HashMap<String, crate::value::Value>) {
    register_read_file(table);
    register_help_read_file();
    register_write_file(table);
    register_help_write_file();
    register_file_exists_p(table);
    register_help_file_exists_p();
}
