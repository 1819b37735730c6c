//! Process operations that don't need the caller's AST: `send recv self
//! is-alive? kill processes`. `spawn`/`spawn-link` are special-cased in
//! `crate::interpreter::Interpreter::eval_call` instead, because they
//! need the unevaluated callee symbol to confirm it names a function in
//! the `functions` table; anonymous closures are rejected there.
//!
//! Each function here is a thin wrapper around `crate::process`, which
//! owns the actual pid/mailbox bookkeeping.

use crate::error::CoreError;
use crate::value::Value;
use lisp_macros::builtin;

/// Sends `value` to the mailbox of process `pid`.
///
/// # Examples
/// ```lisp
/// (send 3 "hello")
/// ```
///
/// # See Also
/// recv
#[builtin(name = "send", category = "Process", related(recv))]
pub fn send(args: &[Value]) -> Result<Value, CoreError> {
    crate::process::send(args)
}

/// Receives the next message from this process's own mailbox, as
/// `(list from-pid value)`, or `nil` if the optional millisecond
/// timeout elapses first. With no timeout, blocks indefinitely.
///
/// # Examples
/// ```lisp
/// (recv)
/// (recv 1000)
/// ```
///
/// # See Also
/// send
#[builtin(name = "recv", category = "Process", related(send))]
pub fn recv(args: &[Value]) -> Result<Value, CoreError> {
    crate::process::recv(args)
}

/// Returns the calling process's own pid.
///
/// # See Also
/// is_alive_p
#[builtin(name = "self", category = "Process", related(is_alive_p))]
pub fn self_pid(args: &[Value]) -> Result<Value, CoreError> {
    crate::process::self_pid(args)
}

/// True if `pid` names a process that is still running.
///
/// # See Also
/// kill, processes
#[builtin(name = "is-alive?", category = "Process", related(kill, processes))]
pub fn is_alive_p(args: &[Value]) -> Result<Value, CoreError> {
    crate::process::is_alive(args)
}

/// Marks `pid` as killed. Advisory: a running process's body cannot
/// actually be preempted, so this only changes what `is-alive?` and
/// `processes` subsequently report.
///
/// # See Also
/// is_alive_p
#[builtin(name = "kill", category = "Process", related(is_alive_p))]
pub fn kill(args: &[Value]) -> Result<Value, CoreError> {
    crate::process::kill(args)
}

/// Lists every known pid, in ascending order.
///
/// # See Also
/// is_alive_p
#[builtin(name = "processes", category = "Process", related(is_alive_p))]
pub fn processes(args: &[Value]) -> Result<Value, CoreError> {
    crate::process::processes(args)
}

pub fn register(table: &mut std::collections::HashMap<String, crate::value::Value>) {
    register_send(table);
    register_help_send();
    register_recv(table);
    register_help_recv();
    register_self_pid(table);
    register_help_self_pid();
    register_is_alive_p(table);
    register_help_is_alive_p();
    register_kill(table);
    register_help_kill();
    register_processes(table);
    register_help_processes();
}
