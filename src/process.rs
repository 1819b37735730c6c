//! The process runtime: pid/mailbox concurrency built on `Interpreter::fork`.
//!
//! Each `spawn` deep-copies the caller's `functions`/`macros`/`bindings`
//! tables into a fresh [`Interpreter`] (see [`Interpreter::fork`]) and
//! runs it to completion on its own OS thread, with a [`SilentSink`] in
//! place of the parent's `StandardSink` so a child's ordinary output
//! never interleaves with the parent's terminal. Processes share nothing
//! but the immutable `builtins` table and whatever values pass through a
//! mailbox, which is why `Value`'s tree (`Arc`/`RwLock` rather than
//! `Rc`/`RefCell`, see `crate::env` and `crate::value`) needs to be
//! `Send`.
//!
//! `spawn`/`spawn-link` are special-cased in `Interpreter::eval_call`
//! (like `include`) so they can inspect the callee's unevaluated AST:
//! only a bare symbol naming an entry in `functions` counts as "named".
//! `send`/`recv`/`self`/`is-alive?`/`kill`/`processes` are ordinary
//! builtins that read thread-local process identity set up here.

use crate::error::CoreError;
use crate::interpreter::Interpreter;
use crate::sink::SilentSink;
use crate::value::Value;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

pub type Pid = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Running,
    Completed,
    Errored,
    Killed,
}

struct ProcessEntry {
    status: ProcessStatus,
    mailbox: Sender<(Pid, Value)>,
}

struct Registry {
    next_pid: AtomicU64,
    table: Mutex<HashMap<Pid, ProcessEntry>>,
}

fn registry() -> &'static Registry {
    static REG: OnceLock<Registry> = OnceLock::new();
    REG.get_or_init(|| Registry {
        // pid 0 is reserved for the main process (see `init_main_process`).
        next_pid: AtomicU64::new(1),
        table: Mutex::new(HashMap::new()),
    })
}

thread_local! {
    static CURRENT_PID: RefCell<Pid> = const { RefCell::new(0) };
    static MY_RECEIVER: RefCell<Option<Receiver<(Pid, Value)>>> = const { RefCell::new(None) };
}

/// Registers pid 0 for the current (main) thread. Called once at
/// startup by the CLI/REPL driver before any `process` builtin runs.
pub fn init_main_process() {
    let (tx, rx) = unbounded();
    registry()
        .table
        .lock()
        .unwrap()
        .insert(0, ProcessEntry { status: ProcessStatus::Running, mailbox: tx });
    CURRENT_PID.with(|p| *p.borrow_mut() = 0);
    MY_RECEIVER.with(|r| *r.borrow_mut() = Some(rx));
}

pub fn current_pid() -> Pid {
    CURRENT_PID.with(|p| *p.borrow())
}

fn set_status(pid: Pid, status: ProcessStatus) {
    if let Some(entry) = registry().table.lock().unwrap().get_mut(&pid) {
        entry.status = status;
    }
}

/// Renders a `Value` as the literal source text that reproduces it, for
/// passing across the process boundary as a call argument. Maps,
/// functions, and builtins cannot be named this way and are rejected.
fn serialize_spawn_arg(value: &Value) -> Result<String, CoreError> {
    match value {
        Value::Number(_) | Value::String(_) | Value::Boolean(_) | Value::Nil => {
            Ok(value.to_string())
        }
        Value::List(items) => {
            let rendered = items
                .iter()
                .map(serialize_spawn_arg)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(format!("(list {})", rendered.join(" ")))
        }
        other => Err(CoreError::process(format!(
            "spawn: cannot pass a {} to a child process",
            other.type_name()
        ))),
    }
}

/// Spawns `function_name` (already confirmed to be a key in `parent`'s
/// `functions` table) as a new process running `args`. Returns the new
/// pid immediately; the child runs concurrently on its own thread.
pub fn spawn(parent: &Interpreter, function_name: &str, args: &[Value]) -> Result<Value, CoreError> {
    let pid = do_spawn(parent, function_name, args, None)?;
    Ok(Value::Number(pid as f64))
}

/// Like `spawn`, but runs the child to completion before returning and
/// reports the outcome as `{:ok value}` / `{:error message}` instead of
/// a bare pid — a supervised call that cannot crash the caller.
pub fn spawn_link(parent: &Interpreter, function_name: &str, args: &[Value]) -> Result<Value, CoreError> {
    let (done_tx, done_rx) = unbounded::<Result<Value, String>>();
    do_spawn(parent, function_name, args, Some(done_tx))?;
    let outcome = done_rx
        .recv()
        .map_err(|_| CoreError::process("spawn-link: child process vanished before reporting"))?;
    let mut map = crate::value::OrderedMap::new();
    match outcome {
        Ok(value) => {
            map.insert(Value::String("ok".to_string()), Value::Boolean(true));
            map.insert(Value::String("value".to_string()), value);
        }
        Err(message) => {
            map.insert(Value::String("ok".to_string()), Value::Boolean(false));
            map.insert(Value::String("error".to_string()), Value::String(message));
        }
    }
    Ok(Value::Map(map))
}

fn do_spawn(
    parent: &Interpreter,
    function_name: &str,
    args: &[Value],
    report_to: Option<Sender<Result<Value, String>>>,
) -> Result<Pid, CoreError> {
    let serialized = args
        .iter()
        .map(serialize_spawn_arg)
        .collect::<Result<Vec<_>, _>>()?;
    let source = format!("({} {})", function_name, serialized.join(" "));

    let child = parent.fork();
    let pid = registry().next_pid.fetch_add(1, Ordering::SeqCst);
    let (tx, rx) = unbounded();
    registry()
        .table
        .lock()
        .unwrap()
        .insert(pid, ProcessEntry { status: ProcessStatus::Running, mailbox: tx });

    std::thread::Builder::new()
        .name(format!("slight-process-{}", pid))
        .spawn(move || {
            CURRENT_PID.with(|p| *p.borrow_mut() = pid);
            MY_RECEIVER.with(|r| *r.borrow_mut() = Some(rx));
            crate::builtins::set_sink_storage(std::sync::Arc::new(SilentSink));
            crate::builtins::init_sandbox_for_this_thread();

            let global_env = crate::env::Environment::new();
            let mut expander = crate::macro_expander::MacroExpander::new();
            let result = crate::interpreter::run_source(&child, &mut expander, &source, &global_env);

            match result {
                Ok(value) => {
                    set_status(pid, ProcessStatus::Completed);
                    if let Some(tx) = report_to {
                        let _ = tx.send(Ok(value));
                    }
                }
                Err(e) => {
                    set_status(pid, ProcessStatus::Errored);
                    if let Some(tx) = report_to {
                        let _ = tx.send(Err(e.message));
                    }
                }
            }
        })
        .map_err(|e| CoreError::process(format!("spawn: could not start process thread: {}", e)))?;

    Ok(pid)
}

pub fn send(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 2 {
        return Err(CoreError::arity("send", "2", args.len()));
    }
    let to = expect_pid(&args[0], "send", 1)?;
    let from = current_pid();
    let sender = {
        let table = registry().table.lock().unwrap();
        table
            .get(&to)
            .map(|entry| entry.mailbox.clone())
            .ok_or_else(|| CoreError::process(format!("send: no process with pid {}", to)))?
    };
    sender
        .send((from, args[1].clone()))
        .map_err(|_| CoreError::process(format!("send: process {} is no longer receiving", to)))?;
    Ok(Value::Boolean(true))
}

/// Receives the next mailbox message as `(list from value)`, or `nil` if
/// none arrives within the optional timeout (milliseconds, default
/// blocks indefinitely).
pub fn recv(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() > 1 {
        return Err(CoreError::arity("recv", "0 or 1", args.len()));
    }
    let timeout_ms = match args.first() {
        Some(Value::Number(n)) => Some(*n),
        Some(other) => return Err(CoreError::type_error("recv", "number", &other.type_name(), 1)),
        None => None,
    };

    let received = MY_RECEIVER.with(|cell| {
        let guard = cell.borrow();
        let receiver = guard
            .as_ref()
            .ok_or_else(|| CoreError::process("recv: this process has no mailbox"))?;
        match timeout_ms {
            Some(ms) => match receiver.recv_timeout(Duration::from_millis(ms as u64)) {
                Ok(msg) => Ok(Some(msg)),
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => Ok(None),
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => Ok(None),
            },
            None => match receiver.recv() {
                Ok(msg) => Ok(Some(msg)),
                Err(_) => Ok(None),
            },
        }
    })?;

    match received {
        Some((from, value)) => Ok(Value::List(vec![Value::Number(from as f64), value])),
        None => Ok(Value::Nil),
    }
}

pub fn self_pid(args: &[Value]) -> Result<Value, CoreError> {
    if !args.is_empty() {
        return Err(CoreError::arity("self", "0", args.len()));
    }
    Ok(Value::Number(current_pid() as f64))
}

pub fn is_alive(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("is-alive?", "1", args.len()));
    }
    let pid = expect_pid(&args[0], "is-alive?", 1)?;
    let alive = matches!(
        registry().table.lock().unwrap().get(&pid).map(|e| e.status),
        Some(ProcessStatus::Running)
    );
    Ok(Value::Boolean(alive))
}

/// Marks a process as killed. Advisory only: a process already running
/// its body to completion on its own thread cannot be preempted, so this
/// only affects what `is-alive?`/`processes` subsequently report.
pub fn kill(args: &[Value]) -> Result<Value, CoreError> {
    if args.len() != 1 {
        return Err(CoreError::arity("kill", "1", args.len()));
    }
    let pid = expect_pid(&args[0], "kill", 1)?;
    set_status(pid, ProcessStatus::Killed);
    Ok(Value::Boolean(true))
}

pub fn processes(args: &[Value]) -> Result<Value, CoreError> {
    if !args.is_empty() {
        return Err(CoreError::arity("processes", "0", args.len()));
    }
    let mut pids: Vec<Value> = registry()
        .table
        .lock()
        .unwrap()
        .keys()
        .map(|pid| Value::Number(*pid as f64))
        .collect();
    pids.sort_by(|a, b| match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y).unwrap(),
        _ => std::cmp::Ordering::Equal,
    });
    Ok(Value::List(pids))
}

fn expect_pid(value: &Value, fn_name: &str, position: usize) -> Result<Pid, CoreError> {
    match value {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Ok(*n as Pid),
        other => Err(CoreError::type_error(fn_name, "process id", &other.type_name(), position)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_spawn_arg_rejects_maps_and_functions() {
        assert!(serialize_spawn_arg(&Value::Map(crate::value::OrderedMap::new())).is_err());
    }

    #[test]
    fn serialize_spawn_arg_renders_nested_lists() {
        let v = Value::List(vec![Value::Number(1.0), Value::String("a".into())]);
        assert_eq!(serialize_spawn_arg(&v).unwrap(), "(list 1 \"a\")");
    }

    #[test]
    fn expect_pid_rejects_negative_and_fractional() {
        assert!(expect_pid(&Value::Number(-1.0), "test", 1).is_err());
        assert!(expect_pid(&Value::Number(1.5), "test", 1).is_err());
        assert_eq!(expect_pid(&Value::Number(3.0), "test", 1).unwrap(), 3);
    }
}
