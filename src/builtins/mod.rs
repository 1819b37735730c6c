//! Built-in functions, grouped one module per category:
//!
//! - [arithmetic]: `+ - * / mod`
//! - [comparison]: `== != < > <= >=`
//! - [logic]: `and or not`
//! - [types]: `number? string? list? nil? symbol? bool? map? function? error? type/of`
//! - [lists]: `list head tail cons empty?`
//! - [maps]: `make-map map-get map-set! map-has? map-delete! map-keys map-values map-size`
//! - [console]: `print say log/info log/warn log/error log/debug`
//! - [json]: `json/parse json/stringify`
//! - [filesystem]: `read-file write-file file-exists?`
//! - [environment]: `env/get env/set!`
//! - [help_builtins]: `help`
//!
//! `spawn spawn-link send recv self is-alive? kill processes` live in
//! [`crate::process`]: `send`/`recv`/`self`/`is-alive?`/`kill`/`processes`
//! are ordinary builtins wired up below, but `spawn`/`spawn-link` need
//! the calling form's unevaluated AST and are special-cased directly in
//! `crate::interpreter::Interpreter::eval_call`.
//!
//! Each category module exposes `register(&mut HashMap<String, Value>)`,
//! generated alongside every `#[builtin(...)]` function by the
//! `lisp-macros` proc macro. `build_builtins` below is the one place
//! that assembles the flat table `Interpreter::new` expects.

use crate::config::FsConfig;
use crate::sandbox::Sandbox;
use crate::sink::{Sink, StandardSink};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

// ============================================================================
// Sandbox storage for filesystem built-ins
// ============================================================================

thread_local! {
    static SANDBOX: RefCell<Option<Sandbox>> = const { RefCell::new(None) };
}

/// The `FsConfig` the CLI/REPL was started with, kept so that a spawned
/// process's own thread can build its own `Sandbox` (a `Sandbox` itself
/// holds non-`Send` `cap_std::fs::Dir` handles, so it cannot simply be
/// shared across threads).
static FS_CONFIG: OnceLock<FsConfig> = OnceLock::new();

/// Installs the sandbox for the *current* thread's filesystem builtins.
/// Called once at startup by `main`, and again on every `process::spawn`
/// child thread.
pub fn set_sandbox_storage(sandbox: Sandbox) {
    SANDBOX.with(|s| *s.borrow_mut() = Some(sandbox));
}

/// Records the `FsConfig` used at startup and builds+installs this
/// thread's `Sandbox` from it in one step.
pub fn init_sandbox(fs_config: FsConfig) -> Result<(), crate::sandbox::SandboxError> {
    let _ = FS_CONFIG.set(fs_config.clone());
    set_sandbox_storage(Sandbox::new(fs_config)?);
    Ok(())
}

/// Rebuilds and installs a `Sandbox` on the calling thread from the
/// `FsConfig` captured by `init_sandbox`. Used by `process::spawn` so a
/// child process gets the same filesystem permissions as its parent.
pub fn init_sandbox_for_this_thread() {
    if let Some(config) = FS_CONFIG.get() {
        if let Ok(sandbox) = Sandbox::new(config.clone()) {
            set_sandbox_storage(sandbox);
        }
    }
}

pub(crate) fn with_sandbox_ref<T>(f: impl FnOnce(Option<&Sandbox>) -> T) -> T {
    SANDBOX.with(|s| f(s.borrow().as_ref()))
}

// ============================================================================
// Output sink storage
// ============================================================================

thread_local! {
    static SINK: RefCell<Arc<dyn Sink>> = RefCell::new(Arc::new(StandardSink));
}

/// Installs the output sink for the current thread. The main thread
/// keeps `StandardSink`; `process::spawn` installs a `SilentSink` on
/// each child's thread so its ordinary output doesn't interleave with
/// the parent's terminal.
pub fn set_sink_storage(sink: Arc<dyn Sink>) {
    SINK.with(|s| *s.borrow_mut() = sink);
}

/// The sink the `log/*` console builtins should emit through.
pub fn current_sink() -> Arc<dyn Sink> {
    SINK.with(|s| Arc::clone(&s.borrow()))
}

// ============================================================================
// Sub-modules
// ============================================================================

pub mod arithmetic;
pub mod comparison;
pub mod console;
pub mod environment;
pub mod filesystem;
#[path = "help.rs"]
pub mod help_builtins;
pub mod json;
pub mod lists;
pub mod logic;
pub mod maps;
pub mod process_ops;
pub mod types;

// ============================================================================
// Main registration function
// ============================================================================

/// Builds the flat builtin table handed to `Interpreter::new`. The
/// `HashMap` this returns *is* the one and only source of builtin
/// bindings at every lookup site (the last stop in the symbol lookup
/// order, after local params, `bindings`, `functions`, and `macros`).
pub fn build_builtins() -> HashMap<String, Value> {
    let mut table = HashMap::new();
    arithmetic::register(&mut table);
    comparison::register(&mut table);
    logic::register(&mut table);
    types::register(&mut table);
    lists::register(&mut table);
    maps::register(&mut table);
    console::register(&mut table);
    json::register(&mut table);
    filesystem::register(&mut table);
    environment::register(&mut table);
    process_ops::register(&mut table);
    help_builtins::register(&mut table);
    table
}
