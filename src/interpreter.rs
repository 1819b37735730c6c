//! The interpreter: the process-global tables (`functions`, `macros`,
//! `bindings`, `builtins`) plus the `eval` function that walks an
//! [`Ast`] against a local [`Environment`]. This is also the pipeline
//! stage that drives output — see [`Interpreter::run`].
//!
//! Three tables live here rather than on `Environment` because a local
//! parameter frame should never shadow a top-level function or macro
//! definition the way a nested `let` shadows a variable. Lookup order:
//! local params, then `bindings`, then `functions`, then
//! `macros`-as-callable, then `builtins`.

use crate::ast::Ast;
use crate::env::Environment;
use crate::error::{ARITY_ONE, CoreError, SourceLoc};
use crate::macro_expander::MacroExpander;
use crate::value::{value_eq, OrderedMap, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// One channel-tagged piece of output produced by evaluating a single
/// top-level form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Stdout,
    Info,
    Warn,
    Error,
    Debug,
}

#[derive(Debug, Clone)]
pub struct OutputToken {
    pub channel: Channel,
    pub value: Value,
}

impl OutputToken {
    pub fn new(channel: Channel, value: Value) -> Self {
        OutputToken { channel, value }
    }
}

/// The interpreter's process-global state: three separate name tables
/// plus the fixed builtin table, distinct from any local `Environment`
/// chain. Cloning an `Interpreter` deep-copies the three mutable tables
/// (share-nothing), which is how `process::spawn` isolates a child.
#[derive(Clone)]
pub struct Interpreter {
    pub functions: Arc<RwLock<HashMap<String, Value>>>,
    pub macros: Arc<RwLock<HashMap<String, Value>>>,
    pub bindings: Arc<RwLock<HashMap<String, Value>>>,
    pub builtins: Arc<HashMap<String, Value>>,
    /// Files currently being `include`d, for cycle detection.
    pub loading_files: Arc<RwLock<Vec<String>>>,
    pub include_dirs: Arc<Vec<std::path::PathBuf>>,
}

impl Interpreter {
    pub fn new(builtins: HashMap<String, Value>, include_dirs: Vec<std::path::PathBuf>) -> Self {
        Interpreter {
            functions: Arc::new(RwLock::new(HashMap::new())),
            macros: Arc::new(RwLock::new(HashMap::new())),
            bindings: Arc::new(RwLock::new(HashMap::new())),
            builtins: Arc::new(builtins),
            loading_files: Arc::new(RwLock::new(Vec::new())),
            include_dirs: Arc::new(include_dirs),
        }
    }

    /// Deep-copies the three mutable tables into a fresh interpreter
    /// that shares nothing with `self` — used by `process::spawn` so a
    /// child process cannot observe the parent's later mutations.
    /// Immutable `builtins`/`include_dirs` are shared by `Arc` since they
    /// never change after construction.
    pub fn fork(&self) -> Interpreter {
        Interpreter {
            functions: Arc::new(RwLock::new(self.functions.read().unwrap().clone())),
            macros: Arc::new(RwLock::new(self.macros.read().unwrap().clone())),
            bindings: Arc::new(RwLock::new(self.bindings.read().unwrap().clone())),
            builtins: Arc::clone(&self.builtins),
            loading_files: Arc::new(RwLock::new(Vec::new())),
            include_dirs: Arc::clone(&self.include_dirs),
        }
    }

    /// Runs one already-macro-expanded top-level form and produces its
    /// output token: an `Ast::Error` placeholder never reaches here (lexical/syntactic
    /// errors are emitted by the caller before evaluation); `Def`/`Set`/
    /// `DefMacro` emit on INFO, everything else emits on STDOUT.
    pub fn run_form(&self, ast: &Ast, local_env: &Arc<Environment>) -> OutputToken {
        match self.eval(ast, local_env) {
            Ok(value) => {
                let channel = match ast {
                    Ast::Def { .. } | Ast::DefMacro { .. } | Ast::Set { .. } => Channel::Info,
                    _ => Channel::Stdout,
                };
                OutputToken::new(channel, value)
            }
            Err(e) => OutputToken::new(Channel::Error, error_to_value(&e)),
        }
    }

    /// Evaluates one AST node against a local environment. Local
    /// parameters shadow the global tables; see `lookup_symbol`.
    pub fn eval(&self, ast: &Ast, local_env: &Arc<Environment>) -> Result<Value, CoreError> {
        match ast {
            Ast::Number(n, _) => Ok(Value::Number(*n)),
            Ast::String(s, _) => Ok(Value::String(s.clone())),
            Ast::Boolean(b, _) => Ok(Value::Boolean(*b)),
            Ast::Symbol(name, loc) => self.eval_symbol(name, local_env, *loc),
            Ast::Quote(expr, _) => Ok(ast_to_value(expr)),
            Ast::Call(elements, loc) => self.eval_call(elements, local_env, *loc),
            Ast::Cond {
                clauses,
                else_clause,
                ..
            } => self.eval_cond(clauses, else_clause.as_deref(), local_env),
            Ast::Def {
                name,
                params,
                body,
                ..
            } => self.eval_def(name, params, body, local_env),
            Ast::DefMacro {
                name, params, body, ..
            } => {
                self.macros.write().unwrap().insert(
                    name.clone(),
                    Value::Function {
                        params: params.clone(),
                        body: Arc::new(vec![(**body).clone()]),
                        captured_env: None,
                    },
                );
                Ok(Value::Boolean(true))
            }
            Ast::Set { name, value, loc } => self.eval_set(name, value, local_env, *loc),
            Ast::Let {
                bindings, body, ..
            } => self.eval_let(bindings, body, local_env),
            Ast::Lambda { params, body, .. } => Ok(Value::Function {
                params: params.clone(),
                body: Arc::new(body.clone()),
                captured_env: Some(Arc::clone(local_env)),
            }),
            Ast::Try {
                try_body,
                catch_var,
                catch_body,
                ..
            } => self.eval_try(try_body, catch_var, catch_body, local_env),
            Ast::Throw(expr, loc) => self.eval_throw(expr, local_env, *loc),
            Ast::Begin(body, _) => self.eval_body(body, local_env),
        }
    }

    fn eval_symbol(
        &self,
        name: &str,
        local_env: &Arc<Environment>,
        loc: Option<SourceLoc>,
    ) -> Result<Value, CoreError> {
        // `.field` access on an in-scope value, e.g. `e.message` inside
        // a `catch` body.
        if let Some(dot) = name.rfind('.') {
            if dot > 0 {
                let (base, field) = (&name[..dot], &name[dot + 1..]);
                if !field.is_empty() && self.lookup(base, local_env).is_some() {
                    let value = self.lookup(base, local_env).unwrap();
                    return field_access(&value, field);
                }
            }
        }

        self.lookup(name, local_env)
            .ok_or_else(|| CoreError::undefined_symbol(name, loc))
    }

    /// Lookup order: local params, `bindings`, `functions`, `macros` (as
    /// a callable value), `builtins`.
    fn lookup(&self, name: &str, local_env: &Arc<Environment>) -> Option<Value> {
        if let Some(v) = local_env.get(name) {
            return Some(v);
        }
        if let Some(v) = self.bindings.read().unwrap().get(name) {
            return Some(v.clone());
        }
        if let Some(v) = self.functions.read().unwrap().get(name) {
            return Some(v.clone());
        }
        if let Some(v) = self.macros.read().unwrap().get(name) {
            return Some(v.clone());
        }
        if let Some(v) = self.builtins.get(name) {
            return Some(v.clone());
        }
        None
    }

    fn eval_call(
        &self,
        elements: &[Ast],
        local_env: &Arc<Environment>,
        loc: Option<SourceLoc>,
    ) -> Result<Value, CoreError> {
        if elements.is_empty() {
            return Ok(Value::Nil);
        }

        // `include` is a plain call at the parser level, but it needs
        // the interpreter's tables and a fresh expander, so
        // it's special-cased here rather than dispatched through `apply`
        // — unless something has locally shadowed the name.
        if let Ast::Symbol(name, _) = &elements[0] {
            if name == "include" && self.lookup(name, local_env).is_none() {
                if elements.len() != 2 {
                    return Err(CoreError::arity("include", "1", elements.len().saturating_sub(1)));
                }
                let path_value = self.eval(&elements[1], local_env)?;
                let path = match path_value {
                    Value::String(s) => s,
                    other => {
                        return Err(CoreError::type_error(
                            "include",
                            "string",
                            other.type_name(),
                            1,
                        ))
                    }
                };
                return self.eval_include(&path, local_env, loc);
            }

            // `spawn`/`spawn-link` need the *unevaluated* callee symbol
            // to confirm it names a top-level function: an anonymous
            // closure value has no name the child process
            // could run, so it's rejected here before anything is
            // evaluated.
            if (name == "spawn" || name == "spawn-link") && self.lookup(name, local_env).is_none() {
                return self.eval_spawn(name == "spawn-link", &elements[1..], local_env, loc);
            }
        }

        let callee = self.eval(&elements[0], local_env)?;
        let mut args = Vec::with_capacity(elements.len() - 1);
        for arg in &elements[1..] {
            args.push(self.eval(arg, local_env)?);
        }

        self.apply(&callee, &args, loc)
    }

    /// Loads and runs a source file named by `include`, searching
    /// `include_dirs` in order. Uses plain `std::fs`, not `Sandbox`:
    /// `include` loads trusted source code supplied by whoever invoked
    /// the interpreter with `-i`, distinct from sandboxed user-data file
    /// operations like `read-file`. Cycle detection via `loading_files`.
    fn eval_include(
        &self,
        path: &str,
        local_env: &Arc<Environment>,
        loc: Option<SourceLoc>,
    ) -> Result<Value, CoreError> {
        let err_at = |message: String| match loc {
            Some(l) => CoreError::semantic_at(message, l),
            None => CoreError::semantic(message),
        };

        let resolved = self
            .include_dirs
            .iter()
            .map(|dir| dir.join(path))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| err_at(format!("include: could not find {} on any include path", path)))?;

        let key = resolved.to_string_lossy().to_string();
        if self.loading_files.read().unwrap().contains(&key) {
            return Err(err_at(format!("include: cycle detected loading {}", path)));
        }

        let source = std::fs::read_to_string(&resolved)
            .map_err(|e| err_at(format!("include: cannot read {}: {}", path, e)))?;

        self.loading_files.write().unwrap().push(key.clone());
        let mut expander = MacroExpander::new();
        let result = run_source(self, &mut expander, &source, local_env);
        self.loading_files.write().unwrap().retain(|f| f != &key);
        result
    }

    /// Handles `(spawn name arg...)` / `(spawn-link name arg...)`. `name`
    /// must be a bare symbol already bound in `functions`: that's the
    /// only way to hand the child a function it can run, since a
    /// serialized call expression has to name the function by its
    /// top-level name.
    fn eval_spawn(
        &self,
        linked: bool,
        args: &[Ast],
        local_env: &Arc<Environment>,
        loc: Option<SourceLoc>,
    ) -> Result<Value, CoreError> {
        let fn_name = match args.first() {
            Some(Ast::Symbol(name, _)) if self.functions.read().unwrap().contains_key(name) => {
                name.clone()
            }
            _ => {
                let at = loc.map(|l| format!(" at {}", l)).unwrap_or_default();
                return Err(CoreError::process(format!(
                    "spawn requires a named function{}",
                    at
                )));
            }
        };

        let mut call_args = Vec::with_capacity(args.len().saturating_sub(1));
        for arg in &args[1..] {
            call_args.push(self.eval(arg, local_env)?);
        }

        if linked {
            crate::process::spawn_link(self, &fn_name, &call_args)
        } else {
            crate::process::spawn(self, &fn_name, &call_args)
        }
    }

    /// Applies an already-evaluated callee to already-evaluated
    /// arguments. Shared by `eval_call` and `process::spawn`.
    pub fn apply(
        &self,
        callee: &Value,
        args: &[Value],
        loc: Option<SourceLoc>,
    ) -> Result<Value, CoreError> {
        match callee {
            Value::Builtin(f) => f(args),
            Value::Function {
                params,
                body,
                captured_env: None,
            } => {
                let frame = Environment::new();
                bind_params(&frame, params, args)?;
                self.eval_body(body, &frame)
            }
            Value::Function {
                params,
                body,
                captured_env: Some(captured),
            } => {
                let frame = Environment::with_parent(Arc::clone(captured));
                bind_params(&frame, params, args)?;
                self.eval_body(body, &frame)
            }
            other => {
                let at = loc.map(|l| format!(" at {}", l)).unwrap_or_default();
                Err(CoreError::not_callable(&format!(
                    "{}{}",
                    other.type_name(),
                    at
                )))
            }
        }
    }

    fn eval_cond(
        &self,
        clauses: &[(Ast, Ast)],
        else_clause: Option<&Ast>,
        local_env: &Arc<Environment>,
    ) -> Result<Value, CoreError> {
        for (test, result) in clauses {
            if self.eval(test, local_env)?.is_truthy() {
                return self.eval(result, local_env);
            }
        }
        match else_clause {
            Some(result) => self.eval(result, local_env),
            None => Ok(Value::Boolean(false)),
        }
    }

    fn eval_def(
        &self,
        name: &str,
        params: &[String],
        body: &[Ast],
        local_env: &Arc<Environment>,
    ) -> Result<Value, CoreError> {
        if params.is_empty() {
            let value = self.eval(&body[0], local_env)?;
            self.bindings.write().unwrap().insert(name.to_string(), value);
        } else {
            // Nested defs capture the enclosing local scope so they can
            // recurse and close over outer parameters; top-level defs
            // capture the (empty) global environment, so no captured
            // env is actually needed there — but storing the local
            // frame unconditionally is simpler and correct in both
            // cases, since the global local_env carries nothing.
            let function = Value::Function {
                params: params.to_vec(),
                body: Arc::new(body.to_vec()),
                captured_env: Some(Arc::clone(local_env)),
            };
            self.functions.write().unwrap().insert(name.to_string(), function);
        }
        Ok(Value::Boolean(true))
    }

    fn eval_set(
        &self,
        name: &str,
        value: &Ast,
        local_env: &Arc<Environment>,
        loc: Option<SourceLoc>,
    ) -> Result<Value, CoreError> {
        let new_value = self.eval(value, local_env)?;
        if local_env.set(name, new_value.clone()) {
            return Ok(new_value);
        }
        if self.bindings.read().unwrap().contains_key(name) {
            self.bindings
                .write()
                .unwrap()
                .insert(name.to_string(), new_value.clone());
            return Ok(new_value);
        }
        Err(CoreError::undefined_symbol(name, loc))
    }

    /// `let*` semantics: each binding is evaluated in, and added to, a
    /// single growing frame, so later bindings see earlier ones.
    fn eval_let(
        &self,
        bindings: &[(String, Ast)],
        body: &[Ast],
        local_env: &Arc<Environment>,
    ) -> Result<Value, CoreError> {
        let frame = Environment::with_parent(Arc::clone(local_env));
        for (name, value_ast) in bindings {
            let value = self.eval(value_ast, &frame)?;
            frame.define(name.clone(), value);
        }
        self.eval_body(body, &frame)
    }

    fn eval_try(
        &self,
        try_body: &[Ast],
        catch_var: &str,
        catch_body: &[Ast],
        local_env: &Arc<Environment>,
    ) -> Result<Value, CoreError> {
        match self.eval_body(try_body, local_env) {
            Ok(value) => Ok(value),
            Err(e) => {
                let frame = Environment::with_parent(Arc::clone(local_env));
                frame.define(catch_var.to_string(), error_to_value(&e));
                self.eval_body(catch_body, &frame)
            }
        }
    }

    fn eval_throw(
        &self,
        expr: &Ast,
        local_env: &Arc<Environment>,
        loc: Option<SourceLoc>,
    ) -> Result<Value, CoreError> {
        let value = self.eval(expr, local_env)?;
        Err(value_to_thrown_error(value, loc))
    }

    fn eval_body(&self, body: &[Ast], local_env: &Arc<Environment>) -> Result<Value, CoreError> {
        let mut result = Value::Nil;
        for node in body {
            result = self.eval(node, local_env)?;
        }
        Ok(result)
    }
}

fn bind_params(frame: &Arc<Environment>, params: &[String], args: &[Value]) -> Result<(), CoreError> {
    if params.len() != args.len() {
        return Err(CoreError::arity(
            "function",
            &params.len().to_string(),
            args.len(),
        ));
    }
    for (param, arg) in params.iter().zip(args.iter()) {
        frame.define(param.clone(), arg.clone());
    }
    Ok(())
}

/// `.field` access on a `Value::Error` (the only struct-like value with
/// named fields in this dialect); `message` is the one guaranteed to be
/// useful from a `catch` body, `line`/`column` are best-effort.
fn field_access(value: &Value, field: &str) -> Result<Value, CoreError> {
    match (value, field) {
        (Value::Error { message, .. }, "message") => Ok(Value::String(message.clone())),
        (Value::Error { line, .. }, "line") => Ok(line
            .map(|l| Value::Number(l as f64))
            .unwrap_or(Value::Nil)),
        (Value::Error { column, .. }, "column") => Ok(column
            .map(|c| Value::Number(c as f64))
            .unwrap_or(Value::Nil)),
        _ => Err(CoreError::undefined_field(field)),
    }
}

/// Converts a caught `CoreError` (from `try`, or a propagating builtin
/// failure) into the `Value::Error` bound to the `catch` variable.
pub fn error_to_value(err: &CoreError) -> Value {
    Value::Error {
        message: err.message.clone(),
        line: err.location.map(|l| l.line),
        column: err.location.map(|l| l.column),
    }
}

/// Wraps a thrown `Value` as a `CoreError` for in-band propagation.
/// Non-`Error` values are auto-wrapped (a thrown string keeps its text
/// as the error message, with no location attached).
fn value_to_thrown_error(value: Value, loc: Option<SourceLoc>) -> CoreError {
    match value {
        Value::Error { message, line, column } => {
            let location = match (line, column) {
                (Some(l), Some(c)) => Some(SourceLoc::new(l, c)),
                _ => loc,
            };
            match location {
                Some(l) => CoreError::semantic_at(message, l),
                None => CoreError::semantic(message),
            }
        }
        other => {
            let message = other.to_string();
            match loc {
                Some(l) => CoreError::semantic_at(message, l),
                None => CoreError::semantic(message),
            }
        }
    }
}

/// Converts a quoted [`Ast`] into the [`Value`] it denotes. Special-form
/// nodes become a `List` headed by the form's keyword as a `String`, so
/// that macro
/// bodies built with `list`/`quote` can construct any shape the parser
/// accepts.
pub fn ast_to_value(ast: &Ast) -> Value {
    match ast {
        Ast::Number(n, _) => Value::Number(*n),
        Ast::String(s, _) => Value::String(s.clone()),
        Ast::Boolean(b, _) => Value::Boolean(*b),
        Ast::Symbol(s, _) => Value::String(s.clone()),
        Ast::Call(elems, _) => Value::List(elems.iter().map(ast_to_value).collect()),
        Ast::Quote(expr, _) => Value::List(vec![
            Value::String("quote".to_string()),
            ast_to_value(expr),
        ]),
        Ast::Cond {
            clauses,
            else_clause,
            ..
        } => {
            let mut items = vec![Value::String("cond".to_string())];
            for (test, result) in clauses {
                items.push(Value::List(vec![ast_to_value(test), ast_to_value(result)]));
            }
            if let Some(e) = else_clause {
                items.push(Value::List(vec![
                    Value::String("else".to_string()),
                    ast_to_value(e),
                ]));
            }
            Value::List(items)
        }
        Ast::Def {
            name, params, body, ..
        } => {
            let mut items = vec![Value::String("def".to_string())];
            items.push(Value::String(name.clone()));
            if !params.is_empty() {
                items.push(Value::List(
                    params.iter().map(|p| Value::String(p.clone())).collect(),
                ));
            }
            items.extend(body.iter().map(ast_to_value));
            Value::List(items)
        }
        Ast::DefMacro {
            name, params, body, ..
        } => Value::List(vec![
            Value::String("defmacro".to_string()),
            Value::String(name.clone()),
            Value::List(params.iter().map(|p| Value::String(p.clone())).collect()),
            ast_to_value(body),
        ]),
        Ast::Set { name, value, .. } => Value::List(vec![
            Value::String("set!".to_string()),
            Value::String(name.clone()),
            ast_to_value(value),
        ]),
        Ast::Let { bindings, body, .. } => {
            let mut items = vec![Value::String("let".to_string())];
            let binding_list = bindings
                .iter()
                .map(|(n, v)| Value::List(vec![Value::String(n.clone()), ast_to_value(v)]))
                .collect();
            items.push(Value::List(binding_list));
            items.extend(body.iter().map(ast_to_value));
            Value::List(items)
        }
        Ast::Lambda { params, body, .. } => {
            let mut items = vec![
                Value::String("fun".to_string()),
                Value::List(params.iter().map(|p| Value::String(p.clone())).collect()),
            ];
            items.extend(body.iter().map(ast_to_value));
            Value::List(items)
        }
        Ast::Try {
            try_body,
            catch_var,
            catch_body,
            ..
        } => {
            let mut items = vec![Value::String("try".to_string())];
            items.extend(try_body.iter().map(ast_to_value));
            let mut catch_items = vec![
                Value::String("catch".to_string()),
                Value::String(catch_var.clone()),
            ];
            catch_items.extend(catch_body.iter().map(ast_to_value));
            items.push(Value::List(catch_items));
            Value::List(items)
        }
        Ast::Throw(expr, _) => Value::List(vec![
            Value::String("throw".to_string()),
            ast_to_value(expr),
        ]),
        Ast::Begin(body, _) => {
            let mut items = vec![Value::String("begin".to_string())];
            items.extend(body.iter().map(ast_to_value));
            Value::List(items)
        }
    }
}

/// Converts a `Value` produced by a macro body back into an [`Ast`],
/// the other direction of `ast_to_value`'s round-trip. Used only by
/// [`MacroExpander`]; kept here since it's the mirror of `ast_to_value`
/// and shares the same special-form keyword table.
pub fn value_to_ast(value: &Value) -> Result<Ast, CoreError> {
    match value {
        Value::Number(n) => Ok(Ast::Number(*n, None)),
        Value::String(s) => Ok(Ast::String(s.clone(), None)),
        Value::Boolean(b) => Ok(Ast::Boolean(*b, None)),
        Value::Nil => Ok(Ast::Call(Vec::new(), None)),
        Value::List(items) => value_list_to_ast(items),
        other => Err(CoreError::expansion(format!(
            "macro expansion produced a non-list, non-atomic value: {}",
            other.type_name()
        ))),
    }
}

fn value_list_to_ast(items: &[Value]) -> Result<Ast, CoreError> {
    if items.is_empty() {
        return Ok(Ast::Call(Vec::new(), None));
    }

    if let Value::String(head) = &items[0] {
        match head.as_str() {
            "quote" if items.len() == 2 => {
                return Ok(Ast::Quote(Box::new(value_to_ast(&items[1])?), None));
            }
            "cond" => return value_list_to_cond(&items[1..]),
            "def" => return value_list_to_def(&items[1..]),
            "defmacro" if items.len() == 4 => {
                let name = expect_string(&items[1])?;
                let params = expect_string_list(&items[2])?;
                let body = value_to_ast(&items[3])?;
                return Ok(Ast::DefMacro {
                    name,
                    params,
                    body: Box::new(body),
                    loc: None,
                });
            }
            "set!" if items.len() == 3 => {
                let name = expect_string(&items[1])?;
                let value = value_to_ast(&items[2])?;
                return Ok(Ast::Set {
                    name,
                    value: Box::new(value),
                    loc: None,
                });
            }
            "let" if items.len() >= 2 => return value_list_to_let(&items[1..]),
            "fun" if items.len() >= 2 => return value_list_to_lambda(&items[1..]),
            "try" if items.len() >= 2 => return value_list_to_try(&items[1..]),
            "throw" if items.len() == 2 => {
                return Ok(Ast::Throw(Box::new(value_to_ast(&items[1])?), None));
            }
            "begin" => {
                let body = items[1..]
                    .iter()
                    .map(value_to_ast)
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Ast::Begin(body, None));
            }
            _ => {}
        }
    }

    let elements = items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(Ast::Symbol(s.clone(), None)),
            other => value_to_ast(other),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Ast::Call(elements, None))
}

fn value_list_to_cond(rest: &[Value]) -> Result<Ast, CoreError> {
    let mut clauses = Vec::new();
    let mut else_clause = None;
    for item in rest {
        let pair = match item {
            Value::List(p) if p.len() == 2 => p,
            _ => return Err(CoreError::expansion("cond: clause must be a 2-element list")),
        };
        let is_else = matches!(&pair[0], Value::String(s) if s == "else");
        if is_else {
            else_clause = Some(Box::new(value_to_ast(&pair[1])?));
            continue;
        }
        clauses.push((value_to_ast(&pair[0])?, value_to_ast(&pair[1])?));
    }
    Ok(Ast::Cond {
        clauses,
        else_clause,
        loc: None,
    })
}

fn value_list_to_def(rest: &[Value]) -> Result<Ast, CoreError> {
    if rest.is_empty() {
        return Err(CoreError::expansion("def: expected a name"));
    }
    let name = expect_string(&rest[0])?;
    let (params, body_start) = match rest.get(1) {
        Some(Value::List(_)) => (expect_string_list(&rest[1])?, 2),
        _ => (Vec::new(), 1),
    };
    let body = rest[body_start..]
        .iter()
        .map(value_to_ast)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Ast::Def {
        name,
        params,
        body,
        loc: None,
    })
}

fn value_list_to_let(rest: &[Value]) -> Result<Ast, CoreError> {
    let binding_list = match rest.first() {
        Some(Value::List(items)) => items,
        _ => return Err(CoreError::expansion("let: expected a binding list")),
    };
    let mut bindings = Vec::new();
    for item in binding_list {
        match item {
            Value::List(pair) if pair.len() == 2 => {
                let name = expect_string(&pair[0])?;
                bindings.push((name, value_to_ast(&pair[1])?));
            }
            _ => return Err(CoreError::expansion("let: binding must be (name value)")),
        }
    }
    let body = rest[1..]
        .iter()
        .map(value_to_ast)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Ast::Let {
        bindings,
        body,
        loc: None,
    })
}

fn value_list_to_lambda(rest: &[Value]) -> Result<Ast, CoreError> {
    let params = expect_string_list(&rest[0])?;
    let body = rest[1..]
        .iter()
        .map(value_to_ast)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Ast::Lambda {
        params,
        body,
        loc: None,
    })
}

fn value_list_to_try(rest: &[Value]) -> Result<Ast, CoreError> {
    if rest.is_empty() {
        return Err(CoreError::expansion("try: expected a body and catch clause"));
    }
    let (try_items, catch_items) = rest.split_at(rest.len() - 1);
    let catch_list = match &catch_items[0] {
        Value::List(items) if items.len() >= 2 => items,
        _ => return Err(CoreError::expansion("try: expected a trailing (catch var body...)")),
    };
    let is_catch = matches!(&catch_list[0], Value::String(s) if s == "catch");
    if !is_catch {
        return Err(CoreError::expansion("try: expected a trailing (catch var body...)"));
    }
    let catch_var = expect_string(&catch_list[1])?;
    let try_body = try_items
        .iter()
        .map(value_to_ast)
        .collect::<Result<Vec<_>, _>>()?;
    let catch_body = catch_list[2..]
        .iter()
        .map(value_to_ast)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Ast::Try {
        try_body,
        catch_var,
        catch_body,
        loc: None,
    })
}

fn expect_string(value: &Value) -> Result<String, CoreError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => Err(CoreError::expansion(format!(
            "expected a symbol, got {}",
            other.type_name()
        ))),
    }
}

fn expect_string_list(value: &Value) -> Result<Vec<String>, CoreError> {
    match value {
        Value::List(items) => items.iter().map(expect_string).collect(),
        Value::Nil => Ok(Vec::new()),
        other => Err(CoreError::expansion(format!(
            "expected a list of symbols, got {}",
            other.type_name()
        ))),
    }
}

/// A variadic equality helper shared by `builtins::comparison` — lives
/// here because it needs `value_eq`, which is already re-exported.
pub fn values_equal(args: &[Value]) -> bool {
    args.windows(2).all(|w| value_eq(&w[0], &w[1]))
}

/// `make-map` takes zero arguments and returns an empty map; used by
/// `builtins::maps` and kept beside the other Value constructors.
pub fn empty_map() -> Value {
    Value::Map(OrderedMap::new())
}

/// Helper shared with `include`: runs one source chunk end to end
/// (tokenize → parse → macro-expand → evaluate), returning the value of
/// the last top-level form, as `include` requires.
pub fn run_source(
    interp: &Interpreter,
    expander: &mut MacroExpander,
    source: &str,
    global_env: &Arc<Environment>,
) -> Result<Value, CoreError> {
    let tokens = crate::token::tokenize(source);
    let forms = crate::parser::parse_all(tokens);
    let mut result = Value::Nil;
    for form in forms {
        let ast = form?;
        let expanded = expander.expand_top_level(&ast, interp, global_env)?;
        result = interp.eval(&expanded, global_env)?;
    }
    Ok(result)
}

pub const _ARITY_ONE_REF: &str = ARITY_ONE;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_one;
    use crate::token::tokenize;

    fn fresh() -> (Interpreter, Arc<Environment>) {
        (
            Interpreter::new(HashMap::new(), Vec::new()),
            Environment::new(),
        )
    }

    fn parse(src: &str) -> Ast {
        parse_one(tokenize(src)).unwrap()
    }

    #[test]
    fn evaluates_arithmetic_like_literals() {
        let (interp, env) = fresh();
        let ast = parse("42");
        assert_eq!(interp.eval(&ast, &env).unwrap(), Value::Number(42.0));
    }

    #[test]
    fn def_value_then_lookup() {
        let (interp, env) = fresh();
        interp.eval(&parse("(def x 10)"), &env).unwrap();
        assert_eq!(interp.eval(&parse("x"), &env).unwrap(), Value::Number(10.0));
    }

    #[test]
    fn def_function_then_call() {
        let (interp, env) = fresh();
        interp
            .eval(&parse("(def double (x) (+ x x))"), &env)
            .unwrap();
        // `+` isn't registered in this bare interpreter; call should at
        // least resolve `double` and attempt the body (undefined `+`).
        let err = interp.eval(&parse("(double 5)"), &env).unwrap_err();
        assert!(err.message.contains("+"));
    }

    #[test]
    fn closures_capture_outer_bindings() {
        let (interp, env) = fresh();
        interp
            .eval(&parse("(def make-adder (n) (fun (x) (set! n n)))"), &env)
            .unwrap();
        // Minimal smoke test: defining and evaluating a lambda-returning
        // function doesn't error before it's even called.
        let result = interp.eval(&parse("(make-adder 5)"), &env);
        assert!(result.is_ok());
    }

    #[test]
    fn cond_picks_first_truthy_else_else_clause() {
        let (interp, env) = fresh();
        assert_eq!(
            interp.eval(&parse("(cond (false 1) (else 2))"), &env).unwrap(),
            Value::Number(2.0)
        );
    }

    #[test]
    fn cond_with_no_match_and_no_else_is_false() {
        let (interp, env) = fresh();
        assert_eq!(
            interp.eval(&parse("(cond (false 1))"), &env).unwrap(),
            Value::Boolean(false)
        );
    }

    #[test]
    fn let_star_sees_earlier_bindings() {
        let (interp, env) = fresh();
        let result = interp
            .eval(&parse("(let ((x 1) (y x)) y)"), &env)
            .unwrap();
        assert_eq!(result, Value::Number(1.0));
    }

    #[test]
    fn try_catch_binds_error_and_message_field() {
        let (interp, env) = fresh();
        let result = interp
            .eval(&parse("(try (throw \"boom\") (catch e e.message))"), &env)
            .unwrap();
        assert_eq!(result, Value::String("boom".to_string()));
    }

    #[test]
    fn set_on_undefined_symbol_is_error() {
        let (interp, env) = fresh();
        assert!(interp.eval(&parse("(set! zzz 1)"), &env).is_err());
    }

    #[test]
    fn quote_converts_symbol_to_string_value() {
        let (interp, env) = fresh();
        assert_eq!(
            interp.eval(&parse("(quote hello)"), &env).unwrap(),
            Value::String("hello".to_string())
        );
    }

    #[test]
    fn quote_round_trips_a_call_shape() {
        let ast = parse("(a b c)");
        let value = ast_to_value(&ast);
        let roundtripped = value_to_ast(&value).unwrap();
        assert_eq!(ast, roundtripped);
    }

    #[test]
    fn begin_returns_last_value() {
        let (interp, env) = fresh();
        assert_eq!(
            interp.eval(&parse("(begin 1 2 3)"), &env).unwrap(),
            Value::Number(3.0)
        );
    }
}
