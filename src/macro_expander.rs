//! The macro expander: walks an [`Ast`] top-down, replacing any call
//! whose head symbol names a defined macro with the result of running
//! the macro body through the interpreter, then re-expanding that
//! result. `defmacro` nodes register their macro here, but the node
//! itself is handed back unchanged rather than collapsed — the
//! interpreter still evaluates it (its own `DefMacro` arm just re-registers
//! the same macro) so `run_form` reports it on the INFO channel like
//! `def`/`set!`, per spec. No `Call` to a macro survives past this stage.
//!
//! Expansion is unhygienic: macro parameters are bound to the caller's
//! unevaluated argument ASTs by name, with no renaming. A macro that
//! shadows a caller's variable will do exactly that, same as the
//! dialect's `let`/`fun` bindings. This is a deliberate simplification,
//! not an oversight.

use crate::ast::Ast;
use crate::env::Environment;
use crate::error::CoreError;
use crate::interpreter::{ast_to_value, value_to_ast, Interpreter};
use crate::value::Value;
use std::sync::Arc;

/// Upper bound on total re-expansion steps for a single top-level form,
/// so a macro that expands into a call to itself (directly or through a
/// cycle of several macros) fails with an error instead of hanging.
const EXPANSION_FUEL: usize = 10_000;

pub struct MacroExpander {
    fuel: usize,
}

impl Default for MacroExpander {
    fn default() -> Self {
        MacroExpander::new()
    }
}

impl MacroExpander {
    pub fn new() -> Self {
        MacroExpander { fuel: EXPANSION_FUEL }
    }

    /// Expands one top-level form to a fixed point. `global_env` is
    /// passed through to `interp.eval` when running macro bodies; macros
    /// only ever see their own parameters, never the caller's locals, so
    /// an empty global environment is the correct choice here too.
    pub fn expand_top_level(
        &mut self,
        ast: &Ast,
        interp: &Interpreter,
        global_env: &Arc<Environment>,
    ) -> Result<Ast, CoreError> {
        self.fuel = EXPANSION_FUEL;
        self.expand(ast, interp, global_env)
    }

    fn take_fuel(&mut self) -> Result<(), CoreError> {
        if self.fuel == 0 {
            return Err(CoreError::expansion(
                "macro expansion exceeded its step budget (possible infinite recursion)",
            ));
        }
        self.fuel -= 1;
        Ok(())
    }

    fn expand(
        &mut self,
        ast: &Ast,
        interp: &Interpreter,
        global_env: &Arc<Environment>,
    ) -> Result<Ast, CoreError> {
        self.take_fuel()?;

        match ast {
            Ast::DefMacro {
                name, params, body, ..
            } => {
                // Registered here so later forms in the same top-level
                // expansion can already call it; the node itself is
                // handed back unchanged (not collapsed to a `Boolean`)
                // so the interpreter's own `DefMacro` arm still runs and
                // `run_form` still reports it on the INFO channel like
                // `Def`/`Set`, per spec.
                interp.macros.write().unwrap().insert(
                    name.clone(),
                    Value::Function {
                        params: params.clone(),
                        body: Arc::new(vec![(**body).clone()]),
                        captured_env: None,
                    },
                );
                Ok(ast.clone())
            }
            Ast::Call(elements, loc) => {
                if let Some((macro_name, macro_value)) =
                    self.matching_macro(elements, interp)
                {
                    let expanded_args = &elements[1..];
                    let result =
                        self.invoke_macro(&macro_name, &macro_value, expanded_args, interp, global_env)?;
                    let as_ast = value_to_ast(&result)?;
                    return self.expand(&as_ast, interp, global_env);
                }

                let expanded = elements
                    .iter()
                    .map(|e| self.expand(e, interp, global_env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Ast::Call(expanded, *loc))
            }
            Ast::Quote(_, _) => Ok(ast.clone()),
            Ast::Cond {
                clauses,
                else_clause,
                loc,
            } => {
                let clauses = clauses
                    .iter()
                    .map(|(t, r)| Ok((self.expand(t, interp, global_env)?, self.expand(r, interp, global_env)?)))
                    .collect::<Result<Vec<_>, CoreError>>()?;
                let else_clause = else_clause
                    .as_ref()
                    .map(|e| self.expand(e, interp, global_env))
                    .transpose()?
                    .map(Box::new);
                Ok(Ast::Cond {
                    clauses,
                    else_clause,
                    loc: *loc,
                })
            }
            Ast::Def {
                name,
                params,
                body,
                loc,
            } => {
                let body = body
                    .iter()
                    .map(|b| self.expand(b, interp, global_env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Ast::Def {
                    name: name.clone(),
                    params: params.clone(),
                    body,
                    loc: *loc,
                })
            }
            Ast::Set { name, value, loc } => Ok(Ast::Set {
                name: name.clone(),
                value: Box::new(self.expand(value, interp, global_env)?),
                loc: *loc,
            }),
            Ast::Let { bindings, body, loc } => {
                let bindings = bindings
                    .iter()
                    .map(|(n, v)| Ok((n.clone(), self.expand(v, interp, global_env)?)))
                    .collect::<Result<Vec<_>, CoreError>>()?;
                let body = body
                    .iter()
                    .map(|b| self.expand(b, interp, global_env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Ast::Let {
                    bindings,
                    body,
                    loc: *loc,
                })
            }
            Ast::Lambda { params, body, loc } => {
                let body = body
                    .iter()
                    .map(|b| self.expand(b, interp, global_env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Ast::Lambda {
                    params: params.clone(),
                    body,
                    loc: *loc,
                })
            }
            Ast::Try {
                try_body,
                catch_var,
                catch_body,
                loc,
            } => {
                let try_body = try_body
                    .iter()
                    .map(|b| self.expand(b, interp, global_env))
                    .collect::<Result<Vec<_>, _>>()?;
                let catch_body = catch_body
                    .iter()
                    .map(|b| self.expand(b, interp, global_env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Ast::Try {
                    try_body,
                    catch_var: catch_var.clone(),
                    catch_body,
                    loc: *loc,
                })
            }
            Ast::Throw(expr, loc) => Ok(Ast::Throw(Box::new(self.expand(expr, interp, global_env)?), *loc)),
            Ast::Begin(body, loc) => {
                let body = body
                    .iter()
                    .map(|b| self.expand(b, interp, global_env))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Ast::Begin(body, *loc))
            }
            Ast::Number(..) | Ast::String(..) | Ast::Boolean(..) | Ast::Symbol(..) => {
                Ok(ast.clone())
            }
        }
    }

    fn matching_macro(&self, elements: &[Ast], interp: &Interpreter) -> Option<(String, Value)> {
        let head = elements.first()?;
        let name = match head {
            Ast::Symbol(name, _) => name,
            _ => return None,
        };
        let macro_value = interp.macros.read().unwrap().get(name).cloned()?;
        Some((name.clone(), macro_value))
    }

    /// Binds the macro's parameters to the caller's unevaluated argument
    /// ASTs (converted to `Value` via `ast_to_value`), evaluates the
    /// macro body with the interpreter, and returns the resulting
    /// `Value`.
    fn invoke_macro(
        &mut self,
        macro_name: &str,
        macro_value: &Value,
        arg_asts: &[Ast],
        interp: &Interpreter,
        global_env: &Arc<Environment>,
    ) -> Result<Value, CoreError> {
        let (params, body) = match macro_value {
            Value::Function { params, body, .. } => (params, body),
            _ => {
                return Err(CoreError::expansion(format!(
                    "{}: macro table entry is not a function",
                    macro_name
                )))
            }
        };
        if params.len() != arg_asts.len() {
            return Err(CoreError::arity(
                macro_name,
                &params.len().to_string(),
                arg_asts.len(),
            ));
        }

        let frame = Environment::with_parent(Arc::clone(global_env));
        for (param, arg_ast) in params.iter().zip(arg_asts.iter()) {
            frame.define(param.clone(), ast_to_value(arg_ast));
        }

        let mut result = Value::Nil;
        for node in body.iter() {
            result = interp.eval(node, &frame)?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_one;
    use crate::token::tokenize;
    use std::collections::HashMap;

    fn parse(src: &str) -> Ast {
        parse_one(tokenize(src)).unwrap()
    }

    fn fresh() -> (Interpreter, Arc<Environment>) {
        (
            Interpreter::new(HashMap::new(), Vec::new()),
            Environment::new(),
        )
    }

    #[test]
    fn defmacro_node_registers_and_is_returned_unchanged() {
        let (interp, env) = fresh();
        let mut expander = MacroExpander::new();
        let ast = parse("(defmacro twice (x) (list 'begin x x))");
        let expanded = expander.expand_top_level(&ast, &interp, &env).unwrap();
        // The node itself survives expansion (not collapsed to `true`)
        // so the interpreter's own `DefMacro` arm still runs it and
        // `run_form` still reports it on the INFO channel, same as `def`.
        assert_eq!(expanded.without_locations(), ast.without_locations());
        assert!(interp.macros.read().unwrap().contains_key("twice"));
    }

    #[test]
    fn when_macro_expands_to_cond() {
        let (interp, env) = fresh();
        let mut expander = MacroExpander::new();
        let defmacro = parse("(defmacro when (test body) (list 'cond (list test body)))");
        expander.expand_top_level(&defmacro, &interp, &env).unwrap();

        let call = parse("(when true 42)");
        let expanded = expander.expand_top_level(&call, &interp, &env).unwrap();
        match expanded {
            Ast::Cond { clauses, .. } => assert_eq!(clauses.len(), 1),
            other => panic!("expected Cond, got {:?}", other),
        }
    }

    #[test]
    fn non_macro_calls_pass_through_unexpanded_except_recursion() {
        let (interp, env) = fresh();
        let mut expander = MacroExpander::new();
        let ast = parse("(+ 1 2)");
        let expanded = expander.expand_top_level(&ast, &interp, &env).unwrap();
        assert_eq!(expanded.without_locations(), ast.without_locations());
    }

    #[test]
    fn runaway_macro_expansion_runs_out_of_fuel() {
        let (interp, env) = fresh();
        let mut expander = MacroExpander::new();
        let defmacro = parse("(defmacro loop () (list 'loop))");
        expander.expand_top_level(&defmacro, &interp, &env).unwrap();
        let call = parse("(loop)");
        let result = expander.expand_top_level(&call, &interp, &env);
        assert!(result.is_err());
    }
}
