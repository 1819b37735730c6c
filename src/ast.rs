//! The AST node set produced by the parser and consumed by the macro
//! expander and interpreter. Deliberately a flat tagged enum — dispatch
//! throughout the crate is a small `match` over a bounded variant set,
//! never class-style inheritance.
//!
//! Every node carries an optional [`SourceLoc`] so that errors raised
//! deep in evaluation can still point back at source text.

use crate::error::SourceLoc;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Number(f64, Option<SourceLoc>),
    String(String, Option<SourceLoc>),
    Boolean(bool, Option<SourceLoc>),
    Symbol(String, Option<SourceLoc>),
    /// An applicative call; `elements[0]` is the callee.
    Call(Vec<Ast>, Option<SourceLoc>),
    /// Literal AST, not evaluated.
    Quote(Box<Ast>, Option<SourceLoc>),
    Cond {
        clauses: Vec<(Ast, Ast)>,
        else_clause: Option<Box<Ast>>,
        loc: Option<SourceLoc>,
    },
    /// Function definition when `params` is non-empty; variable
    /// definition when `params` is empty (`body` then holds exactly one
    /// expression).
    Def {
        name: String,
        params: Vec<String>,
        body: Vec<Ast>,
        loc: Option<SourceLoc>,
    },
    DefMacro {
        name: String,
        params: Vec<String>,
        body: Box<Ast>,
        loc: Option<SourceLoc>,
    },
    /// Mutate an existing binding.
    Set {
        name: String,
        value: Box<Ast>,
        loc: Option<SourceLoc>,
    },
    /// `let*` semantics: each binding sees all prior bindings.
    Let {
        bindings: Vec<(String, Ast)>,
        body: Vec<Ast>,
        loc: Option<SourceLoc>,
    },
    Lambda {
        params: Vec<String>,
        body: Vec<Ast>,
        loc: Option<SourceLoc>,
    },
    Try {
        try_body: Vec<Ast>,
        catch_var: String,
        catch_body: Vec<Ast>,
        loc: Option<SourceLoc>,
    },
    Throw(Box<Ast>, Option<SourceLoc>),
    Begin(Vec<Ast>, Option<SourceLoc>),
}

impl Ast {
    pub fn loc(&self) -> Option<SourceLoc> {
        match self {
            Ast::Number(_, loc)
            | Ast::String(_, loc)
            | Ast::Boolean(_, loc)
            | Ast::Symbol(_, loc)
            | Ast::Call(_, loc)
            | Ast::Quote(_, loc)
            | Ast::Throw(_, loc)
            | Ast::Begin(_, loc) => *loc,
            Ast::Cond { loc, .. }
            | Ast::Def { loc, .. }
            | Ast::DefMacro { loc, .. }
            | Ast::Set { loc, .. }
            | Ast::Let { loc, .. }
            | Ast::Lambda { loc, .. }
            | Ast::Try { loc, .. } => *loc,
        }
    }

    /// Strip source locations for equality checks that must hold
    /// "modulo source locations" (print/reparse and AST<->Value round
    /// trips).
    pub fn without_locations(&self) -> Ast {
        match self {
            Ast::Number(n, _) => Ast::Number(*n, None),
            Ast::String(s, _) => Ast::String(s.clone(), None),
            Ast::Boolean(b, _) => Ast::Boolean(*b, None),
            Ast::Symbol(s, _) => Ast::Symbol(s.clone(), None),
            Ast::Call(elems, _) => {
                Ast::Call(elems.iter().map(Ast::without_locations).collect(), None)
            }
            Ast::Quote(expr, _) => Ast::Quote(Box::new(expr.without_locations()), None),
            Ast::Cond {
                clauses,
                else_clause,
                ..
            } => Ast::Cond {
                clauses: clauses
                    .iter()
                    .map(|(t, r)| (t.without_locations(), r.without_locations()))
                    .collect(),
                else_clause: else_clause
                    .as_ref()
                    .map(|e| Box::new(e.without_locations())),
                loc: None,
            },
            Ast::Def {
                name, params, body, ..
            } => Ast::Def {
                name: name.clone(),
                params: params.clone(),
                body: body.iter().map(Ast::without_locations).collect(),
                loc: None,
            },
            Ast::DefMacro {
                name, params, body, ..
            } => Ast::DefMacro {
                name: name.clone(),
                params: params.clone(),
                body: Box::new(body.without_locations()),
                loc: None,
            },
            Ast::Set { name, value, .. } => Ast::Set {
                name: name.clone(),
                value: Box::new(value.without_locations()),
                loc: None,
            },
            Ast::Let { bindings, body, .. } => Ast::Let {
                bindings: bindings
                    .iter()
                    .map(|(n, v)| (n.clone(), v.without_locations()))
                    .collect(),
                body: body.iter().map(Ast::without_locations).collect(),
                loc: None,
            },
            Ast::Lambda { params, body, .. } => Ast::Lambda {
                params: params.clone(),
                body: body.iter().map(Ast::without_locations).collect(),
                loc: None,
            },
            Ast::Try {
                try_body,
                catch_var,
                catch_body,
                ..
            } => Ast::Try {
                try_body: try_body.iter().map(Ast::without_locations).collect(),
                catch_var: catch_var.clone(),
                catch_body: catch_body.iter().map(Ast::without_locations).collect(),
                loc: None,
            },
            Ast::Throw(expr, _) => Ast::Throw(Box::new(expr.without_locations()), None),
            Ast::Begin(body, _) => {
                Ast::Begin(body.iter().map(Ast::without_locations).collect(), None)
            }
        }
    }
}

fn fmt_body(body: &[Ast], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for node in body {
        write!(f, " {}", node)?;
    }
    Ok(())
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ast::Number(n, _) => {
                if n.fract() == 0.0 && n.is_finite() {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Ast::String(s, _) => write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
            Ast::Boolean(b, _) => write!(f, "{}", if *b { "true" } else { "false" }),
            Ast::Symbol(s, _) => write!(f, "{}", s),
            Ast::Call(elems, _) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", e)?;
                }
                write!(f, ")")
            }
            Ast::Quote(expr, _) => write!(f, "(quote {})", expr),
            Ast::Cond {
                clauses,
                else_clause,
                ..
            } => {
                write!(f, "(cond")?;
                for (test, result) in clauses {
                    write!(f, " ({} {})", test, result)?;
                }
                if let Some(e) = else_clause {
                    write!(f, " (else {})", e)?;
                }
                write!(f, ")")
            }
            Ast::Def {
                name, params, body, ..
            } => {
                if params.is_empty() {
                    write!(f, "(def {}{})", name, {
                        let mut s = String::new();
                        for b in body {
                            s.push(' ');
                            s.push_str(&b.to_string());
                        }
                        s
                    })
                } else {
                    write!(f, "(def {} ({})", name, params.join(" "))?;
                    fmt_body(body, f)?;
                    write!(f, ")")
                }
            }
            Ast::DefMacro {
                name, params, body, ..
            } => write!(f, "(defmacro {} ({}) {})", name, params.join(" "), body),
            Ast::Set { name, value, .. } => write!(f, "(set! {} {})", name, value),
            Ast::Let { bindings, body, .. } => {
                write!(f, "(let (")?;
                for (i, (n, v)) in bindings.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "({} {})", n, v)?;
                }
                write!(f, ")")?;
                fmt_body(body, f)?;
                write!(f, ")")
            }
            Ast::Lambda { params, body, .. } => {
                write!(f, "(fun ({})", params.join(" "))?;
                fmt_body(body, f)?;
                write!(f, ")")
            }
            Ast::Try {
                try_body,
                catch_var,
                catch_body,
                ..
            } => {
                write!(f, "(try")?;
                fmt_body(try_body, f)?;
                write!(f, " (catch {}", catch_var)?;
                fmt_body(catch_body, f)?;
                write!(f, "))")
            }
            Ast::Throw(expr, _) => write!(f, "(throw {})", expr),
            Ast::Begin(body, _) => {
                write!(f, "(begin")?;
                fmt_body(body, f)?;
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_number_whole_vs_fractional() {
        assert_eq!(Ast::Number(3.0, None).to_string(), "3");
        assert_eq!(Ast::Number(3.5, None).to_string(), "3.5");
    }

    #[test]
    fn display_call_roundtrips_shape() {
        let call = Ast::Call(
            vec![
                Ast::Symbol("+".into(), None),
                Ast::Number(1.0, None),
                Ast::Number(2.0, None),
            ],
            None,
        );
        assert_eq!(call.to_string(), "(+ 1 2)");
    }

    #[test]
    fn without_locations_strips_nested_locations() {
        let loc = SourceLoc::new(1, 1);
        let a = Ast::Quote(Box::new(Ast::Number(1.0, Some(loc))), Some(loc));
        let b = a.without_locations();
        assert_eq!(a.loc(), Some(loc));
        assert_eq!(b.loc(), None);
    }
}
