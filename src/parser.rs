//! The parser: a lazy sequence of `Token | CoreError` in, one [`Ast`] per
//! top-level balanced form out. Recursive-descent over the paren-balanced
//! grammar in spec §4.2 — special forms are recognised structurally by
//! the symbol in head position of a `Call`, not by a separate keyword
//! token kind.

use crate::ast::Ast;
use crate::error::{CoreError, SourceLoc};
use crate::token::{Token, TokenKind};

/// Parses every complete token stream produced by the tokenizer into a
/// sequence of top-level forms. Each `Ok(Token)` run between balanced
/// parens becomes one `Ast`; a lexer error already present in the input
/// is passed through unchanged as the next item.
pub fn parse_all(tokens: Vec<Result<Token, CoreError>>) -> Vec<Result<Ast, CoreError>> {
    let mut out = Vec::new();
    let mut parser = Parser::new(tokens);
    while !parser.at_end() {
        match parser.parse_top_level() {
            Ok(ast) => out.push(Ok(ast)),
            Err(e) => {
                out.push(Err(e));
                parser.recover();
            }
        }
    }
    out
}

/// Parses a single top-level form, for callers (the REPL, `include`)
/// that already know they have exactly one balanced chunk of tokens.
pub fn parse_one(tokens: Vec<Result<Token, CoreError>>) -> Result<Ast, CoreError> {
    let mut parser = Parser::new(tokens);
    if parser.at_end() {
        return Err(CoreError::syntactic("empty input, expected one form"));
    }
    let ast = parser.parse_top_level()?;
    if !parser.at_end() {
        return Err(CoreError::syntactic("extraneous tokens after form"));
    }
    Ok(ast)
}

struct Parser {
    tokens: Vec<Result<Token, CoreError>>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Result<Token, CoreError>>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Skip past a single bad token, so a syntax error on one top-level
    /// form doesn't stop the rest of the chunk from being parsed.
    fn recover(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<&Result<Token, CoreError>> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Result<Token, CoreError> {
        let item = self
            .tokens
            .get(self.pos)
            .cloned()
            .unwrap_or_else(|| Err(CoreError::syntactic("unexpected end of input")));
        self.pos += 1;
        item
    }

    fn expect_lparen(&mut self) -> Result<SourceLoc, CoreError> {
        let tok = self.advance()?;
        if tok.kind != TokenKind::LParen {
            return Err(CoreError::syntactic_at(
                format!("expected '(', found {}", tok.kind),
                tok.loc,
            ));
        }
        Ok(tok.loc)
    }

    fn expect_rparen(&mut self) -> Result<(), CoreError> {
        let tok = self.advance()?;
        if tok.kind != TokenKind::RParen {
            return Err(CoreError::syntactic_at(
                format!("expected ')', found {}", tok.kind),
                tok.loc,
            ));
        }
        Ok(())
    }

    fn expect_symbol(&mut self) -> Result<(String, SourceLoc), CoreError> {
        let tok = self.advance()?;
        if tok.kind != TokenKind::Symbol {
            return Err(CoreError::syntactic_at(
                format!("expected a symbol, found {}", tok.kind),
                tok.loc,
            ));
        }
        Ok((tok.source, tok.loc))
    }

    /// One top-level form: either an atom or a fully balanced `(...)`.
    /// A stray `)` here (depth 0) is always an error.
    fn parse_top_level(&mut self) -> Result<Ast, CoreError> {
        match self.peek() {
            Some(Err(_)) => {
                let err = self.advance().unwrap_err();
                Err(err)
            }
            Some(Ok(tok)) if tok.kind == TokenKind::RParen => Err(CoreError::syntactic_at(
                "unexpected ')' at top level",
                tok.loc,
            )),
            _ => self.parse_expr(),
        }
    }

    /// Dispatches on the next token to parse one expression (atom, quote
    /// sugar, or a parenthesised form).
    fn parse_expr(&mut self) -> Result<Ast, CoreError> {
        let tok = self.advance()?;
        match tok.kind {
            TokenKind::Number => {
                let n: f64 = tok.source.parse().map_err(|_| {
                    CoreError::syntactic_at(format!("invalid number: {}", tok.source), tok.loc)
                })?;
                Ok(Ast::Number(n, Some(tok.loc)))
            }
            TokenKind::String => Ok(Ast::String(tok.source, Some(tok.loc))),
            TokenKind::Boolean => Ok(Ast::Boolean(tok.source == "true", Some(tok.loc))),
            TokenKind::Symbol => Ok(Ast::Symbol(tok.source, Some(tok.loc))),
            TokenKind::Quote => {
                let inner = self.parse_expr()?;
                Ok(Ast::Quote(Box::new(inner), Some(tok.loc)))
            }
            TokenKind::RParen => Err(CoreError::syntactic_at(
                "unexpected ')' with no matching '('",
                tok.loc,
            )),
            TokenKind::LParen => self.parse_list(tok.loc),
        }
    }

    /// The opening `(` has already been consumed; `loc` is its position.
    /// Peeks at the head symbol (if any) to decide whether this is a
    /// special form or a plain call.
    fn parse_list(&mut self, loc: SourceLoc) -> Result<Ast, CoreError> {
        if matches!(self.peek(), Some(Ok(t)) if t.kind == TokenKind::RParen) {
            self.advance()?;
            return Ok(Ast::Call(Vec::new(), Some(loc)));
        }

        let head_is_symbol = matches!(self.peek(), Some(Ok(t)) if t.kind == TokenKind::Symbol);
        if head_is_symbol {
            let head_text = match self.peek() {
                Some(Ok(t)) => t.source.clone(),
                _ => unreachable!(),
            };
            match head_text.as_str() {
                "def" => return self.parse_def(loc),
                "defmacro" => return self.parse_defmacro(loc),
                "set!" => return self.parse_set(loc),
                "let" => return self.parse_let(loc),
                "cond" => return self.parse_cond(loc),
                "quote" => return self.parse_quote_form(loc),
                "fun" | "lambda" => return self.parse_lambda(loc),
                "try" => return self.parse_try(loc),
                "throw" => return self.parse_throw(loc),
                "begin" => return self.parse_begin(loc),
                _ => {}
            }
        }

        self.parse_call(loc)
    }

    fn parse_call(&mut self, loc: SourceLoc) -> Result<Ast, CoreError> {
        let mut elements = Vec::new();
        loop {
            match self.peek() {
                Some(Ok(t)) if t.kind == TokenKind::RParen => {
                    self.advance()?;
                    break;
                }
                None => {
                    return Err(CoreError::syntactic(
                        "unexpected end of input inside call, expected ')'",
                    ))
                }
                _ => elements.push(self.parse_expr()?),
            }
        }
        Ok(Ast::Call(elements, Some(loc)))
    }

    /// `(def name value)` or `(def name (params...) body...)`. When the
    /// token after `name` is a parenthesised group, a value def (e.g.
    /// `(def add5 (make-adder 5))`) and a function def (e.g.
    /// `(def square (x) (* x x))`) are lexically indistinguishable at
    /// that group's opening `(` alone: both start with `name (`. The
    /// disambiguator from spec §4.2 is what comes *after* the group's
    /// matching `)` — a function def still has a body to parse, a value
    /// def's group was the form's last element. `paren_group_is_value`
    /// looks that far ahead without consuming anything.
    fn parse_def(&mut self, loc: SourceLoc) -> Result<Ast, CoreError> {
        self.advance()?; // 'def'
        let (name, _) = self.expect_symbol()?;

        if matches!(self.peek(), Some(Ok(t)) if t.kind == TokenKind::LParen) && !self.paren_group_is_value()? {
            self.advance()?; // '('
            let params = self.parse_param_list()?;
            let body = self.parse_body_until_rparen("def")?;
            return Ok(Ast::Def {
                name,
                params,
                body,
                loc: Some(loc),
            });
        }

        let value = self.parse_expr()?;
        self.expect_rparen()
            .map_err(|_| CoreError::syntactic("def: expected exactly one value expression"))?;
        Ok(Ast::Def {
            name,
            params: Vec::new(),
            body: vec![value],
            loc: Some(loc),
        })
    }

    /// Looks ahead from the current position — which must be a `(` —
    /// to its matching `)`, without consuming any tokens, and reports
    /// whether that matching `)` is immediately followed by the
    /// enclosing `def` form's own closing `)`. If so, the group has
    /// nothing following it but the end of the form, so it must be the
    /// def's value expression rather than a parameter list (which would
    /// always be followed by at least one body expression).
    fn paren_group_is_value(&self) -> Result<bool, CoreError> {
        let mut depth = 0i32;
        let mut i = self.pos;
        loop {
            match self.tokens.get(i) {
                Some(Ok(t)) if t.kind == TokenKind::LParen => depth += 1,
                Some(Ok(t)) if t.kind == TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(matches!(
                            self.tokens.get(i + 1),
                            Some(Ok(next)) if next.kind == TokenKind::RParen
                        ));
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.clone()),
                None => return Ok(false),
            }
            i += 1;
        }
    }

    /// `(defmacro name (params...) body)` — exactly one body expression.
    fn parse_defmacro(&mut self, loc: SourceLoc) -> Result<Ast, CoreError> {
        self.advance()?; // 'defmacro'
        let (name, _) = self.expect_symbol()?;
        self.expect_lparen()
            .map_err(|_| CoreError::syntactic("defmacro: expected a parameter list"))?;
        let params = self.parse_param_list()?;
        let body = self.parse_expr()?;
        self.expect_rparen()
            .map_err(|_| CoreError::syntactic("defmacro: expected exactly one body expression"))?;
        Ok(Ast::DefMacro {
            name,
            params,
            body: Box::new(body),
            loc: Some(loc),
        })
    }

    /// `(set! name value)`.
    fn parse_set(&mut self, loc: SourceLoc) -> Result<Ast, CoreError> {
        self.advance()?; // 'set!'
        let (name, _) = self.expect_symbol()?;
        let value = self.parse_expr()?;
        self.expect_rparen()
            .map_err(|_| CoreError::syntactic("set!: expected exactly one value expression"))?;
        Ok(Ast::Set {
            name,
            value: Box::new(value),
            loc: Some(loc),
        })
    }

    /// `(let ((n1 v1) (n2 v2) ...) body...)` — `let*` semantics.
    fn parse_let(&mut self, loc: SourceLoc) -> Result<Ast, CoreError> {
        self.advance()?; // 'let'
        self.expect_lparen()
            .map_err(|_| CoreError::syntactic("let: expected a binding list"))?;

        let mut bindings = Vec::new();
        loop {
            match self.peek() {
                Some(Ok(t)) if t.kind == TokenKind::RParen => {
                    self.advance()?;
                    break;
                }
                None => {
                    return Err(CoreError::syntactic(
                        "let: unexpected end of input in binding list",
                    ))
                }
                _ => {
                    self.expect_lparen()
                        .map_err(|_| CoreError::syntactic("let: expected (name value) binding"))?;
                    let (name, _) = self.expect_symbol()?;
                    let value = self.parse_expr()?;
                    self.expect_rparen().map_err(|_| {
                        CoreError::syntactic("let: binding must be exactly (name value)")
                    })?;
                    bindings.push((name, value));
                }
            }
        }

        if bindings.is_empty() {
            return Err(CoreError::syntactic("let: at least one binding required"));
        }

        let body = self.parse_body_until_rparen("let")?;
        Ok(Ast::Let {
            bindings,
            body,
            loc: Some(loc),
        })
    }

    /// `(cond (test result)* (else result)?)`.
    fn parse_cond(&mut self, loc: SourceLoc) -> Result<Ast, CoreError> {
        self.advance()?; // 'cond'
        let mut clauses = Vec::new();
        let mut else_clause = None;

        loop {
            match self.peek() {
                Some(Ok(t)) if t.kind == TokenKind::RParen => {
                    self.advance()?;
                    break;
                }
                None => {
                    return Err(CoreError::syntactic(
                        "cond: unexpected end of input, expected ')'",
                    ))
                }
                _ => {
                    self.expect_lparen().map_err(|_| {
                        CoreError::syntactic("cond: expected a (test result) clause")
                    })?;

                    let is_else = matches!(self.peek(), Some(Ok(t)) if t.kind == TokenKind::Symbol && t.source == "else");
                    if is_else {
                        self.advance()?; // 'else'
                        let result = self.parse_expr()?;
                        self.expect_rparen().map_err(|_| {
                            CoreError::syntactic("cond: else clause must be (else result)")
                        })?;
                        else_clause = Some(Box::new(result));
                        self.expect_rparen().map_err(|_| {
                            CoreError::syntactic("cond: else must be the last clause")
                        })?;
                        break;
                    }

                    let test = self.parse_expr()?;
                    let result = self.parse_expr()?;
                    self.expect_rparen().map_err(|_| {
                        CoreError::syntactic("cond: clause must be exactly (test result)")
                    })?;
                    clauses.push((test, result));
                }
            }
        }

        Ok(Ast::Cond {
            clauses,
            else_clause,
            loc: Some(loc),
        })
    }

    /// `(quote expr)` — the explicit form; `'expr` is handled in
    /// `parse_expr` as sugar for the same node.
    fn parse_quote_form(&mut self, loc: SourceLoc) -> Result<Ast, CoreError> {
        self.advance()?; // 'quote'
        let expr = self.parse_expr()?;
        self.expect_rparen()
            .map_err(|_| CoreError::syntactic("quote: expected exactly one expression"))?;
        Ok(Ast::Quote(Box::new(expr), Some(loc)))
    }

    /// `(fun (params...) body...)` / `(lambda (params...) body...)`.
    fn parse_lambda(&mut self, loc: SourceLoc) -> Result<Ast, CoreError> {
        self.advance()?; // 'fun' | 'lambda'
        self.expect_lparen()
            .map_err(|_| CoreError::syntactic("fun: expected a parameter list"))?;
        let params = self.parse_param_list()?;
        let body = self.parse_body_until_rparen("fun")?;
        Ok(Ast::Lambda {
            params,
            body,
            loc: Some(loc),
        })
    }

    /// `(try body... (catch var body...))`.
    fn parse_try(&mut self, loc: SourceLoc) -> Result<Ast, CoreError> {
        self.advance()?; // 'try'
        let mut try_body = Vec::new();

        loop {
            let is_catch = matches!(self.peek(), Some(Ok(t)) if t.kind == TokenKind::LParen)
                && matches!(
                    self.tokens.get(self.pos + 1),
                    Some(Ok(t)) if t.kind == TokenKind::Symbol && t.source == "catch"
                );
            if is_catch {
                break;
            }
            match self.peek() {
                Some(Ok(t)) if t.kind == TokenKind::RParen => {
                    return Err(CoreError::syntactic(
                        "try: expected a (catch var body...) clause",
                    ))
                }
                None => return Err(CoreError::syntactic("try: unexpected end of input")),
                _ => try_body.push(self.parse_expr()?),
            }
        }

        if try_body.is_empty() {
            return Err(CoreError::syntactic(
                "try: expected at least one expression before catch",
            ));
        }

        self.expect_lparen()?;
        self.advance()?; // 'catch'
        let (catch_var, _) = self.expect_symbol()?;
        let catch_body = self.parse_body_until_rparen("catch")?;
        if catch_body.is_empty() {
            return Err(CoreError::syntactic(
                "catch: expected at least one body expression",
            ));
        }
        self.expect_rparen()
            .map_err(|_| CoreError::syntactic("try: expected ')' after catch clause"))?;

        Ok(Ast::Try {
            try_body,
            catch_var,
            catch_body,
            loc: Some(loc),
        })
    }

    /// `(throw expr)`.
    fn parse_throw(&mut self, loc: SourceLoc) -> Result<Ast, CoreError> {
        self.advance()?; // 'throw'
        let expr = self.parse_expr()?;
        self.expect_rparen()
            .map_err(|_| CoreError::syntactic("throw: expected exactly one expression"))?;
        Ok(Ast::Throw(Box::new(expr), Some(loc)))
    }

    /// `(begin expr...)`.
    fn parse_begin(&mut self, loc: SourceLoc) -> Result<Ast, CoreError> {
        self.advance()?; // 'begin'
        let body = self.parse_body_until_rparen("begin")?;
        Ok(Ast::Begin(body, Some(loc)))
    }

    /// A parameter list: the opening `(` has already been consumed by
    /// the caller; reads symbols up to and including the closing `)`.
    fn parse_param_list(&mut self) -> Result<Vec<String>, CoreError> {
        let mut params = Vec::new();
        loop {
            match self.peek() {
                Some(Ok(t)) if t.kind == TokenKind::RParen => {
                    self.advance()?;
                    break;
                }
                None => {
                    return Err(CoreError::syntactic(
                        "unexpected end of input in parameter list",
                    ))
                }
                _ => {
                    let (name, _) = self.expect_symbol().map_err(|_| {
                        CoreError::syntactic("parameter list must contain only symbols")
                    })?;
                    params.push(name);
                }
            }
        }
        Ok(params)
    }

    /// Reads zero or more body expressions up to (and consuming) the
    /// closing `)` of the enclosing form. `form_name` is only used to
    /// phrase the end-of-input error.
    fn parse_body_until_rparen(&mut self, form_name: &str) -> Result<Vec<Ast>, CoreError> {
        let mut body = Vec::new();
        loop {
            match self.peek() {
                Some(Ok(t)) if t.kind == TokenKind::RParen => {
                    self.advance()?;
                    break;
                }
                None => {
                    return Err(CoreError::syntactic(format!(
                        "{}: unexpected end of input, expected ')'",
                        form_name
                    )))
                }
                _ => body.push(self.parse_expr()?),
            }
        }
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tokenize;

    fn parse_str(src: &str) -> Ast {
        parse_one(tokenize(src)).expect("parse should succeed")
    }

    #[test]
    fn parses_plain_call() {
        let ast = parse_str("(+ 1 2)");
        match ast {
            Ast::Call(elems, _) => assert_eq!(elems.len(), 3),
            _ => panic!("expected Call"),
        }
    }

    #[test]
    fn parses_value_def() {
        let ast = parse_str("(def x 10)");
        match ast {
            Ast::Def {
                name, params, body, ..
            } => {
                assert_eq!(name, "x");
                assert!(params.is_empty());
                assert_eq!(body.len(), 1);
            }
            _ => panic!("expected Def"),
        }
    }

    #[test]
    fn parses_value_def_whose_value_is_a_call() {
        // `(def add5 (make-adder 5))` — a parenthesised value with no
        // trailing body must parse as a variable def, not a function def
        // with `make-adder` misread as a parameter name.
        let ast = parse_str("(def add5 (make-adder 5))");
        match ast {
            Ast::Def {
                name, params, body, ..
            } => {
                assert_eq!(name, "add5");
                assert!(params.is_empty());
                assert_eq!(body.len(), 1);
                match &body[0] {
                    Ast::Call(elems, _) => assert_eq!(elems.len(), 2),
                    other => panic!("expected Call value, got {:?}", other),
                }
            }
            _ => panic!("expected Def"),
        }
    }

    #[test]
    fn parses_function_def_with_zero_params() {
        let ast = parse_str("(def greet () (say \"hi\"))");
        match ast {
            Ast::Def { name, params, body, .. } => {
                assert_eq!(name, "greet");
                assert!(params.is_empty());
                assert_eq!(body.len(), 1);
            }
            _ => panic!("expected Def"),
        }
    }

    #[test]
    fn parses_function_def() {
        let ast = parse_str("(def square (x) (* x x))");
        match ast {
            Ast::Def { name, params, .. } => {
                assert_eq!(name, "square");
                assert_eq!(params, vec!["x".to_string()]);
            }
            _ => panic!("expected Def"),
        }
    }

    #[test]
    fn parses_let_as_let_star_shape() {
        let ast = parse_str("(let ((x 1) (y 2)) (+ x y))");
        match ast {
            Ast::Let { bindings, body, .. } => {
                assert_eq!(bindings.len(), 2);
                assert_eq!(body.len(), 1);
            }
            _ => panic!("expected Let"),
        }
    }

    #[test]
    fn parses_cond_with_else() {
        let ast = parse_str("(cond (false 1) (else 2))");
        match ast {
            Ast::Cond {
                clauses,
                else_clause,
                ..
            } => {
                assert_eq!(clauses.len(), 1);
                assert!(else_clause.is_some());
            }
            _ => panic!("expected Cond"),
        }
    }

    #[test]
    fn parses_try_catch() {
        let ast = parse_str("(try (throw \"boom\") (catch e e))");
        match ast {
            Ast::Try {
                try_body,
                catch_var,
                catch_body,
                ..
            } => {
                assert_eq!(try_body.len(), 1);
                assert_eq!(catch_var, "e");
                assert_eq!(catch_body.len(), 1);
            }
            _ => panic!("expected Try"),
        }
    }

    #[test]
    fn quote_sugar_and_explicit_form_match() {
        let sugar = parse_str("'(a b)").without_locations();
        let explicit = parse_str("(quote (a b))").without_locations();
        assert_eq!(sugar, explicit);
    }

    #[test]
    fn unexpected_rparen_at_top_level_is_error() {
        let result = parse_one(tokenize(")"));
        assert!(result.is_err());
    }

    #[test]
    fn unclosed_form_is_error() {
        let result = parse_one(tokenize("(+ 1 2"));
        assert!(result.is_err());
    }

    #[test]
    fn parse_all_recovers_after_a_bad_form() {
        let results = parse_all(tokenize(") (+ 1 2)"));
        assert_eq!(results.len(), 2);
        assert!(results[0].is_err());
        assert!(results[1].is_ok());
    }

    #[test]
    fn include_is_a_plain_call_not_a_special_form() {
        let ast = parse_str("(include \"foo.lisp\")");
        match ast {
            Ast::Call(elems, _) => {
                assert_eq!(elems.len(), 2);
                assert_eq!(elems[0], Ast::Symbol("include".into(), elems[0].loc()));
            }
            _ => panic!("expected Call"),
        }
    }
}
