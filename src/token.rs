//! The tokenizer: source-text chunks in, a lazy sequence of `Token | CoreError`
//! out. Each chunk is scanned independently — tokens never straddle chunk
//! boundaries, since the REPL buffers a complete balanced form before
//! submitting it (see `main.rs`).
//!
//! Lexeme recognition (numbers, escaped strings, symbols) is done with
//! `nom` combinators, matching how this dialect's own `parser.rs` builds
//! its lexeme recognizers; the outer scan loop stays a plain byte walk so
//! it can track `line`/`column`/`sequence_id` per token, which a pure
//! `nom` grammar over the whole chunk has no place to carry.

use crate::error::{CoreError, SourceLoc};
use nom::{
    bytes::complete::{escaped, take_while, take_while1},
    character::complete::{char, none_of, one_of, satisfy},
    combinator::{opt, recognize},
    IResult, Parser,
};
use std::fmt;

/// Monotonically increasing id assigned within a single tokenizer run,
/// strictly increasing for every token it produces.
pub type SequenceId = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LParen,
    RParen,
    Quote,
    Number,
    String,
    Boolean,
    Symbol,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::LParen => "LPAREN",
            TokenKind::RParen => "RPAREN",
            TokenKind::Quote => "QUOTE",
            TokenKind::Number => "NUMBER",
            TokenKind::String => "STRING",
            TokenKind::Boolean => "BOOLEAN",
            TokenKind::Symbol => "SYMBOL",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text as written. Strings carry their unquoted, unescaped
    /// content; numbers and booleans keep their source text until the
    /// parser converts them.
    pub source: String,
    pub sequence_id: SequenceId,
    pub loc: SourceLoc,
}

impl Token {
    fn new(kind: TokenKind, source: impl Into<String>, sequence_id: SequenceId, loc: SourceLoc) -> Self {
        Token {
            kind,
            source: source.into(),
            sequence_id,
            loc,
        }
    }
}

fn is_symbol_start(c: char) -> bool {
    c.is_ascii_alphabetic() || "+-*/?!<>=:._".contains(c)
}

fn is_symbol_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || "+-*/?!<>=:._".contains(c)
}

/// `-?digit(_|digit)*(.((_|digit)*))?` — optional leading `-`, a run of
/// digits and underscores, then an optional fractional part of the same
/// shape.
fn number_lexeme(input: &str) -> IResult<&str, &str> {
    recognize((
        opt(char('-')),
        take_while1(|c: char| c.is_ascii_digit() || c == '_'),
        opt((char('.'), take_while(|c: char| c.is_ascii_digit() || c == '_'))),
    ))
    .parse(input)
}

/// `[A-Za-z_+\-*/?!<>=:.][A-Za-z0-9_+\-*/?!<>=:.]*` — one lead char from
/// the symbol-start class, then zero or more from the continue class.
/// Covers namespaced symbols like `math/pi`... no: `/` isn't in the
/// continue class, matching spec's example of `math/pi` as one token via
/// the `.`/`:`-bearing continue class, not literal `/`-splitting.
fn symbol_lexeme(input: &str) -> IResult<&str, &str> {
    recognize((satisfy(is_symbol_start), take_while(is_symbol_continue))).parse(input)
}

/// A double-quoted string body, content still carrying its backslash
/// escapes; the closing `"` has already been stripped by the caller's
/// empty-string fast path or the trailing `char('"')` here.
fn string_lexeme(input: &str) -> IResult<&str, String> {
    let (input, _) = char('"').parse(input)?;
    if let Ok((rest, _)) = char::<_, nom::error::Error<&str>>('"').parse(input) {
        return Ok((rest, String::new()));
    }
    let (input, raw) = escaped(none_of("\"\\"), '\\', one_of("\"\\nrt")).parse(input)?;
    let (input, _) = char('"').parse(input)?;
    Ok((input, unescape(raw)))
}

/// Resolves the backslash escapes `nom::escaped` left untouched in the
/// raw matched body: `\n \t \r \" \\`; anything else is kept literal.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// An unrecognised run: anything that isn't whitespace, a paren, or a
/// comment starter, consumed whole so the caller can report it as one
/// lexical error instead of one error per byte.
fn unrecognised_lexeme(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && c != '(' && c != ')' && c != ';').parse(input)
}

fn advance_loc(line: &mut usize, column: &mut usize, consumed: &str) {
    for ch in consumed.chars() {
        if ch == '\n' {
            *line += 1;
            *column = 1;
        } else {
            *column += 1;
        }
    }
}

/// Tokenize a single chunk of source text, returning every token (and
/// lexer error) found, in order, each carrying a strictly increasing
/// `sequence_id` and a line/column monotone within this chunk.
pub fn tokenize(chunk: &str) -> Vec<Result<Token, CoreError>> {
    let mut out = Vec::new();
    let mut rest = chunk;
    let mut line = 1usize;
    let mut column = 1usize;
    let mut seq: SequenceId = 0;

    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            let ch_len = c.len_utf8();
            advance_loc(&mut line, &mut column, &rest[..ch_len]);
            rest = &rest[ch_len..];
            continue;
        }

        if c == ';' {
            let (remaining, consumed): (&str, &str) =
                take_while::<_, _, nom::error::Error<&str>>(|ch: char| ch != '\n')
                    .parse(rest)
                    .expect("take_while never fails");
            advance_loc(&mut line, &mut column, consumed);
            rest = remaining;
            continue;
        }

        let start_loc = SourceLoc::new(line, column);

        if c == '(' {
            out.push(Ok(Token::new(TokenKind::LParen, "(", seq, start_loc)));
            seq += 1;
            advance_loc(&mut line, &mut column, &rest[..1]);
            rest = &rest[1..];
            continue;
        }
        if c == ')' {
            out.push(Ok(Token::new(TokenKind::RParen, ")", seq, start_loc)));
            seq += 1;
            advance_loc(&mut line, &mut column, &rest[..1]);
            rest = &rest[1..];
            continue;
        }
        if c == '\'' {
            out.push(Ok(Token::new(TokenKind::Quote, "'", seq, start_loc)));
            seq += 1;
            advance_loc(&mut line, &mut column, &rest[..1]);
            rest = &rest[1..];
            continue;
        }

        if c == '"' {
            match string_lexeme(rest) {
                Ok((remaining, content)) => {
                    let consumed = &rest[..rest.len() - remaining.len()];
                    advance_loc(&mut line, &mut column, consumed);
                    rest = remaining;
                    out.push(Ok(Token::new(TokenKind::String, content, seq, start_loc)));
                    seq += 1;
                }
                Err(_) => {
                    out.push(Err(CoreError::lexical("unclosed string literal", start_loc)));
                    advance_loc(&mut line, &mut column, rest);
                    rest = "";
                }
            }
            continue;
        }

        let next = rest[c.len_utf8()..].chars().next();
        if c.is_ascii_digit() || (c == '-' && matches!(next, Some(d) if d.is_ascii_digit())) {
            let (remaining, matched) = number_lexeme(rest).expect("guarded by the digit check above");
            let consumed = &rest[..rest.len() - remaining.len()];
            advance_loc(&mut line, &mut column, consumed);
            rest = remaining;
            let text: String = matched.chars().filter(|&ch| ch != '_').collect();
            out.push(Ok(Token::new(TokenKind::Number, text, seq, start_loc)));
            seq += 1;
            continue;
        }

        if is_symbol_start(c) {
            let (remaining, matched) = symbol_lexeme(rest).expect("guarded by is_symbol_start above");
            let consumed = &rest[..rest.len() - remaining.len()];
            advance_loc(&mut line, &mut column, consumed);
            rest = remaining;
            let kind = match matched {
                "true" | "false" => TokenKind::Boolean,
                _ => TokenKind::Symbol,
            };
            out.push(Ok(Token::new(kind, matched, seq, start_loc)));
            seq += 1;
            continue;
        }

        match unrecognised_lexeme(rest) {
            Ok((remaining, matched)) => {
                out.push(Err(CoreError::lexical(
                    format!("unrecognised token: '{}'", matched),
                    start_loc,
                )));
                advance_loc(&mut line, &mut column, matched);
                rest = remaining;
            }
            Err(_) => {
                // Defensive: shouldn't happen given the branches above,
                // but never spin forever on an unrecognised byte.
                let ch_len = c.len_utf8();
                advance_loc(&mut line, &mut column, &rest[..ch_len]);
                rest = &rest[ch_len..];
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_tokens(src: &str) -> Vec<Token> {
        tokenize(src).into_iter().map(|t| t.unwrap()).collect()
    }

    #[test]
    fn sequence_ids_strictly_increase() {
        let tokens = ok_tokens("(+ 1 2)");
        for w in tokens.windows(2) {
            assert!(w[1].sequence_id > w[0].sequence_id);
        }
    }

    #[test]
    fn tokenizes_parens_and_atoms() {
        let tokens = ok_tokens("(+ 1 2)");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::LParen,
                TokenKind::Symbol,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn strings_carry_unescaped_content() {
        let tokens = ok_tokens(r#""hello\nworld""#);
        assert_eq!(tokens[0].source, "hello\nworld");
    }

    #[test]
    fn empty_string_literal() {
        let tokens = ok_tokens(r#""""#);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].source, "");
    }

    #[test]
    fn unclosed_string_is_lexical_error() {
        let results = tokenize(r#""unterminated"#);
        assert!(results[0].is_err());
    }

    #[test]
    fn comments_are_stripped() {
        let tokens = ok_tokens("; a comment\n42");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Number);
    }

    #[test]
    fn booleans_recognised() {
        let tokens = ok_tokens("true false");
        assert_eq!(tokens[0].kind, TokenKind::Boolean);
        assert_eq!(tokens[1].kind, TokenKind::Boolean);
    }

    #[test]
    fn namespaced_symbol_is_one_token() {
        let tokens = ok_tokens("math/pi");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Symbol);
        assert_eq!(tokens[0].source, "math/pi");
    }

    #[test]
    fn underscored_number_strips_underscores() {
        let tokens = ok_tokens("1_000_000");
        assert_eq!(tokens[0].source, "1000000");
    }

    #[test]
    fn quote_sugar_emits_quote_token() {
        let tokens = ok_tokens("'x");
        assert_eq!(tokens[0].kind, TokenKind::Quote);
        assert_eq!(tokens[1].kind, TokenKind::Symbol);
    }

    #[test]
    fn line_and_column_track_newlines() {
        let tokens = ok_tokens("(+\n1\n2)");
        assert_eq!(tokens[0].loc, SourceLoc::new(1, 1));
        let one = tokens.iter().find(|t| t.source == "1").unwrap();
        assert_eq!(one.loc, SourceLoc::new(2, 1));
    }

    #[test]
    fn unrecognised_run_is_lexical_error() {
        let results = tokenize("@@@");
        assert!(results[0].is_err());
    }
}
