//! Syntax highlighter for the REPL: implements rustyline's `Highlighter`
//! trait to color special forms, builtins, strings, numbers, and
//! comments while leaving display width untouched.

use rustyline::completion::Completer;
use rustyline::highlight::{CmdKind, Highlighter};
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper;
use std::borrow::Cow;
use std::collections::HashSet;

const COLOR_RESET: &str = "\x1b[0m";
const COLOR_PARENS: &str = "\x1b[1;34m";
const COLOR_SPECIAL_FORM: &str = "\x1b[1;35m";
const COLOR_BUILTIN: &str = "\x1b[36m";
const COLOR_NUMBER: &str = "\x1b[33m";
const COLOR_STRING: &str = "\x1b[32m";
const COLOR_BOOLEAN: &str = "\x1b[33m";
const COLOR_COMMENT: &str = "\x1b[90m";
const COLOR_QUOTE: &str = "\x1b[1;33m";

pub struct LispHelper;

impl LispHelper {
    pub fn new() -> Self {
        LispHelper
    }
}

impl Default for LispHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl Helper for LispHelper {}

impl Completer for LispHelper {
    type Candidate = String;
}

impl Hinter for LispHelper {
    type Hint = String;
}

impl Validator for LispHelper {}

impl Highlighter for LispHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let special_forms = special_forms();
        let builtins = builtins();

        let highlighted = highlight_line(line, &special_forms, &builtins);

        if highlighted == line {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(highlighted)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _kind: CmdKind) -> bool {
        true
    }
}

fn highlight_line(line: &str, special_forms: &HashSet<&'static str>, builtins: &HashSet<&'static str>) -> String {
    let mut result = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            ';' => {
                result.push_str(COLOR_COMMENT);
                while i < chars.len() && chars[i] != '\n' {
                    result.push(chars[i]);
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            '"' => {
                result.push_str(COLOR_STRING);
                result.push('"');
                i += 1;

                let mut found_close = false;
                while i < chars.len() {
                    if chars[i] == '\\' && i + 1 < chars.len() {
                        result.push(chars[i]);
                        result.push(chars[i + 1]);
                        i += 2;
                    } else if chars[i] == '"' {
                        result.push('"');
                        i += 1;
                        found_close = true;
                        break;
                    } else {
                        result.push(chars[i]);
                        i += 1;
                    }
                }

                result.push_str(COLOR_RESET);
                if !found_close {
                    while i < chars.len() && chars[i] != '\n' {
                        result.push(chars[i]);
                        i += 1;
                    }
                }
            }

            '0'..='9' => {
                let start = i;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if i < chars.len() && chars[i] == '.' && i + 1 < chars.len() && chars[i + 1].is_ascii_digit() {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let num_str: String = chars[start..i].iter().collect();
                result.push_str(COLOR_NUMBER);
                result.push_str(&num_str);
                result.push_str(COLOR_RESET);
            }

            '-' if i + 1 < chars.len() && chars[i + 1].is_ascii_digit() => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                if i < chars.len() && chars[i] == '.' && i + 1 < chars.len() && chars[i + 1].is_ascii_digit() {
                    i += 1;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let num_str: String = chars[start..i].iter().collect();
                result.push_str(COLOR_NUMBER);
                result.push_str(&num_str);
                result.push_str(COLOR_RESET);
            }

            '\'' | '`' | ',' => {
                result.push_str(COLOR_QUOTE);
                result.push(chars[i]);
                i += 1;
                if chars[i - 1] == ',' && i < chars.len() && chars[i] == '@' {
                    result.push('@');
                    i += 1;
                }
                result.push_str(COLOR_RESET);
            }

            '(' | ')' | '[' | ']' | '{' | '}' => {
                result.push_str(COLOR_PARENS);
                result.push(chars[i]);
                i += 1;
                result.push_str(COLOR_RESET);
            }

            ' ' | '\t' | '\n' | '\r' => {
                result.push(chars[i]);
                i += 1;
            }

            _ => {
                let start = i;
                while i < chars.len() && !is_delimiter(chars[i]) {
                    i += 1;
                }

                let symbol: String = chars[start..i].iter().collect();

                if symbol == "true" || symbol == "false" {
                    result.push_str(COLOR_BOOLEAN);
                    result.push_str(&symbol);
                    result.push_str(COLOR_RESET);
                } else if special_forms.contains(symbol.as_str()) {
                    result.push_str(COLOR_SPECIAL_FORM);
                    result.push_str(&symbol);
                    result.push_str(COLOR_RESET);
                } else if builtins.contains(symbol.as_str()) {
                    result.push_str(COLOR_BUILTIN);
                    result.push_str(&symbol);
                    result.push_str(COLOR_RESET);
                } else {
                    result.push_str(&symbol);
                }
            }
        }
    }

    result
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '"' | ';' | '\'' | '`' | ',')
}

/// Keywords recognised structurally by the parser (spec §4.2), never
/// looked up as ordinary symbols.
fn special_forms() -> HashSet<&'static str> {
    [
        "def", "defmacro", "set!", "let", "cond", "quote", "quasiquote", "unquote",
        "unquote-splicing", "fun", "lambda", "try", "catch", "throw", "begin", "include",
        "spawn", "spawn-link",
    ]
    .iter()
    .copied()
    .collect()
}

/// Every function name registered by `crate::builtins::build_builtins`.
fn builtins() -> HashSet<&'static str> {
    [
        "+", "-", "*", "/", "mod",
        "==", "!=", "<", ">", "<=", ">=",
        "and", "or", "not",
        "list", "head", "tail", "cons", "empty?",
        "make-map", "map-get", "map-set!", "map-has?", "map-delete!", "map-keys", "map-values",
        "map-size",
        "number?", "string?", "list?", "nil?", "symbol?", "bool?", "map?", "function?", "error?",
        "type/of",
        "print", "say", "log/info", "log/warn", "log/error", "log/debug",
        "json/parse", "json/stringify",
        "read-file", "write-file", "file-exists?",
        "env/get", "env/set!",
        "send", "recv", "self", "is-alive?", "kill", "processes",
        "help",
    ]
    .iter()
    .copied()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_colored() {
        let highlighted = highlight_line("42", &special_forms(), &builtins());
        assert!(highlighted.contains(COLOR_NUMBER));
    }

    #[test]
    fn strings_are_colored() {
        let highlighted = highlight_line("\"hello\"", &special_forms(), &builtins());
        assert!(highlighted.contains(COLOR_STRING));
    }

    #[test]
    fn comments_are_colored() {
        let highlighted = highlight_line("; a comment", &special_forms(), &builtins());
        assert!(highlighted.contains(COLOR_COMMENT));
    }

    #[test]
    fn special_forms_are_colored() {
        let highlighted = highlight_line("(def x 5)", &special_forms(), &builtins());
        assert!(highlighted.contains(COLOR_SPECIAL_FORM));
        assert!(highlighted.contains(COLOR_PARENS));
    }

    #[test]
    fn builtins_are_colored() {
        let highlighted = highlight_line("(+ 1 2)", &special_forms(), &builtins());
        assert!(highlighted.contains(COLOR_BUILTIN));
    }

    #[test]
    fn booleans_are_colored() {
        let highlighted = highlight_line("true false", &special_forms(), &builtins());
        assert!(highlighted.contains(COLOR_BOOLEAN));
    }

    #[test]
    fn quote_markers_are_colored() {
        let highlighted = highlight_line("'(1 2 3)", &special_forms(), &builtins());
        assert!(highlighted.contains(COLOR_QUOTE));
    }
}
