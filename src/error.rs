//! Unified in-band error type for every pipeline stage.
//!
//! Every stage of the pipeline — tokenizer, parser, macro expander,
//! interpreter, process runtime — produces the same `CoreError` type so
//! that downstream stages can pass an error through untouched without
//! knowing which stage raised it. Errors are values flowing in the same
//! sequence as tokens/AST nodes/results, not exceptions.

use std::fmt;
use thiserror::Error;

/// Which pipeline stage raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Tokenizer,
    Parser,
    MacroExpander,
    Interpreter,
    Process,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Tokenizer => "Tokenizer",
            Stage::Parser => "Parser",
            Stage::MacroExpander => "MacroExpander",
            Stage::Interpreter => "Interpreter",
            Stage::Process => "Process",
        };
        write!(f, "{}", name)
    }
}

/// A 1-based line/column pair attached to tokens, AST nodes, and errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLoc {
    pub line: usize,
    pub column: usize,
}

impl SourceLoc {
    pub fn new(line: usize, column: usize) -> Self {
        SourceLoc { line, column }
    }
}

impl fmt::Display for SourceLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// An error flowing in-band through the pipeline, tagged with the stage
/// that raised it and an optional source location.
#[derive(Debug, Clone, Error)]
#[error("{stage}: {message}")]
pub struct CoreError {
    pub stage: Stage,
    pub message: String,
    pub location: Option<SourceLoc>,
}

impl CoreError {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        CoreError {
            stage,
            message: message.into(),
            location: None,
        }
    }

    pub fn with_loc(stage: Stage, message: impl Into<String>, location: SourceLoc) -> Self {
        CoreError {
            stage,
            message: message.into(),
            location: Some(location),
        }
    }

    pub fn lexical(message: impl Into<String>, location: SourceLoc) -> Self {
        CoreError::with_loc(Stage::Tokenizer, message, location)
    }

    pub fn syntactic(message: impl Into<String>) -> Self {
        CoreError::new(Stage::Parser, message)
    }

    pub fn syntactic_at(message: impl Into<String>, location: SourceLoc) -> Self {
        CoreError::with_loc(Stage::Parser, message, location)
    }

    pub fn expansion(message: impl Into<String>) -> Self {
        CoreError::new(Stage::MacroExpander, message)
    }

    pub fn semantic(message: impl Into<String>) -> Self {
        CoreError::new(Stage::Interpreter, message)
    }

    pub fn semantic_at(message: impl Into<String>, location: SourceLoc) -> Self {
        CoreError::with_loc(Stage::Interpreter, message, location)
    }

    pub fn process(message: impl Into<String>) -> Self {
        CoreError::new(Stage::Process, message)
    }

    pub fn undefined_symbol(name: &str, location: Option<SourceLoc>) -> Self {
        let message = format!("undefined symbol: {}", name);
        match location {
            Some(loc) => CoreError::with_loc(Stage::Interpreter, message, loc),
            None => CoreError::new(Stage::Interpreter, message),
        }
    }

    pub fn undefined_field(field: &str) -> Self {
        CoreError::semantic(format!("undefined field: {}", field))
    }

    pub fn not_callable(description: &str) -> Self {
        CoreError::semantic(format!("not callable: {}", description))
    }

    pub fn arity(function: &str, expected: &str, actual: usize) -> Self {
        CoreError::semantic(format!(
            "{}: expected {} argument(s), got {}",
            function, expected, actual
        ))
    }

    pub fn arity_error(function: &str, expected: impl Into<String>, actual: usize) -> Self {
        CoreError::arity(function, &expected.into(), actual)
    }

    pub fn type_error(function: &str, expected: &str, actual: &str, position: usize) -> Self {
        CoreError::semantic(format!(
            "{}: argument {} expected {}, got {}",
            function, position, expected, actual
        ))
    }

    pub fn runtime_error(function: &str, message: impl Into<String>) -> Self {
        CoreError::semantic(format!("{}: {}", function, message.into()))
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CoreError::new(
            Stage::Interpreter,
            format!("internal error: {}", message.into()),
        )
    }
}

pub const ARITY_ONE: &str = "1";
pub const ARITY_TWO: &str = "2";
pub const ARITY_THREE: &str = "3";
pub const ARITY_ZERO_OR_ONE: &str = "0 or 1";
pub const ARITY_ONE_OR_TWO: &str = "1 or 2";
pub const ARITY_TWO_OR_THREE: &str = "2 or 3";
pub const ARITY_AT_LEAST_ONE: &str = "at least 1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_stage_and_message() {
        let err = CoreError::new(Stage::Parser, "unbalanced parens");
        let text = format!("{}", err);
        assert!(text.contains("Parser"));
        assert!(text.contains("unbalanced parens"));
    }

    #[test]
    fn undefined_symbol_carries_location_when_given() {
        let loc = SourceLoc::new(3, 7);
        let err = CoreError::undefined_symbol("foo", Some(loc));
        assert_eq!(err.location, Some(loc));
        assert_eq!(err.stage, Stage::Interpreter);
    }

    #[test]
    fn undefined_symbol_without_location() {
        let err = CoreError::undefined_symbol("foo", None);
        assert!(err.location.is_none());
    }
}
