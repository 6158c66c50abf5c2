// ABOUTME: Error types raised by the lexer, parser, and evaluator

use thiserror::Error;

/// A lexer failure. Aborts lexing of the module it was raised for; any
/// sibling module already lexed is unaffected.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("lex error: in {module}: {message} at line {line} col {col}")]
pub struct LexError {
    pub module: String,
    pub line: usize,
    pub col: usize,
    pub message: String,
}

/// A parser failure: an ill-formed token sequence or a bad arity.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("parse error: in {module}: {message} at line {line} col {col}")]
pub struct ParseError {
    pub module: String,
    pub line: usize,
    pub col: usize,
    pub message: String,
}

/// The supertype diagnostics route through when they cannot be pinned to a
/// single token — unresolved imports, declaration-scan failures, and the
/// like. `Lex`/`Parse` already carry a concrete line/col; `Syntax` is the
/// catch-all for the rest.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("syntax error: in {module}: {message}")]
pub struct SyntaxError {
    pub module: String,
    pub message: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("file error: {path}: {message}")]
pub struct FileIOError {
    pub path: String,
    pub message: String,
}

/// Everything that can fail while evaluating an already-parsed AST:
/// calling an undeclared function, indexing an empty list, and so on.
/// Division by zero is not one of these — `__rem` by zero yields `Null`,
/// see DESIGN.md.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("runtime error: {function}: {message}")]
pub struct RuntimeError {
    pub function: String,
    pub message: String,
}

impl RuntimeError {
    pub fn new(function: impl Into<String>, message: impl Into<String>) -> Self {
        RuntimeError {
            function: function.into(),
            message: message.into(),
        }
    }
}

/// The single error type the core raises. One enum, the way the teacher's
/// `EvalError` is one enum — callers that want structured fields match on
/// the variant; callers that just want a message use `Display`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AttoError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    FileIO(#[from] FileIOError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lex_error_display_includes_position() {
        let err = LexError {
            module: "main".to_string(),
            line: 3,
            col: 7,
            message: "unexpected character '@'".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("line 3"));
        assert!(rendered.contains("col 7"));
    }

    #[test]
    fn atto_error_wraps_each_variant() {
        let e: AttoError = RuntimeError::new("__div", "division by zero").into();
        assert!(matches!(e, AttoError::Runtime(_)));
    }
}
