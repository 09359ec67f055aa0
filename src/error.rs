//! Centralised error hierarchy for the **Rox interpreter**.
//!
//! Static problems (scanner, parser, resolver) become [`LoxError`] values and
//! are collected in a [`Diagnostics`] accumulator owned by a single run, so one
//! input can surface several independent mistakes.  Runtime failures are
//! [`RuntimeError`]s: the first one aborts the current program.
//!
//! The module **does not** print diagnostics itself.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.  `location` is `" at end"` or `" at 'x'"`.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        location: String,
    },

    /// Static‑analysis or resolution failure (e.g. early‑binding errors).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: token.location(),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            location: token.location(),
        }
    }
}

/// Failure raised while evaluating a program.  Rendered as
/// `<message>\n[line N]`.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// An operand or callee had the wrong kind of value.
    #[error("{message}\n[line {line}]")]
    Type { message: String, line: usize },

    #[error("Expected {expected} arguments but got {actual}.\n[line {line}]")]
    Arity {
        expected: usize,
        actual: usize,
        line: usize,
    },

    #[error("Undefined variable '{name}'.\n[line {line}]")]
    UndefinedVariable { name: String, line: usize },

    #[error("Undefined property '{name}'.\n[line {line}]")]
    UndefinedProperty { name: String, line: usize },

    /// Calls nested deeper than the interpreter allows.
    #[error("Stack overflow.\n[line {line}]")]
    StackOverflow { line: usize },

    /// The `print` sink refused a write.
    #[error("Failed to write program output: {0}")]
    Output(#[from] io::Error),
}

impl RuntimeError {
    pub fn type_error<S: Into<String>>(token: &Token, msg: S) -> Self {
        RuntimeError::Type {
            message: msg.into(),
            line: token.line,
        }
    }

    pub fn undefined_variable(token: &Token) -> Self {
        RuntimeError::UndefinedVariable {
            name: token.lexeme.clone(),
            line: token.line,
        }
    }

    pub fn undefined_property(token: &Token) -> Self {
        RuntimeError::UndefinedProperty {
            name: token.lexeme.clone(),
            line: token.line,
        }
    }
}

/// Static errors collected during one scan/parse/resolve cycle.  A fresh
/// accumulator is created for every input unit, so an error on one REPL line
/// never suppresses the next.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<LoxError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, error: LoxError) {
        info!("Diagnostic reported: {}", error);

        self.errors.push(error);
    }

    /// Sticky flag: once anything is reported, execution is suppressed.
    pub fn had_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[LoxError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<LoxError> {
        self.errors
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Result alias for evaluation.
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;
