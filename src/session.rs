//! One long‑lived interpreter fed one input unit at a time.
//!
//! Each call to [`Session::run`] is a full scan → parse → resolve → interpret
//! cycle with its own [`Diagnostics`].  Global state (variables, functions,
//! classes) carries over between calls, which is what a REPL needs; error state
//! does not.

use std::fs;
use std::io::Write;
use std::path::Path;

use log::{debug, info};
use thiserror::Error;

use crate::error::{Diagnostics, LoxError, Result, RuntimeError};
use crate::expr::Expr;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stmt::Stmt;
use crate::token::Token;
use crate::value::Value;

/// Why an input unit did not run to completion.
#[derive(Debug, Error)]
pub enum RunError {
    /// Scan, parse or resolve errors; nothing was executed.
    #[error("{}", render_all(.0))]
    Static(Vec<LoxError>),

    /// Execution started and stopped at this error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl RunError {
    /// Conventional process exit code (sysexits `EX_DATAERR` / `EX_SOFTWARE`).
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Static(_) => 65,
            RunError::Runtime(_) => 70,
        }
    }
}

fn render_all(errors: &[LoxError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct Session {
    interpreter: Interpreter,
    next_id: u32,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A session printing program output to stdout.
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    /// A session printing program output to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        Self::with_interpreter(Interpreter::with_output(output))
    }

    fn with_interpreter(interpreter: Interpreter) -> Self {
        info!("Session started");
        Self {
            interpreter,
            next_id: 0,
        }
    }

    /// Run one program (a whole file or one REPL line).
    pub fn run(&mut self, source: &str) -> std::result::Result<(), RunError> {
        let mut diagnostics = Diagnostics::new();

        let statements: Vec<Stmt> = self.parse_program(source, &mut diagnostics);
        if diagnostics.had_error() {
            return Err(RunError::Static(diagnostics.into_errors()));
        }

        let bindings = Resolver::new(&mut diagnostics).resolve(&statements);
        if diagnostics.had_error() {
            return Err(RunError::Static(diagnostics.into_errors()));
        }

        self.interpreter.absorb(bindings);
        self.interpreter.interpret(&statements)?;

        Ok(())
    }

    /// Evaluate `source` as a single expression and return its value.
    pub fn evaluate(&mut self, source: &str) -> std::result::Result<Value, RunError> {
        let mut diagnostics = Diagnostics::new();

        let expr: Option<Expr> = self.parse_expression(source, &mut diagnostics);
        let expr = match expr {
            Some(expr) if !diagnostics.had_error() => expr,
            _ => return Err(RunError::Static(diagnostics.into_errors())),
        };

        let bindings = Resolver::new(&mut diagnostics).resolve_expression(&expr);
        if diagnostics.had_error() {
            return Err(RunError::Static(diagnostics.into_errors()));
        }

        self.interpreter.absorb(bindings);
        Ok(self.interpreter.evaluate(&expr)?)
    }

    /// Parse `source` as a single expression without running it.
    pub fn parse_expression(
        &mut self,
        source: &str,
        diagnostics: &mut Diagnostics,
    ) -> Option<Expr> {
        let mut parser = Parser::with_first_id(scan(source, diagnostics), self.next_id);
        let expr = parser.parse_expression();
        self.next_id = parser.next_id();

        match expr {
            Ok(expr) => Some(expr),
            Err(e) => {
                diagnostics.report(e);
                None
            }
        }
    }

    fn parse_program(&mut self, source: &str, diagnostics: &mut Diagnostics) -> Vec<Stmt> {
        let mut parser = Parser::with_first_id(scan(source, diagnostics), self.next_id);
        let statements = parser.parse(diagnostics);
        self.next_id = parser.next_id();
        statements
    }
}

/// Scan all of `source`, reporting lexical errors and keeping going.
pub fn scan(source: &str, diagnostics: &mut Diagnostics) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();

    for result in Scanner::new(source.as_bytes()) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => diagnostics.report(e),
        }
    }

    debug!("Scanned {} token(s)", tokens.len());

    tokens
}

/// Read a source file as UTF‑8 text.
pub fn read_source(path: &Path) -> Result<String> {
    info!("Reading file: {:?}", path);

    let bytes: Vec<u8> = fs::read(path)?;

    info!("Read {} bytes from {:?}", bytes.len(), path);

    Ok(String::from_utf8(bytes)?)
}
