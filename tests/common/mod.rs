#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::session::{RunError, Session};

/// Program output sink that the test keeps a handle on after the session
/// takes ownership of its clone.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.0.borrow())
            .lines()
            .map(str::to_owned)
            .collect()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn session() -> (Session, SharedBuffer) {
    let output = SharedBuffer::default();
    let session = Session::with_output(Box::new(output.clone()));
    (session, output)
}

/// Run `source` in a fresh session; returns printed lines and the outcome.
pub fn run(source: &str) -> (Vec<String>, Result<(), RunError>) {
    let (mut session, output) = session();
    let result = session.run(source);
    (output.lines(), result)
}

/// Run `source` and fail the test on any error.
pub fn run_ok(source: &str) -> Vec<String> {
    let (lines, result) = run(source);
    if let Err(e) = result {
        panic!("program failed:\n{}", e);
    }
    lines
}

/// Run `source` and return the rendered static diagnostics.
pub fn static_errors(source: &str) -> Vec<String> {
    match run(source).1 {
        Err(RunError::Static(errors)) => errors.iter().map(ToString::to_string).collect(),
        Err(e) => panic!("expected static errors, got runtime error:\n{}", e),
        Ok(()) => panic!("expected static errors, program ran"),
    }
}
