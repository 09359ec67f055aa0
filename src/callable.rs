use std::fmt;

use chrono::Utc;
use log::debug;

use crate::error::RuntimeResult;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Anything a Lox call expression can invoke.
///
/// The interpreter validates `arguments.len() == arity()` before calling, so
/// implementations may bind positionally without re-checking.
pub trait Callable {
    fn arity(&self) -> usize;

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> RuntimeResult<Value>;
}

/// A builtin implemented in Rust.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> Value,
}

impl NativeFunction {
    /// `clock()`: seconds since the Unix epoch, with millisecond precision.
    pub fn clock() -> Self {
        NativeFunction {
            name: "clock",
            arity: 0,
            func: |_args: &[Value]| {
                let timestamp: f64 = Utc::now().timestamp_millis() as f64 / 1000.0;
                debug!("Native function 'clock' returned: {}", timestamp);
                Value::Number(timestamp)
            },
        }
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter, arguments: Vec<Value>) -> RuntimeResult<Value> {
        debug!("Calling native function '{}'", self.name);
        Ok((self.func)(&arguments))
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}
