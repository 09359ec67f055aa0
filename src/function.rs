use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::callable::Callable;
use crate::class::Instance;
use crate::environment::{Env, Environment};
use crate::error::RuntimeResult;
use crate::interpreter::{Flow, Interpreter};
use crate::stmt::FunctionDecl;
use crate::value::Value;

/// A user-defined function or method together with the frame it closes over.
pub struct Function {
    declaration: Rc<FunctionDecl>,
    closure: Env,
    is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Env, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// A copy of this method whose closure gains one frame binding `this` to
    /// `instance`.  The receiver stays fixed however the result is later
    /// called.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Function {
        debug!("Binding method '{}' to an instance", self.name());

        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", Value::Instance(instance));

        Function {
            declaration: Rc::clone(&self.declaration),
            closure: environment.shared(),
            is_initializer: self.is_initializer,
        }
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> RuntimeResult<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        // The new frame hangs off the closure, not the caller's frame.
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let flow = interpreter.execute_block(&self.declaration.body, environment.shared())?;

        if self.is_initializer {
            return Ok(Environment::get_at(&self.closure, 0, "this"));
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}
