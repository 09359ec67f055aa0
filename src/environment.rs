use crate::error::{RuntimeError, RuntimeResult};
use crate::token::Token;
use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a frame.  Closures and child frames keep their parent
/// alive through it.
pub type Env = Rc<RefCell<Environment>>;

/// One frame of name → value bindings plus a link to the enclosing frame.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Env>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Env) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap the frame in its shared handle.
    pub fn shared(self) -> Env {
        Rc::new(RefCell::new(self))
    }

    /// Insert or overwrite `name` in this frame.  Redeclaration is legal here;
    /// the resolver enforces the stricter rule for local scopes.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> RuntimeResult<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            debug!("Lookup of '{}' fell off the global frame", name.lexeme);
            Err(RuntimeError::undefined_variable(name))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> RuntimeResult<()> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            debug!("Assignment to undeclared '{}'", name.lexeme);
            Err(RuntimeError::undefined_variable(name))
        }
    }

    /// Read `name` exactly `depth` frames up from `env`.
    ///
    /// # Panics
    ///
    /// When the chain is shorter than `depth` or the frame lacks `name`; both
    /// mean the resolver and the interpreter disagree about scope shape.
    pub fn get_at(env: &Env, depth: usize, name: &str) -> Value {
        let frame = Self::ancestor(env, depth);
        let value = frame.borrow().values.get(name).cloned();

        match value {
            Some(value) => value,
            None => panic!("resolved binding '{}' missing at depth {}", name, depth),
        }
    }

    /// Overwrite `name` exactly `depth` frames up from `env`.
    ///
    /// # Panics
    ///
    /// Same contract as [`Environment::get_at`].
    pub fn assign_at(env: &Env, depth: usize, name: &str, value: Value) {
        let frame = Self::ancestor(env, depth);
        let mut frame = frame.borrow_mut();

        match frame.values.get_mut(name) {
            Some(slot) => *slot = value,
            None => panic!("resolved binding '{}' missing at depth {}", name, depth),
        }
    }

    fn ancestor(env: &Env, depth: usize) -> Env {
        let mut frame: Env = Rc::clone(env);

        for hop in 0..depth {
            let parent = match &frame.borrow().enclosing {
                Some(parent) => Rc::clone(parent),
                None => panic!("scope chain ended after {} of {} hops", hop, depth),
            };
            frame = parent;
        }

        frame
    }
}
