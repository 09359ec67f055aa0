use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};

use crate::callable::NativeFunction;
use crate::class::{Class, Instance, INITIALIZER};
use crate::environment::{Env, Environment};
use crate::error::{RuntimeError, RuntimeResult};
use crate::expr::{Expr, ExprId, ExprKind, LiteralValue};
use crate::function::Function;
use crate::resolver::Bindings;
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Deepest call nesting a program may reach before `StackOverflow`.
pub const MAX_CALL_DEPTH: usize = 2048;

/// Grow the native stack when less than this remains at a call boundary.
const RED_ZONE: usize = 128 * 1024;

/// Size of each stack segment added by `stacker`.
const STACK_GROWTH: usize = 1024 * 1024;

/// How a statement finished.  `Return` unwinds to the nearest enclosing call
/// and is never confused with a [`RuntimeError`].
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    globals: Env,
    environment: Env,
    locals: Bindings,
    output: Box<dyn Write>,
    call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an Interpreter printing to stdout, with `clock` defined.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an Interpreter whose `print` statements write to `output`.
    pub fn with_output(output: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: Env = Environment::new().shared();

        debug!("Defining native function 'clock'");

        globals
            .borrow_mut()
            .define("clock", Value::Native(Rc::new(NativeFunction::clock())));

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: Bindings::new(),
            output,
            call_depth: 0,
        }
    }

    /// Adds a resolver pass's side table.  Expression ids are unique per
    /// session, so earlier entries stay valid for functions declared by
    /// earlier inputs.
    pub fn absorb(&mut self, bindings: Bindings) {
        debug!("Absorbing {} resolved binding(s)", bindings.len());
        self.locals.merge(bindings);
    }

    /// Interprets a list of statements (a "program").  The first runtime
    /// error abandons the remaining statements and is returned.
    pub fn interpret(&mut self, statements: &[Stmt]) -> RuntimeResult<()> {
        debug!("Interpreting {} statements", statements.len());
        for stmt in statements {
            if let Flow::Return(_) = self.execute(stmt)? {
                // top-level `return` is rejected by the resolver
                break;
            }
        }
        info!("Interpretation completed successfully");
        Ok(())
    }

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> RuntimeResult<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, environment.shared())
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                debug!("Exited while loop");
                Ok(Flow::Normal)
            }

            Stmt::Function(declaration) => {
                debug!("Defining function '{}'", declaration.name.lexeme);
                // Capture the *current* frame as the closure.
                let function = Function::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );
                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                debug!("Declaring class '{}'", name.lexeme);

                // Methods may mention the class before it exists.
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Nil);

                let superclass: Option<Rc<Class>> = match superclass {
                    Some(expr) => match self.evaluate(expr)? {
                        Value::Class(class) => Some(class),
                        _ => {
                            let token = match &expr.kind {
                                ExprKind::Variable(token) => token,
                                _ => name,
                            };
                            return Err(RuntimeError::type_error(
                                token,
                                "Superclass must be a class.",
                            ));
                        }
                    },
                    None => None,
                };

                // Methods of a subclass close over a frame binding `super`.
                let method_closure: Env = match &superclass {
                    Some(class) => {
                        let mut environment =
                            Environment::with_enclosing(Rc::clone(&self.environment));
                        environment.define("super", Value::Class(Rc::clone(class)));
                        environment.shared()
                    }
                    None => Rc::clone(&self.environment),
                };

                let methods: HashMap<String, Rc<Function>> = methods
                    .iter()
                    .map(|declaration| {
                        let function = Function::new(
                            Rc::clone(declaration),
                            Rc::clone(&method_closure),
                            declaration.name.lexeme == INITIALIZER,
                        );
                        (declaration.name.lexeme.clone(), Rc::new(function))
                    })
                    .collect();

                let class = Class::new(name.lexeme.clone(), superclass, methods);
                self.environment
                    .borrow_mut()
                    .assign(name, Value::Class(Rc::new(class)))?;
                Ok(Flow::Normal)
            }
        }
    }

    /// Runs `statements` with `environment` as the current frame, restoring
    /// the previous frame on every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Env) -> RuntimeResult<Flow> {
        debug!("Entering block with {} statements", statements.len());

        let previous: Env = std::mem::replace(&mut self.environment, environment);
        let result = self.execute_statements(statements);
        self.environment = previous;

        result
    }

    fn execute_statements(&mut self, statements: &[Stmt]) -> RuntimeResult<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute(stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::from(s.as_str()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            ExprKind::Grouping(inner) => self.evaluate(inner),

            ExprKind::Unary { operator, right } => self.evaluate_unary(operator, right),

            ExprKind::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            ExprKind::Logical {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;
                let decided = match operator.token_type {
                    TokenType::OR => left_val.is_truthy(),
                    _ => !left_val.is_truthy(),
                };
                if decided {
                    return Ok(left_val);
                }
                self.evaluate(right)
            }

            ExprKind::Variable(name) => self.look_up_variable(name, expr.id),

            ExprKind::Assign { name, value } => {
                let value = self.evaluate(value)?;
                match self.locals.depth(expr.id) {
                    Some(depth) => {
                        Environment::assign_at(&self.environment, depth, &name.lexeme, value.clone())
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }
                Ok(value)
            }

            ExprKind::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(callee)?;
                let mut arg_values = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(arg)?);
                }
                self.invoke_callable(&callee_val, paren, arg_values)
            }

            ExprKind::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Instance::get(&instance, name),
                _ => Err(RuntimeError::type_error(
                    name,
                    "Only instances have properties.",
                )),
            },

            ExprKind::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RuntimeError::type_error(name, "Only instances have fields."));
                };
                let value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());
                Ok(value)
            }

            ExprKind::This(keyword) => self.look_up_variable(keyword, expr.id),

            ExprKind::Super { method, .. } => self.evaluate_super(expr.id, method),
        }
    }

    /// Evaluates a unary expression.
    fn evaluate_unary(&mut self, op: &Token, expr: &Expr) -> RuntimeResult<Value> {
        let right_val = self.evaluate(expr)?;
        match op.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::type_error(op, "Operand must be a number.")),
            },
            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),
            _ => unreachable!("parser produced unary operator '{}'", op.lexeme),
        }
    }

    /// Evaluates a binary expression.
    fn evaluate_binary(&mut self, left: &Expr, op: &Token, right: &Expr) -> RuntimeResult<Value> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        match op.token_type {
            TokenType::EQUAL_EQUAL => return Ok(Value::Bool(left_val == right_val)),
            TokenType::BANG_EQUAL => return Ok(Value::Bool(left_val != right_val)),
            TokenType::PLUS => {
                return match (left_val, right_val) {
                    (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                    (Value::String(a), Value::String(b)) => {
                        Ok(Value::from(format!("{}{}", a, b)))
                    }
                    _ => Err(RuntimeError::type_error(
                        op,
                        "Operands must be two numbers or two strings.",
                    )),
                };
            }
            _ => {}
        }

        let (Value::Number(a), Value::Number(b)) = (&left_val, &right_val) else {
            debug!("Non-numeric operands {} {} {}", left_val, op.lexeme, right_val);
            return Err(RuntimeError::type_error(op, "Operands must be numbers."));
        };

        let value = match op.token_type {
            TokenType::MINUS => Value::Number(a - b),
            TokenType::STAR => Value::Number(a * b),
            TokenType::SLASH => Value::Number(a / b),
            TokenType::LESS => Value::Bool(a < b),
            TokenType::LESS_EQUAL => Value::Bool(a <= b),
            TokenType::GREATER => Value::Bool(a > b),
            TokenType::GREATER_EQUAL => Value::Bool(a >= b),
            _ => unreachable!("parser produced binary operator '{}'", op.lexeme),
        };
        Ok(value)
    }

    /// Reads a variable or `this` through the side table.
    fn look_up_variable(&self, name: &Token, id: ExprId) -> RuntimeResult<Value> {
        match self.locals.depth(id) {
            Some(depth) => Ok(Environment::get_at(&self.environment, depth, &name.lexeme)),
            None => self.globals.borrow().get(name),
        }
    }

    /// `super.method`: the superclass sits `depth` frames up and the
    /// receiver's `this` frame directly below it.
    fn evaluate_super(&mut self, id: ExprId, method: &Token) -> RuntimeResult<Value> {
        let Some(depth) = self.locals.depth(id) else {
            panic!("'super' on line {} was never resolved", method.line);
        };

        let Value::Class(superclass) = Environment::get_at(&self.environment, depth, "super")
        else {
            panic!("'super' is not bound to a class");
        };
        let Value::Instance(instance) = Environment::get_at(&self.environment, depth - 1, "this")
        else {
            panic!("'this' is not bound to an instance");
        };

        match superclass.find_method(&method.lexeme) {
            Some(function) => Ok(Value::Function(Rc::new(function.bind(instance)))),
            None => Err(RuntimeError::undefined_property(method)),
        }
    }

    /// Invokes a callable (native function, user function or class).
    fn invoke_callable(
        &mut self,
        callee_val: &Value,
        paren_token: &Token,
        arg_values: Vec<Value>,
    ) -> RuntimeResult<Value> {
        let Some(callable) = callee_val.as_callable() else {
            debug!("Refusing to call {}", callee_val);
            return Err(RuntimeError::type_error(
                paren_token,
                "Can only call functions and classes.",
            ));
        };

        if arg_values.len() != callable.arity() {
            return Err(RuntimeError::Arity {
                expected: callable.arity(),
                actual: arg_values.len(),
                line: paren_token.line,
            });
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            debug!("Call depth limit {} reached", MAX_CALL_DEPTH);
            return Err(RuntimeError::StackOverflow {
                line: paren_token.line,
            });
        }

        // One Lox call nests several Rust frames; the native stack must
        // outlast MAX_CALL_DEPTH of them on any thread.
        self.call_depth += 1;
        let result = stacker::maybe_grow(RED_ZONE, STACK_GROWTH, || {
            callable.call(self, arg_values)
        });
        self.call_depth -= 1;

        let result = result?;
        debug!("{} returned: {}", callee_val, result);
        Ok(result)
    }
}
