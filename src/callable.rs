use crate::ast::Statement;
use crate::environment::{Environment, ScopeId};
use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::Value;
use std::fmt;
use std::fmt::Debug;
use std::rc::Rc;
use tracing::trace;

/// A user function: its code plus the scope it was declared in.
#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub parameters: Vec<String>,
    pub body: Rc<[Statement]>,
    pub declaration_env: ScopeId,
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name)
    }
}

impl Function {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
    /// Runs the body in a fresh child of the declaration scope. The value of
    /// the last statement is the result.
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        if self.arity() != arguments.len() {
            return Err(RuntimeError::ArityMismatch {
                name: self.name.clone(),
                expected: self.arity(),
                found: arguments.len(),
            });
        }
        let scope = interpreter.environment.new_child(self.declaration_env)?;
        trace!(function = %self.name, ?scope, "calling function");

        let result = self.execute(interpreter, scope, arguments);
        interpreter.environment.release(scope);
        result
    }
    fn execute(
        &self,
        interpreter: &mut Interpreter,
        scope: ScopeId,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        for (param, arg) in self.parameters.iter().zip(arguments.into_iter()) {
            interpreter
                .environment
                .declare_var(scope, param, arg, false)?;
        }
        let mut result = Value::Null;
        for stmt in self.body.iter() {
            result = interpreter.evaluate_statement(stmt, scope)?;
        }
        Ok(result)
    }
}

pub type NativeFn = dyn Fn(&[Value], &Environment, ScopeId) -> Result<Value, RuntimeError>;

/// A callable implemented in Rust, invoked with the evaluated arguments and
/// the caller's scope.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    call: Rc<NativeFn>,
}

impl NativeFunction {
    pub fn new<F>(name: &str, call: F) -> NativeFunction
    where
        F: Fn(&[Value], &Environment, ScopeId) -> Result<Value, RuntimeError> + 'static,
    {
        NativeFunction {
            name: name.to_string(),
            call: Rc::new(call),
        }
    }
    pub fn call(
        &self,
        arguments: &[Value],
        environment: &Environment,
        scope: ScopeId,
    ) -> Result<Value, RuntimeError> {
        (self.call)(arguments, environment, scope)
    }
    pub fn equals(&self, other: &NativeFunction) -> bool {
        Rc::ptr_eq(&self.call, &other.call)
    }
}

impl Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}
