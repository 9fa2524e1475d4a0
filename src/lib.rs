pub mod ast;
pub mod callable;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod natives;
pub mod parser;
pub mod scanner;
pub mod token;
pub mod value;

pub use crate::error::{Error, RuntimeError, SyntaxError};
pub use crate::interpreter::Interpreter;
pub use crate::parser::produce_ast;
pub use crate::value::Value;

/// Runs `source` in a fresh interpreter with the native functions registered.
pub fn run(source: &str) -> Result<Value, Error> {
    let mut interpreter = Interpreter::with_natives()?;
    interpreter.run(source)
}
