use crate::ast::BinaryOperator;
use crate::token::TokenType;
use thiserror::Error;

/// Lexical and structural failures. Parsing stops at the first one.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyntaxError {
    #[error("[line {line}] Lexer Error: Unrecognized character found in source '{character}'")]
    UnrecognizedCharacter { line: usize, character: char },

    #[error("[line {line}] Lexer Error: Unterminated string literal")]
    UnterminatedString { line: usize },

    #[error("[line {line}] Parse Error: {message}\n  Found: {found} '{lexeme}' - Expecting: {expected}")]
    UnexpectedToken {
        line: usize,
        message: String,
        expected: TokenType,
        found: TokenType,
        lexeme: String,
    },

    #[error("[line {line}] Parse Error: Unexpected token found during parsing: {found} '{lexeme}'")]
    ExpectedExpression {
        line: usize,
        found: TokenType,
        lexeme: String,
    },

    #[error("[line {line}] Parse Error: Unknown binary operator '{operator}'")]
    UnknownOperator { line: usize, operator: String },

    #[error("[line {line}] Parse Error: Invalid number literal '{lexeme}'")]
    InvalidNumber { line: usize, lexeme: String },

    #[error("[line {line}] Parse Error: Must assign value to constant expression '{name}'")]
    ConstantWithoutValue { line: usize, name: String },

    #[error("[line {line}] Parse Error: Inside function declaration of '{function}' expected parameters to be identifiers, found {parameter}")]
    InvalidParameter {
        line: usize,
        function: String,
        parameter: String,
    },

    #[error("[line {line}] Parse Error: Cannot use dot operator without an identifier on the right, found {property}")]
    InvalidProperty { line: usize, property: String },
}

/// Failures raised while walking the tree. Each one aborts the current evaluation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Cannot resolve '{name}' as it does not exist in this or parent scopes")]
    UndefinedVariable { name: String },

    #[error("Cannot declare variable '{name}' as it is already defined")]
    AlreadyDeclared { name: String },

    #[error("Cannot reassign to variable '{name}' as it was declared constant")]
    ConstantReassignment { name: String },

    #[error("Invalid left hand side inside assignment expression {target}")]
    InvalidAssignmentTarget { target: String },

    #[error("Cannot call a value that is not a function: {value}")]
    NotCallable { value: String },

    #[error("The function '{name}' needs {expected} arguments, but {found} were passed")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("DivisionByZeroError: rhs value is zero")]
    DivisionByZero,

    #[error("Cannot compare a value with null using '{operator}', use == or != only")]
    NullComparison { operator: BinaryOperator },

    #[error("This AST node has not yet been set up for interpretation: {kind}")]
    Unsupported { kind: &'static str },

    #[error("Native function '{name}' failed: {message}")]
    NativeFailure { name: String, message: String },

    #[error("Scope {index} (generation {generation}) is no longer alive")]
    ScopeReleased { index: usize, generation: u32 },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("{0}")]
    Syntax(#[from] SyntaxError),

    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}
