use crate::ast::{AstPrinter, BinaryOperator, Expression, Program, Property, Statement};
use crate::callable::Function;
use crate::environment::{Environment, ScopeId};
use crate::error::{Error, RuntimeError};
use crate::natives;
use crate::parser;
use crate::value::{Object, Value};
use std::cmp::Ordering;
use std::rc::Rc;
use tracing::debug;

/// Walks the tree directly; every run re-evaluates from the AST.
pub struct Interpreter {
    pub environment: Environment,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl Interpreter {
    /// An interpreter whose global scope only holds `true`, `false` and `null`.
    pub fn new() -> Interpreter {
        Interpreter {
            environment: Environment::new(),
        }
    }
    /// Same as `new`, with `print` and `time` registered globally.
    pub fn with_natives() -> Result<Interpreter, RuntimeError> {
        let mut interpreter = Interpreter::new();
        let global = interpreter.global();
        natives::register(&mut interpreter.environment, global)?;
        Ok(interpreter)
    }
    pub fn global(&self) -> ScopeId {
        self.environment.global()
    }
    /// Parses and evaluates `source` in the global scope. Bindings persist
    /// between runs.
    pub fn run(&mut self, source: &str) -> Result<Value, Error> {
        let program = parser::produce_ast(source)?;
        let global = self.global();
        Ok(self.evaluate(&program, global)?)
    }
    /// The value of the last statement, or `Null` for an empty program.
    pub fn evaluate(&mut self, program: &Program, scope: ScopeId) -> Result<Value, RuntimeError> {
        let mut last_evaluated = Value::Null;
        for stmt in &program.body {
            last_evaluated = self.evaluate_statement(stmt, scope)?;
        }
        debug!(live_scopes = self.environment.live_scopes(), "evaluated program");
        Ok(last_evaluated)
    }
    pub fn evaluate_statement(
        &mut self,
        stmt: &Statement,
        scope: ScopeId,
    ) -> Result<Value, RuntimeError> {
        match stmt {
            Statement::VarDeclaration {
                identifier,
                constant,
                value,
            } => {
                let value = match value {
                    Some(value) => self.evaluate_expression(value, scope)?,
                    None => Value::Null,
                };
                self.environment
                    .declare_var(scope, identifier, value, *constant)
            }
            Statement::FunctionDeclaration {
                name,
                parameters,
                body,
            } => {
                let function = Function {
                    name: name.clone(),
                    parameters: parameters.clone(),
                    body: Rc::clone(body),
                    declaration_env: scope,
                };
                self.environment.mark_captured(scope)?;
                self.environment
                    .declare_var(scope, name, Value::Function(Rc::new(function)), true)
            }
            Statement::Expression(expr) => self.evaluate_expression(expr, scope),
        }
    }
    pub fn evaluate_expression(
        &mut self,
        expr: &Expression,
        scope: ScopeId,
    ) -> Result<Value, RuntimeError> {
        match expr {
            Expression::NumericLiteral(value) => Ok(Value::Number(*value)),
            Expression::StringLiteral(value) => Ok(Value::String(value.clone())),
            Expression::Identifier(symbol) => self.environment.lookup_var(scope, symbol),
            Expression::Assignment { assignee, value } => match assignee.as_ref() {
                Expression::Identifier(symbol) => {
                    let value = self.evaluate_expression(value, scope)?;
                    self.environment.assign_var(scope, symbol, value)
                }
                other => Err(RuntimeError::InvalidAssignmentTarget {
                    target: AstPrinter {}.print_expression(other),
                }),
            },
            Expression::ObjectLiteral(properties) => self.evaluate_object(properties, scope),
            Expression::Binary {
                left,
                right,
                operator,
            } => {
                if operator.is_logical() {
                    return self.evaluate_logical(left, right, *operator, scope);
                }
                let lhs = self.evaluate_expression(left, scope)?;
                let rhs = self.evaluate_expression(right, scope)?;
                evaluate_binary(&lhs, &rhs, *operator)
            }
            Expression::Call { callee, args } => self.evaluate_call(callee, args, scope),
            Expression::Member { .. } => Err(RuntimeError::Unsupported { kind: expr.kind() }),
        }
    }
    fn evaluate_object(
        &mut self,
        properties: &[Property],
        scope: ScopeId,
    ) -> Result<Value, RuntimeError> {
        let mut object = Object::new();
        for Property { key, value } in properties {
            let value = match value {
                Some(value) => self.evaluate_expression(value, scope)?,
                None => self.environment.lookup_var(scope, key)?,
            };
            object.insert(key, value);
        }
        Ok(Value::Object(Rc::new(object)))
    }
    // The right operand is skipped only when a comparable left decides the
    // result. One of the operand values is returned, never a coerced boolean.
    fn evaluate_logical(
        &mut self,
        left: &Expression,
        right: &Expression,
        operator: BinaryOperator,
        scope: ScopeId,
    ) -> Result<Value, RuntimeError> {
        let lhs = self.evaluate_expression(left, scope)?;
        if !lhs.is_comparable() {
            self.evaluate_expression(right, scope)?;
            return Ok(Value::Null);
        }
        let decided = match operator {
            BinaryOperator::And => !lhs.is_truthy(),
            _ => lhs.is_truthy(),
        };
        if decided {
            return Ok(lhs);
        }
        let rhs = self.evaluate_expression(right, scope)?;
        if rhs.is_comparable() {
            Ok(rhs)
        } else {
            Ok(Value::Null)
        }
    }
    fn evaluate_call(
        &mut self,
        callee: &Expression,
        args: &[Expression],
        scope: ScopeId,
    ) -> Result<Value, RuntimeError> {
        let mut arguments: Vec<Value> = Vec::with_capacity(args.len());
        for arg in args {
            arguments.push(self.evaluate_expression(arg, scope)?);
        }
        match self.evaluate_expression(callee, scope)? {
            Value::NativeFunction(native) => native.call(&arguments, &self.environment, scope),
            Value::Function(function) => function.call(self, arguments),
            other => Err(RuntimeError::NotCallable {
                value: format!("{} {}", other.type_name(), other),
            }),
        }
    }
}

/// Dispatch on the runtime types of both operands. Combinations that match
/// no rule evaluate to `Null`.
fn evaluate_binary(
    lhs: &Value,
    rhs: &Value,
    operator: BinaryOperator,
) -> Result<Value, RuntimeError> {
    match (lhs, rhs) {
        (Value::Number(l), Value::Number(r)) if operator.is_arithmetic() => {
            evaluate_numeric(*l, *r, operator)
        }
        (Value::String(l), Value::String(r)) if operator == BinaryOperator::Add => {
            let mut joined = l.clone();
            joined.push_str(r.as_str());
            Ok(Value::String(joined))
        }
        _ if lhs.is_comparable() && rhs.is_comparable() && operator.is_comparison() => {
            evaluate_comparison(lhs, rhs, operator)
        }
        _ => Ok(Value::Null),
    }
}

fn evaluate_numeric(l: f64, r: f64, operator: BinaryOperator) -> Result<Value, RuntimeError> {
    let result = match operator {
        BinaryOperator::Add => l + r,
        BinaryOperator::Subtract => l - r,
        BinaryOperator::Multiply => l * r,
        BinaryOperator::Divide => {
            if r == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            l / r
        }
        BinaryOperator::Modulo => l % r,
        _ => return Ok(Value::Null),
    };
    Ok(Value::Number(result))
}

fn evaluate_comparison(
    lhs: &Value,
    rhs: &Value,
    operator: BinaryOperator,
) -> Result<Value, RuntimeError> {
    if lhs.is_null() || rhs.is_null() {
        let equal = lhs.is_null() && rhs.is_null();
        return match operator {
            BinaryOperator::Equal => Ok(Value::Boolean(equal)),
            BinaryOperator::NotEqual => Ok(Value::Boolean(!equal)),
            _ => Err(RuntimeError::NullComparison { operator }),
        };
    }

    let ordering = match (lhs, rhs) {
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Number(_), Value::Number(_)) | (Value::Boolean(_), Value::Boolean(_)) => {
            to_number(lhs).partial_cmp(&to_number(rhs))
        }
        // mixed types are never equal, but still order numerically
        _ => match operator {
            BinaryOperator::Equal => return Ok(Value::Boolean(false)),
            BinaryOperator::NotEqual => return Ok(Value::Boolean(true)),
            _ => to_number(lhs).partial_cmp(&to_number(rhs)),
        },
    };

    let result = match operator {
        BinaryOperator::Less => ordering == Some(Ordering::Less),
        BinaryOperator::Greater => ordering == Some(Ordering::Greater),
        BinaryOperator::LessEqual => {
            ordering == Some(Ordering::Less) || ordering == Some(Ordering::Equal)
        }
        BinaryOperator::GreaterEqual => {
            ordering == Some(Ordering::Greater) || ordering == Some(Ordering::Equal)
        }
        BinaryOperator::Equal => ordering == Some(Ordering::Equal),
        BinaryOperator::NotEqual => ordering != Some(Ordering::Equal),
        _ => return Ok(Value::Null),
    };
    Ok(Value::Boolean(result))
}

/// Numeric reading of a comparable operand. `true`/`false` are 1 and 0, a
/// blank string is 0, and any other unparsable string is NaN.
fn to_number(value: &Value) -> f64 {
    match value {
        Value::Number(x) => *x,
        Value::Boolean(x) => {
            if *x {
                1.0
            } else {
                0.0
            }
        }
        Value::String(x) => parse_number(x.trim()),
        _ => f64::NAN,
    }
}

fn parse_number(text: &str) -> f64 {
    match text {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ if text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')) =>
        {
            text.parse::<f64>().unwrap_or(f64::NAN)
        }
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod interpreter_tests {
    use crate::error::{Error, RuntimeError};
    use crate::interpreter::Interpreter;
    use crate::parser::produce_ast;
    use crate::value::Value;

    fn eval(source: &str) -> Result<Value, Error> {
        Interpreter::new().run(source)
    }

    fn runtime_error(source: &str) -> RuntimeError {
        match eval(source) {
            Err(Error::Runtime(e)) => e,
            other => panic!("expected a runtime error, got {:?}", other),
        }
    }

    #[test]
    fn precedence() {
        assert_eq!(eval("2 + 3 * 4"), Ok(Value::Number(14.0)));
        assert_eq!(eval("(2 + 3) * 4"), Ok(Value::Number(20.0)));
        assert_eq!(eval("10 - 4 - 3"), Ok(Value::Number(3.0)));
        assert_eq!(eval("7 % 4 * 2"), Ok(Value::Number(6.0)));
        assert_eq!(eval("7 / 2"), Ok(Value::Number(3.5)));
    }

    #[test]
    fn empty_program_is_null() {
        assert_eq!(eval(""), Ok(Value::Null));
    }

    #[test]
    fn variables() {
        assert_eq!(
            eval("let x = 10; let y = 20; x + y * 2;"),
            Ok(Value::Number(50.0))
        );
        assert_eq!(eval("let x; x"), Ok(Value::Null));
        assert_eq!(eval("let x = 1; x = x + 1; x"), Ok(Value::Number(2.0)));
        assert_eq!(eval("let a = 1; let b = a = 7; b"), Ok(Value::Number(7.0)));
    }

    #[test]
    fn declarations_evaluate_to_their_value() {
        assert_eq!(eval("let x = 3"), Ok(Value::Number(3.0)));
    }

    #[test]
    fn constants() {
        let mut interpreter = Interpreter::new();
        assert_eq!(interpreter.run("const x = 1;"), Ok(Value::Number(1.0)));
        assert_eq!(
            interpreter.run("x = 2"),
            Err(Error::Runtime(RuntimeError::ConstantReassignment {
                name: "x".to_string()
            }))
        );
        assert_eq!(interpreter.run("x"), Ok(Value::Number(1.0)));
        assert!(matches!(eval("const x;"), Err(Error::Syntax(_))));
    }

    #[test]
    fn redeclaration_fails() {
        assert_eq!(
            runtime_error("let x = 1; let x = 2;"),
            RuntimeError::AlreadyDeclared {
                name: "x".to_string()
            }
        );
        assert!(matches!(
            runtime_error("let null = 1"),
            RuntimeError::AlreadyDeclared { .. }
        ));
    }

    #[test]
    fn undefined_variable() {
        assert_eq!(
            runtime_error("y + 1"),
            RuntimeError::UndefinedVariable {
                name: "y".to_string()
            }
        );
    }

    #[test]
    fn strings() {
        assert_eq!(
            eval("\"foo\" + \"bar\""),
            Ok(Value::String("foobar".to_string()))
        );
        assert_eq!(eval("\"a\" < \"b\""), Ok(Value::Boolean(true)));
        assert_eq!(eval("\"a\" == \"a\""), Ok(Value::Boolean(true)));
    }

    #[test]
    fn comparisons() {
        assert_eq!(eval("1 < 2"), Ok(Value::Boolean(true)));
        assert_eq!(eval("2 <= 2"), Ok(Value::Boolean(true)));
        assert_eq!(eval("3 >= 4"), Ok(Value::Boolean(false)));
        assert_eq!(eval("1 != 1"), Ok(Value::Boolean(false)));
        assert_eq!(eval("true == true"), Ok(Value::Boolean(true)));
        assert_eq!(eval("false < true"), Ok(Value::Boolean(true)));
        assert_eq!(eval("1 == \"1\""), Ok(Value::Boolean(false)));
        assert_eq!(eval("1 != \"1\""), Ok(Value::Boolean(true)));
    }

    #[test]
    fn mixed_type_ordering_is_numeric() {
        assert_eq!(eval("1 < \"2\""), Ok(Value::Boolean(true)));
        assert_eq!(eval("true < 2"), Ok(Value::Boolean(true)));
        assert_eq!(eval("\"b\" > 1"), Ok(Value::Boolean(false)));
        assert_eq!(eval("\"b\" <= 1"), Ok(Value::Boolean(false)));
        assert_eq!(eval("\" 3 \" >= 3"), Ok(Value::Boolean(true)));
        assert_eq!(eval("false <= \"\""), Ok(Value::Boolean(true)));
        assert_eq!(eval("\"10\" < \"9\""), Ok(Value::Boolean(true)));
    }

    #[test]
    fn null_comparisons() {
        assert_eq!(eval("null == null"), Ok(Value::Boolean(true)));
        assert_eq!(eval("null != 0"), Ok(Value::Boolean(true)));
        assert_eq!(eval("0 == null"), Ok(Value::Boolean(false)));
        assert!(matches!(
            runtime_error("null < 1"),
            RuntimeError::NullComparison { .. }
        ));
    }

    #[test]
    fn logical_operators_return_operands() {
        assert_eq!(eval("1 && 2"), Ok(Value::Number(2.0)));
        assert_eq!(eval("0 && 2"), Ok(Value::Number(0.0)));
        assert_eq!(eval("0 || \"x\""), Ok(Value::String("x".to_string())));
        assert_eq!(eval("3 || 4"), Ok(Value::Number(3.0)));
        assert_eq!(eval("null || false"), Ok(Value::Boolean(false)));
    }

    #[test]
    fn logical_operators_short_circuit() {
        assert_eq!(eval("false && (1 / 0)"), Ok(Value::Boolean(false)));
        assert_eq!(eval("true || (1 / 0)"), Ok(Value::Boolean(true)));
        assert_eq!(
            runtime_error("true && (1 / 0)"),
            RuntimeError::DivisionByZero
        );
    }

    #[test]
    fn logical_operators_evaluate_right_of_non_comparable() {
        assert_eq!(
            runtime_error("func f() { 1 } f && nope"),
            RuntimeError::UndefinedVariable {
                name: "nope".to_string()
            }
        );
        assert_eq!(
            runtime_error("func f() { 1 } f || (1 / 0)"),
            RuntimeError::DivisionByZero
        );
        assert_eq!(
            eval("let n = 0; let o = {}; o && (n = n + 1); o || (n = n + 1); n"),
            Ok(Value::Number(2.0))
        );
        assert_eq!(eval("let o = {}; o && 1"), Ok(Value::Null));
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(runtime_error("1 / 0"), RuntimeError::DivisionByZero);
        match eval("5 % 0") {
            Ok(Value::Number(x)) => assert!(x.is_nan()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn mismatched_operands_are_null() {
        assert_eq!(eval("\"a\" - 1"), Ok(Value::Null));
        assert_eq!(eval("\"a\" * \"b\""), Ok(Value::Null));
        assert_eq!(eval("\"a\" + 1"), Ok(Value::Null));
        assert_eq!(eval("let o = {}; o == o"), Ok(Value::Null));
    }

    #[test]
    fn objects() {
        let value = eval("let a = 5; { b: a }").unwrap();
        match value {
            Value::Object(object) => assert_eq!(object.get("b"), Some(&Value::Number(5.0))),
            other => panic!("expected an object, got {:?}", other),
        }

        let value = eval("let a = 5; let b = \"x\"; { a, b, c: a * 2 }").unwrap();
        assert_eq!(value.to_string(), "{ a: 5, b: \"x\", c: 10 }");

        assert!(matches!(
            runtime_error("{ missing }"),
            RuntimeError::UndefinedVariable { .. }
        ));
    }

    #[test]
    fn functions() {
        assert_eq!(
            eval("func add(a, b) { a + b } add(2, 3);"),
            Ok(Value::Number(5.0))
        );
        assert_eq!(eval("func nothing() {} nothing()"), Ok(Value::Null));
        assert!(matches!(
            eval("func f() { 1 } f"),
            Ok(Value::Function(_))
        ));
    }

    #[test]
    fn functions_are_constant() {
        assert!(matches!(
            runtime_error("func f() { 1 } f = 2"),
            RuntimeError::ConstantReassignment { .. }
        ));
    }

    #[test]
    fn arity_is_checked() {
        let source = "func add(a, b) { a + b }";
        for call in &["add(1)", "add(1, 2, 3)"] {
            assert_eq!(
                runtime_error(&format!("{} {}", source, call)),
                RuntimeError::ArityMismatch {
                    name: "add".to_string(),
                    expected: 2,
                    found: if *call == "add(1)" { 1 } else { 3 },
                }
            );
        }
    }

    #[test]
    fn parameters_shadow_globals() {
        assert_eq!(
            eval("let x = 1; func f(x) { x = x + 10; x } f(5) + x"),
            Ok(Value::Number(16.0))
        );
    }

    #[test]
    fn assignment_reaches_declaring_scope() {
        assert_eq!(
            eval("let total = 0; func add(n) { total = total + n } add(2); add(3); total"),
            Ok(Value::Number(5.0))
        );
    }

    #[test]
    fn closures_keep_their_declaration_scope() {
        let source = "
            func makeCounter() {
                let count = 0;
                func inc() { count = count + 1 }
                inc
            }
            let a = makeCounter();
            let b = makeCounter();
            a(); a(); b();
            a() * 10 + b()
        ";
        assert_eq!(eval(source), Ok(Value::Number(32.0)));
    }

    #[test]
    fn chained_calls() {
        let source = "
            func adder(a) { func add(b) { a + b } add }
            adder(2)(3)
        ";
        assert_eq!(eval(source), Ok(Value::Number(5.0)));
    }

    #[test]
    fn recursion() {
        let source = "
            func fib(n) { (n < 3 && 1) || fib(n - 1) + fib(n - 2) }
            fib(10)
        ";
        assert_eq!(eval(source), Ok(Value::Number(55.0)));
    }

    #[test]
    fn call_scopes_are_released() {
        let mut interpreter = Interpreter::new();
        interpreter
            .run("func sq(n) { n * n } sq(2); sq(3); sq(4)")
            .unwrap();
        assert_eq!(interpreter.environment.live_scopes(), 1);

        interpreter
            .run("func make() { func get() { 1 } get } make(); make()")
            .unwrap();
        assert_eq!(interpreter.environment.live_scopes(), 3);
    }

    #[test]
    fn not_callable() {
        assert!(matches!(
            runtime_error("let x = 1; x()"),
            RuntimeError::NotCallable { .. }
        ));
    }

    #[test]
    fn invalid_assignment_target() {
        assert!(matches!(
            runtime_error("1 = 2"),
            RuntimeError::InvalidAssignmentTarget { .. }
        ));
    }

    #[test]
    fn member_access_is_unsupported() {
        assert_eq!(
            runtime_error("let o = { a: 1 }; o.a"),
            RuntimeError::Unsupported { kind: "MemberExpr" }
        );
        assert!(produce_ast("o[\"a\"]").is_ok());
    }
}
