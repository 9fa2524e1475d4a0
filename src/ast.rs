use std::rc::Rc;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum BinaryOperator {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "%")]
    Modulo,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = "<=")]
    LessEqual,
    #[strum(serialize = ">=")]
    GreaterEqual,
    #[strum(serialize = "==")]
    Equal,
    #[strum(serialize = "!=")]
    NotEqual,
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
}

impl BinaryOperator {
    pub fn is_arithmetic(self) -> bool {
        match self {
            BinaryOperator::Add
            | BinaryOperator::Subtract
            | BinaryOperator::Multiply
            | BinaryOperator::Divide
            | BinaryOperator::Modulo => true,
            _ => false,
        }
    }
    pub fn is_comparison(self) -> bool {
        match self {
            BinaryOperator::Less
            | BinaryOperator::Greater
            | BinaryOperator::LessEqual
            | BinaryOperator::GreaterEqual
            | BinaryOperator::Equal
            | BinaryOperator::NotEqual => true,
            _ => false,
        }
    }
    pub fn is_logical(self) -> bool {
        match self {
            BinaryOperator::And | BinaryOperator::Or => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub body: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    VarDeclaration {
        identifier: String,
        constant: bool,
        value: Option<Expression>,
    },
    FunctionDeclaration {
        name: String,
        parameters: Vec<String>,
        body: Rc<[Statement]>,
    },
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Assignment {
        assignee: Box<Expression>,
        value: Box<Expression>,
    },
    Binary {
        left: Box<Expression>,
        right: Box<Expression>,
        operator: BinaryOperator,
    },
    Member {
        object: Box<Expression>,
        property: Box<Expression>,
        computed: bool,
    },
    Call {
        callee: Box<Expression>,
        args: Vec<Expression>,
    },
    ObjectLiteral(Vec<Property>),
    Identifier(String),
    NumericLiteral(f64),
    StringLiteral(String),
}

/// An object literal entry. `value` is `None` for the `{ key }` shorthand.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    pub value: Option<Expression>,
}

impl Expression {
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::Assignment { .. } => "AssignmentExpr",
            Expression::Binary { .. } => "BinaryExpr",
            Expression::Member { .. } => "MemberExpr",
            Expression::Call { .. } => "CallExpr",
            Expression::ObjectLiteral(_) => "ObjectLiteral",
            Expression::Identifier(_) => "Identifier",
            Expression::NumericLiteral(_) => "NumericLiteral",
            Expression::StringLiteral(_) => "StringLiteral",
        }
    }
}

pub trait Visitor<T, Output> {
    fn visit(&mut self, n: &T) -> Output;
}

impl Expression {
    pub fn accept<T>(&self, v: &mut dyn Visitor<Expression, T>) -> T {
        v.visit(self)
    }
}

impl Statement {
    pub fn accept<T>(&self, v: &mut dyn Visitor<Statement, T>) -> T {
        v.visit(self)
    }
}

impl Program {
    pub fn accept<T>(&self, v: &mut dyn Visitor<Program, T>) -> T {
        v.visit(self)
    }
}

/// Renders the tree as S-expressions, one line per top-level statement.
pub struct AstPrinter {}

impl AstPrinter {
    pub fn print(&mut self, program: &Program) -> String {
        program.accept::<String>(self)
    }
    pub fn print_statement(&mut self, stmt: &Statement) -> String {
        stmt.accept::<String>(self)
    }
    pub fn print_expression(&mut self, expr: &Expression) -> String {
        expr.accept::<String>(self)
    }
    fn parenthesize(&mut self, name: &str, args: Vec<&Expression>) -> String {
        let mut x = String::from("(");
        x.push_str(name);
        for arg in args {
            x.push(' ');
            x.push_str(self.print_expression(arg).as_str());
        }
        x.push(')');
        x
    }
}

impl Visitor<Expression, String> for AstPrinter {
    fn visit(&mut self, n: &Expression) -> String {
        match n {
            Expression::Binary {
                left,
                right,
                operator,
            } => self.parenthesize(&operator.to_string(), vec![left.as_ref(), right.as_ref()]),
            Expression::Assignment { assignee, value } => {
                self.parenthesize("assign", vec![assignee.as_ref(), value.as_ref()])
            }
            Expression::Member {
                object,
                property,
                computed,
            } => self.parenthesize(
                if *computed { "index" } else { "." },
                vec![object.as_ref(), property.as_ref()],
            ),
            Expression::Call { callee, args } => {
                let mut parts = vec![callee.as_ref()];
                parts.extend(args.iter());
                self.parenthesize("call", parts)
            }
            Expression::ObjectLiteral(properties) => {
                let mut x = String::from("(object");
                for property in properties {
                    x.push(' ');
                    match &property.value {
                        Some(value) => {
                            x.push_str(&format!("({} {})", property.key, self.print_expression(value)))
                        }
                        None => x.push_str(&property.key),
                    }
                }
                x.push(')');
                x
            }
            Expression::Identifier(symbol) => symbol.clone(),
            Expression::NumericLiteral(value) => format!("{}", value),
            Expression::StringLiteral(value) => format!("\"{}\"", value),
        }
    }
}

impl Visitor<Statement, String> for AstPrinter {
    fn visit(&mut self, n: &Statement) -> String {
        match n {
            Statement::VarDeclaration {
                identifier,
                constant,
                value,
            } => {
                let keyword = if *constant { "const" } else { "let" };
                match value {
                    Some(value) => {
                        format!("({} {} {})", keyword, identifier, self.print_expression(value))
                    }
                    None => format!("({} {})", keyword, identifier),
                }
            }
            Statement::FunctionDeclaration {
                name,
                parameters,
                body,
            } => {
                let mut x = format!("(func {} ({})", name, parameters.join(" "));
                for stmt in body.iter() {
                    x.push(' ');
                    x.push_str(self.print_statement(stmt).as_str());
                }
                x.push(')');
                x
            }
            Statement::Expression(expr) => self.print_expression(expr),
        }
    }
}

impl Visitor<Program, String> for AstPrinter {
    fn visit(&mut self, n: &Program) -> String {
        n.body
            .iter()
            .map(|stmt| self.print_statement(stmt))
            .collect::<Vec<String>>()
            .join("\n")
    }
}
