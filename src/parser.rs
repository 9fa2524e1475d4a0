use crate::ast::{AstPrinter, BinaryOperator, Expression, Program, Property, Statement};
use crate::error::SyntaxError;
use crate::scanner;
use crate::token::{Token, TokenType};
use std::rc::Rc;
use tracing::debug;

/// Tokenizes and parses `source` into a `Program`.
pub fn produce_ast(source: &str) -> Result<Program, SyntaxError> {
    let tokens = scanner::tokenize(source)?;
    Parser::new(tokens).parse()
}

/// Recursive descent over a token sequence, one token of lookahead.
///
/// Precedence, lowest first: assignment, object literal, `||`, `&&`,
/// equality, relational, additive, multiplicative, call/member, primary.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Parser {
        let terminated = match tokens.last() {
            Some(token) => token.tokentype == TokenType::EOF,
            None => false,
        };
        if !terminated {
            let line = tokens.last().map_or(1, |token| token.line);
            tokens.push(Token::new(TokenType::EOF, "EndOfFile", line));
        }
        Parser { tokens, current: 0 }
    }
    pub fn parse(&mut self) -> Result<Program, SyntaxError> {
        let mut body: Vec<Statement> = Vec::new();
        while !self.is_at_end() {
            body.push(self.statement()?);
        }
        debug!(statements = body.len(), "parsed program");
        Ok(Program { body })
    }
    fn statement(&mut self) -> Result<Statement, SyntaxError> {
        let tokentype = self.at().tokentype;
        let stmt = match tokentype {
            TokenType::Let | TokenType::Const => self.var_declaration()?,
            TokenType::Func => self.function_declaration()?,
            _ => Statement::Expression(self.expression()?),
        };
        if self.at().tokentype == TokenType::SemiColon {
            self.eat();
        }
        Ok(stmt)
    }
    fn var_declaration(&mut self) -> Result<Statement, SyntaxError> {
        let constant = self.eat().tokentype == TokenType::Const;
        let identifier = self
            .expect(
                TokenType::Identifier,
                "Expected identifier name following let | const keywords.",
            )?
            .value;

        if self.at().tokentype == TokenType::Equals {
            self.eat();
            let value = self.expression()?;
            return Ok(Statement::VarDeclaration {
                identifier,
                constant,
                value: Some(value),
            });
        }
        if constant {
            return Err(SyntaxError::ConstantWithoutValue {
                line: self.at().line,
                name: identifier,
            });
        }
        match self.at().tokentype {
            TokenType::SemiColon | TokenType::CloseBrace | TokenType::EOF => {
                Ok(Statement::VarDeclaration {
                    identifier,
                    constant,
                    value: None,
                })
            }
            _ => Err(self.unexpected(
                TokenType::Equals,
                "Expected equals token following identifier in var declaration.",
            )),
        }
    }
    fn function_declaration(&mut self) -> Result<Statement, SyntaxError> {
        self.eat();
        let name = self
            .expect(
                TokenType::Identifier,
                "Expected function name following func keyword.",
            )?
            .value;
        let line = self.at().line;
        let mut parameters: Vec<String> = Vec::new();
        for arg in self.arguments()? {
            match arg {
                Expression::Identifier(symbol) => parameters.push(symbol),
                other => {
                    return Err(SyntaxError::InvalidParameter {
                        line,
                        function: name,
                        parameter: AstPrinter {}.print_expression(&other),
                    })
                }
            }
        }

        self.expect(
            TokenType::OpenBrace,
            "Expected function body following declaration.",
        )?;
        let mut body: Vec<Statement> = Vec::new();
        while !self.is_at_end() && self.at().tokentype != TokenType::CloseBrace {
            body.push(self.statement()?);
        }
        self.expect(
            TokenType::CloseBrace,
            "Closing brace expected inside function declaration.",
        )?;

        Ok(Statement::FunctionDeclaration {
            name,
            parameters,
            body: Rc::from(body),
        })
    }
    fn expression(&mut self) -> Result<Expression, SyntaxError> {
        self.assignment()
    }
    fn assignment(&mut self) -> Result<Expression, SyntaxError> {
        let left = self.object()?;
        if self.at().tokentype == TokenType::Equals {
            self.eat();
            let value = self.assignment()?;
            return Ok(Expression::Assignment {
                assignee: Box::new(left),
                value: Box::new(value),
            });
        }
        Ok(left)
    }
    fn object(&mut self) -> Result<Expression, SyntaxError> {
        if self.at().tokentype != TokenType::OpenBrace {
            return self.or();
        }
        self.eat();

        let mut properties: Vec<Property> = Vec::new();
        while !self.is_at_end() && self.at().tokentype != TokenType::CloseBrace {
            let key = self
                .expect(TokenType::Identifier, "Object literal key expected.")?
                .value;

            // { key, } and { key } look the value up by name at evaluation time
            let tokentype = self.at().tokentype;
            match tokentype {
                TokenType::Comma => {
                    self.eat();
                    properties.push(Property { key, value: None });
                    continue;
                }
                TokenType::CloseBrace => {
                    properties.push(Property { key, value: None });
                    continue;
                }
                _ => {}
            }

            self.expect(
                TokenType::Colon,
                "Missing colon following identifier in object literal.",
            )?;
            let value = self.expression()?;
            properties.push(Property {
                key,
                value: Some(value),
            });

            if self.at().tokentype != TokenType::CloseBrace {
                self.expect(
                    TokenType::Comma,
                    "Expected comma or closing brace following property.",
                )?;
            }
        }

        self.expect(TokenType::CloseBrace, "Object literal missing closing brace.")?;
        Ok(Expression::ObjectLiteral(properties))
    }
    fn or(&mut self) -> Result<Expression, SyntaxError> {
        let mut expr = self.and()?;
        while let Some(operator) = self.match_operator(&[BinaryOperator::Or])? {
            let right = self.and()?;
            expr = binary(expr, operator, right);
        }
        Ok(expr)
    }
    fn and(&mut self) -> Result<Expression, SyntaxError> {
        let mut expr = self.equality()?;
        while let Some(operator) = self.match_operator(&[BinaryOperator::And])? {
            let right = self.equality()?;
            expr = binary(expr, operator, right);
        }
        Ok(expr)
    }
    fn equality(&mut self) -> Result<Expression, SyntaxError> {
        let mut expr = self.relational()?;
        while let Some(operator) =
            self.match_operator(&[BinaryOperator::Equal, BinaryOperator::NotEqual])?
        {
            let right = self.relational()?;
            expr = binary(expr, operator, right);
        }
        Ok(expr)
    }
    fn relational(&mut self) -> Result<Expression, SyntaxError> {
        let mut expr = self.additive()?;
        while let Some(operator) = self.match_operator(&[
            BinaryOperator::Less,
            BinaryOperator::Greater,
            BinaryOperator::LessEqual,
            BinaryOperator::GreaterEqual,
        ])? {
            let right = self.additive()?;
            expr = binary(expr, operator, right);
        }
        Ok(expr)
    }
    fn additive(&mut self) -> Result<Expression, SyntaxError> {
        let mut expr = self.multiplicative()?;
        while let Some(operator) =
            self.match_operator(&[BinaryOperator::Add, BinaryOperator::Subtract])?
        {
            let right = self.multiplicative()?;
            expr = binary(expr, operator, right);
        }
        Ok(expr)
    }
    fn multiplicative(&mut self) -> Result<Expression, SyntaxError> {
        let mut expr = self.call_member()?;
        while let Some(operator) = self.match_operator(&[
            BinaryOperator::Multiply,
            BinaryOperator::Divide,
            BinaryOperator::Modulo,
        ])? {
            let right = self.call_member()?;
            expr = binary(expr, operator, right);
        }
        Ok(expr)
    }
    fn call_member(&mut self) -> Result<Expression, SyntaxError> {
        let member = self.member()?;
        if self.at().tokentype == TokenType::OpenParen {
            return self.call(member);
        }
        Ok(member)
    }
    fn call(&mut self, callee: Expression) -> Result<Expression, SyntaxError> {
        let args = self.arguments()?;
        let call = Expression::Call {
            callee: Box::new(callee),
            args,
        };
        // f()()
        if self.at().tokentype == TokenType::OpenParen {
            return self.call(call);
        }
        Ok(call)
    }
    fn arguments(&mut self) -> Result<Vec<Expression>, SyntaxError> {
        self.expect(TokenType::OpenParen, "Expected open parenthesis.")?;
        let mut args: Vec<Expression> = Vec::new();
        if self.at().tokentype != TokenType::CloseParen {
            args.push(self.assignment()?);
            while self.at().tokentype == TokenType::Comma {
                self.eat();
                args.push(self.assignment()?);
            }
        }
        self.expect(
            TokenType::CloseParen,
            "Missing closing parenthesis inside arguments list.",
        )?;
        Ok(args)
    }
    fn member(&mut self) -> Result<Expression, SyntaxError> {
        let mut object = self.primary()?;
        loop {
            let tokentype = self.at().tokentype;
            let computed = match tokentype {
                TokenType::Dot => false,
                TokenType::OpenBracket => true,
                _ => break,
            };
            let line = self.eat().line;

            let property = if computed {
                let property = self.expression()?;
                self.expect(
                    TokenType::CloseBracket,
                    "Missing closing bracket in computed value.",
                )?;
                property
            } else {
                match self.primary()? {
                    Expression::Identifier(symbol) => Expression::Identifier(symbol),
                    other => {
                        return Err(SyntaxError::InvalidProperty {
                            line,
                            property: AstPrinter {}.print_expression(&other),
                        })
                    }
                }
            };

            object = Expression::Member {
                object: Box::new(object),
                property: Box::new(property),
                computed,
            };
        }
        Ok(object)
    }
    fn primary(&mut self) -> Result<Expression, SyntaxError> {
        let tokentype = self.at().tokentype;
        match tokentype {
            TokenType::Identifier => Ok(Expression::Identifier(self.eat().value)),
            TokenType::Number => {
                let token = self.eat();
                token
                    .value
                    .parse::<f64>()
                    .map(Expression::NumericLiteral)
                    .map_err(|_| SyntaxError::InvalidNumber {
                        line: token.line,
                        lexeme: token.value.clone(),
                    })
            }
            TokenType::String => Ok(Expression::StringLiteral(self.eat().value)),
            TokenType::OpenParen => {
                self.eat();
                let value = self.expression()?;
                self.expect(
                    TokenType::CloseParen,
                    "Unexpected token found inside parenthesized expression. Expected closing parenthesis.",
                )?;
                Ok(value)
            }
            found => {
                let token = self.at();
                Err(SyntaxError::ExpectedExpression {
                    line: token.line,
                    found,
                    lexeme: token.value.clone(),
                })
            }
        }
    }
    fn match_operator(
        &mut self,
        operators: &[BinaryOperator],
    ) -> Result<Option<BinaryOperator>, SyntaxError> {
        let token = self.at();
        if token.tokentype != TokenType::BinaryOperator {
            return Ok(None);
        }
        let operator: BinaryOperator =
            token
                .value
                .parse()
                .map_err(|_| SyntaxError::UnknownOperator {
                    line: token.line,
                    operator: token.value.clone(),
                })?;
        if operators.contains(&operator) {
            self.eat();
            Ok(Some(operator))
        } else {
            Ok(None)
        }
    }
    fn expect(&mut self, tokentype: TokenType, message: &str) -> Result<Token, SyntaxError> {
        if self.at().tokentype != tokentype {
            return Err(self.unexpected(tokentype, message));
        }
        Ok(self.eat())
    }
    fn unexpected(&self, expected: TokenType, message: &str) -> SyntaxError {
        let token = self.at();
        SyntaxError::UnexpectedToken {
            line: token.line,
            message: message.to_string(),
            expected,
            found: token.tokentype,
            lexeme: token.value.clone(),
        }
    }
    fn eat(&mut self) -> Token {
        let token = self.at().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }
    fn is_at_end(&self) -> bool {
        self.at().tokentype == TokenType::EOF
    }
    fn at(&self) -> &Token {
        &self.tokens[self.current]
    }
}

fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Expression {
    Expression::Binary {
        left: Box::new(left),
        right: Box::new(right),
        operator,
    }
}
