use strum_macros::Display;

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TokenType {
    // Keywords.
    Let, Const, Func,

    // Literals.
    Identifier, Number, String,

    // Operators.
    Equals, Bang, BinaryOperator,

    // Grouping.
    OpenParen, CloseParen, OpenBrace, CloseBrace, OpenBracket, CloseBracket,
    Colon, Comma, Dot, SemiColon,

    EOF
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tokentype: TokenType,
    pub value: String,
    pub line: usize,
}

impl Token {
    pub fn new(tokentype: TokenType, value: &str, line: usize) -> Token {
        Token {
            tokentype,
            value: value.to_string(),
            line,
        }
    }
}
