use crate::error::SyntaxError;
use crate::token::{Token, TokenType};
use phf::phf_map;
use std::iter::Peekable;
use std::str::CharIndices;
use tracing::debug;

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "let" => TokenType::Let,
    "const" => TokenType::Const,
    "func" => TokenType::Func,
};

// Note: current becomes self.iter.peek()?.0
struct Scanner<'a> {
    source: &'a str,
    iter: Peekable<CharIndices<'a>>,
    start: usize,
    line: usize,
}

/// Turns source text into tokens, always terminated by an `EOF` token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, SyntaxError> {
    let mut scanner = Scanner {
        source,
        iter: source.char_indices().peekable(),
        start: 0,
        line: 1,
    };
    let mut tokens: Vec<Token> = Vec::new();

    while let Some(&(idx, _)) = scanner.iter.peek() {
        scanner.start = idx;
        if let Some(token) = scanner.scan_token()? {
            tokens.push(token);
        }
    }
    tokens.push(Token::new(TokenType::EOF, "EndOfFile", scanner.line));
    debug!(count = tokens.len(), "tokenized source");
    Ok(tokens)
}

impl<'a> Scanner<'a> {
    fn scan_token(&mut self) -> Result<Option<Token>, SyntaxError> {
        let c = match self.iter.next() {
            Some((_, c)) => c,
            None => return Ok(None),
        };
        match c {
            '(' => Ok(Some(self.token(TokenType::OpenParen))),
            ')' => Ok(Some(self.token(TokenType::CloseParen))),
            '{' => Ok(Some(self.token(TokenType::OpenBrace))),
            '}' => Ok(Some(self.token(TokenType::CloseBrace))),
            '[' => Ok(Some(self.token(TokenType::OpenBracket))),
            ']' => Ok(Some(self.token(TokenType::CloseBracket))),
            ':' => Ok(Some(self.token(TokenType::Colon))),
            ',' => Ok(Some(self.token(TokenType::Comma))),
            '.' => Ok(Some(self.token(TokenType::Dot))),
            ';' => Ok(Some(self.token(TokenType::SemiColon))),
            '+' | '-' | '*' | '/' | '%' => Ok(Some(self.token(TokenType::BinaryOperator))),
            '<' | '>' => {
                self.next_if('=');
                Ok(Some(self.token(TokenType::BinaryOperator)))
            }
            '=' => {
                if self.next_if('=') {
                    Ok(Some(self.token(TokenType::BinaryOperator)))
                } else {
                    Ok(Some(self.token(TokenType::Equals)))
                }
            }
            '!' => {
                if self.next_if('=') {
                    Ok(Some(self.token(TokenType::BinaryOperator)))
                } else {
                    Ok(Some(self.token(TokenType::Bang)))
                }
            }
            '&' | '|' => {
                if self.next_if(c) {
                    Ok(Some(self.token(TokenType::BinaryOperator)))
                } else {
                    Err(self.unrecognized(c))
                }
            }
            ' ' | '\r' | '\t' => Ok(None),
            '\n' => {
                self.line += 1;
                Ok(None)
            }
            '"' => Ok(Some(self.string()?)),
            '0'..='9' => Ok(Some(self.number())),
            c if c.is_alphabetic() => Ok(Some(self.identifier())),
            c => Err(self.unrecognized(c)),
        }
    }
    fn current(&mut self) -> usize {
        match self.iter.peek() {
            None => self.source.len(),
            Some((idx, _)) => *idx,
        }
    }
    fn token(&mut self, token_type: TokenType) -> Token {
        let current = self.current();
        Token::new(token_type, &self.source[self.start..current], self.line)
    }
    fn next_if(&mut self, expected: char) -> bool {
        if let Some((_, c)) = self.iter.peek() {
            if *c == expected {
                self.iter.next();
                return true;
            }
        }
        false
    }
    fn unrecognized(&self, character: char) -> SyntaxError {
        SyntaxError::UnrecognizedCharacter {
            line: self.line,
            character,
        }
    }
    fn string(&mut self) -> Result<Token, SyntaxError> {
        let line = self.line;
        loop {
            match self.iter.next() {
                Some((_, '"')) => break,
                Some((_, '\n')) => self.line += 1,
                Some(_) => {}
                None => return Err(SyntaxError::UnterminatedString { line }),
            }
        }
        let current = self.current();
        Ok(Token::new(
            TokenType::String,
            &self.source[self.start + 1..current - 1],
            line,
        ))
    }
    fn number(&mut self) -> Token {
        while let Some((_, c)) = self.iter.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            self.iter.next();
        }
        self.token(TokenType::Number)
    }
    fn identifier(&mut self) -> Token {
        while let Some((_, c)) = self.iter.peek() {
            if !c.is_alphabetic() {
                break;
            }
            self.iter.next();
        }
        let current = self.current();
        let text = &self.source[self.start..current];
        let tokentype = KEYWORDS
            .get(text)
            .copied()
            .unwrap_or(TokenType::Identifier);
        Token::new(tokentype, text, self.line)
    }
}
