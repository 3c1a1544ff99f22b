//! Recursive-descent parser for textual expressions and relations.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! relation := expression '=' expression
//! expression := term (('+' | '-') term)*
//! term := unary (('*' | '/') unary)*
//! unary := ('-' | '+') unary | power
//! power := primary (('**' | '^') unary)?
//! primary := number | ident | ident '(' expression ')' | '(' expression ')'
//! ```
use super::error::ParseError;
use super::expr::{BinaryOp, Constant, Expr, Function, Relation};
use std::collections::{BTreeSet, HashSet};

/// The set of names the parser accepts as symbols.
pub trait Namespace {
    fn contains_symbol(&self, name: &str) -> bool;
}

impl Namespace for BTreeSet<String> {
    fn contains_symbol(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl Namespace for HashSet<String> {
    fn contains_symbol(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl Namespace for [&str] {
    fn contains_symbol(&self, name: &str) -> bool {
        self.iter().any(|s| *s == name)
    }
}

/// Accepts every identifier as a symbol.
pub struct OpenNamespace;

impl Namespace for OpenNamespace {
    fn contains_symbol(&self, _name: &str) -> bool {
        true
    }
}

pub fn parse_expr<N: Namespace + ?Sized>(input: &str, namespace: &N) -> Result<Expr, ParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser { tokens, pos: 0, namespace };
    let expr = parser.parse_expression()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parses `"lhs = rhs"`.
pub fn parse_relation<N: Namespace + ?Sized>(
    input: &str,
    namespace: &N,
) -> Result<Relation, ParseError> {
    let tokens = tokenize(input)?;
    let equals = tokens.iter().filter(|t| **t == Token::Equals).count();
    if equals != 1 {
        return Err(ParseError::MalformedRelation(equals));
    }
    let mut parser = Parser { tokens, pos: 0, namespace };
    let lhs = parser.parse_expression()?;
    match parser.consume() {
        Some(Token::Equals) => {}
        Some(other) => return Err(ParseError::UnexpectedToken(other.describe())),
        None => return Err(ParseError::UnexpectedEnd),
    }
    let rhs = parser.parse_expression()?;
    parser.expect_end()?;
    Ok(Relation::new(lhs, rhs))
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Power,
    LParen,
    RParen,
    Equals,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Identifier(s) => s.clone(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::Power => "**".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Equals => "=".into(),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() || c == '.' {
            let mut literal = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if d.is_ascii_digit() || d == '.' {
                    literal.push(d);
                    chars.next();
                } else if (d == 'e' || d == 'E') && !literal.contains(|ch: char| ch == 'e' || ch == 'E') {
                    // Only treat as exponent when a digit or sign follows.
                    let mut lookahead = chars.clone();
                    lookahead.next();
                    match lookahead.peek() {
                        Some(&(_, n)) if n.is_ascii_digit() || n == '-' || n == '+' => {
                            literal.push(d);
                            chars.next();
                            if let Some(&(_, sign)) = chars.peek() {
                                if sign == '-' || sign == '+' {
                                    literal.push(sign);
                                    chars.next();
                                }
                            }
                        }
                        _ => break,
                    }
                } else {
                    break;
                }
            }
            let value = literal
                .parse::<f64>()
                .map_err(|_| ParseError::InvalidNumber(literal.clone()))?;
            tokens.push(Token::Number(value));
        } else if c.is_alphabetic() || c == '_' {
            let mut ident = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if d.is_alphanumeric() || d == '_' {
                    ident.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Identifier(ident));
        } else {
            chars.next();
            let token = match c {
                '+' => Token::Plus,
                '-' => Token::Minus,
                '*' => {
                    if matches!(chars.peek(), Some(&(_, '*'))) {
                        chars.next();
                        Token::Power
                    } else {
                        Token::Star
                    }
                }
                '/' => Token::Slash,
                '^' => Token::Power,
                '(' => Token::LParen,
                ')' => Token::RParen,
                '=' => {
                    // Accept `==` as an equality too.
                    if matches!(chars.peek(), Some(&(_, '='))) {
                        chars.next();
                    }
                    Token::Equals
                }
                _ => return Err(ParseError::UnexpectedChar { ch: c, offset }),
            };
            tokens.push(token);
        }
    }
    Ok(tokens)
}

struct Parser<'a, N: Namespace + ?Sized> {
    tokens: Vec<Token>,
    pos: usize,
    namespace: &'a N,
}

impl<N: Namespace + ?Sized> Parser<'_, N> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect_end(&self) -> Result<(), ParseError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(ParseError::UnexpectedToken(token.describe())),
        }
    }

    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.consume();
            let right = self.parse_term()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => break,
            };
            self.consume();
            let right = self.parse_unary()?;
            left = Expr::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.consume();
                let inner = self.parse_unary()?;
                Ok(match inner {
                    Expr::Number(n) => Expr::Number(-n),
                    other => Expr::neg(other),
                })
            }
            Some(Token::Plus) => {
                self.consume();
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_primary()?;
        if let Some(Token::Power) = self.peek() {
            self.consume();
            let exponent = self.parse_unary()?;
            return Ok(Expr::pow(base, exponent));
        }
        Ok(base)
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.consume() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Identifier(name)) => {
                if let Some(Token::LParen) = self.peek() {
                    let func = Function::from_name(&name)
                        .ok_or_else(|| ParseError::UnknownFunction(name.clone()))?;
                    self.consume();
                    let arg = self.parse_expression()?;
                    self.expect_rparen()?;
                    return Ok(Expr::call(func, arg));
                }
                if self.namespace.contains_symbol(&name) {
                    return Ok(Expr::Symbol(name));
                }
                match name.as_str() {
                    "pi" => Ok(Expr::Constant(Constant::Pi)),
                    "e" => Ok(Expr::Constant(Constant::E)),
                    _ => Err(ParseError::UnknownSymbol(name)),
                }
            }
            Some(Token::LParen) => {
                let expr = self.parse_expression()?;
                self.expect_rparen()?;
                Ok(expr)
            }
            Some(other) => Err(ParseError::UnexpectedToken(other.describe())),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn expect_rparen(&mut self) -> Result<(), ParseError> {
        match self.consume() {
            Some(Token::RParen) => Ok(()),
            Some(other) => Err(ParseError::UnexpectedToken(other.describe())),
            None => Err(ParseError::UnexpectedEnd),
        }
    }
}
