use crate::{
    pattern::PatternError,
    predicate::ast::{ConstructError, Predicate},
    value::Value,
};
use std::fmt;
use std::str::FromStr;
use thiserror::Error as ThisError;

///
/// Textual syntax
///
/// Recursive-descent parser for the infix predicate syntax, the same
/// syntax rendering produces: `||` under `&&` under unary `!`, comparison
/// operators, `contains(attr, {v1, v2})`, `matches(attr, "pattern")`, and
/// a bare attribute name as sugar for `attr == true`. Attribute names are
/// opaque; dotted segments pass through untouched.
///

///
/// ParseError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ParseError {
    #[error("unexpected character `{ch}` at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },

    #[error("unterminated string literal starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("invalid number `{text}` at offset {offset}")]
    InvalidNumber { text: String, offset: usize },

    #[error("unexpected {found} at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: &'static str,
        offset: usize,
    },

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Construct(#[from] ConstructError),
}

///
/// Token
///

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    AndAnd,
    OrOr,
    Bang,
    EqEq,
    NotEq,
    Gt,
    Ge,
    Lt,
    Le,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "`{name}`"),
            Self::Int(v) => write!(f, "`{v}`"),
            Self::Float(v) => write!(f, "`{v}`"),
            Self::Str(v) => write!(f, "string `{v}`"),
            Self::AndAnd => write!(f, "`&&`"),
            Self::OrOr => write!(f, "`||`"),
            Self::Bang => write!(f, "`!`"),
            Self::EqEq => write!(f, "`==`"),
            Self::NotEq => write!(f, "`!=`"),
            Self::Gt => write!(f, "`>`"),
            Self::Ge => write!(f, "`>=`"),
            Self::Lt => write!(f, "`<`"),
            Self::Le => write!(f, "`<=`"),
            Self::LParen => write!(f, "`(`"),
            Self::RParen => write!(f, "`)`"),
            Self::LBrace => write!(f, "`{{`"),
            Self::RBrace => write!(f, "`}}`"),
            Self::Comma => write!(f, "`,`"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}

// Tokenize the whole input up front; the parser works over the buffer.
fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut out = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut index = 0;

    while index < chars.len() {
        let ch = chars[index];
        let offset = index;

        match ch {
            _ if ch.is_whitespace() => {
                index += 1;
            }
            '(' => {
                out.push((Token::LParen, offset));
                index += 1;
            }
            ')' => {
                out.push((Token::RParen, offset));
                index += 1;
            }
            '{' => {
                out.push((Token::LBrace, offset));
                index += 1;
            }
            '}' => {
                out.push((Token::RBrace, offset));
                index += 1;
            }
            ',' => {
                out.push((Token::Comma, offset));
                index += 1;
            }
            '&' if chars.get(index + 1) == Some(&'&') => {
                out.push((Token::AndAnd, offset));
                index += 2;
            }
            '|' if chars.get(index + 1) == Some(&'|') => {
                out.push((Token::OrOr, offset));
                index += 2;
            }
            '!' if chars.get(index + 1) == Some(&'=') => {
                out.push((Token::NotEq, offset));
                index += 2;
            }
            '!' => {
                out.push((Token::Bang, offset));
                index += 1;
            }
            '=' if chars.get(index + 1) == Some(&'=') => {
                out.push((Token::EqEq, offset));
                index += 2;
            }
            '>' if chars.get(index + 1) == Some(&'=') => {
                out.push((Token::Ge, offset));
                index += 2;
            }
            '>' => {
                out.push((Token::Gt, offset));
                index += 1;
            }
            '<' if chars.get(index + 1) == Some(&'=') => {
                out.push((Token::Le, offset));
                index += 2;
            }
            '<' => {
                out.push((Token::Lt, offset));
                index += 1;
            }
            '\'' | '"' => {
                let (text, next) = lex_string(&chars, index)?;
                out.push((Token::Str(text), offset));
                index = next;
            }
            _ if ch.is_ascii_digit() || (ch == '-' && next_is_digit(&chars, index)) => {
                let (token, next) = lex_number(&chars, index)?;
                out.push((token, offset));
                index = next;
            }
            _ if is_ident_start(ch) => {
                let mut end = index + 1;
                while end < chars.len() && is_ident_part(chars[end]) {
                    end += 1;
                }
                let name: String = chars[index..end].iter().collect();
                out.push((Token::Ident(name), offset));
                index = end;
            }
            _ => return Err(ParseError::UnexpectedChar { ch, offset }),
        }
    }

    out.push((Token::Eof, chars.len()));
    Ok(out)
}

const fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

// Dotted attribute names are opaque to the engine; the lexer keeps the
// dot inside one identifier token.
const fn is_ident_part(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '.'
}

fn next_is_digit(chars: &[char], index: usize) -> bool {
    chars
        .get(index + 1)
        .is_some_and(|ch| ch.is_ascii_digit())
}

fn lex_string(chars: &[char], start: usize) -> Result<(String, usize), ParseError> {
    let quote = chars[start];
    let mut out = String::new();
    let mut index = start + 1;

    while index < chars.len() {
        match chars[index] {
            '\\' => {
                let Some(&escaped) = chars.get(index + 1) else {
                    return Err(ParseError::UnterminatedString { offset: start });
                };
                out.push(escaped);
                index += 2;
            }
            ch if ch == quote => return Ok((out, index + 1)),
            ch => {
                out.push(ch);
                index += 1;
            }
        }
    }

    Err(ParseError::UnterminatedString { offset: start })
}

fn lex_number(chars: &[char], start: usize) -> Result<(Token, usize), ParseError> {
    let mut end = start + 1;
    let mut is_float = false;

    while end < chars.len() {
        match chars[end] {
            ch if ch.is_ascii_digit() => end += 1,
            '.' if !is_float && next_is_digit(chars, end) => {
                is_float = true;
                end += 1;
            }
            // Exponent suffix, with an optional sign: 2.5e-3, 1e300.
            'e' | 'E' => {
                let mut cursor = end + 1;
                if matches!(chars.get(cursor), Some('+' | '-')) {
                    cursor += 1;
                }
                if !chars.get(cursor).is_some_and(|ch| ch.is_ascii_digit()) {
                    break;
                }
                is_float = true;
                end = cursor;
            }
            _ => break,
        }
    }

    let text: String = chars[start..end].iter().collect();
    let token = if is_float {
        Token::Float(f64::from_str(&text).map_err(|_| ParseError::InvalidNumber {
            text: text.clone(),
            offset: start,
        })?)
    } else {
        Token::Int(i64::from_str(&text).map_err(|_| ParseError::InvalidNumber {
            text: text.clone(),
            offset: start,
        })?)
    };

    Ok((token, end))
}

///
/// Parser
///

struct Parser {
    tokens: Vec<(Token, usize)>,
    position: usize,
}

/// Parse the textual syntax into a predicate tree.
pub fn parse(input: &str) -> Result<Predicate, ParseError> {
    let mut parser = Parser {
        tokens: tokenize(input)?,
        position: 0,
    };

    let predicate = parser.parse_or()?;
    parser.expect_eof()?;

    Ok(predicate)
}

impl FromStr for Predicate {
    type Err = ParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse(input)
    }
}

impl Parser {
    fn current(&self) -> &Token {
        &self.tokens[self.position].0
    }

    fn offset(&self) -> usize {
        self.tokens[self.position].1
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.position].0.clone();
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.current() == token {
            self.advance();
            return true;
        }
        false
    }

    fn expect(&mut self, token: &Token, expected: &'static str) -> Result<(), ParseError> {
        if self.eat(token) {
            return Ok(());
        }

        Err(self.unexpected(expected))
    }

    fn expect_eof(&mut self) -> Result<(), ParseError> {
        self.expect(&Token::Eof, "end of input")
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        ParseError::UnexpectedToken {
            found: self.current().to_string(),
            expected,
            offset: self.offset(),
        }
    }

    fn parse_or(&mut self) -> Result<Predicate, ParseError> {
        let mut operands = vec![self.parse_and()?];
        while self.eat(&Token::OrOr) {
            operands.push(self.parse_and()?);
        }

        Ok(Predicate::disjunction(operands)?)
    }

    fn parse_and(&mut self) -> Result<Predicate, ParseError> {
        let mut operands = vec![self.parse_unary()?];
        while self.eat(&Token::AndAnd) {
            operands.push(self.parse_unary()?);
        }

        Ok(Predicate::conjunction(operands)?)
    }

    fn parse_unary(&mut self) -> Result<Predicate, ParseError> {
        if self.eat(&Token::Bang) {
            return Ok(Predicate::negation(self.parse_unary()?));
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Predicate, ParseError> {
        if self.eat(&Token::LParen) {
            let inner = self.parse_or()?;
            self.expect(&Token::RParen, "`)`")?;
            return Ok(inner);
        }

        let Token::Ident(name) = self.current().clone() else {
            return Err(self.unexpected("attribute, call, or `(`"));
        };

        match name.as_str() {
            "true" => {
                self.advance();
                return Ok(Predicate::always());
            }
            "false" => {
                self.advance();
                return Ok(Predicate::never());
            }
            // Call-style predicates, only when a `(` follows; otherwise
            // the word is an ordinary attribute name.
            "contains" if self.peek_is_lparen() => return self.parse_contains(),
            "matches" if self.peek_is_lparen() => return self.parse_matches(),
            _ => {}
        }

        self.advance();
        self.parse_comparison(name)
    }

    fn peek_is_lparen(&self) -> bool {
        matches!(
            self.tokens.get(self.position + 1),
            Some((Token::LParen, _))
        )
    }

    fn parse_comparison(&mut self, attribute: String) -> Result<Predicate, ParseError> {
        let predicate = match self.current() {
            Token::EqEq => {
                self.advance();
                Predicate::equal_to(attribute, self.parse_value()?)
            }
            Token::NotEq => {
                self.advance();
                Predicate::not_equal_to(attribute, self.parse_value()?)
            }
            Token::Gt => {
                self.advance();
                Predicate::greater_than(attribute, self.parse_value()?)?
            }
            Token::Ge => {
                self.advance();
                Predicate::at_least(attribute, self.parse_value()?)?
            }
            Token::Lt => {
                self.advance();
                Predicate::lesser_than(attribute, self.parse_value()?)?
            }
            Token::Le => {
                self.advance();
                Predicate::at_most(attribute, self.parse_value()?)?
            }
            // A bare attribute is sugar for `attribute == true`.
            _ => Predicate::equal_to(attribute, true),
        };

        Ok(predicate)
    }

    fn parse_contains(&mut self) -> Result<Predicate, ParseError> {
        self.advance();
        self.expect(&Token::LParen, "`(`")?;
        let attribute = self.parse_attribute()?;
        self.expect(&Token::Comma, "`,`")?;
        self.expect(&Token::LBrace, "`{`")?;

        let mut values = Vec::new();
        if !self.eat(&Token::RBrace) {
            loop {
                values.push(self.parse_value()?);
                if !self.eat(&Token::Comma) {
                    break;
                }
            }
            self.expect(&Token::RBrace, "`}`")?;
        }
        self.expect(&Token::RParen, "`)`")?;

        Ok(Predicate::is_in(attribute, values))
    }

    fn parse_matches(&mut self) -> Result<Predicate, ParseError> {
        self.advance();
        self.expect(&Token::LParen, "`(`")?;
        let attribute = self.parse_attribute()?;
        self.expect(&Token::Comma, "`,`")?;

        let Token::Str(pattern) = self.current().clone() else {
            return Err(self.unexpected("pattern string"));
        };
        self.advance();
        self.expect(&Token::RParen, "`)`")?;

        Ok(Predicate::matches(attribute, pattern)?)
    }

    fn parse_attribute(&mut self) -> Result<String, ParseError> {
        match self.current().clone() {
            Token::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("attribute name")),
        }
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        let value = match self.current().clone() {
            Token::Int(v) => Value::Int(v),
            Token::Float(v) => Value::Float(v),
            Token::Str(v) => Value::Text(v),
            Token::Ident(word) => match word.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "null" => Value::Null,
                _ => return Err(self.unexpected("value literal")),
            },
            _ => return Err(self.unexpected("value literal")),
        };
        self.advance();

        Ok(value)
    }
}
