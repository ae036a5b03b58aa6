//! Stream filter predicates
//!
//! A small, case-sensitive subset of the XPath-style predicates used by
//! stream discovery:
//!
//! ```text
//! type='EEG'
//! type='EEG' and name='BioSemi'
//! (type='EEG' and name='BioSemi') or type='HR'
//! not(hostname='lab-pc') and starts-with(name,'Polar')
//! channel_count=8 and nominal_srate!=0
//! ```
//!
//! Grammar:
//! ```text
//! expr    := and ('or' and)*
//! and     := unary ('and' unary)*
//! unary   := 'not' '(' expr ')' | primary
//! primary := '(' expr ')'
//!          | ('starts-with' | 'contains') '(' field ',' literal ')'
//!          | field ('=' | '!=') literal
//! ```
//!
//! An empty predicate matches every stream.

use std::fmt;
use std::str::FromStr;

use crate::stream::StreamInfo;

/// Malformed predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateError {
    /// Byte offset of the offending token
    pub position: usize,
    pub message: String,
}

impl PredicateError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

impl fmt::Display for PredicateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Malformed predicate at {}: {}", self.position, self.message)
    }
}

impl std::error::Error for PredicateError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Type,
    Hostname,
    Uid,
    SourceId,
    ChannelFormat,
    ChannelCount,
    NominalSrate,
}

impl Field {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "name" => Field::Name,
            "type" => Field::Type,
            "hostname" => Field::Hostname,
            "uid" => Field::Uid,
            "source_id" => Field::SourceId,
            "channel_format" => Field::ChannelFormat,
            "channel_count" => Field::ChannelCount,
            "nominal_srate" => Field::NominalSrate,
            _ => return None,
        })
    }

    fn text(&self, info: &StreamInfo) -> String {
        match self {
            Field::Name => info.name().to_string(),
            Field::Type => info.stream_type().to_string(),
            Field::Hostname => info.host().to_string(),
            Field::Uid => info.uid().to_string(),
            Field::SourceId => info.source().to_string(),
            Field::ChannelFormat => info.format_label().to_string(),
            Field::ChannelCount => info.channels().to_string(),
            Field::NominalSrate => info.srate().to_string(),
        }
    }

    fn number(&self, info: &StreamInfo) -> Option<f64> {
        match self {
            Field::ChannelCount => Some(info.channels() as f64),
            Field::NominalSrate => Some(info.srate()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Any,
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Equals { field: Field, value: String, negate: bool },
    StartsWith { field: Field, value: String },
    Contains { field: Field, value: String },
}

impl Expr {
    fn eval(&self, info: &StreamInfo) -> bool {
        match self {
            Expr::Any => true,
            Expr::Or(a, b) => a.eval(info) || b.eval(info),
            Expr::And(a, b) => a.eval(info) && b.eval(info),
            Expr::Not(e) => !e.eval(info),
            Expr::Equals {
                field,
                value,
                negate,
            } => {
                // Numeric fields compare by value when the literal is a number
                let equal = match (field.number(info), value.parse::<f64>()) {
                    (Some(actual), Ok(expected)) => actual == expected,
                    _ => field.text(info) == *value,
                };
                equal != *negate
            }
            Expr::StartsWith { field, value } => field.text(info).starts_with(value.as_str()),
            Expr::Contains { field, value } => field.text(info).contains(value.as_str()),
        }
    }
}

/// A parsed stream filter
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    source: String,
    expr: Expr,
}

impl Predicate {
    /// Parse a predicate; an empty (or blank) string matches everything
    pub fn parse(source: &str) -> Result<Self, PredicateError> {
        let tokens = tokenize(source)?;
        let expr = if tokens.is_empty() {
            Expr::Any
        } else {
            let mut parser = Parser {
                tokens: &tokens,
                pos: 0,
                end: source.len(),
            };
            let expr = parser.expr()?;
            if let Some(tok) = parser.peek() {
                return Err(PredicateError::new(tok.offset, "unexpected trailing input"));
            }
            expr
        };

        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// Predicate matching every stream
    pub fn any() -> Self {
        Self {
            source: String::new(),
            expr: Expr::Any,
        }
    }

    pub fn matches(&self, info: &StreamInfo) -> bool {
        self.expr.eval(info)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Self::any()
    }
}

impl FromStr for Predicate {
    type Err = PredicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Word(String),
    Literal(String),
    Eq,
    Ne,
    LParen,
    RParen,
    Comma,
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

fn tokenize(source: &str) -> Result<Vec<Token>, PredicateError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        let kind = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '(' => {
                chars.next();
                TokenKind::LParen
            }
            ')' => {
                chars.next();
                TokenKind::RParen
            }
            ',' => {
                chars.next();
                TokenKind::Comma
            }
            '=' => {
                chars.next();
                TokenKind::Eq
            }
            '!' => {
                chars.next();
                match chars.next() {
                    Some((_, '=')) => TokenKind::Ne,
                    _ => return Err(PredicateError::new(offset, "expected '=' after '!'")),
                }
            }
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some((_, ch)) if ch == quote => break,
                        Some((_, ch)) => value.push(ch),
                        None => {
                            return Err(PredicateError::new(offset, "unterminated string literal"))
                        }
                    }
                }
                TokenKind::Literal(value)
            }
            c if is_word_char(c) => {
                let mut word = String::new();
                while let Some(&(_, ch)) = chars.peek() {
                    if !is_word_char(ch) {
                        break;
                    }
                    word.push(ch);
                    chars.next();
                }
                TokenKind::Word(word)
            }
            other => {
                return Err(PredicateError::new(
                    offset,
                    format!("unexpected character '{}'", other),
                ))
            }
        };
        tokens.push(Token { kind, offset });
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    end: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Result<&'a Token, PredicateError> {
        let tok = self
            .tokens
            .get(self.pos)
            .ok_or_else(|| PredicateError::new(self.end, "unexpected end of predicate"))?;
        self.pos += 1;
        Ok(tok)
    }

    fn peek_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token { kind: TokenKind::Word(w), .. }) if w == word)
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), PredicateError> {
        let tok = self.next()?;
        if tok.kind == kind {
            Ok(())
        } else {
            Err(PredicateError::new(tok.offset, format!("expected {}", what)))
        }
    }

    fn expr(&mut self) -> Result<Expr, PredicateError> {
        let mut lhs = self.and()?;
        while self.peek_word("or") {
            self.pos += 1;
            let rhs = self.and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, PredicateError> {
        let mut lhs = self.unary()?;
        while self.peek_word("and") {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, PredicateError> {
        if self.peek_word("not") {
            self.pos += 1;
            self.expect(TokenKind::LParen, "'(' after not")?;
            let inner = self.expr()?;
            self.expect(TokenKind::RParen, "')'")?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, PredicateError> {
        let tok = self.next()?;
        match &tok.kind {
            TokenKind::LParen => {
                let inner = self.expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Word(w) if w == "starts-with" || w == "contains" => {
                self.expect(TokenKind::LParen, "'('")?;
                let field = self.field()?;
                self.expect(TokenKind::Comma, "','")?;
                let value = self.literal()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(if w == "starts-with" {
                    Expr::StartsWith { field, value }
                } else {
                    Expr::Contains { field, value }
                })
            }
            TokenKind::Word(_) => {
                self.pos -= 1;
                let field = self.field()?;
                let op = self.next()?;
                let negate = match op.kind {
                    TokenKind::Eq => false,
                    TokenKind::Ne => true,
                    _ => return Err(PredicateError::new(op.offset, "expected '=' or '!='")),
                };
                let value = self.literal()?;
                Ok(Expr::Equals {
                    field,
                    value,
                    negate,
                })
            }
            _ => Err(PredicateError::new(tok.offset, "expected a comparison")),
        }
    }

    fn field(&mut self) -> Result<Field, PredicateError> {
        let tok = self.next()?;
        match &tok.kind {
            TokenKind::Word(w) => Field::parse(w)
                .ok_or_else(|| PredicateError::new(tok.offset, format!("unknown field '{}'", w))),
            _ => Err(PredicateError::new(tok.offset, "expected a field name")),
        }
    }

    fn literal(&mut self) -> Result<String, PredicateError> {
        let tok = self.next()?;
        match &tok.kind {
            TokenKind::Literal(s) | TokenKind::Word(s) => Ok(s.clone()),
            _ => Err(PredicateError::new(tok.offset, "expected a value")),
        }
    }
}
