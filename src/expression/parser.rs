//! Recursive-descent parser for the embedded expression language.
//!
//! Grammar (lowest precedence first):
//!
//! ```text
//! expr    := conj ("or" conj)*
//! conj    := unary ("and" unary)*
//! unary   := "(" expr ")" | term "some" unary | term
//! term    := QUOTED | WORD
//! ```
//!
//! Names are handed to a [`TermMapper`] as they are read, innermost first
//! (a restriction's relation after its filler). [`parse`] keeps them as
//! written; the resolver maps them onto taxonomy ids.

use super::{Expression, TermId};

/// A syntax error with the byte offset where it was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Byte offset into the input.
    pub offset: usize,
    /// What went wrong.
    pub message: String,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at offset {}", self.message, self.offset)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Open,
    Close,
    And,
    Or,
    Some,
    Term(String),
}

fn keyword(word: &str) -> Option<Token> {
    match word.to_ascii_lowercase().as_str() {
        "and" => Some(Token::And),
        "or" => Some(Token::Or),
        "some" => Some(Token::Some),
        _ => None,
    }
}

/// Returns true if a term must be quoted to be read back as one term.
#[must_use]
pub fn needs_quotes(term: &str) -> bool {
    term.is_empty()
        || keyword(term).is_some()
        || term
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '\''))
}

/// Returns true if the literal is a compound expression rather than a single id.
#[must_use]
pub fn is_compound(literal: &str) -> bool {
    let trimmed = literal.trim();
    trimmed.starts_with('\'') || needs_quotes(trimmed)
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            '(' => {
                chars.next();
                tokens.push((pos, Token::Open));
            }
            ')' => {
                chars.next();
                tokens.push((pos, Token::Close));
            }
            '\'' => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == '\'' {
                        closed = true;
                        break;
                    }
                    text.push(c);
                }
                if !closed {
                    return Err(ParseError {
                        offset: pos,
                        message: "unterminated quoted name".to_string(),
                    });
                }
                if text.trim().is_empty() {
                    return Err(ParseError {
                        offset: pos,
                        message: "empty quoted name".to_string(),
                    });
                }
                tokens.push((pos, Token::Term(text)));
            }
            _ => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | '\'') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push((pos, keyword(&word).unwrap_or(Token::Term(word))));
            }
        }
    }

    Ok(tokens)
}

/// Maps raw class and relation names while parsing.
pub trait TermMapper {
    /// Maps a class name.
    fn class(&mut self, name: &str) -> TermId;
    /// Maps a relation name.
    fn relation(&mut self, name: &str) -> TermId;
}

struct Verbatim;

impl TermMapper for Verbatim {
    fn class(&mut self, name: &str) -> TermId {
        TermId::from(name)
    }

    fn relation(&mut self, name: &str) -> TermId {
        TermId::from(name)
    }
}

struct Parser<'m> {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
    mapper: &'m mut dyn TermMapper,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(o, _)| *o)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            offset: self.offset(),
            message: message.into(),
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<Expression, ParseError> {
        let mut operands = vec![self.conj()?];
        while self.eat(&Token::Or) {
            operands.push(self.conj()?);
        }
        Ok(if operands.len() == 1 {
            operands.remove(0)
        } else {
            Expression::union(operands)
        })
    }

    fn conj(&mut self) -> Result<Expression, ParseError> {
        let mut operands = vec![self.unary()?];
        while self.eat(&Token::And) {
            operands.push(self.unary()?);
        }
        Ok(if operands.len() == 1 {
            operands.remove(0)
        } else {
            Expression::intersection(operands)
        })
    }

    fn unary(&mut self) -> Result<Expression, ParseError> {
        if self.eat(&Token::Open) {
            let inner = self.expr()?;
            if !self.eat(&Token::Close) {
                return Err(self.error("expected ')'"));
            }
            return Ok(inner);
        }

        let name = match self.peek() {
            Some(Token::Term(t)) => t.clone(),
            Some(other) => return Err(self.error(format!("unexpected {other:?}"))),
            None => return Err(self.error("unexpected end of expression")),
        };
        self.pos += 1;

        if self.eat(&Token::Some) {
            let filler = self.unary()?;
            let relation = self.mapper.relation(&name);
            return Ok(Expression::restriction(relation, filler));
        }
        Ok(Expression::Class {
            id: self.mapper.class(&name),
        })
    }
}

/// Parses an embedded expression, keeping names as written.
///
/// # Errors
/// Returns a [`ParseError`] for unbalanced parentheses, dangling operators,
/// unterminated quotes or trailing input.
pub fn parse(input: &str) -> Result<Expression, ParseError> {
    parse_with(input, &mut Verbatim)
}

/// Parses an embedded expression, mapping names through `mapper`.
///
/// # Errors
/// See [`parse`].
pub fn parse_with(input: &str, mapper: &mut dyn TermMapper) -> Result<Expression, ParseError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: input.len(),
        mapper,
    };
    let expr = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}
