/*
 * Order Expression Parser
 *
 * Recursive-descent parser for order expressions only. Guard-level rule
 * text is parsed by the external rule front end; this parser exists so
 * canonical renderings of order expressions round-trip to an equivalent
 * tree.
 *
 * Grammar:
 *   order       := "order"? sequence
 *   sequence    := alternative ("," alternative)*
 *   alternative := repetition ("|" repetition)*
 *   repetition  := primary ("*" | "+" | "?")?
 *   primary     := terminal | "(" sequence ")"
 *   terminal    := ident "." ident "(" ")"
 */

use crate::errors::{EngineError, Result};
use crate::features::expression::domain::{Expression, RepetitionOp};

/// Parse the textual form of an order expression
///
/// Accepts both `order c.init(), c.finish()` and the bare sequence form.
/// The result is always wrapped in `Expression::Order`.
pub fn parse_order(text: &str) -> Result<Expression> {
    let mut parser = Parser::new(text);
    parser.skip_ws();
    if parser.rest().starts_with("order")
        && parser
            .rest()
            .chars()
            .nth(5)
            .map(|c| c.is_whitespace())
            .unwrap_or(false)
    {
        parser.pos += 5;
    }
    let seq = parser.parse_sequence()?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(parser.error("trailing input after order expression"));
    }
    Ok(Expression::Order(Box::new(seq)))
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.rest().is_empty()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn eat(&mut self, expected: char) -> Result<()> {
        self.skip_ws();
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += c.len_utf8();
                Ok(())
            }
            _ => Err(self.error(format!("expected '{}'", expected))),
        }
    }

    fn error(&self, msg: impl Into<String>) -> EngineError {
        EngineError::evaluation(format!(
            "order parse error at offset {}: {}",
            self.pos,
            msg.into()
        ))
    }

    fn parse_sequence(&mut self) -> Result<Expression> {
        let mut left = self.parse_alternative()?;
        loop {
            self.skip_ws();
            if self.peek() == Some(',') {
                self.pos += 1;
                let right = self.parse_alternative()?;
                left = Expression::Sequence {
                    left: Box::new(left),
                    op: ",".to_string(),
                    right: Box::new(right),
                };
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_alternative(&mut self) -> Result<Expression> {
        let mut left = self.parse_repetition()?;
        loop {
            self.skip_ws();
            if self.peek() == Some('|') {
                self.pos += 1;
                let right = self.parse_repetition()?;
                left = Expression::Alternative {
                    left: Box::new(left),
                    right: Box::new(right),
                };
            } else {
                return Ok(left);
            }
        }
    }

    fn parse_repetition(&mut self) -> Result<Expression> {
        let inner = self.parse_primary()?;
        self.skip_ws();
        let op = match self.peek() {
            Some('*') => Some(RepetitionOp::Star),
            Some('+') => Some(RepetitionOp::Plus),
            Some('?') => Some(RepetitionOp::Opt),
            _ => None,
        };
        match op {
            Some(op) => {
                self.pos += 1;
                Ok(Expression::Repetition {
                    inner: Box::new(inner),
                    op,
                })
            }
            None => Ok(inner),
        }
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        self.skip_ws();
        if self.peek() == Some('(') {
            self.pos += 1;
            let inner = self.parse_sequence()?;
            self.eat(')')?;
            return Ok(inner);
        }
        self.parse_terminal()
    }

    fn parse_terminal(&mut self) -> Result<Expression> {
        let entity = self.parse_ident()?;
        self.eat('.')?;
        let op = self.parse_ident()?;
        self.eat('(')?;
        self.eat(')')?;
        Ok(Expression::Terminal { entity, op })
    }

    fn parse_ident(&mut self) -> Result<String> {
        self.skip_ws();
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(self.text[start..self.pos].to_string())
    }
}
