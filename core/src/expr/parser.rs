//! Recursive-descent parser for `manual` rule expressions.
//!
//! ```text
//! expr    := or
//! or      := and (("||" | "or") and)*
//! and     := unary (("&&" | "and") unary)*
//! unary   := ("!" | "not") unary | primary
//! primary := "(" expr ")" | "true" | "false" | call
//! call    := IDENT [ "(" [ arg ("," arg)* ] ")" ]
//! arg     := NUMBER | STRING | "array(" args ")" | "[" args "]"
//! ```

use super::lexer::{Token, TokenKind};
use super::{Call, Expr, ManualPredicate};
use crate::{ExprError, MAX_CALL_ARGS, MAX_DEPTH};

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    end: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>, source_len: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            end: source_len,
        }
    }

    pub(crate) fn parse(mut self) -> Result<Expr, ExprError> {
        if self.tokens.is_empty() {
            return Err(ExprError::Empty);
        }
        let expr = self.parse_or()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(ExprError::UnexpectedToken {
                expected: "end of expression",
                found: token.kind.describe(),
                offset: token.offset,
            }),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut terms = vec![self.parse_and()?];
        while self.eat(&TokenKind::Or) {
            terms.push(self.parse_and()?);
        }
        Ok(collapse(terms, Expr::Or))
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut terms = vec![self.parse_unary()?];
        while self.eat(&TokenKind::And) {
            terms.push(self.parse_unary()?);
        }
        Ok(collapse(terms, Expr::And))
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if self.eat(&TokenKind::Not) {
            self.enter()?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let token = self.next_token("an expression")?;
        match token.kind {
            TokenKind::LParen => {
                self.enter()?;
                let inner = self.parse_or()?;
                self.depth -= 1;
                self.expect(&TokenKind::RParen, "`)`")?;
                Ok(inner)
            }
            TokenKind::True => Ok(Expr::Literal(true)),
            TokenKind::False => Ok(Expr::Literal(false)),
            TokenKind::Ident(name) => self.parse_call(name),
            other => Err(ExprError::UnexpectedToken {
                expected: "an expression",
                found: other.describe(),
                offset: token.offset,
            }),
        }
    }

    fn parse_call(&mut self, name: String) -> Result<Expr, ExprError> {
        let predicate = ManualPredicate::from_name(&name)
            .ok_or_else(|| ExprError::UnknownPredicate { name: name.clone() })?;

        let mut args = Vec::new();
        if self.eat(&TokenKind::LParen) {
            self.parse_args(&TokenKind::RParen, "`)`", &mut args)?;
        }

        if args.len() > MAX_CALL_ARGS {
            return Err(ExprError::TooManyArguments {
                name,
                count: args.len(),
                max: MAX_CALL_ARGS,
            });
        }

        Ok(Expr::Call(Call { predicate, args }))
    }

    /// Parse a comma-separated argument list up to and including `close`.
    /// Nested arrays are flattened into `out`.
    fn parse_args(
        &mut self,
        close: &TokenKind,
        close_desc: &'static str,
        out: &mut Vec<String>,
    ) -> Result<(), ExprError> {
        if self.eat(close) {
            return Ok(());
        }
        loop {
            self.parse_arg(out)?;
            if self.eat(close) {
                return Ok(());
            }
            self.expect(&TokenKind::Comma, close_desc)?;
        }
    }

    fn parse_arg(&mut self, out: &mut Vec<String>) -> Result<(), ExprError> {
        let token = self.next_token("an argument")?;
        match token.kind {
            TokenKind::Number(n) => out.push(n),
            TokenKind::Str(s) => out.push(s),
            TokenKind::LBracket => {
                self.enter()?;
                self.parse_args(&TokenKind::RBracket, "`]`", out)?;
                self.depth -= 1;
            }
            TokenKind::Ident(name) if name.eq_ignore_ascii_case("array") => {
                self.expect(&TokenKind::LParen, "`(`")?;
                self.enter()?;
                self.parse_args(&TokenKind::RParen, "`)`", out)?;
                self.depth -= 1;
            }
            other => {
                return Err(ExprError::UnexpectedToken {
                    expected: "a number, string or array",
                    found: other.describe(),
                    offset: token.offset,
                })
            }
        }
        Ok(())
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::DepthExceeded { max: MAX_DEPTH });
        }
        Ok(())
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek().is_some_and(|t| t.kind == *kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn next_token(&mut self, expected: &'static str) -> Result<Token, ExprError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| ExprError::UnexpectedToken {
                expected,
                found: "end of input".into(),
                offset: self.end,
            })?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, kind: &TokenKind, expected: &'static str) -> Result<(), ExprError> {
        let token = self.next_token(expected)?;
        if token.kind == *kind {
            Ok(())
        } else {
            Err(ExprError::UnexpectedToken {
                expected,
                found: token.kind.describe(),
                offset: token.offset,
            })
        }
    }
}

/// Single term → unwrapped (no wrapping overhead), otherwise `wrap(terms)`.
fn collapse(mut terms: Vec<Expr>, wrap: fn(Vec<Expr>) -> Expr) -> Expr {
    if terms.len() == 1 {
        if let Some(only) = terms.pop() {
            return only;
        }
    }
    wrap(terms)
}
