//! Statement parsing for QMI kernel bodies.

use anneal_ir::AnnealDirection;

use super::Parser;
use crate::ast::{Statement, Value};
use crate::error::{CompileError, CompileResult};
use crate::lexer::Token;

impl Parser {
    /// Parse a statement.
    pub(super) fn parse_statement(&mut self) -> CompileResult<Statement> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| CompileError::UnexpectedEof("statement".into()))?;

        match token {
            Token::IntLiteral(_) | Token::FloatLiteral(_) | Token::Minus => self.parse_term(),
            Token::Anneal => self.parse_anneal(),
            Token::Identifier(_) if self.peek_second() == Some(&Token::LParen) => self.parse_call(),
            Token::Identifier(_) => self.parse_term(),
            _ => Err(self.unexpected("statement", &token)),
        }
    }

    /// Parse `a b weight;`.
    fn parse_term(&mut self) -> CompileResult<Statement> {
        let a = self.parse_qubit_index()?;
        let b = self.parse_qubit_index()?;
        let weight = self.parse_value()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Term { a, b, weight })
    }

    /// Parse a qubit index: a non-negative integer that fits in `u32`.
    fn parse_qubit_index(&mut self) -> CompileResult<u32> {
        let line = self.line();
        let malformed = |found: String| CompileError::MalformedInstruction {
            line,
            message: format!("qubit index must be a non-negative integer, found '{found}'"),
        };

        match self.advance() {
            Some(Token::IntLiteral(v)) => u32::try_from(v).map_err(|_| malformed(v.to_string())),
            Some(Token::Minus) => {
                let rest = self.advance().map(|t| t.to_string()).unwrap_or_default();
                Err(malformed(format!("-{rest}")))
            }
            Some(other) => Err(malformed(other.to_string())),
            None => Err(CompileError::UnexpectedEof("qubit index".into())),
        }
    }

    /// Parse `["-"] number | identifier`.
    #[allow(clippy::cast_precision_loss)]
    pub(super) fn parse_value(&mut self) -> CompileResult<Value> {
        let negative = self.consume(&Token::Minus);
        let line = self.line();
        let sign = if negative { -1.0 } else { 1.0 };

        match self.advance() {
            Some(Token::IntLiteral(v)) => Ok(Value::Number(sign * v as f64)),
            Some(Token::FloatLiteral(v)) => Ok(Value::Number(sign * v)),
            Some(Token::Identifier(name)) if !negative => Ok(Value::Ident(name)),
            Some(other) => Err(CompileError::UnexpectedToken {
                line,
                expected: if negative { "number" } else { "number or identifier" }.into(),
                found: other.to_string(),
            }),
            None => Err(CompileError::UnexpectedEof("value".into())),
        }
    }

    /// Parse `anneal ta tp tq [forward|reverse];`.
    fn parse_anneal(&mut self) -> CompileResult<Statement> {
        self.expect(Token::Anneal)?;
        let ta = self.parse_value()?;
        let tp = self.parse_value()?;
        let tq = self.parse_value()?;

        let direction = if self.consume(&Token::Reverse) {
            AnnealDirection::Reverse
        } else {
            self.consume(&Token::Forward);
            AnnealDirection::Forward
        };
        self.expect(Token::Semicolon)?;

        Ok(Statement::Anneal {
            ta,
            tp,
            tq,
            direction,
        })
    }

    /// Parse `name(args);`.
    fn parse_call(&mut self) -> CompileResult<Statement> {
        let callee = self.parse_identifier()?;
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if !self.check(&Token::RParen) {
            args.push(self.parse_value()?);
            while self.consume(&Token::Comma) {
                args.push(self.parse_value()?);
            }
        }
        self.expect(Token::RParen)?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Call { callee, args })
    }
}
