//! Parser for QMI kernel source.

mod lowering;
mod statement;

pub(crate) use lowering::lower_to_kernels;

use anneal_ir::Kernel;
use tracing::debug;

use crate::ast::{KernelDecl, Param, Program};
use crate::error::{CompileError, CompileResult};
use crate::lexer::{LexError, SpannedToken, Token, tokenize};

/// Compile QMI source into kernels, in declaration order.
///
/// Called kernels are inlined into their callers; every kernel is still
/// returned on its own.
pub fn compile(source: &str) -> CompileResult<Vec<Kernel>> {
    let program = parse_ast(source)?;
    let kernels = lower_to_kernels(&program)?;
    debug!(kernels = kernels.len(), "compiled QMI source");
    Ok(kernels)
}

/// Parse QMI source into its syntax tree without lowering.
pub fn parse_ast(source: &str) -> CompileResult<Program> {
    let mut parser = Parser::new(source)?;
    parser.parse_program()
}

/// Parser state.
pub(super) struct Parser {
    pub(super) tokens: Vec<SpannedToken>,
    pub(super) pos: usize,
}

impl Parser {
    /// Create a new parser from source.
    fn new(source: &str) -> CompileResult<Self> {
        let mut tokens = Vec::new();
        for result in tokenize(source) {
            match result {
                Ok(t) => tokens.push(t),
                Err(LexError::Invalid { line, slice }) => {
                    return Err(CompileError::LexerError {
                        line,
                        message: format!("Invalid token: '{slice}'"),
                    });
                }
                Err(LexError::IntegerOverflow { line, literal }) => {
                    return Err(CompileError::MalformedInstruction {
                        line,
                        message: format!("integer literal '{literal}' is out of range"),
                    });
                }
            }
        }
        Ok(Self { tokens, pos: 0 })
    }

    /// Check if we've reached the end.
    pub(super) fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Line of the current token (or of the last one at end of input).
    pub(super) fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    /// Peek at the current token.
    pub(super) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Peek at the token after the current one.
    pub(super) fn peek_second(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1).map(|t| &t.token)
    }

    /// Advance and return the current token.
    pub(super) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?.token.clone();
        self.pos += 1;
        Some(token)
    }

    /// Build an `UnexpectedToken` error at the current line.
    pub(super) fn unexpected(&self, expected: &str, found: &Token) -> CompileError {
        CompileError::UnexpectedToken {
            line: self.line(),
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    /// Expect a specific token.
    #[allow(clippy::needless_pass_by_value)]
    pub(super) fn expect(&mut self, expected: Token) -> CompileResult<()> {
        let line = self.line();
        let found = self
            .advance()
            .ok_or_else(|| CompileError::UnexpectedEof(format!("expected {expected}")))?;

        if std::mem::discriminant(&found) != std::mem::discriminant(&expected) {
            return Err(CompileError::UnexpectedToken {
                line,
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        Ok(())
    }

    /// Check if current token matches.
    pub(super) fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    /// Consume token if it matches.
    pub(super) fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Parse the entire program.
    fn parse_program(&mut self) -> CompileResult<Program> {
        let mut kernels = Vec::new();
        while !self.is_eof() {
            kernels.push(self.parse_kernel()?);
        }
        Ok(Program { kernels })
    }

    /// Parse `__qpu__ name(params) { body }`.
    fn parse_kernel(&mut self) -> CompileResult<KernelDecl> {
        let line = self.line();
        self.expect(Token::Qpu)?;
        let name = self.parse_identifier()?;

        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            params.push(self.parse_param()?);
            while self.consume(&Token::Comma) {
                params.push(self.parse_param()?);
            }
        }
        self.expect(Token::RParen)?;

        self.expect(Token::LBrace)?;
        let mut body = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.is_eof() {
                return Err(CompileError::UnexpectedEof(format!(
                    "closing '}}' of kernel '{name}'"
                )));
            }
            body.push(self.parse_statement()?);
        }
        self.expect(Token::RBrace)?;

        Ok(KernelDecl {
            name,
            params,
            body,
            line,
        })
    }

    /// Parse `Type name`.
    fn parse_param(&mut self) -> CompileResult<Param> {
        let ty = self.parse_identifier()?;
        let name = self.parse_identifier()?;
        Ok(Param { ty, name })
    }

    /// Parse an identifier.
    pub(super) fn parse_identifier(&mut self) -> CompileResult<String> {
        let line = self.line();
        match self.advance() {
            Some(Token::Identifier(s)) => Ok(s),
            Some(other) => Err(CompileError::UnexpectedToken {
                line,
                expected: "identifier".into(),
                found: other.to_string(),
            }),
            None => Err(CompileError::UnexpectedEof("identifier".into())),
        }
    }
}
