//! Lexer for QMI kernel source.

use logos::Logos;

/// Tokens of the QMI kernel language.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
pub enum Token {
    // Keywords
    #[token("__qpu__")]
    Qpu,

    #[token("anneal")]
    Anneal,

    #[token("forward")]
    Forward,

    #[token("reverse")]
    Reverse,

    // Literals
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    FloatLiteral(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    IntLiteral(u64),

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Punctuation
    #[token("-")]
    Minus,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Qpu => write!(f, "__qpu__"),
            Token::Anneal => write!(f, "anneal"),
            Token::Forward => write!(f, "forward"),
            Token::Reverse => write!(f, "reverse"),
            Token::FloatLiteral(v) => write!(f, "{v}"),
            Token::IntLiteral(v) => write!(f, "{v}"),
            Token::Identifier(s) => write!(f, "{s}"),
            Token::Minus => write!(f, "-"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Semicolon => write!(f, ";"),
            Token::Comma => write!(f, ","),
        }
    }
}

/// A token with its position in the source.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    #[allow(dead_code)]
    pub span: std::ops::Range<usize>,
    /// 1-based source line of the token start.
    pub line: usize,
}

/// A stretch of source that is not a token.
#[derive(Debug, Clone, PartialEq)]
pub enum LexError {
    /// Characters that start no token.
    Invalid { line: usize, slice: String },
    /// Integer literal too large for `u64`.
    IntegerOverflow { line: usize, literal: String },
}

/// Tokenize QMI source.
pub fn tokenize(source: &str) -> Vec<Result<SpannedToken, LexError>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut counted = 0;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        line += source[counted..span.start].matches('\n').count();
        counted = span.start;

        if let Ok(token) = result {
            tokens.push(Ok(SpannedToken { token, span, line }));
        } else {
            let slice = source[span.clone()].to_string();
            let error = if slice.bytes().all(|b| b.is_ascii_digit()) {
                LexError::IntegerOverflow {
                    line,
                    literal: slice,
                }
            } else {
                LexError::Invalid { line, slice }
            };
            tokens.push(Err(error));
        }
    }

    tokens
}
