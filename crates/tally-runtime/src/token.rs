//! Token types for lexical analysis

use crate::span::Span;

/// Token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// Source text of this token (unescaped contents for strings)
    pub lexeme: String,
    /// Source location
    pub span: Span,
}

impl Token {
    /// Create a new token
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }
}

/// Classification of token types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    Number,
    String,
    True,
    False,
    Null,
    Identifier,

    // Keywords
    Let,
    Var,
    Fn,
    If,
    Else,
    While,
    Return,
    Break,
    Continue,
    Raise,
    Import,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Equal,
    EqualEqual,
    BangEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AmpAmp,
    PipePipe,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Semicolon,
    Comma,

    // Special
    /// Lexer error (a diagnostic was recorded)
    Error,
    /// End of file
    Eof,
}

impl TokenKind {
    /// Look up the keyword for an identifier, if any
    pub fn is_keyword(s: &str) -> Option<TokenKind> {
        match s {
            "let" => Some(TokenKind::Let),
            "var" => Some(TokenKind::Var),
            "fn" => Some(TokenKind::Fn),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "while" => Some(TokenKind::While),
            "return" => Some(TokenKind::Return),
            "break" => Some(TokenKind::Break),
            "continue" => Some(TokenKind::Continue),
            "raise" => Some(TokenKind::Raise),
            "import" => Some(TokenKind::Import),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "null" => Some(TokenKind::Null),
            _ => None,
        }
    }

    /// Whether this kind is a reserved word
    pub fn is_reserved(self) -> bool {
        matches!(
            self,
            TokenKind::Let
                | TokenKind::Var
                | TokenKind::Fn
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::While
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
                | TokenKind::Raise
                | TokenKind::Import
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        )
    }
}
