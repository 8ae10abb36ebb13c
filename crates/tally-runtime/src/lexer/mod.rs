//! Lexical analysis (tokenization)
//!
//! The lexer converts unit source code into a stream of tokens, each tagged
//! with the line it starts on so runtime errors can point back at statements.

use crate::diagnostic::Diagnostic;
use crate::span::Span;
use crate::token::{Token, TokenKind};

mod literals;

/// Lexer state for tokenizing source code
pub struct Lexer {
    /// Original source code
    pub(super) source: String,
    /// Characters of source code
    pub(super) chars: Vec<char>,
    /// Current position in chars
    pub(super) current: usize,
    /// Current line number (1-indexed)
    pub(super) line: u32,
    /// Start position of current token
    pub(super) start_pos: usize,
    /// Start line of current token
    pub(super) start_line: u32,
    /// Collected diagnostics
    pub(super) diagnostics: Vec<Diagnostic>,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let chars: Vec<char> = source.chars().collect();
        Self {
            source,
            chars,
            current: 0,
            line: 1,
            start_pos: 0,
            start_line: 1,
            diagnostics: Vec::new(),
        }
    }

    /// Tokenize the source code, returning tokens and any diagnostics
    pub fn tokenize(&mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        (tokens, std::mem::take(&mut self.diagnostics))
    }

    /// Scan the next token
    fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        self.start_pos = self.current;
        self.start_line = self.line;

        if self.is_at_end() {
            return self.make_token(TokenKind::Eof, "");
        }

        let c = self.advance();

        match c {
            '(' => self.make_token(TokenKind::LeftParen, "("),
            ')' => self.make_token(TokenKind::RightParen, ")"),
            '{' => self.make_token(TokenKind::LeftBrace, "{"),
            '}' => self.make_token(TokenKind::RightBrace, "}"),
            '[' => self.make_token(TokenKind::LeftBracket, "["),
            ']' => self.make_token(TokenKind::RightBracket, "]"),
            ';' => self.make_token(TokenKind::Semicolon, ";"),
            ',' => self.make_token(TokenKind::Comma, ","),
            '+' => self.make_token(TokenKind::Plus, "+"),
            '-' => self.make_token(TokenKind::Minus, "-"),
            '*' => self.make_token(TokenKind::Star, "*"),
            '/' => self.make_token(TokenKind::Slash, "/"),
            '%' => self.make_token(TokenKind::Percent, "%"),

            '=' => {
                if self.match_char('=') {
                    self.make_token(TokenKind::EqualEqual, "==")
                } else {
                    self.make_token(TokenKind::Equal, "=")
                }
            }
            '!' => {
                if self.match_char('=') {
                    self.make_token(TokenKind::BangEqual, "!=")
                } else {
                    self.make_token(TokenKind::Bang, "!")
                }
            }
            '<' => {
                if self.match_char('=') {
                    self.make_token(TokenKind::LessEqual, "<=")
                } else {
                    self.make_token(TokenKind::Less, "<")
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.make_token(TokenKind::GreaterEqual, ">=")
                } else {
                    self.make_token(TokenKind::Greater, ">")
                }
            }
            '&' => {
                if self.match_char('&') {
                    self.make_token(TokenKind::AmpAmp, "&&")
                } else {
                    self.error_token("Unexpected character '&' (did you mean '&&'?)")
                }
            }
            '|' => {
                if self.match_char('|') {
                    self.make_token(TokenKind::PipePipe, "||")
                } else {
                    self.error_token("Unexpected character '|' (did you mean '||'?)")
                }
            }

            '"' => self.string(),

            c if c.is_ascii_digit() => self.number(),

            c if c.is_alphabetic() || c == '_' => self.identifier(),

            _ => self.error_token(&format!("Unexpected character '{}'", c)),
        }
    }

    /// Skip whitespace and comments
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            if self.is_at_end() {
                return;
            }

            match self.peek() {
                ' ' | '\r' | '\t' => {
                    self.advance();
                }
                '\n' => {
                    self.advance();
                    self.line += 1;
                }
                '/' => {
                    if self.peek_next() == Some('/') {
                        while !self.is_at_end() && self.peek() != '\n' {
                            self.advance();
                        }
                    } else if self.peek_next() == Some('*') {
                        let comment_start_line = self.line;
                        self.start_pos = self.current;
                        self.advance(); // /
                        self.advance(); // *

                        let mut terminated = false;
                        while !self.is_at_end() {
                            if self.peek() == '*' && self.peek_next() == Some('/') {
                                self.advance();
                                self.advance();
                                terminated = true;
                                break;
                            }
                            if self.peek() == '\n' {
                                self.line += 1;
                            }
                            self.advance();
                        }

                        if !terminated {
                            let span = Span::new(self.start_pos, self.current, comment_start_line);
                            let snippet = self.get_line_snippet(comment_start_line);
                            self.diagnostics.push(
                                Diagnostic::error_with_code(
                                    "TL1004",
                                    "Unterminated multi-line comment",
                                    span,
                                )
                                .with_snippet(snippet)
                                .with_help("add '*/' to close the multi-line comment"),
                            );
                        }
                    } else {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    // === Character navigation ===

    /// Advance to next character and return it
    pub(super) fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        c
    }

    /// Peek at current character without advancing
    pub(super) fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.current]
        }
    }

    /// Peek at next character (current + 1)
    pub(super) fn peek_next(&self) -> Option<char> {
        self.chars.get(self.current + 1).copied()
    }

    /// Consume the current character if it matches
    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.chars[self.current] != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    /// Check if we've reached the end of source
    pub(super) fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    // === Token creation ===

    /// Create a token with the given kind and lexeme
    pub(super) fn make_token(&self, kind: TokenKind, lexeme: &str) -> Token {
        Token::new(
            kind,
            lexeme,
            Span::new(self.start_pos, self.current, self.start_line),
        )
    }

    /// Create an error token and record a diagnostic with a specific code
    pub(super) fn error_token_with_code(&mut self, code: &str, message: &str) -> Token {
        let span = Span::new(
            self.start_pos,
            self.current.max(self.start_pos + 1),
            self.start_line,
        );
        let snippet = self.get_line_snippet(self.start_line);

        self.diagnostics.push(
            Diagnostic::error_with_code(code, message, span).with_snippet(snippet),
        );

        Token::new(TokenKind::Error, message, span)
    }

    /// Unexpected or invalid character (TL1001)
    pub(super) fn error_token(&mut self, message: &str) -> Token {
        self.error_token_with_code("TL1001", message)
    }

    /// Unterminated string (TL1002)
    pub(super) fn error_unterminated_string(&mut self) -> Token {
        self.error_token_with_code("TL1002", "Unterminated string literal")
    }

    /// Invalid escape sequence (TL1003)
    pub(super) fn error_invalid_escape(&mut self, escape_char: char) -> Token {
        self.error_token_with_code(
            "TL1003",
            &format!("Invalid escape sequence '\\{}'", escape_char),
        )
    }

    /// Get the source line for a given line number
    fn get_line_snippet(&self, line: u32) -> String {
        self.source
            .lines()
            .nth(line.saturating_sub(1) as usize)
            .unwrap_or("")
            .to_string()
    }
}
