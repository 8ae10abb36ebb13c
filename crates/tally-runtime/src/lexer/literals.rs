//! Literal scanning for the lexer

use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

impl Lexer {
    /// Scan a string literal
    pub(super) fn string(&mut self) -> Token {
        let mut value = String::new();
        let mut error_token = None;

        while !self.is_at_end() && self.peek() != '"' {
            if self.peek() == '\n' {
                self.line += 1;
            }

            if self.peek() == '\\' {
                self.advance();
                if self.is_at_end() {
                    return self.error_unterminated_string();
                }

                let escape_char = self.peek();
                let escaped = match escape_char {
                    'n' => '\n',
                    'r' => '\r',
                    't' => '\t',
                    '\\' => '\\',
                    '"' => '"',
                    _ => {
                        // Keep scanning to find the end of the string
                        if error_token.is_none() {
                            error_token = Some(self.error_invalid_escape(escape_char));
                        }
                        self.advance();
                        continue;
                    }
                };

                self.advance();
                value.push(escaped);
            } else {
                value.push(self.advance());
            }
        }

        if self.is_at_end() {
            return self.error_unterminated_string();
        }

        self.advance(); // closing "

        match error_token {
            Some(err) => err,
            None => self.make_token(TokenKind::String, &value),
        }
    }

    /// Scan a number literal (integer or decimal)
    pub(super) fn number(&mut self) -> Token {
        let start = self.current - 1;

        while !self.is_at_end() && self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(); // .
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let lexeme: String = self.chars[start..self.current].iter().collect();
        self.make_token(TokenKind::Number, &lexeme)
    }

    /// Scan an identifier or keyword
    pub(super) fn identifier(&mut self) -> Token {
        let start = self.current - 1;

        while !self.is_at_end() {
            let c = self.peek();
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let lexeme: String = self.chars[start..self.current].iter().collect();
        let kind = TokenKind::is_keyword(&lexeme).unwrap_or(TokenKind::Identifier);

        self.make_token(kind, &lexeme)
    }
}
