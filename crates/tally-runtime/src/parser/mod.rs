//! Parsing (tokens to AST)
//!
//! Pratt parsing for expressions and recursive descent for statements.

mod expr;
mod stmt;

use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::token::{Token, TokenKind};

/// Deepest nesting of expressions and blocks a unit may use
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parser state for building AST from tokens
pub struct Parser {
    pub(super) tokens: Vec<Token>,
    pub(super) current: usize,
    pub(super) diagnostics: Vec<Diagnostic>,
    /// Current nesting of expressions and blocks
    pub(super) depth: usize,
}

/// Operator precedence levels for Pratt parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum Precedence {
    Lowest,
    Or,         // ||
    And,        // &&
    Equality,   // == !=
    Comparison, // < <= > >=
    Term,       // + -
    Factor,     // * / %
    Unary,      // ! -
    Call,       // () []
}

impl Parser {
    /// Create a new parser for the given tokens
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            diagnostics: Vec::new(),
            depth: 0,
        }
    }

    /// Parse tokens into an AST
    pub fn parse(&mut self) -> (Program, Vec<Diagnostic>) {
        let mut items = Vec::new();

        while !self.is_at_end() {
            match self.parse_item() {
                Ok(item) => items.push(item),
                Err(_) => self.synchronize(),
            }
        }

        (Program { items }, std::mem::take(&mut self.diagnostics))
    }

    /// Parse a top-level item (function, import, or statement)
    fn parse_item(&mut self) -> Result<Item, ()> {
        if self.check(TokenKind::Import) {
            Ok(Item::Import(self.parse_import()?))
        } else if self.check(TokenKind::Fn) {
            Ok(Item::Function(self.parse_function()?))
        } else {
            Ok(Item::Statement(self.parse_statement()?))
        }
    }

    /// Parse a function declaration
    fn parse_function(&mut self) -> Result<FunctionDecl, ()> {
        let fn_span = self.consume(TokenKind::Fn, "Expected 'fn'")?.span;

        let name_token = self.consume_identifier("a function name")?;
        let name = Identifier {
            name: name_token.lexeme.clone(),
            span: name_token.span,
        };

        self.consume(TokenKind::LeftParen, "Expected '(' after function name")?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                let param = self.consume_identifier("a parameter name")?;
                params.push(Identifier {
                    name: param.lexeme.clone(),
                    span: param.span,
                });

                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }

        self.consume(TokenKind::RightParen, "Expected ')' after parameters")?;

        let body = self.parse_block()?;
        let end_span = body.span;

        Ok(FunctionDecl {
            name,
            params,
            body,
            span: fn_span.merge(end_span),
        })
    }

    /// Parse an import declaration
    ///
    /// Syntax: `import "./helpers.tl";`
    fn parse_import(&mut self) -> Result<ImportDecl, ()> {
        let import_span = self.consume(TokenKind::Import, "Expected 'import'")?.span;
        let source = self
            .consume(TokenKind::String, "Expected module path string")?
            .lexeme
            .clone();
        let end_span = self
            .consume(TokenKind::Semicolon, "Expected ';' after import")?
            .span;

        Ok(ImportDecl {
            source,
            span: import_span.merge(end_span),
        })
    }

    // === Token navigation ===

    /// Advance to next token
    pub(super) fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Peek at current token
    pub(super) fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    /// Check if current token matches kind
    pub(super) fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    /// Match and consume token if it matches
    pub(super) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume token of given kind or error
    pub(super) fn consume(&mut self, kind: TokenKind, message: &str) -> Result<&Token, ()> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            self.error(message);
            Err(())
        }
    }

    /// Consume an identifier, rejecting reserved words
    pub(super) fn consume_identifier(&mut self, context: &str) -> Result<&Token, ()> {
        let current = self.peek();

        if current.kind.is_reserved() {
            let message = format!(
                "Cannot use reserved keyword '{}' as {}",
                current.lexeme, context
            );
            self.error(&message);
            Err(())
        } else if current.kind == TokenKind::Identifier {
            Ok(self.advance())
        } else {
            self.error(&format!("Expected {}", context));
            Err(())
        }
    }

    /// Check if at end of token stream
    pub(super) fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len() || self.tokens[self.current].kind == TokenKind::Eof
    }

    /// Record an error at the current token
    pub(super) fn error(&mut self, message: &str) {
        let span = self.peek().span;
        self.diagnostics.push(
            Diagnostic::error_with_code("TL1000", message, span)
                .with_help("check your syntax for typos or missing tokens"),
        );
    }

    /// Record a nesting-limit error at the current token (TL1005)
    pub(super) fn nesting_error(&mut self) {
        let span = self.peek().span;
        self.diagnostics.push(
            Diagnostic::error_with_code(
                "TL1005",
                format!("Nesting deeper than {} levels", MAX_NESTING_DEPTH),
                span,
            )
            .with_help("split the expression or block into smaller pieces"),
        );
    }

    /// Run `parse` one nesting level deeper, failing past `MAX_NESTING_DEPTH`
    pub(super) fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ()>,
    ) -> Result<T, ()> {
        if self.depth >= MAX_NESTING_DEPTH {
            self.nesting_error();
            return Err(());
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Skip tokens until a likely statement boundary
    pub(super) fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.tokens[self.current - 1].kind == TokenKind::Semicolon {
                return;
            }

            match self.peek().kind {
                TokenKind::Fn
                | TokenKind::Let
                | TokenKind::Var
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Return
                | TokenKind::Raise
                | TokenKind::Import => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}
