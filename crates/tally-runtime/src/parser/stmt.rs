//! Statement parsing

use crate::ast::*;
use crate::parser::Parser;
use crate::token::TokenKind;

impl Parser {
    /// Parse a statement
    pub(super) fn parse_statement(&mut self) -> Result<Stmt, ()> {
        match self.peek().kind {
            TokenKind::Let | TokenKind::Var => self.parse_var_decl(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::Raise => self.parse_raise_stmt(),
            TokenKind::Break => {
                let span = self.advance().span;
                let end = self.consume(TokenKind::Semicolon, "Expected ';' after 'break'")?.span;
                Ok(Stmt::Break(span.merge(end)))
            }
            TokenKind::Continue => {
                let span = self.advance().span;
                let end = self
                    .consume(TokenKind::Semicolon, "Expected ';' after 'continue'")?
                    .span;
                Ok(Stmt::Continue(span.merge(end)))
            }
            TokenKind::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Fn => {
                self.error("Functions can only be declared at the top level");
                Err(())
            }
            TokenKind::Import => {
                self.error("Imports can only appear at the top level");
                Err(())
            }
            _ => self.parse_assign_or_expr_stmt(),
        }
    }

    /// Parse a block `{ ... }`
    pub(super) fn parse_block(&mut self) -> Result<Block, ()> {
        self.nested(Self::parse_block_body)
    }

    fn parse_block_body(&mut self) -> Result<Block, ()> {
        let start_span = self.consume(TokenKind::LeftBrace, "Expected '{'")?.span;
        let mut statements = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        let end_span = self.consume(TokenKind::RightBrace, "Expected '}'")?.span;

        Ok(Block {
            statements,
            span: start_span.merge(end_span),
        })
    }

    /// Parse a variable declaration
    fn parse_var_decl(&mut self) -> Result<Stmt, ()> {
        let keyword = self.advance();
        let keyword_span = keyword.span;
        let mutable = keyword.kind == TokenKind::Var;

        let name_token = self.consume_identifier("a variable name")?;
        let name = Identifier {
            name: name_token.lexeme.clone(),
            span: name_token.span,
        };

        self.consume(TokenKind::Equal, "Expected '=' in variable declaration")?;
        let init = self.parse_expression()?;
        let end_span = self
            .consume(TokenKind::Semicolon, "Expected ';' after variable declaration")?
            .span;

        Ok(Stmt::VarDecl(VarDecl {
            mutable,
            name,
            init,
            span: keyword_span.merge(end_span),
        }))
    }

    /// Parse assignment or expression statement
    fn parse_assign_or_expr_stmt(&mut self) -> Result<Stmt, ()> {
        let expr = self.parse_expression()?;
        let expr_span = expr.span();

        if self.match_token(TokenKind::Equal) {
            let target = match expr {
                Expr::Identifier(ident) => AssignTarget::Name(ident),
                Expr::Index(idx) => AssignTarget::Index {
                    target: idx.target,
                    index: idx.index,
                    span: idx.span,
                },
                _ => {
                    self.error("Invalid assignment target");
                    return Err(());
                }
            };
            let value = self.parse_expression()?;
            let end_span = self
                .consume(TokenKind::Semicolon, "Expected ';' after assignment")?
                .span;

            return Ok(Stmt::Assign(Assign {
                target,
                value,
                span: expr_span.merge(end_span),
            }));
        }

        let end_span = self
            .consume(TokenKind::Semicolon, "Expected ';' after expression")?
            .span;
        Ok(Stmt::Expr(ExprStmt {
            expr,
            span: expr_span.merge(end_span),
        }))
    }

    /// Parse if statement (with `else if` chains)
    fn parse_if_stmt(&mut self) -> Result<Stmt, ()> {
        let if_span = self.consume(TokenKind::If, "Expected 'if'")?.span;

        self.consume(TokenKind::LeftParen, "Expected '(' after 'if'")?;
        let cond = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after if condition")?;

        let then_block = self.parse_block()?;
        let mut end_span = then_block.span;

        let else_block = if self.match_token(TokenKind::Else) {
            let block = if self.check(TokenKind::If) {
                let nested = self.nested(Self::parse_if_stmt)?;
                let span = nested.span();
                Block {
                    statements: vec![nested],
                    span,
                }
            } else {
                self.parse_block()?
            };
            end_span = block.span;
            Some(block)
        } else {
            None
        };

        Ok(Stmt::If(IfStmt {
            cond,
            then_block,
            else_block,
            span: if_span.merge(end_span),
        }))
    }

    /// Parse while statement
    fn parse_while_stmt(&mut self) -> Result<Stmt, ()> {
        let while_span = self.consume(TokenKind::While, "Expected 'while'")?.span;

        self.consume(TokenKind::LeftParen, "Expected '(' after 'while'")?;
        let cond = self.parse_expression()?;
        self.consume(TokenKind::RightParen, "Expected ')' after while condition")?;

        let body = self.parse_block()?;
        let body_span = body.span;

        Ok(Stmt::While(WhileStmt {
            cond,
            body,
            span: while_span.merge(body_span),
        }))
    }

    /// Parse return statement
    fn parse_return_stmt(&mut self) -> Result<Stmt, ()> {
        let return_span = self.consume(TokenKind::Return, "Expected 'return'")?.span;

        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        let end_span = self
            .consume(TokenKind::Semicolon, "Expected ';' after return")?
            .span;

        Ok(Stmt::Return(ReturnStmt {
            value,
            span: return_span.merge(end_span),
        }))
    }

    /// Parse raise statement
    fn parse_raise_stmt(&mut self) -> Result<Stmt, ()> {
        let raise_span = self.consume(TokenKind::Raise, "Expected 'raise'")?.span;
        let value = self.parse_expression()?;
        let end_span = self
            .consume(TokenKind::Semicolon, "Expected ';' after raise")?
            .span;

        Ok(Stmt::Raise(RaiseStmt {
            value,
            span: raise_span.merge(end_span),
        }))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse_stmts(source: &str) -> Vec<Stmt> {
        let (tokens, _) = Lexer::new(source).tokenize();
        let (program, diagnostics) = Parser::new(tokens).parse();
        assert!(diagnostics.is_empty(), "parse errors: {:?}", diagnostics);
        program
            .items
            .into_iter()
            .map(|item| match item {
                Item::Statement(stmt) => stmt,
                other => panic!("Expected statement, got {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_var_decl_mutability() {
        let stmts = parse_stmts("let a = 1; var b = 2;");
        assert!(matches!(&stmts[0], Stmt::VarDecl(v) if !v.mutable));
        assert!(matches!(&stmts[1], Stmt::VarDecl(v) if v.mutable));
    }

    #[test]
    fn test_index_assignment() {
        let stmts = parse_stmts("xs[0] = 5;");
        match &stmts[0] {
            Stmt::Assign(assign) => assert!(matches!(assign.target, AssignTarget::Index { .. })),
            other => panic!("Expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn test_else_if_chain() {
        let stmts = parse_stmts("if (a) { } else if (b) { } else { x; }");
        match &stmts[0] {
            Stmt::If(outer) => {
                let else_block = outer.else_block.as_ref().expect("else block");
                assert!(matches!(&else_block.statements[0], Stmt::If(inner) if inner.else_block.is_some()));
            }
            other => panic!("Expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_raise_statement() {
        let stmts = parse_stmts("raise \"boom\";");
        assert!(matches!(&stmts[0], Stmt::Raise(_)));
    }

    #[test]
    fn test_while_with_break_and_continue() {
        let stmts = parse_stmts("while (true) { continue; break; }");
        match &stmts[0] {
            Stmt::While(w) => assert_eq!(w.body.statements.len(), 2),
            other => panic!("Expected while, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_function_rejected() {
        let (tokens, _) = Lexer::new("fn outer() { fn inner() { } }").tokenize();
        let (_, diagnostics) = Parser::new(tokens).parse();
        assert!(diagnostics
            .iter()
            .any(|d| d.message.contains("top level")));
    }
}
