//! Expression parsing (Pratt parsing)

use crate::ast::*;
use crate::parser::{Parser, Precedence, MAX_NESTING_DEPTH};
use crate::token::TokenKind;

impl Parser {
    /// Parse an expression
    pub(super) fn parse_expression(&mut self) -> Result<Expr, ()> {
        self.parse_precedence(Precedence::Lowest)
    }

    /// Parse expression with given precedence
    ///
    /// Each infix operator in a left-associative chain nests the tree one
    /// level deeper, so the chain counts against the nesting limit too.
    pub(super) fn parse_precedence(&mut self, precedence: Precedence) -> Result<Expr, ()> {
        self.nested(|parser| {
            let mut left = parser.parse_prefix()?;
            let mut chained = 0;

            while precedence < parser.current_precedence() {
                chained += 1;
                if parser.depth + chained > MAX_NESTING_DEPTH {
                    parser.nesting_error();
                    return Err(());
                }
                left = parser.parse_infix(left)?;
            }

            Ok(left)
        })
    }

    /// Parse prefix expression
    fn parse_prefix(&mut self) -> Result<Expr, ()> {
        match self.peek().kind {
            TokenKind::Number => self.parse_number(),
            TokenKind::String => {
                let token = self.advance();
                Ok(Expr::Literal(Literal::String(token.lexeme.clone()), token.span))
            }
            TokenKind::True | TokenKind::False => {
                let token = self.advance();
                Ok(Expr::Literal(
                    Literal::Bool(token.kind == TokenKind::True),
                    token.span,
                ))
            }
            TokenKind::Null => {
                let span = self.advance().span;
                Ok(Expr::Literal(Literal::Null, span))
            }
            TokenKind::Identifier => {
                let token = self.advance();
                Ok(Expr::Identifier(Identifier {
                    name: token.lexeme.clone(),
                    span: token.span,
                }))
            }
            TokenKind::LeftParen => self.parse_group(),
            TokenKind::LeftBracket => self.parse_array_literal(),
            TokenKind::Minus | TokenKind::Bang => self.parse_unary(),
            _ => {
                self.error("Expected expression");
                Err(())
            }
        }
    }

    /// Parse infix expression
    fn parse_infix(&mut self, left: Expr) -> Result<Expr, ()> {
        match self.peek().kind {
            TokenKind::LeftParen => self.parse_call(left),
            TokenKind::LeftBracket => self.parse_index(left),
            _ => self.parse_binary(left),
        }
    }

    /// Get current token precedence
    pub(super) fn current_precedence(&self) -> Precedence {
        if self.is_at_end() {
            return Precedence::Lowest;
        }
        Self::precedence_of(self.peek().kind)
    }

    fn precedence_of(kind: TokenKind) -> Precedence {
        match kind {
            TokenKind::PipePipe => Precedence::Or,
            TokenKind::AmpAmp => Precedence::And,
            TokenKind::EqualEqual | TokenKind::BangEqual => Precedence::Equality,
            TokenKind::Less
            | TokenKind::LessEqual
            | TokenKind::Greater
            | TokenKind::GreaterEqual => Precedence::Comparison,
            TokenKind::Plus | TokenKind::Minus => Precedence::Term,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Factor,
            TokenKind::LeftParen | TokenKind::LeftBracket => Precedence::Call,
            _ => Precedence::Lowest,
        }
    }

    /// Parse number literal
    fn parse_number(&mut self) -> Result<Expr, ()> {
        let token = self.advance();
        let span = token.span;
        match token.lexeme.parse::<f64>() {
            Ok(value) => Ok(Expr::Literal(Literal::Number(value), span)),
            Err(_) => {
                self.error("Invalid number literal");
                Err(())
            }
        }
    }

    /// Parse grouped expression
    fn parse_group(&mut self) -> Result<Expr, ()> {
        let start_span = self.consume(TokenKind::LeftParen, "Expected '('")?.span;
        let expr = self.parse_expression()?;
        let end_span = self.consume(TokenKind::RightParen, "Expected ')'")?.span;

        Ok(Expr::Group(GroupExpr {
            expr: Box::new(expr),
            span: start_span.merge(end_span),
        }))
    }

    /// Parse array literal
    fn parse_array_literal(&mut self) -> Result<Expr, ()> {
        let start_span = self.consume(TokenKind::LeftBracket, "Expected '['")?.span;
        let mut elements = Vec::new();

        if !self.check(TokenKind::RightBracket) {
            loop {
                elements.push(self.parse_expression()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }

        let end_span = self.consume(TokenKind::RightBracket, "Expected ']'")?.span;

        Ok(Expr::ArrayLiteral(ArrayLiteral {
            elements,
            span: start_span.merge(end_span),
        }))
    }

    /// Parse unary expression
    fn parse_unary(&mut self) -> Result<Expr, ()> {
        let op_token = self.advance();
        let op_span = op_token.span;
        let op = if op_token.kind == TokenKind::Minus {
            UnaryOp::Negate
        } else {
            UnaryOp::Not
        };

        let operand = self.parse_precedence(Precedence::Unary)?;
        let operand_span = operand.span();

        Ok(Expr::Unary(UnaryExpr {
            op,
            expr: Box::new(operand),
            span: op_span.merge(operand_span),
        }))
    }

    /// Parse binary expression
    fn parse_binary(&mut self, left: Expr) -> Result<Expr, ()> {
        let left_span = left.span();
        let op_kind = self.advance().kind;

        let op = match op_kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Mod,
            TokenKind::EqualEqual => BinaryOp::Eq,
            TokenKind::BangEqual => BinaryOp::Ne,
            TokenKind::Less => BinaryOp::Lt,
            TokenKind::LessEqual => BinaryOp::Le,
            TokenKind::Greater => BinaryOp::Gt,
            TokenKind::GreaterEqual => BinaryOp::Ge,
            TokenKind::AmpAmp => BinaryOp::And,
            TokenKind::PipePipe => BinaryOp::Or,
            _ => {
                self.error("Expected binary operator");
                return Err(());
            }
        };

        let right = self.parse_precedence(Self::precedence_of(op_kind))?;
        let right_span = right.span();

        Ok(Expr::Binary(BinaryExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span: left_span.merge(right_span),
        }))
    }

    /// Parse call expression
    fn parse_call(&mut self, callee: Expr) -> Result<Expr, ()> {
        let callee_span = callee.span();
        self.consume(TokenKind::LeftParen, "Expected '('")?;
        let mut args = Vec::new();

        if !self.check(TokenKind::RightParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.match_token(TokenKind::Comma) {
                    break;
                }
            }
        }

        let end_span = self.consume(TokenKind::RightParen, "Expected ')'")?.span;

        Ok(Expr::Call(CallExpr {
            callee: Box::new(callee),
            args,
            span: callee_span.merge(end_span),
        }))
    }

    /// Parse index expression
    fn parse_index(&mut self, target: Expr) -> Result<Expr, ()> {
        let target_span = target.span();
        self.consume(TokenKind::LeftBracket, "Expected '['")?;
        let index = self.parse_expression()?;
        let end_span = self.consume(TokenKind::RightBracket, "Expected ']'")?.span;

        Ok(Expr::Index(IndexExpr {
            target: Box::new(target),
            index: Box::new(index),
            span: target_span.merge(end_span),
        }))
    }
}
