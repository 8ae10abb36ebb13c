//! Statement execution

use crate::ast::*;
use crate::interpreter::{ControlFlow, Interpreter};
use crate::value::{ErrorKind, RuntimeError, Value};

impl Interpreter {
    /// Execute a statement, attaching a traceback to any error it raises
    pub(super) fn exec_statement(&mut self, stmt: &Stmt) -> Result<(), RuntimeError> {
        self.set_line(stmt.span().line);
        self.eval_statement(stmt).map_err(|e| self.with_traceback(e))
    }

    fn eval_statement(&mut self, stmt: &Stmt) -> Result<(), RuntimeError> {
        match stmt {
            Stmt::VarDecl(var) => {
                let value = self.eval_expr(&var.init)?;
                self.declare(var.name.name.clone(), value, var.mutable);
                Ok(())
            }
            Stmt::Assign(assign) => self.eval_assign(assign),
            Stmt::If(if_stmt) => self.eval_if(if_stmt),
            Stmt::While(while_stmt) => self.eval_while(while_stmt),
            Stmt::Return(return_stmt) => {
                let value = match &return_stmt.value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                self.control_flow = ControlFlow::Return(value);
                Ok(())
            }
            Stmt::Break(_) => self.loop_signal(ControlFlow::Break, "break"),
            Stmt::Continue(_) => self.loop_signal(ControlFlow::Continue, "continue"),
            Stmt::Raise(raise) => {
                let value = self.eval_expr(&raise.value)?;
                Err(RuntimeError::new(ErrorKind::Raised, value.to_string()))
            }
            Stmt::Block(block) => self.eval_block(block),
            Stmt::Expr(expr_stmt) => self.eval_expr(&expr_stmt.expr).map(|_| ()),
        }
    }

    fn loop_signal(&mut self, signal: ControlFlow, keyword: &str) -> Result<(), RuntimeError> {
        if self.loop_depth == 0 {
            return Err(RuntimeError::type_error(format!(
                "'{}' outside loop",
                keyword
            )));
        }
        self.control_flow = signal;
        Ok(())
    }

    /// Evaluate an assignment
    fn eval_assign(&mut self, assign: &Assign) -> Result<(), RuntimeError> {
        let value = self.eval_expr(&assign.value)?;

        match &assign.target {
            AssignTarget::Name(id) => self.set_variable(&id.name, value),
            AssignTarget::Index { target, index, .. } => self.assign_at_index(target, index, value),
        }
    }

    /// Evaluate a block in its own scope
    pub(super) fn eval_block(&mut self, block: &Block) -> Result<(), RuntimeError> {
        self.push_scope();
        let result = self.eval_block_statements(block);
        self.pop_scope();
        result
    }

    fn eval_block_statements(&mut self, block: &Block) -> Result<(), RuntimeError> {
        for stmt in &block.statements {
            self.exec_statement(stmt)?;
            if self.control_flow != ControlFlow::None {
                break;
            }
        }
        Ok(())
    }

    /// Evaluate an if statement
    fn eval_if(&mut self, if_stmt: &IfStmt) -> Result<(), RuntimeError> {
        if self.eval_condition(&if_stmt.cond, "if")? {
            self.eval_block(&if_stmt.then_block)
        } else if let Some(else_block) = &if_stmt.else_block {
            self.eval_block(else_block)
        } else {
            Ok(())
        }
    }

    /// Evaluate a while loop
    fn eval_while(&mut self, while_stmt: &WhileStmt) -> Result<(), RuntimeError> {
        self.loop_depth += 1;
        let result = self.eval_while_loop(while_stmt);
        self.loop_depth -= 1;
        result
    }

    fn eval_while_loop(&mut self, while_stmt: &WhileStmt) -> Result<(), RuntimeError> {
        loop {
            self.set_line(while_stmt.span.line);
            if !self.eval_condition(&while_stmt.cond, "while")? {
                return Ok(());
            }

            self.eval_block(&while_stmt.body)?;

            match self.control_flow {
                ControlFlow::Break => {
                    self.control_flow = ControlFlow::None;
                    return Ok(());
                }
                ControlFlow::Continue => self.control_flow = ControlFlow::None,
                ControlFlow::Return(_) => return Ok(()),
                ControlFlow::None => {}
            }
        }
    }

    /// Evaluate a condition, which must be a bool
    fn eval_condition(&mut self, cond: &Expr, keyword: &str) -> Result<bool, RuntimeError> {
        match self.eval_expr(cond)? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeError::type_error(format!(
                "{} condition must be bool, got {}",
                keyword,
                other.type_name()
            ))),
        }
    }
}
