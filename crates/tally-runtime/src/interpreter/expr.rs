//! Expression evaluation

use crate::ast::*;
use crate::interpreter::Interpreter;
use crate::value::{ErrorKind, RuntimeError, Value};

impl Interpreter {
    /// Evaluate an expression
    pub(super) fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(lit, _) => Ok(self.eval_literal(lit)),
            Expr::Identifier(id) => self.get_variable(&id.name),
            Expr::Binary(binary) => self.eval_binary(binary),
            Expr::Unary(unary) => self.eval_unary(unary),
            Expr::Call(call) => self.eval_call(call),
            Expr::Index(index) => self.eval_index(index),
            Expr::ArrayLiteral(arr) => self.eval_array_literal(arr),
            Expr::Group(group) => self.eval_expr(&group.expr),
        }
    }

    /// Evaluate a literal
    pub(super) fn eval_literal(&self, lit: &Literal) -> Value {
        match lit {
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::string(s.clone()),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Null => Value::Null,
        }
    }

    /// Evaluate a binary expression
    fn eval_binary(&mut self, binary: &BinaryExpr) -> Result<Value, RuntimeError> {
        // Short-circuit evaluation for && and ||
        if matches!(binary.op, BinaryOp::And | BinaryOp::Or) {
            let left = self.expect_bool(&binary.left, binary.op)?;
            let short_circuit = if binary.op == BinaryOp::And { !left } else { left };
            if short_circuit {
                return Ok(Value::Bool(left));
            }
            return Ok(Value::Bool(self.expect_bool(&binary.right, binary.op)?));
        }

        let left = self.eval_expr(&binary.left)?;
        let right = self.eval_expr(&binary.right)?;

        match binary.op {
            BinaryOp::Add => match (&left, &right) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                (Value::String(a), Value::String(b)) => Ok(Value::string(format!("{}{}", a, b))),
                _ => Err(operand_error(binary.op, &left, &right)),
            },
            BinaryOp::Sub => numeric(binary.op, &left, &right, |a, b| a - b),
            BinaryOp::Mul => numeric(binary.op, &left, &right, |a, b| a * b),
            BinaryOp::Div | BinaryOp::Mod => {
                if let (Value::Number(_), Value::Number(b)) = (&left, &right) {
                    if *b == 0.0 {
                        let what = if binary.op == BinaryOp::Div {
                            "division by zero"
                        } else {
                            "modulo by zero"
                        };
                        return Err(RuntimeError::new(ErrorKind::ZeroDivision, what));
                    }
                }
                if binary.op == BinaryOp::Div {
                    numeric(binary.op, &left, &right, |a, b| a / b)
                } else {
                    numeric(binary.op, &left, &right, |a, b| a % b)
                }
            }
            BinaryOp::Eq => Ok(Value::Bool(left.equals(&right)?)),
            BinaryOp::Ne => Ok(Value::Bool(!left.equals(&right)?)),
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let ordering = match (&left, &right) {
                    (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                    (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                    _ => return Err(operand_error(binary.op, &left, &right)),
                };
                let result = ordering.is_some_and(|ord| match binary.op {
                    BinaryOp::Lt => ord.is_lt(),
                    BinaryOp::Le => ord.is_le(),
                    BinaryOp::Gt => ord.is_gt(),
                    _ => ord.is_ge(),
                });
                Ok(Value::Bool(result))
            }
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    fn expect_bool(&mut self, expr: &Expr, op: BinaryOp) -> Result<bool, RuntimeError> {
        match self.eval_expr(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeError::type_error(format!(
                "expected bool operand for {}, got {}",
                op.symbol(),
                other.type_name()
            ))),
        }
    }

    /// Evaluate a unary expression
    fn eval_unary(&mut self, unary: &UnaryExpr) -> Result<Value, RuntimeError> {
        let value = self.eval_expr(&unary.expr)?;

        match (unary.op, &value) {
            (UnaryOp::Negate, Value::Number(n)) => Ok(Value::Number(-n)),
            (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (UnaryOp::Negate, other) => Err(RuntimeError::type_error(format!(
                "bad operand type for unary -: {}",
                other.type_name()
            ))),
            (UnaryOp::Not, other) => Err(RuntimeError::type_error(format!(
                "bad operand type for !: {}",
                other.type_name()
            ))),
        }
    }

    /// Evaluate a function call
    fn eval_call(&mut self, call: &CallExpr) -> Result<Value, RuntimeError> {
        let callee = self.eval_expr(&call.callee)?;

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.eval_expr(arg)?);
        }

        self.call_value(&callee, args)
    }

    /// Evaluate array or string indexing
    fn eval_index(&mut self, index: &IndexExpr) -> Result<Value, RuntimeError> {
        let target = self.eval_expr(&index.target)?;
        let idx = self.eval_expr(&index.index)?;

        match &target {
            Value::Array(items) => {
                let items = items.borrow();
                let i = checked_index(&idx, items.len())?;
                Ok(items[i].clone())
            }
            Value::String(s) => {
                let len = s.chars().count();
                let i = checked_index(&idx, len)?;
                Ok(s.chars()
                    .nth(i)
                    .map(|c| Value::string(c.to_string()))
                    .unwrap_or(Value::Null))
            }
            other => Err(RuntimeError::type_error(format!(
                "'{}' is not indexable",
                other.type_name()
            ))),
        }
    }

    /// Store `value` at `target[index]`
    pub(super) fn assign_at_index(
        &mut self,
        target: &Expr,
        index: &Expr,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let target = self.eval_expr(target)?;
        let idx = self.eval_expr(index)?;

        match &target {
            Value::Array(items) => {
                let mut items = items.borrow_mut();
                let i = checked_index(&idx, items.len())?;
                items[i] = value;
                Ok(())
            }
            other => Err(RuntimeError::type_error(format!(
                "'{}' does not support item assignment",
                other.type_name()
            ))),
        }
    }

    /// Evaluate an array literal
    fn eval_array_literal(&mut self, arr: &ArrayLiteral) -> Result<Value, RuntimeError> {
        let mut elements = Vec::with_capacity(arr.elements.len());
        for element in &arr.elements {
            elements.push(self.eval_expr(element)?);
        }
        Ok(Value::array(elements))
    }
}

fn numeric(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    apply: impl Fn(f64, f64) -> f64,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(apply(*a, *b))),
        _ => Err(operand_error(op, left, right)),
    }
}

fn operand_error(op: BinaryOp, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::type_error(format!(
        "unsupported operand types for {}: {} and {}",
        op.symbol(),
        left.type_name(),
        right.type_name()
    ))
}

fn checked_index(idx: &Value, len: usize) -> Result<usize, RuntimeError> {
    let n = match idx {
        Value::Number(n) => *n,
        other => {
            return Err(RuntimeError::type_error(format!(
                "index must be a number, got {}",
                other.type_name()
            )))
        }
    };
    if n.fract() != 0.0 || n < 0.0 {
        return Err(RuntimeError::new(
            ErrorKind::Index,
            format!("invalid index {}", idx),
        ));
    }
    let i = n as usize;
    if i >= len {
        return Err(RuntimeError::new(
            ErrorKind::Index,
            format!("index {} out of range for length {}", i, len),
        ));
    }
    Ok(i)
}
