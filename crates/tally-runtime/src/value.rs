//! Runtime values and errors

use crate::ast::{Block, Identifier};
use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Deepest array nesting that display and comparison will walk
pub const MAX_VALUE_DEPTH: usize = 256;

type ArrayCell = RefCell<Vec<Value>>;

/// A runtime value
#[derive(Clone)]
pub enum Value {
    Number(f64),
    String(Rc<str>),
    Bool(bool),
    Null,
    /// Arrays are shared and mutable (reference semantics)
    Array(Rc<ArrayCell>),
    Function(Rc<Function>),
    Builtin(&'static str),
}

/// A user-defined function
#[derive(Debug)]
pub struct Function {
    pub name: String,
    pub params: Vec<Identifier>,
    pub body: Block,
    /// File the function was defined in
    pub file: Rc<Path>,
    /// Line of the `fn` keyword
    pub line: u32,
}

impl Value {
    /// Create a string value
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(Rc::from(s.into()))
    }

    /// Create an array value
    pub fn array(values: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(values)))
    }

    /// Name of this value's type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Function(_) | Value::Builtin(_) => "function",
        }
    }

    /// Whether this value can be called
    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Builtin(_))
    }

    /// Whether a call with `count` arguments would pass the arity check
    pub fn accepts_arity(&self, count: usize) -> bool {
        match self {
            Value::Function(func) => func.params.len() == count,
            Value::Builtin(name) => crate::stdlib::arity(name)
                .is_some_and(|(min, max)| (min..=max).contains(&count)),
            _ => false,
        }
    }
}

impl Value {
    /// Structural equality, safe on self-containing arrays
    ///
    /// A pair of arrays met again while it is still being compared counts as
    /// equal. Nesting deeper than `MAX_VALUE_DEPTH` is a `RecursionError`.
    pub fn equals(&self, other: &Value) -> Result<bool, RuntimeError> {
        self.equals_at(other, &mut Vec::new())
    }

    fn equals_at(
        &self,
        other: &Value,
        comparing: &mut Vec<(*const ArrayCell, *const ArrayCell)>,
    ) -> Result<bool, RuntimeError> {
        let (a, b) = match (self, other) {
            (Value::Array(a), Value::Array(b)) => (a, b),
            (Value::Number(a), Value::Number(b)) => return Ok(a == b),
            (Value::String(a), Value::String(b)) => return Ok(a == b),
            (Value::Bool(a), Value::Bool(b)) => return Ok(a == b),
            (Value::Null, Value::Null) => return Ok(true),
            (Value::Function(a), Value::Function(b)) => return Ok(Rc::ptr_eq(a, b)),
            (Value::Builtin(a), Value::Builtin(b)) => return Ok(a == b),
            _ => return Ok(false),
        };

        let pair = (Rc::as_ptr(a), Rc::as_ptr(b));
        if Rc::ptr_eq(a, b) || comparing.contains(&pair) {
            return Ok(true);
        }
        if comparing.len() >= MAX_VALUE_DEPTH {
            return Err(RuntimeError::new(
                ErrorKind::Recursion,
                "maximum nesting depth exceeded in comparison",
            ));
        }

        let (left, right) = (a.borrow(), b.borrow());
        if left.len() != right.len() {
            return Ok(false);
        }

        comparing.push(pair);
        let mut result = Ok(true);
        for (x, y) in left.iter().zip(right.iter()) {
            result = x.equals_at(y, comparing);
            if !matches!(result, Ok(true)) {
                break;
            }
        }
        comparing.pop();
        result
    }

    fn fmt_at(&self, f: &mut fmt::Formatter<'_>, open: &mut Vec<*const ArrayCell>) -> fmt::Result {
        match self {
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::String(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
            Value::Array(items) => {
                let ptr = Rc::as_ptr(items);
                if open.contains(&ptr) || open.len() >= MAX_VALUE_DEPTH {
                    return write!(f, "[...]");
                }
                open.push(ptr);
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Value::String(s) => write!(f, "{:?}", s)?,
                        other => other.fmt_at(f, open)?,
                    }
                }
                open.pop();
                write!(f, "]")
            }
            Value::Function(func) => write!(f, "<fn {}>", func.name),
            Value::Builtin(name) => write!(f, "<builtin {}>", name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Function(func) => write!(f, "Function({})", func.name),
            other => write!(f, "{}({})", other.type_name(), other),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other).unwrap_or(false)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_at(f, &mut Vec::new())
    }
}

/// Error class of a runtime error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Undefined name
    Name,
    /// Bad operand type, bad arity, assignment to a `let` binding
    Type,
    /// Division or modulo by zero
    ZeroDivision,
    /// Index out of range or not an integer
    Index,
    /// Failed `assert`
    Assertion,
    /// Call stack too deep
    Recursion,
    /// `import` failed
    Import,
    /// Explicit `raise`
    Raised,
}

impl ErrorKind {
    /// Class name shown in reports
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Name => "NameError",
            ErrorKind::Type => "TypeError",
            ErrorKind::ZeroDivision => "ZeroDivisionError",
            ErrorKind::Index => "IndexError",
            ErrorKind::Assertion => "AssertionError",
            ErrorKind::Recursion => "RecursionError",
            ErrorKind::Import => "ImportError",
            ErrorKind::Raised => "Error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of an error's frame chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Function name (`<module>` for top-level code)
    pub function: String,
    /// Source file of the function
    pub file: PathBuf,
    /// Line of the statement executing in this frame (1-based)
    pub line: u32,
}

/// An error propagating through unit code
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    /// Call frames at the raise site, innermost first.
    /// Empty until the error leaves its first statement.
    pub frames: Vec<Frame>,
}

impl RuntimeError {
    /// Create an error with no frames attached yet
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            frames: Vec::new(),
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub fn undefined(name: &str) -> Self {
        Self::new(ErrorKind::Name, format!("name '{}' is not defined", name))
    }

    /// Innermost frame whose source file is `file`
    pub fn innermost_frame_in(&self, file: &Path) -> Option<&Frame> {
        self.frames.iter().find(|frame| frame.file == file)
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for RuntimeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_display() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(-2.5).to_string(), "-2.5");
    }

    #[test]
    fn test_array_display_quotes_strings() {
        let arr = Value::array(vec![Value::Number(1.0), Value::string("a")]);
        assert_eq!(arr.to_string(), "[1, \"a\"]");
    }

    #[test]
    fn test_array_equality_is_structural() {
        let a = Value::array(vec![Value::Number(1.0)]);
        let b = Value::array(vec![Value::Number(1.0)]);
        assert_eq!(a, b);
        assert_ne!(a, Value::array(vec![]));
    }

    #[test]
    fn test_self_containing_array_display() {
        let a = Value::array(vec![Value::Number(1.0)]);
        if let Value::Array(items) = &a {
            items.borrow_mut().push(a.clone());
        }
        assert_eq!(a.to_string(), "[1, [...]]");
    }

    #[test]
    fn test_shared_array_is_not_a_cycle() {
        let inner = Value::array(vec![Value::Number(2.0)]);
        let outer = Value::array(vec![inner.clone(), inner]);
        assert_eq!(outer.to_string(), "[[2], [2]]");
    }

    #[test]
    fn test_self_containing_arrays_compare() {
        let make = |n: f64| {
            let a = Value::array(vec![Value::Number(n)]);
            if let Value::Array(items) = &a {
                items.borrow_mut().push(a.clone());
            }
            a
        };
        let (a, b, c) = (make(1.0), make(1.0), make(2.0));
        assert_eq!(a.equals(&b), Ok(true));
        assert_eq!(a.equals(&c), Ok(false));
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_too_deep_comparison_is_recursion_error() {
        let nest = || {
            let mut value = Value::Null;
            for _ in 0..MAX_VALUE_DEPTH + 10 {
                value = Value::array(vec![value]);
            }
            value
        };
        let err = nest().equals(&nest()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Recursion);
    }

    #[test]
    fn test_error_display() {
        let err = RuntimeError::new(ErrorKind::ZeroDivision, "division by zero");
        assert_eq!(err.to_string(), "ZeroDivisionError: division by zero");
        let bare = RuntimeError::new(ErrorKind::Assertion, "");
        assert_eq!(bare.to_string(), "AssertionError");
    }

    #[test]
    fn test_innermost_frame_in() {
        let mut err = RuntimeError::type_error("bad");
        err.frames = vec![
            Frame {
                function: "helper".into(),
                file: PathBuf::from("lib.tl"),
                line: 3,
            },
            Frame {
                function: "test_x".into(),
                file: PathBuf::from("unit.tl"),
                line: 7,
            },
            Frame {
                function: "<module>".into(),
                file: PathBuf::from("unit.tl"),
                line: 12,
            },
        ];
        let frame = err.innermost_frame_in(Path::new("unit.tl")).expect("frame");
        assert_eq!(frame.line, 7);
        assert!(err.innermost_frame_in(Path::new("other.tl")).is_none());
    }
}
