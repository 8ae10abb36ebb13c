//! Builtin functions available to every unit

use crate::value::{ErrorKind, RuntimeError, Value};

/// Builtin names with their (min, max) arity
const BUILTINS: &[(&str, usize, usize)] = &[
    ("print", 0, 1),
    ("len", 1, 1),
    ("str", 1, 1),
    ("push", 2, 2),
    ("assert", 1, 2),
];

/// Resolve a builtin by name
pub fn lookup(name: &str) -> Option<&'static str> {
    BUILTINS
        .iter()
        .find(|(builtin, _, _)| *builtin == name)
        .map(|(builtin, _, _)| *builtin)
}

/// Accepted (min, max) argument counts of a builtin
pub fn arity(name: &str) -> Option<(usize, usize)> {
    BUILTINS
        .iter()
        .find(|(builtin, _, _)| *builtin == name)
        .map(|(_, min, max)| (*min, *max))
}

/// Call a builtin function
pub fn call_builtin(name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
    let (min, max) = arity(name).ok_or_else(|| RuntimeError::undefined(name))?;
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{} to {}", min, max)
        };
        return Err(RuntimeError::type_error(format!(
            "{}() takes {} argument(s) but {} were given",
            name,
            expected,
            args.len()
        )));
    }

    match name {
        "print" => {
            match args.first() {
                Some(value) => println!("{}", value),
                None => println!(),
            }
            Ok(Value::Null)
        }
        "len" => match &args[0] {
            Value::String(s) => Ok(Value::Number(s.chars().count() as f64)),
            Value::Array(items) => Ok(Value::Number(items.borrow().len() as f64)),
            other => Err(RuntimeError::type_error(format!(
                "len() expects a string or array, got {}",
                other.type_name()
            ))),
        },
        "str" => Ok(Value::string(args[0].to_string())),
        "push" => match &args[0] {
            Value::Array(items) => {
                items.borrow_mut().push(args[1].clone());
                Ok(Value::Null)
            }
            other => Err(RuntimeError::type_error(format!(
                "push() expects an array, got {}",
                other.type_name()
            ))),
        },
        "assert" => match &args[0] {
            Value::Bool(true) => Ok(Value::Null),
            Value::Bool(false) => {
                let message = args.get(1).map(|m| m.to_string()).unwrap_or_default();
                Err(RuntimeError::new(ErrorKind::Assertion, message))
            }
            other => Err(RuntimeError::type_error(format!(
                "assert() expects a bool condition, got {}",
                other.type_name()
            ))),
        },
        _ => Err(RuntimeError::undefined(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len() {
        assert_eq!(
            call_builtin("len", &[Value::string("héllo")]).unwrap(),
            Value::Number(5.0)
        );
        let arr = Value::array(vec![Value::Null, Value::Null]);
        assert_eq!(call_builtin("len", &[arr]).unwrap(), Value::Number(2.0));
    }

    #[test]
    fn test_push_mutates_shared_array() {
        let arr = Value::array(vec![]);
        call_builtin("push", &[arr.clone(), Value::Number(1.0)]).unwrap();
        assert_eq!(arr, Value::array(vec![Value::Number(1.0)]));
    }

    #[test]
    fn test_assert_failure_kind() {
        let err = call_builtin("assert", &[Value::Bool(false), Value::string("nope")]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Assertion);
        assert_eq!(err.message, "nope");
    }

    #[test]
    fn test_arity_checked() {
        let err = call_builtin("len", &[]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Type);
        assert!(err.message.contains("len() takes 1 argument(s)"));
    }

    #[test]
    fn test_zero_arity_builtins() {
        assert_eq!(arity("print"), Some((0, 1)));
        assert!(lookup("test_print").is_none());
    }
}
