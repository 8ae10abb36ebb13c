//! Tally Runtime - the unit language
//!
//! This library provides everything needed to load a `.tl` unit:
//! - Lexical analysis and parsing
//! - Tree-walking interpretation with call frames for tracebacks
//! - Builtin functions
//! - `Module`, an isolated namespace loaded from one file

/// Tally runtime version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// File extension of unit sources
pub const SOURCE_EXTENSION: &str = "tl";

pub mod ast;
pub mod diagnostic;
pub mod interpreter;
pub mod lexer;
pub mod module;
pub mod parser;
pub mod span;
pub mod stdlib;
pub mod token;
pub mod value;

// Re-export commonly used types
pub use diagnostic::Diagnostic;
pub use interpreter::Interpreter;
pub use lexer::Lexer;
pub use module::{LoadError, Module};
pub use parser::Parser;
pub use span::Span;
pub use token::{Token, TokenKind};
pub use value::{ErrorKind, Frame, RuntimeError, Value};
