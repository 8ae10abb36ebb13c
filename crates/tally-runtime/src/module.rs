//! Loading a unit file into an isolated namespace

use crate::diagnostic::Diagnostic;
use crate::interpreter::Interpreter;
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::{RuntimeError, Value};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use thiserror::Error;

/// Why a file could not be loaded as a module
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "{} has {} syntax error(s), first: {}",
        .path.display(),
        .diagnostics.len(),
        first_message(.diagnostics)
    )]
    Syntax {
        path: PathBuf,
        diagnostics: Vec<Diagnostic>,
    },

    #[error("{} raised while loading: {error}", .path.display())]
    Execution {
        path: PathBuf,
        #[source]
        error: RuntimeError,
    },
}

fn first_message(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .first()
        .map(|d| d.to_string())
        .unwrap_or_default()
}

/// A loaded unit: one file executed in its own interpreter
pub struct Module {
    path: PathBuf,
    interpreter: Interpreter,
}

impl Module {
    /// Read, parse and execute the file at `path`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(path, &source)
    }

    /// Parse and execute `source` as if it were read from `path`
    ///
    /// `path` is used for frame locations and to resolve imports.
    pub fn from_source(path: impl AsRef<Path>, source: &str) -> Result<Self, LoadError> {
        let path = path.as_ref().to_path_buf();
        let file_name = path.display().to_string();

        let (tokens, lex_diags) = Lexer::new(source).tokenize();
        let (program, parse_diags) = Parser::new(tokens).parse();

        let diagnostics: Vec<Diagnostic> = lex_diags
            .into_iter()
            .chain(parse_diags)
            .map(|d| d.with_file(file_name.clone()))
            .collect();
        if !diagnostics.is_empty() {
            return Err(LoadError::Syntax { path, diagnostics });
        }

        let mut interpreter = Interpreter::new();
        if let Err(error) = interpreter.exec_program(&program, Rc::from(path.as_path())) {
            return Err(LoadError::Execution { path, error });
        }

        tracing::debug!(
            path = %file_name,
            bindings = interpreter.globals().count(),
            "module loaded"
        );

        Ok(Self { path, interpreter })
    }

    /// File this module was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Top-level bindings in definition order
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.interpreter.globals()
    }

    /// Look up one top-level binding
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.interpreter.global(name)
    }

    /// Call the top-level binding `name` with no arguments
    pub fn call(&mut self, name: &str) -> Result<Value, RuntimeError> {
        let callee = self
            .interpreter
            .global(name)
            .cloned()
            .ok_or_else(|| RuntimeError::undefined(name))?;
        self.interpreter.call_value(&callee, Vec::new())
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Module").field("path", &self.path).finish()
    }
}
