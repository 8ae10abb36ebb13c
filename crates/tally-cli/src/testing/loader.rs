//! Unit loading - turn a discovered file into an isolated namespace

use std::path::{Path, PathBuf};
use tally_runtime::{LoadError, Module, RuntimeError, SOURCE_EXTENSION};
use thiserror::Error;

/// A top-level binding as seen by test collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingInfo {
    pub name: String,
    /// Whether the binding can be invoked with no arguments
    pub zero_arg_callable: bool,
}

/// A loaded unit's namespace of top-level definitions
pub trait UnitNamespace {
    /// Top-level bindings in definition order
    fn bindings(&self) -> Vec<BindingInfo>;

    /// Invoke the binding `name` with no arguments
    fn invoke(&mut self, name: &str) -> Result<(), RuntimeError>;
}

/// Why a file contributed no unit
#[derive(Debug, Error)]
pub enum Unresolved {
    #[error("no loader for {}", .0.display())]
    UnsupportedType(PathBuf),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("loader panicked on {}: {message}", .path.display())]
    Panicked { path: PathBuf, message: String },
}

/// Capability that turns a file path into a unit namespace
pub trait UnitResolver {
    fn resolve(&self, path: &Path) -> Result<Box<dyn UnitNamespace>, Unresolved>;
}

/// Resolver for `.tl` files written in the tally unit language
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptResolver;

impl UnitResolver for ScriptResolver {
    fn resolve(&self, path: &Path) -> Result<Box<dyn UnitNamespace>, Unresolved> {
        if path.extension().and_then(|ext| ext.to_str()) != Some(SOURCE_EXTENSION) {
            return Err(Unresolved::UnsupportedType(path.to_path_buf()));
        }
        let module = Module::load(path)?;
        Ok(Box::new(module))
    }
}

impl UnitNamespace for Module {
    fn bindings(&self) -> Vec<BindingInfo> {
        Module::bindings(self)
            .map(|(name, value)| BindingInfo {
                name: name.to_string(),
                zero_arg_callable: value.is_callable() && value.accepts_arity(0),
            })
            .collect()
    }

    fn invoke(&mut self, name: &str) -> Result<(), RuntimeError> {
        self.call(name).map(|_| ())
    }
}

/// Loads units through a resolver, swallowing every failure
pub struct UnitLoader<R> {
    resolver: R,
}

impl Default for UnitLoader<ScriptResolver> {
    fn default() -> Self {
        Self::new(ScriptResolver)
    }
}

impl<R: UnitResolver> UnitLoader<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// Load `path` as a unit, or `None` if it cannot be loaded
    ///
    /// Failures are logged at debug level only; a panicking resolver is
    /// treated like any other failure.
    pub fn load(&self, path: &Path) -> Option<Box<dyn UnitNamespace>> {
        let outcome = super::catch_quietly(|| self.resolver.resolve(path)).unwrap_or_else(|payload| {
            Err(Unresolved::Panicked {
                path: path.to_path_buf(),
                message: super::panic_message(payload.as_ref()),
            })
        });

        match outcome {
            Ok(unit) => Some(unit),
            Err(reason) => {
                tracing::debug!(path = %path.display(), %reason, "unit not loaded");
                None
            }
        }
    }
}
