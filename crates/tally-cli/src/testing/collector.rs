//! Test collection - pick test functions out of a loaded unit

use crate::testing::loader::UnitNamespace;
use std::fmt;
use std::path::{Path, PathBuf};

/// Name prefix that marks a binding as a test
pub const TEST_PREFIX: &str = "test_";

/// A test's qualified name: unit path plus function name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestIdentity {
    pub path: PathBuf,
    pub name: String,
}

impl fmt::Display for TestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.path.display(), self.name)
    }
}

/// A loaded unit together with its tests, in definition order
pub struct TestUnit {
    path: PathBuf,
    namespace: Box<dyn UnitNamespace>,
    tests: Vec<String>,
}

impl TestUnit {
    /// Path the unit was discovered at
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the collected tests
    pub fn tests(&self) -> &[String] {
        &self.tests
    }

    /// Number of collected tests
    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    pub fn identity(&self, name: &str) -> TestIdentity {
        TestIdentity {
            path: self.path.clone(),
            name: name.to_string(),
        }
    }

    pub(crate) fn namespace_mut(&mut self) -> &mut dyn UnitNamespace {
        self.namespace.as_mut()
    }
}

impl fmt::Debug for TestUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestUnit")
            .field("path", &self.path)
            .field("tests", &self.tests)
            .finish()
    }
}

/// Collect the tests of a loaded unit
///
/// Returns `None` when the unit defines no tests.
pub fn collect(path: &Path, namespace: Box<dyn UnitNamespace>) -> Option<TestUnit> {
    let tests: Vec<String> = namespace
        .bindings()
        .into_iter()
        .filter(|binding| binding.zero_arg_callable && binding.name.starts_with(TEST_PREFIX))
        .map(|binding| binding.name)
        .collect();

    if tests.is_empty() {
        tracing::debug!(path = %path.display(), "no tests in unit");
        return None;
    }

    Some(TestUnit {
        path: path.to_path_buf(),
        namespace,
        tests,
    })
}
