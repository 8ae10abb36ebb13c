//! Test runner - execute collected tests one at a time

use crate::testing::collector::{TestIdentity, TestUnit};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tally_runtime::RuntimeError;

/// Error kind reported when the interpreter itself panics during a test
pub const INTERNAL_ERROR: &str = "InternalError";

/// Where a failure happened inside the unit under test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: PathBuf,
    /// 1-based line number
    pub line: u32,
}

/// Details of a failed test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureInfo {
    /// Error class name, e.g. `ZeroDivisionError`
    pub kind: String,
    pub message: String,
    /// Deepest frame inside the unit's own file, if any
    pub location: Option<Location>,
}

impl FailureInfo {
    fn from_error(unit_path: &Path, error: &RuntimeError) -> Self {
        Self {
            kind: error.kind.name().to_string(),
            message: error.message.clone(),
            location: error.innermost_frame_in(unit_path).map(|frame| Location {
                path: frame.file.clone(),
                line: frame.line,
            }),
        }
    }

    /// `Kind: message`, or just `Kind` when the message is empty
    pub fn describe(&self) -> String {
        if self.message.is_empty() {
            self.kind.clone()
        } else {
            format!("{}: {}", self.kind, self.message)
        }
    }
}

/// Result of running a single test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed(FailureInfo),
}

impl Outcome {
    /// Check if this outcome is a pass
    pub fn is_pass(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    /// Check if this outcome is a failure
    pub fn is_fail(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// A completed test run
#[derive(Debug, Clone)]
pub struct TestRecord {
    pub identity: TestIdentity,
    pub outcome: Outcome,
    pub duration: Duration,
}

/// Every record of a run, in execution order, plus its wall-clock time
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub records: Vec<TestRecord>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn new(records: Vec<TestRecord>, elapsed: Duration) -> Self {
        Self { records, elapsed }
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn passed(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_pass()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.iter().filter(|r| r.outcome.is_fail()).count()
    }

    /// Failed tests with their details, in execution order
    pub fn failures(&self) -> impl Iterator<Item = (&TestIdentity, &FailureInfo)> {
        self.records.iter().filter_map(|r| match &r.outcome {
            Outcome::Failed(info) => Some((&r.identity, info)),
            Outcome::Passed => None,
        })
    }
}

/// Sequential test runner
#[derive(Debug, Default)]
pub struct TestRunner;

impl TestRunner {
    pub fn new() -> Self {
        Self
    }

    /// Run every test of every unit in order, reporting each record as it completes
    pub fn run<E>(
        &self,
        units: &mut [TestUnit],
        mut on_complete: impl FnMut(&TestRecord) -> Result<(), E>,
    ) -> Result<Vec<TestRecord>, E> {
        let mut records = Vec::new();

        for unit in units.iter_mut() {
            let names = unit.tests().to_vec();
            for name in names {
                let record = self.run_single_test(unit, &name);
                on_complete(&record)?;
                records.push(record);
            }
        }

        Ok(records)
    }

    /// Run a single test
    pub fn run_single_test(&self, unit: &mut TestUnit, name: &str) -> TestRecord {
        let identity = unit.identity(name);
        let start = Instant::now();

        let outcome = match super::catch_quietly(|| unit.namespace_mut().invoke(name)) {
            Ok(Ok(())) => Outcome::Passed,
            Ok(Err(error)) => Outcome::Failed(FailureInfo::from_error(unit.path(), &error)),
            Err(payload) => Outcome::Failed(FailureInfo {
                kind: INTERNAL_ERROR.to_string(),
                message: super::panic_message(payload.as_ref()),
                location: None,
            }),
        };

        let duration = start.elapsed();
        tracing::debug!(test = %identity, passed = outcome.is_pass(), ?duration, "test finished");

        TestRecord {
            identity,
            outcome,
            duration,
        }
    }
}
