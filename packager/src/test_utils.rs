//! Shared test utilities for the packager crate.
//!
//! Compiled for unit tests and, through the `test-support` feature, for the
//! behaviour suites under `tests/`.

use crate::archive::ArchiveCreator;
use crate::command::CommandExecutor;
use crate::error::{PipelineError, Result};
use crate::extractor::TextExtractor;
use crate::pattern::ExclusionSet;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code.unsigned_abs())
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a successful command `Output` with the given stdout.
#[must_use]
pub fn stdout_output(stdout: &str) -> Output {
    Output {
        stdout: stdout.as_bytes().to_vec(),
        ..success_output()
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "zip").
    pub cmd: &'static str,
    /// The arguments to pass to the command.
    pub args: Vec<String>,
    /// The working directory the command must run in, if checked.
    pub cwd: Option<PathBuf>,
    /// The result to return when this command is invoked.
    pub result: io::Result<Output>,
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    #[expect(
        clippy::panic_in_result_fn,
        reason = "a mismatched invocation is a test failure"
    )]
    fn run(&self, cmd: &str, args: &[&str], cwd: &Path) -> io::Result<Output> {
        let Some(call) = self.expected.borrow_mut().pop_front() else {
            panic!("unexpected command invocation: {cmd} {args:?}");
        };

        assert_eq!(call.cmd, cmd);
        assert_eq!(call.args, args);
        if let Some(expected_cwd) = &call.cwd {
            assert_eq!(expected_cwd.as_path(), cwd);
        }

        call.result
    }
}

/// A `TextExtractor` that returns fixed text, or fails, for any path.
#[derive(Debug, Clone)]
pub struct FakeExtractor {
    text: Option<String>,
}

impl FakeExtractor {
    /// Return `text` for every extraction.
    #[must_use]
    pub fn returning(text: &str) -> Self {
        Self {
            text: Some(text.to_owned()),
        }
    }

    /// Fail every extraction with [`PipelineError::Extraction`].
    #[must_use]
    pub fn failing() -> Self {
        Self { text: None }
    }
}

impl TextExtractor for FakeExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        self.text.clone().ok_or_else(|| PipelineError::Extraction {
            path: path.to_path_buf(),
            reason: "fake extractor failure".to_owned(),
        })
    }
}

/// One recorded [`ArchiveCreator::create_archive`] invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveCall {
    /// Directory that was archived.
    pub source_dir: PathBuf,
    /// Archive destination.
    pub destination: PathBuf,
    /// Source form of each pattern passed.
    pub patterns: Vec<String>,
    /// Extra exact-path exclusions passed.
    pub extra_exclusions: Vec<String>,
}

/// An `ArchiveCreator` that records calls and writes fixed bytes.
///
/// The destination is created with the configured contents so the
/// pipeline can still digest it.
#[derive(Debug, Default)]
pub struct RecordingArchiver {
    contents: Vec<u8>,
    calls: RefCell<Vec<ArchiveCall>>,
}

impl RecordingArchiver {
    /// Write `contents` as the archive on every call.
    #[must_use]
    pub fn with_contents(contents: &[u8]) -> Self {
        Self {
            contents: contents.to_vec(),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Return the recorded invocations.
    #[must_use]
    pub fn calls(&self) -> Vec<ArchiveCall> {
        self.calls.borrow().clone()
    }
}

impl ArchiveCreator for RecordingArchiver {
    fn create_archive(
        &self,
        source_dir: &Path,
        destination: &Path,
        patterns: &ExclusionSet,
        extra_exclusions: &[String],
    ) -> Result<()> {
        self.calls.borrow_mut().push(ArchiveCall {
            source_dir: source_dir.to_path_buf(),
            destination: destination.to_path_buf(),
            patterns: patterns.patterns().iter().map(ToString::to_string).collect(),
            extra_exclusions: extra_exclusions.to_vec(),
        });
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(|err| PipelineError::io(parent, err))?;
        }
        std::fs::write(destination, &self.contents)
            .map_err(|err| PipelineError::io(destination, err))
    }
}
