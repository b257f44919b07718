//! Printable-text extraction from binaries.
//!
//! The pipeline only needs the readable strings of a binary to locate its
//! version token. [`PrintableStringsExtractor`] does this in-process;
//! [`StringsCommandExtractor`] defers to the `strings` tool.

use crate::command::{CommandExecutor, failure_reason};
use crate::error::{PipelineError, Result};
use std::fs;
use std::path::Path;

/// Minimum run length emitted, matching the `strings` default.
const MIN_RUN_LEN: usize = 4;

/// Capability that returns the printable-string content of a file.
#[cfg_attr(test, mockall::automock)]
pub trait TextExtractor {
    /// Extract printable text from the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Extraction`] when the file is unreadable or
    /// the backing tool is unavailable.
    fn extract(&self, path: &Path) -> Result<String>;
}

/// Scans the file bytes for printable ASCII runs without spawning a process.
///
/// Each run of at least four printable characters (space through `~`, plus
/// tab) is emitted on its own line, in file order.
///
/// # Examples
///
/// ```
/// use dh_updater::extractor::printable_runs;
///
/// let text = printable_runs(b"\0\0MZ\x01FileVersion\x001.2.3.4\xff");
/// assert_eq!(text, "FileVersion\n1.2.3.4\n");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PrintableStringsExtractor;

impl TextExtractor for PrintableStringsExtractor {
    fn extract(&self, path: &Path) -> Result<String> {
        let bytes = fs::read(path).map_err(|err| PipelineError::Extraction {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        Ok(printable_runs(&bytes))
    }
}

/// Collect the printable runs of `bytes`, one per line.
#[must_use]
pub fn printable_runs(bytes: &[u8]) -> String {
    let mut out = String::new();
    for run in bytes
        .split(|b| !is_printable(*b))
        .filter(|run| run.len() >= MIN_RUN_LEN)
    {
        // Every byte in `run` is printable ASCII.
        out.extend(run.iter().map(|b| char::from(*b)));
        out.push('\n');
    }
    out
}

const fn is_printable(byte: u8) -> bool {
    matches!(byte, b' '..=b'~' | b'\t')
}

/// Runs the `strings` binary through a [`CommandExecutor`].
#[derive(Debug, Clone)]
pub struct StringsCommandExtractor<E> {
    executor: E,
}

impl<E: CommandExecutor> StringsCommandExtractor<E> {
    /// Wrap `executor` so extraction shells out to `strings`.
    #[must_use]
    pub fn new(executor: E) -> Self {
        Self { executor }
    }
}

impl<E: CommandExecutor> TextExtractor for StringsCommandExtractor<E> {
    fn extract(&self, path: &Path) -> Result<String> {
        let extraction_error = |reason: String| PipelineError::Extraction {
            path: path.to_path_buf(),
            reason,
        };
        let path_arg = path.to_string_lossy();
        let output = self
            .executor
            .run("strings", &[path_arg.as_ref()], Path::new("."))
            .map_err(|err| extraction_error(format!("failed to run strings: {err}")))?;
        if !output.status.success() {
            return Err(extraction_error(failure_reason("strings", &output)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
