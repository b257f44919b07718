//! Process invocation seam for the external collaborators.
//!
//! `strings` and `zip` are only ever reached through [`CommandExecutor`], so
//! the process-backed extractor and archiver can be exercised with a stub.

use std::io;
use std::path::Path;
use std::process::{Command, Output};

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs `cmd` with `args` inside `cwd` and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O error encountered while spawning or running the
    /// command. A non-zero exit status is not an error at this level.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dh_updater::command::{CommandExecutor, SystemCommandExecutor};
    /// use std::path::Path;
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("zip", &["-v"], Path::new("."))?;
    /// assert!(output.status.success());
    /// # Ok::<(), std::io::Error>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str], cwd: &Path) -> io::Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str], cwd: &Path) -> io::Result<Output> {
        log::trace!("running {cmd} {args:?} in {}", cwd.display());
        Command::new(cmd).args(args).current_dir(cwd).output()
    }
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for &E {
    fn run(&self, cmd: &str, args: &[&str], cwd: &Path) -> io::Result<Output> {
        (**self).run(cmd, args, cwd)
    }
}

/// Summarise a failed command's stderr (or exit status) for diagnostics.
pub(crate) fn failure_reason(cmd: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        format!("{cmd} exited with {}", output.status)
    } else {
        format!("{cmd} exited with {}: {stderr}", output.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::failure_output;

    #[test]
    fn failure_reason_includes_stderr() {
        let reason = failure_reason("zip", &failure_output("zip error: Nothing to do!"));
        assert!(reason.starts_with("zip exited with"));
        assert!(reason.contains("Nothing to do!"));
    }

    #[test]
    fn failure_reason_without_stderr_reports_status() {
        let mut output = failure_output("");
        output.stderr.clear();
        let reason = failure_reason("strings", &output);
        assert!(reason.starts_with("strings exited with"));
        assert!(!reason.ends_with(": "));
    }

    #[test]
    fn system_executor_reports_spawn_failure() {
        let result = SystemCommandExecutor.run(
            "dh-updater-definitely-missing-tool",
            &[],
            Path::new("."),
        );
        assert!(result.is_err());
    }
}
