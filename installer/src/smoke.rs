//! Post-install smoke test.
//!
//! Runs the installed executable with the release's smoke-test arguments
//! and checks that it exits successfully within a timeout. The process is
//! launched through the [`ProcessRunner`] trait so tests can script the
//! outcome.

use crate::artefact::release::SmokeTest;
use crate::output::command_line;
use camino::Utf8Path;
use std::fmt;
use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

/// Default time allowed for the smoke test to finish.
pub const DEFAULT_SMOKE_TEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How a supervised process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The process exited on its own.
    Exited {
        /// Exit code, or `None` when terminated by a signal.
        code: Option<i32>,
        /// Captured standard error, trimmed.
        stderr: String,
    },
    /// The process was killed after exceeding the timeout.
    TimedOut,
}

/// Trait for running an executable under a timeout, enabling test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait ProcessRunner {
    /// Run `program` with `args`, killing it after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the process cannot be spawned or waited on.
    fn run(
        &self,
        program: &Utf8Path,
        args: &[String],
        timeout: Duration,
    ) -> std::io::Result<ProcessOutcome>;
}

/// [`ProcessRunner`] backed by `std::process` and `wait-timeout`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(
        &self,
        program: &Utf8Path,
        args: &[String],
        timeout: Duration,
    ) -> std::io::Result<ProcessOutcome> {
        let mut child = Command::new(program.as_std_path())
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain stderr while waiting so a chatty child cannot fill the pipe.
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                buf
            })
        });

        let status = match child.wait_timeout(timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Ok(ProcessOutcome::TimedOut);
            }
            Err(err) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(err);
            }
        };

        let stderr = stderr_reader
            .and_then(|reader| reader.join().ok())
            .unwrap_or_default();
        Ok(ProcessOutcome::Exited {
            code: status.code(),
            stderr: String::from_utf8_lossy(&stderr).trim().to_owned(),
        })
    }
}

/// Result of the smoke test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmokeTestOutcome {
    /// The executable exited with status zero.
    Passed,
    /// The executable could not be run or exited unsuccessfully.
    Failed {
        /// Human-readable explanation.
        reason: String,
    },
    /// The smoke test was disabled.
    Skipped,
}

impl SmokeTestOutcome {
    /// Whether the outcome should fail the install.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for SmokeTestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("passed"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
            Self::Skipped => f.write_str("skipped"),
        }
    }
}

/// Run the smoke test against the installed `binary`.
///
/// Never returns an error: spawn failures and timeouts become
/// [`SmokeTestOutcome::Failed`].
pub fn verify_install(
    runner: &dyn ProcessRunner,
    binary: &Utf8Path,
    smoke_test: &SmokeTest,
    timeout: Duration,
) -> SmokeTestOutcome {
    let command = command_line(binary, &smoke_test.args);
    log::debug!("smoke test: {command}");
    match runner.run(binary, &smoke_test.args, timeout) {
        Ok(ProcessOutcome::Exited { code: Some(0), .. }) => SmokeTestOutcome::Passed,
        Ok(ProcessOutcome::Exited { code, stderr }) => {
            let status = code.map_or_else(
                || "was terminated by a signal".to_owned(),
                |code| format!("exited with status {code}"),
            );
            let detail = if stderr.is_empty() {
                String::new()
            } else {
                format!(": {stderr}")
            };
            SmokeTestOutcome::Failed {
                reason: format!("`{command}` {status}{detail}"),
            }
        }
        Ok(ProcessOutcome::TimedOut) => SmokeTestOutcome::Failed {
            reason: format!(
                "`{command}` did not finish within {} seconds",
                timeout.as_secs()
            ),
        },
        Err(err) => SmokeTestOutcome::Failed {
            reason: format!("could not run {binary}: {err}"),
        },
    }
}
