//! Synchronous shell command execution with a hard timeout
//!
//! Build and benchmark steps are external programs that may wedge. Every
//! invocation goes through [`CommandRunner::run`], which turns an unresponsive
//! process into a definite [`CommandError::Timeout`] instead of an indefinite
//! hang, and folds every other failure mode into a `CommandError` the caller
//! treats as "no result".

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Default per-command timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Poll interval while waiting for a child process to exit
const REAP_INTERVAL: Duration = Duration::from_millis(25);

/// Failure modes of an external command
#[derive(Debug, Error)]
pub enum CommandError {
    /// Command ran to completion but exited non-zero
    #[error("command exited with status {code}: {stderr}")]
    Failed {
        /// Exit code (-1 when terminated by a signal)
        code: i32,
        /// Captured stderr, trimmed
        stderr: String,
    },

    /// Command did not exit within the configured timeout
    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    /// Command could not be spawned or reaped
    #[error("failed to execute command: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Runs shell command strings with captured output and a timeout
#[derive(Debug, Clone)]
pub struct CommandRunner {
    timeout: Duration,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl CommandRunner {
    /// Create a runner with the given per-command timeout
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Execute `cmd` via `sh -c`, returning trimmed stdout on zero exit.
    ///
    /// Non-zero exit, timeout, and spawn errors all surface as a
    /// [`CommandError`] with a diagnostic logged; the caller decides whether
    /// the failure is fatal (for this pipeline it never is).
    pub fn run(&self, cmd: &str) -> Result<String, CommandError> {
        debug!(command = cmd, "spawning shell command");

        let mut child = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                warn!(command = cmd, error = %e, "failed to spawn command");
                CommandError::Spawn(e)
            })?;

        // Drain the pipes on background threads so a chatty child (a full
        // build log easily exceeds the pipe buffer) cannot deadlock the
        // reaping loop below.
        let stdout_reader = spawn_pipe_reader(child.stdout.take());
        let stderr_reader = spawn_pipe_reader(child.stderr.take());

        let status = match self.reap_with_timeout(&mut child, cmd) {
            Ok(status) => status,
            Err(e) => {
                // Pipes close once the child is killed; join to avoid leaks.
                let _ = stdout_reader.join();
                let _ = stderr_reader.join();
                return Err(e);
            }
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();

        if status.success() {
            Ok(stdout.trim().to_string())
        } else {
            let code = status.code().unwrap_or(-1);
            warn!(
                command = cmd,
                code,
                stderr = stderr.trim(),
                "command exited non-zero"
            );
            Err(CommandError::Failed {
                code,
                stderr: stderr.trim().to_string(),
            })
        }
    }

    /// Poll the child until it exits or the timeout elapses; kill on timeout.
    fn reap_with_timeout(
        &self,
        child: &mut Child,
        cmd: &str,
    ) -> Result<std::process::ExitStatus, CommandError> {
        let start = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if start.elapsed() > self.timeout {
                warn!(command = cmd, timeout = ?self.timeout, "command timed out, killing");
                if let Err(e) = child.kill() {
                    warn!(command = cmd, error = %e, "failed to kill timed-out command");
                } else {
                    // Reap so the kill does not leave a zombie behind.
                    let _ = child.wait();
                }
                return Err(CommandError::Timeout(self.timeout));
            }
            thread::sleep(REAP_INTERVAL);
        }
    }
}

/// Read a child pipe to completion on a background thread
fn spawn_pipe_reader<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buf);
        }
        buf
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_captures_trimmed_stdout() {
        let runner = CommandRunner::default();
        let out = runner.run("echo '  42.5  '").unwrap();
        assert_eq!(out, "42.5");
    }

    #[test]
    fn test_run_nonzero_exit_is_failed() {
        let runner = CommandRunner::default();
        match runner.run("exit 3") {
            Err(CommandError::Failed { code, .. }) => assert_eq!(code, 3),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_run_captures_stderr_on_failure() {
        let runner = CommandRunner::default();
        match runner.run("echo boom >&2; exit 1") {
            Err(CommandError::Failed { stderr, .. }) => assert_eq!(stderr, "boom"),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_run_timeout_kills_process() {
        let runner = CommandRunner::new(Duration::from_millis(100));
        let start = Instant::now();
        match runner.run("sleep 30") {
            Err(CommandError::Timeout(t)) => assert_eq!(t, Duration::from_millis(100)),
            other => panic!("expected Timeout, got {:?}", other),
        }
        // Must not have waited for the sleep to finish
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_run_missing_binary_is_failed_not_panic() {
        // sh itself runs, the inner command fails with 127
        let runner = CommandRunner::default();
        match runner.run("definitely_not_a_real_binary_qq") {
            Err(CommandError::Failed { code, .. }) => assert_eq!(code, 127),
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_run_large_output_does_not_deadlock() {
        // Well past the 64 KiB pipe buffer
        let runner = CommandRunner::default();
        let out = runner
            .run("i=0; while [ $i -lt 20000 ]; do echo 0123456789; i=$((i+1)); done")
            .unwrap();
        assert!(out.len() > 200_000);
    }
}
