//! Runner — invokes external algorithms as subprocesses.
//!
//! The value is written to the child's stdin and its stdout is the result.
//! A child that outlives its timeout is killed.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::RunError;
use crate::predictor::BoxFuture;

/// Port for executing an external algorithm with a serialized value.
pub trait Runner: Send + Sync {
    fn run_algorithm_with_value<'a>(
        &'a self,
        algorithm_path: &'a str,
        value: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<String, RunError>>;
}

/// Runs algorithms as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    async fn run(
        algorithm_path: &str,
        value: &str,
        timeout: Duration,
    ) -> Result<String, RunError> {
        let mut child = Command::new(algorithm_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| RunError::Spawn {
                path: algorithm_path.to_string(),
                source,
            })?;

        let io_err = |source: std::io::Error| RunError::Io {
            path: algorithm_path.to_string(),
            source,
        };

        let exchange = async move {
            if let Some(mut stdin) = child.stdin.take() {
                // A child may exit without reading its input; its status decides.
                if let Err(e) = stdin.write_all(value.as_bytes()).await
                    && e.kind() != std::io::ErrorKind::BrokenPipe
                {
                    return Err(io_err(e));
                }
                // Dropping stdin closes the pipe so the child sees EOF.
            }
            child.wait_with_output().await.map_err(io_err)
        };

        let output = match tokio::time::timeout(timeout, exchange).await {
            Ok(output) => output?,
            Err(_) => {
                debug!(path = %algorithm_path, ?timeout, "algorithm timed out, killed");
                return Err(RunError::Timeout {
                    path: algorithm_path.to_string(),
                    timeout,
                });
            }
        };

        if !output.status.success() {
            return Err(RunError::Exit {
                path: algorithm_path.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!(path = %algorithm_path, bytes = stdout.len(), "algorithm finished");
        Ok(stdout)
    }
}

impl Runner for ProcessRunner {
    fn run_algorithm_with_value<'a>(
        &'a self,
        algorithm_path: &'a str,
        value: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<String, RunError>> {
        Box::pin(Self::run(algorithm_path, value, timeout))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn script(dir: &tempfile::TempDir, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.path().join("algorithm.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn returns_stdout_and_feeds_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let path = script(&dir, "cat");

        let out = ProcessRunner::new()
            .run_algorithm_with_value(&path, "{\"lookAhead\":0}", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out, "{\"lookAhead\":0}");
    }

    #[tokio::test]
    async fn non_zero_exit_is_reported_with_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let path = script(&dir, "echo boom >&2\nexit 3");

        let err = ProcessRunner::new()
            .run_algorithm_with_value(&path, "", Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Exit { ref stderr, .. } if stderr == "boom"));
    }

    #[tokio::test]
    async fn slow_algorithm_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = script(&dir, "sleep 5");

        let err = ProcessRunner::new()
            .run_algorithm_with_value(&path, "", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Timeout { .. }));
    }

    #[tokio::test]
    async fn missing_algorithm_fails_to_spawn() {
        let err = ProcessRunner::new()
            .run_algorithm_with_value("/nonexistent/algorithm", "", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Spawn { .. }));
    }
}
