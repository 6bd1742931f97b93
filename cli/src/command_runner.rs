use std::process::{Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::AsyncReadExt;

use crate::environment::Environment;

/// Default timeout for short container-engine commands (ps, images, rm).
pub const DEFAULT_CMD_TIMEOUT: Duration = Duration::from_secs(120);

/// Timeout for image pulls, which can take far longer on slow links.
pub const PULL_TIMEOUT: Duration = Duration::from_secs(3600);

/// Generic command execution with timeout and guaranteed process kill.
///
/// This trait is NOT tied to docker — it can run any external command.
/// The production implementation uses tokio; test doubles can return
/// canned results without spawning processes.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a command with the default timeout, passing `env` as extra
    /// process environment.
    async fn run(&self, program: &str, args: &[&str], env: &Environment) -> Result<Output>;

    /// Run a command with a custom timeout (overrides default).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        env: &Environment,
        timeout: Duration,
    ) -> Result<Output>;

    /// Run a command with inherited stdio (interactive pass-through,
    /// e.g. `logs --follow`). No timeout — caller controls lifetime.
    async fn run_passthrough(
        &self,
        program: &str,
        args: &[&str],
        env: &Environment,
    ) -> Result<std::process::ExitStatus>;
}

/// Production `CommandRunner` — tokio process execution with guaranteed
/// timeout and kill.
///
/// `tokio::time::timeout` around `.output().await` does not kill the
/// child when the timeout fires on all platforms — the future is
/// dropped but the OS process keeps running. `tokio::select!` with an
/// explicit `child.kill()` guarantees termination.
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_CMD_TIMEOUT)
    }
}

impl TokioCommandRunner {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str], env: &Environment) -> Result<Output> {
        self.run_with_timeout(program, args, env, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        env: &Environment,
        timeout: Duration,
    ) -> Result<Output> {
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .envs(env.iter())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();

        // Read stdout/stderr CONCURRENTLY with wait() to avoid pipe
        // deadlock: a child writing more than the OS pipe buffer blocks
        // on write, and wait() alone would never resolve.
        tokio::select! {
            result = async {
                let (status, stdout, stderr) = tokio::join!(
                    child.wait(),
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stdout_handle {
                            let _ = h.read_to_end(&mut buf).await;
                        }
                        buf
                    },
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stderr_handle {
                            let _ = h.read_to_end(&mut buf).await;
                        }
                        buf
                    },
                );
                Ok(Output {
                    status: status.with_context(|| format!("waiting for {program}"))?,
                    stdout,
                    stderr,
                })
            } => result,
            () = tokio::time::sleep(timeout) => {
                let _ = child.kill().await;
                anyhow::bail!("{program} timed out after {}s", timeout.as_secs())
            }
        }
    }

    async fn run_passthrough(
        &self,
        program: &str,
        args: &[&str],
        env: &Environment,
    ) -> Result<std::process::ExitStatus> {
        let mut child = tokio::process::Command::new(program)
            .args(args)
            .envs(env.iter())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        child
            .wait()
            .await
            .with_context(|| format!("waiting for {program}"))
    }
}
