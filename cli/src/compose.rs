//! Container-engine boundary: compose-file layering and the
//! `ComposeEngine` trait over `docker compose`.
//!
//! Layering order is the contract the engine collaborator sees:
//! app-proxy fragment (only when the app's own compose file declares
//! the `app_proxy` service), tor fragment (only when remote access is
//! enabled), the common fragment, then the app's own compose file last
//! so its definitions take final precedence.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use anyhow::{Context, Result};
use harbor_common::HostConfig;

use crate::command_runner::{CommandRunner, PULL_TIMEOUT, TokioCommandRunner};
use crate::environment::Environment;
use crate::error::LifecycleError;
use crate::paths::HostPaths;

/// Service name that marks an app as proxy-fronted.
pub const APP_PROXY_SERVICE: &str = "app_proxy";

/// One app's compose invocation context: project name, layered file
/// chain, and the composed environment.
pub struct ComposeProject {
    pub app: String,
    pub files: Vec<PathBuf>,
    pub env: Environment,
}

impl ComposeProject {
    /// Build the layered invocation for `app`.
    ///
    /// # Errors
    ///
    /// `InvalidManifest` if the app's compose file is missing or
    /// unparsable.
    pub fn new(
        paths: &HostPaths,
        config: &HostConfig,
        app: &str,
        env: Environment,
    ) -> Result<Self, LifecycleError> {
        let app_file = paths.app_compose_file(app);
        let mut files = Vec::with_capacity(4);
        if declares_app_proxy(app, &app_file)? {
            files.push(paths.compose_fragment("app-proxy"));
        }
        if config.remote_access {
            files.push(paths.compose_fragment("tor"));
        }
        files.push(paths.compose_fragment("common"));
        files.push(app_file);
        // The file chain is passed to the engine as string arguments;
        // reject paths that cannot survive that conversion instead of
        // handing docker an empty -f.
        for file in &files {
            if file.to_str().is_none() {
                return Err(LifecycleError::InvalidManifest {
                    app: app.to_owned(),
                    reason: format!("compose file path {} is not valid UTF-8", file.display()),
                });
            }
        }
        Ok(Self {
            app: app.to_owned(),
            files,
            env,
        })
    }

    fn args<'a>(&'a self, tail: &[&'a str]) -> Vec<&'a str> {
        let mut args = vec!["compose", "--project-name", self.app.as_str()];
        for file in &self.files {
            args.push("-f");
            args.push(file.to_str().unwrap_or_default());
        }
        args.extend_from_slice(tail);
        args
    }
}

/// Whether the app's own compose file declares the proxy service.
///
/// # Errors
///
/// `InvalidManifest` when the file is missing or not valid YAML.
pub fn declares_app_proxy(app: &str, compose_file: &Path) -> Result<bool, LifecycleError> {
    let raw =
        std::fs::read_to_string(compose_file).map_err(|e| LifecycleError::InvalidManifest {
            app: app.to_owned(),
            reason: format!("cannot read {}: {e}", compose_file.display()),
        })?;
    let doc: serde_yaml::Value =
        serde_yaml::from_str(&raw).map_err(|e| LifecycleError::InvalidManifest {
            app: app.to_owned(),
            reason: format!("compose file: {e}"),
        })?;
    Ok(doc
        .get("services")
        .and_then(|s| s.get(APP_PROXY_SERVICE))
        .is_some())
}

/// Abstracts the container engine so transitions are testable without
/// docker.
#[allow(async_fn_in_trait)]
pub trait ComposeEngine {
    /// Pull the project's images.
    async fn pull(&self, project: &ComposeProject) -> Result<()>;

    /// Bring the project's containers up, detached.
    async fn up(&self, project: &ComposeProject) -> Result<()>;

    /// Stop and remove the project's containers (force).
    async fn stop(&self, project: &ComposeProject) -> Result<()>;

    /// Tear the project down, removing containers and images.
    async fn down(&self, project: &ComposeProject) -> Result<()>;

    /// Image ids currently referenced by the project.
    async fn images(&self, project: &ComposeProject) -> Result<Vec<String>>;

    /// Best-effort removal of images by id (update cleanup).
    async fn remove_images(&self, ids: &[String]) -> Result<()>;

    /// Stream project logs with pass-through stdio.
    async fn logs(&self, project: &ComposeProject, extra: &[String]) -> Result<ExitStatus>;

    /// Arbitrary compose subcommand with pass-through stdio.
    async fn passthrough(&self, project: &ComposeProject, extra: &[String])
    -> Result<ExitStatus>;
}

/// Production engine — shells out to `docker compose`.
pub struct DockerComposeEngine<R: CommandRunner = TokioCommandRunner> {
    runner: R,
}

impl DockerComposeEngine {
    #[must_use]
    pub fn default_runner() -> Self {
        Self {
            runner: TokioCommandRunner::default(),
        }
    }
}

impl<R: CommandRunner> DockerComposeEngine<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn run_checked(&self, project: &ComposeProject, tail: &[&str]) -> Result<()> {
        let args = project.args(tail);
        let output = self.runner.run("docker", &args, &project.env).await?;
        ensure_success("docker compose", &output)
    }
}

fn ensure_success(program: &str, output: &std::process::Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(LifecycleError::ExternalCommandFailure {
        program: program.to_owned(),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
    }
    .into())
}

impl<R: CommandRunner> ComposeEngine for DockerComposeEngine<R> {
    async fn pull(&self, project: &ComposeProject) -> Result<()> {
        let args = project.args(&["pull"]);
        let output = self
            .runner
            .run_with_timeout("docker", &args, &project.env, PULL_TIMEOUT)
            .await?;
        ensure_success("docker compose pull", &output)
    }

    async fn up(&self, project: &ComposeProject) -> Result<()> {
        self.run_checked(project, &["up", "--detach", "--remove-orphans"])
            .await
    }

    async fn stop(&self, project: &ComposeProject) -> Result<()> {
        self.run_checked(project, &["rm", "--stop", "--force"]).await
    }

    async fn down(&self, project: &ComposeProject) -> Result<()> {
        self.run_checked(project, &["down", "--rmi", "all", "--remove-orphans"])
            .await
    }

    async fn images(&self, project: &ComposeProject) -> Result<Vec<String>> {
        let args = project.args(&["images", "--quiet"]);
        let output = self.runner.run("docker", &args, &project.env).await?;
        ensure_success("docker compose images", &output)?;
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect())
    }

    async fn remove_images(&self, ids: &[String]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let mut args = vec!["rmi"];
        args.extend(ids.iter().map(String::as_str));
        // best effort: exit status intentionally ignored, images still
        // in use by another project are expected to survive
        let _ = self.runner.run("docker", &args, &Environment::new()).await?;
        Ok(())
    }

    async fn logs(&self, project: &ComposeProject, extra: &[String]) -> Result<ExitStatus> {
        let mut tail = vec!["logs"];
        tail.extend(extra.iter().map(String::as_str));
        let args = project.args(&tail);
        self.runner
            .run_passthrough("docker", &args, &project.env)
            .await
            .context("streaming logs")
    }

    async fn passthrough(
        &self,
        project: &ComposeProject,
        extra: &[String],
    ) -> Result<ExitStatus> {
        let tail: Vec<&str> = extra.iter().map(String::as_str).collect();
        let args = project.args(&tail);
        self.runner
            .run_passthrough("docker", &args, &project.env)
            .await
            .context("running compose pass-through")
    }
}
