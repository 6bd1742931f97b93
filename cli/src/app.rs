//! Application context — unified state passed to every command handler.
//!
//! `AppContext` bundles the cross-cutting pieces (output, host config,
//! paths, registry, engine) so adding a new concern is one field change
//! here instead of a signature change across every command.

use anyhow::{Context, Result};
use harbor_common::HostConfig;

use crate::compose::DockerComposeEngine;
use crate::output::OutputContext;
use crate::paths::HostPaths;
use crate::registry::Registry;

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Skip interactive prompts (also set by `CI` / `HARBOR_YES` env vars).
    pub yes: bool,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Host configuration, defaulted when `harbor.yml` is absent.
    pub config: HostConfig,
    /// On-disk layout under the harbor root.
    pub paths: HostPaths,
    /// Locked registry store.
    pub registry: Registry,
    /// Container engine.
    pub engine: DockerComposeEngine,
    /// When `true`, skip interactive prompts and use defaults.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be resolved or an
    /// existing `harbor.yml` cannot be parsed.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("HARBOR_YES").is_ok();
        let non_interactive = flags.yes || ci_env;

        let paths = HostPaths::discover()?;
        let config = load_config(&paths)?;
        let registry = Registry::new(&paths, &config);

        Ok(Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            config,
            paths,
            registry,
            engine: DockerComposeEngine::default_runner(),
            non_interactive,
        })
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true` (CI, `--yes` flag, or
    /// `HARBOR_YES` env), returns `default` immediately without
    /// prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }
}

fn load_config(paths: &HostPaths) -> Result<HostConfig> {
    let file = paths.config_file();
    if !file.exists() {
        return Ok(HostConfig::default());
    }
    let raw = std::fs::read_to_string(&file)
        .with_context(|| format!("reading config {}", file.display()))?;
    serde_yaml::from_str(&raw).with_context(|| format!("parsing config {}", file.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_absent_file_is_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let paths = HostPaths::with_root(dir.path().to_path_buf());
        let config = load_config(&paths).expect("load");
        assert!(!config.remote_access);
    }

    #[test]
    fn test_load_config_reads_harbor_yml() {
        let dir = TempDir::new().expect("tempdir");
        let paths = HostPaths::with_root(dir.path().to_path_buf());
        std::fs::write(paths.config_file(), "remote_access: true\nnetwork_ip: 10.0.0.9\n")
            .expect("write");
        let config = load_config(&paths).expect("load");
        assert!(config.remote_access);
        assert_eq!(config.network_ip, "10.0.0.9");
    }

    #[test]
    fn test_load_config_invalid_yaml_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let paths = HostPaths::with_root(dir.path().to_path_buf());
        std::fs::write(paths.config_file(), ":::").expect("write");
        assert!(load_config(&paths).is_err());
    }
}
