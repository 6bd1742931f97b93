//! Lifecycle hook execution.
//!
//! Hooks are optional executables under `<app-data>/hooks/`, looked up
//! by fixed name. They receive the composed environment plus
//! `APP_ROOT`/`APP_DATA_DIR`; their own files are never modified. A
//! failing hook is reported as a value — callers log it and move on, a
//! hook can never abort a transition.

use std::path::{Path, PathBuf};

use crate::environment::Environment;
use crate::paths::HostPaths;

/// Result of attempting one hook, returned as a value rather than an
/// error so the orchestrator's policy (log and continue) is explicit.
#[derive(Debug, PartialEq, Eq)]
pub enum HookOutcome {
    /// No executable hook with this name exists.
    NotPresent,
    /// The hook ran and exited zero.
    Completed,
    /// The hook could not be spawned or exited non-zero.
    Failed(String),
}

/// Path of a named hook under an app data directory.
#[must_use]
pub fn hook_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join("hooks").join(name)
}

/// Run the named hook from `data_dir` if present and executable.
pub async fn run_hook(
    paths: &HostPaths,
    data_dir: &Path,
    name: &str,
    env: &Environment,
) -> HookOutcome {
    run_hook_file(paths, &hook_path(data_dir, name), data_dir, env).await
}

/// Run a hook from an explicit file path. Used directly for snapshotted
/// uninstall hooks, which outlive the data directory they came from.
pub async fn run_hook_file(
    paths: &HostPaths,
    hook: &Path,
    data_dir: &Path,
    env: &Environment,
) -> HookOutcome {
    if !is_executable(hook) {
        return HookOutcome::NotPresent;
    }
    let mut command = tokio::process::Command::new(hook);
    command
        .envs(env.iter())
        .env("APP_ROOT", paths.root())
        .env("APP_DATA_DIR", data_dir);
    if data_dir.is_dir() {
        command.current_dir(data_dir);
    }
    match command.status().await {
        Ok(status) if status.success() => HookOutcome::Completed,
        Ok(status) => HookOutcome::Failed(format!("{} exited with {status}", hook.display())),
        Err(e) => HookOutcome::Failed(format!("{} failed to start: {e}", hook.display())),
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.is_file()
        && std::fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn paths(dir: &TempDir) -> HostPaths {
        HostPaths::with_root(dir.path().to_path_buf())
    }

    #[cfg(unix)]
    fn write_hook(data_dir: &Path, name: &str, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = hook_path(data_dir, name);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).expect("write hook");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("chmod");
        path
    }

    #[tokio::test]
    async fn test_missing_hook_is_not_present() {
        let dir = TempDir::new().expect("tempdir");
        let outcome = run_hook(
            &paths(&dir),
            &dir.path().join("data"),
            "pre-install",
            &Environment::new(),
        )
        .await;
        assert_eq!(outcome, HookOutcome::NotPresent);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_hook_completes() {
        let dir = TempDir::new().expect("tempdir");
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).expect("mkdir");
        write_hook(&data, "pre-start", "exit 0");
        let outcome =
            run_hook(&paths(&dir), &data, "pre-start", &Environment::new()).await;
        assert_eq!(outcome, HookOutcome::Completed);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_hook_reports_failure_without_erroring() {
        let dir = TempDir::new().expect("tempdir");
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).expect("mkdir");
        write_hook(&data, "post-start", "exit 3");
        let outcome =
            run_hook(&paths(&dir), &data, "post-start", &Environment::new()).await;
        assert!(matches!(outcome, HookOutcome::Failed(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_executable_file_is_skipped() {
        let dir = TempDir::new().expect("tempdir");
        let data = dir.path().join("data");
        let path = hook_path(&data, "pre-stop");
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").expect("write");
        // mode 644 — present but not executable
        let outcome =
            run_hook(&paths(&dir), &data, "pre-stop", &Environment::new()).await;
        assert_eq!(outcome, HookOutcome::NotPresent);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_hook_receives_environment_and_data_dir() {
        let dir = TempDir::new().expect("tempdir");
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).expect("mkdir");
        let marker = dir.path().join("seen");
        write_hook(
            &data,
            "post-install",
            &format!("printf '%s %s' \"$APP_ID\" \"$APP_DATA_DIR\" > {}", marker.display()),
        );
        let mut env = Environment::new();
        env.set("APP_ID", "demo");
        let outcome = run_hook(&paths(&dir), &data, "post-install", &env).await;
        assert_eq!(outcome, HookOutcome::Completed);
        let seen = std::fs::read_to_string(&marker).expect("marker");
        assert_eq!(seen, format!("demo {}", data.display()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_snapshotted_hook_runs_after_source_dir_removed() {
        let dir = TempDir::new().expect("tempdir");
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).expect("mkdir");
        let original = write_hook(&data, "post-uninstall", "exit 0");
        let snapshot = dir.path().join("snapshot-post-uninstall");
        std::fs::copy(&original, &snapshot).expect("snapshot");
        std::fs::remove_dir_all(&data).expect("remove data dir");
        let outcome =
            run_hook_file(&paths(&dir), &snapshot, &data, &Environment::new()).await;
        assert_eq!(outcome, HookOutcome::Completed);
    }
}
