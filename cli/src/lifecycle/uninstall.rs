//! The uninstall transition.
//!
//! The uninstall hooks live inside the data directory that is about to
//! be deleted, so both are snapshotted to a tempdir first; the
//! post-uninstall hook runs from the snapshot after the registry entry
//! is gone, and the snapshot is discarded when the tempdir drops.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::AppContext;
use crate::compose::{ComposeEngine, ComposeProject};
use crate::environment::compose_env;
use crate::error::LifecycleError;
use crate::hooks::{self, HookOutcome};

/// Uninstall `app`: remove containers and images, delete app data,
/// deregister.
///
/// # Errors
///
/// `NotInstalled` when the registry does not know the app; otherwise
/// fails on a broken manifest, a failed teardown, or a failed data
/// deletion.
pub async fn uninstall(ctx: &AppContext, engine: &impl ComposeEngine, app: &str) -> Result<()> {
    if !ctx.registry.is_installed(app)? {
        return Err(LifecycleError::NotInstalled {
            app: app.to_owned(),
        }
        .into());
    }

    let env = compose_env(&ctx.paths, &ctx.config, app)?;
    let data_dir = ctx.paths.app_data_dir(app);

    let snapshot = tempfile::tempdir().context("creating hook snapshot dir")?;
    let pre = snapshot_hook(&data_dir, "pre-uninstall", snapshot.path())?;
    let post = snapshot_hook(&data_dir, "post-uninstall", snapshot.path())?;

    if let Some(hook) = &pre {
        run_snapshotted(ctx, hook, &data_dir, &env, "pre-uninstall").await;
    }

    ctx.output.step(&format!("removing {app} containers and images..."));
    let project = ComposeProject::new(&ctx.paths, &ctx.config, app, env.clone())?;
    engine
        .down(&project)
        .await
        .with_context(|| format!("tearing down {app}"))?;

    if data_dir.exists() {
        std::fs::remove_dir_all(&data_dir)
            .with_context(|| format!("removing {}", data_dir.display()))?;
    }

    ctx.registry.remove_installed_app(app)?;

    if let Some(hook) = &post {
        run_snapshotted(ctx, hook, &data_dir, &env, "post-uninstall").await;
    }

    ctx.output.success(&format!("{app} uninstalled"));
    Ok(())
}

fn snapshot_hook(data_dir: &Path, name: &str, snapshot_dir: &Path) -> Result<Option<PathBuf>> {
    let source = hooks::hook_path(data_dir, name);
    if !source.is_file() {
        return Ok(None);
    }
    let target = snapshot_dir.join(name);
    // fs::copy preserves the executable bit
    std::fs::copy(&source, &target)
        .with_context(|| format!("snapshotting hook {}", source.display()))?;
    Ok(Some(target))
}

async fn run_snapshotted(
    ctx: &AppContext,
    hook: &Path,
    data_dir: &Path,
    env: &crate::environment::Environment,
    name: &str,
) {
    if let HookOutcome::Failed(msg) =
        hooks::run_hook_file(&ctx.paths, hook, data_dir, env).await
    {
        ctx.output.warn(&format!("hook {name}: {msg} (continuing)"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::test_support::MockEngine;
    use crate::lifecycle::test_fixtures::{install_app_files, seed_store_app, test_ctx};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_uninstall_requires_registration() {
        let dir = TempDir::new().expect("tempdir");
        let ctx = test_ctx(&dir);
        seed_store_app(&ctx, "demo", &[]);
        let engine = MockEngine::new();
        let err = uninstall(&ctx, &engine, "demo").await.expect_err("must fail");
        assert!(
            err.downcast_ref::<LifecycleError>()
                .is_some_and(|e| matches!(e, LifecycleError::NotInstalled { .. }))
        );
        assert!(engine.recorded().is_empty());
    }

    #[tokio::test]
    async fn test_uninstall_tears_down_deletes_and_deregisters() {
        let dir = TempDir::new().expect("tempdir");
        let ctx = test_ctx(&dir);
        seed_store_app(&ctx, "demo", &[]);
        install_app_files(&ctx, "demo");
        let engine = MockEngine::new();
        uninstall(&ctx, &engine, "demo").await.expect("uninstall");
        assert_eq!(engine.recorded(), vec!["down demo"]);
        assert!(!ctx.paths.app_data_dir("demo").exists());
        assert!(!ctx.registry.is_installed("demo").expect("is_installed"));
    }

    #[tokio::test]
    async fn test_uninstall_teardown_failure_keeps_registration() {
        let dir = TempDir::new().expect("tempdir");
        let ctx = test_ctx(&dir);
        seed_store_app(&ctx, "demo", &[]);
        install_app_files(&ctx, "demo");
        let engine = MockEngine::failing_on("down");
        assert!(uninstall(&ctx, &engine, "demo").await.is_err());
        // registry removal is the last destructive step; retry converges
        assert!(ctx.registry.is_installed("demo").expect("is_installed"));
        assert!(ctx.paths.app_data_dir("demo").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_uninstall_post_hook_runs_from_snapshot_after_deletion() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().expect("tempdir");
        let ctx = test_ctx(&dir);
        seed_store_app(&ctx, "demo", &[]);
        install_app_files(&ctx, "demo");
        let marker = dir.path().join("post-ran");
        let hook = hooks::hook_path(&ctx.paths.app_data_dir("demo"), "post-uninstall");
        std::fs::create_dir_all(hook.parent().expect("parent")).expect("mkdir");
        std::fs::write(
            &hook,
            format!("#!/bin/sh\ntest ! -d \"$APP_DATA_DIR\" && touch {}\n", marker.display()),
        )
        .expect("write");
        std::fs::set_permissions(&hook, std::fs::Permissions::from_mode(0o755))
            .expect("chmod");
        uninstall(&ctx, &MockEngine::new(), "demo").await.expect("uninstall");
        assert!(
            marker.exists(),
            "post-uninstall hook must run after the data dir is gone"
        );
    }
}
