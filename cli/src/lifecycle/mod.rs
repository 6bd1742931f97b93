//! Lifecycle transitions — one module per top-level command.
//!
//! Each transition is a free async function taking the `AppContext`
//! plus an injected `ComposeEngine`, so tests drive them against a mock
//! engine without docker. Hook failures are logged and swallowed here;
//! everything else propagates and aborts the transition.

pub mod install;
pub mod start;
pub mod stop;
pub mod uninstall;
pub mod update;

use std::path::Path;

use anyhow::{Context, Result};

use crate::app::AppContext;
use crate::compose::ComposeEngine;
use crate::environment::Environment;
use crate::hooks::{self, HookOutcome};

pub use update::UpdateOptions;

/// Run a named hook and apply the orchestrator's policy: failures are
/// warned about and discarded, never propagated.
pub(crate) async fn fire_hook(ctx: &AppContext, data_dir: &Path, name: &str, env: &Environment) {
    if let HookOutcome::Failed(msg) = hooks::run_hook(&ctx.paths, data_dir, name, env).await {
        ctx.output.warn(&format!("hook {name}: {msg} (continuing)"));
    }
}

/// Copy a directory tree, overwriting existing files. Idempotent by
/// construction, which is what makes re-running install safe.
pub(crate) fn copy_recursive(src: &Path, dst: &Path) -> Result<()> {
    std::fs::create_dir_all(dst)
        .with_context(|| format!("creating directory {}", dst.display()))?;
    let entries =
        std::fs::read_dir(src).with_context(|| format!("reading {}", src.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("reading {}", src.display()))?;
        let target = dst.join(entry.file_name());
        if entry.path().is_dir() {
            copy_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target).with_context(|| {
                format!("copying {} to {}", entry.path().display(), target.display())
            })?;
        }
    }
    Ok(())
}

/// Copy only the named entries (files or directories) from `src` to
/// `dst`. Entries absent in `src` are skipped — an app without
/// templates or hooks is normal.
pub(crate) fn copy_allow_list(src: &Path, dst: &Path, entries: &[&str]) -> Result<()> {
    std::fs::create_dir_all(dst)
        .with_context(|| format!("creating directory {}", dst.display()))?;
    for name in entries {
        let from = src.join(name);
        if !from.exists() {
            continue;
        }
        let to = dst.join(name);
        if from.is_dir() {
            copy_recursive(&from, &to)?;
        } else {
            std::fs::copy(&from, &to)
                .with_context(|| format!("copying {} to {}", from.display(), to.display()))?;
        }
    }
    Ok(())
}

/// Reinstall: uninstall followed by install. A macro-transition with no
/// state of its own.
///
/// # Errors
///
/// Propagates any failure from either phase.
pub async fn reinstall(
    ctx: &AppContext,
    engine: &impl ComposeEngine,
    app: &str,
    origin: harbor_common::RepoRef,
) -> Result<()> {
    uninstall::uninstall(ctx, engine, app).await?;
    install::install(ctx, engine, app, origin).await
}

/// Restart: stop followed by start.
///
/// # Errors
///
/// Propagates any failure from either phase.
pub async fn restart(ctx: &AppContext, engine: &impl ComposeEngine, app: &str) -> Result<()> {
    stop::stop(ctx, engine, app).await?;
    start::start(ctx, engine, app).await
}
