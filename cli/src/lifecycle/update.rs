//! The update transition and its two-phase file copy.
//!
//! Runtime files (compose file, templates, exports, hooks) are copied
//! from the store before images are pulled; the manifest is copied only
//! after the app is running again, so an observer never reads a new
//! version number next to an old runtime. A completion guard makes the
//! second phase happen on every exit path between the two copies.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::AppContext;
use crate::compose::{ComposeEngine, ComposeProject};
use crate::environment::{Environment, compose_env};
use crate::error::LifecycleError;
use crate::lifecycle::{copy_allow_list, fire_hook, start, stop};
use crate::template::render_templates;

/// Runtime files replaced before the restart.
const PRE_PHASE_FILES: &[&str] = &["docker-compose.yml", "exports.env", "templates", "hooks"];

/// Files replaced only once the app runs the new version.
const POST_PHASE_FILES: &[&str] = &["app.yml"];

/// Flags for the update transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    /// Leave the current containers running during the update.
    pub skip_stop: bool,
    /// Do not start the app after replacing files and images.
    pub skip_start: bool,
}

/// Runs its action on drop unless disarmed. Armed across the risky
/// window between the two copy phases: an error, panic, or a
/// signal-induced future drop still completes the second phase.
struct CompletionGuard<F: FnOnce()> {
    action: Option<F>,
}

impl<F: FnOnce()> CompletionGuard<F> {
    fn arm(action: F) -> Self {
        Self {
            action: Some(action),
        }
    }

    fn disarm(mut self) {
        self.action = None;
    }
}

impl<F: FnOnce()> Drop for CompletionGuard<F> {
    fn drop(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }
}

/// Update `app` from its store definition.
///
/// # Errors
///
/// `NotInstalled` when the app is not registered; otherwise fails on a
/// broken manifest, a failed stop/pull/start, or a failed file copy.
pub async fn update(
    ctx: &AppContext,
    engine: &impl ComposeEngine,
    app: &str,
    opts: UpdateOptions,
) -> Result<()> {
    if !ctx.registry.is_installed(app)? {
        return Err(LifecycleError::NotInstalled {
            app: app.to_owned(),
        }
        .into());
    }
    let store = ctx.paths.store_dir(app);
    let data_dir = ctx.paths.app_data_dir(app);

    fire_hook(ctx, &data_dir, "pre-update", &Environment::new()).await;

    // Image ids in use before the update, for best-effort cleanup once
    // the new ones are confirmed running.
    let old_images = current_images(ctx, engine, app).await;

    ctx.output.step(&format!("copying updated {app} files..."));
    copy_allow_list(&store, &data_dir, PRE_PHASE_FILES)
        .with_context(|| format!("copying runtime files for {app}"))?;

    let guard = arm_manifest_guard(&store, &data_dir);

    if !opts.skip_stop {
        stop::stop(ctx, engine, app).await?;
    }

    let env = compose_env(&ctx.paths, &ctx.config, app)?;
    render_templates(&data_dir, &env)
        .with_context(|| format!("rendering templates for {app}"))?;

    ctx.output.step(&format!("pulling images for {app}..."));
    let project = ComposeProject::new(&ctx.paths, &ctx.config, app, env.clone())?;
    engine
        .pull(&project)
        .await
        .with_context(|| format!("pulling images for {app}"))?;

    if !opts.skip_start {
        start::start(ctx, engine, app).await?;
    }

    copy_allow_list(&store, &data_dir, POST_PHASE_FILES)
        .with_context(|| format!("copying manifest for {app}"))?;
    guard.disarm();

    cleanup_stale_images(ctx, engine, app, old_images).await;

    fire_hook(ctx, &data_dir, "post-update", &env).await;
    ctx.output.success(&format!("{app} updated"));
    Ok(())
}

fn arm_manifest_guard(
    store: &Path,
    data_dir: &Path,
) -> CompletionGuard<impl FnOnce() + use<>> {
    let store: PathBuf = store.to_path_buf();
    let data_dir: PathBuf = data_dir.to_path_buf();
    CompletionGuard::arm(move || {
        // Drop context: failures cannot propagate, the copy converges
        // on the next invocation instead.
        let _ = copy_allow_list(&store, &data_dir, POST_PHASE_FILES);
    })
}

async fn current_images(
    ctx: &AppContext,
    engine: &impl ComposeEngine,
    app: &str,
) -> Vec<String> {
    let Ok(env) = compose_env(&ctx.paths, &ctx.config, app) else {
        return Vec::new();
    };
    let Ok(project) = ComposeProject::new(&ctx.paths, &ctx.config, app, env) else {
        return Vec::new();
    };
    engine.images(&project).await.unwrap_or_default()
}

async fn cleanup_stale_images(
    ctx: &AppContext,
    engine: &impl ComposeEngine,
    app: &str,
    old_images: Vec<String>,
) {
    if old_images.is_empty() {
        return;
    }
    let new_images = current_images(ctx, engine, app).await;
    let stale: Vec<String> = old_images
        .into_iter()
        .filter(|id| !new_images.contains(id))
        .collect();
    if stale.is_empty() {
        return;
    }
    if engine.remove_images(&stale).await.is_err() {
        ctx.output
            .warn(&format!("could not remove previous images for {app}"));
    }
}
