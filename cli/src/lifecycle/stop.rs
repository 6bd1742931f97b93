//! The stop transition. Safe to call speculatively — it never checks
//! registry membership, only that the app's files exist.

use anyhow::{Context, Result};

use crate::app::AppContext;
use crate::compose::{ComposeEngine, ComposeProject};
use crate::environment::compose_env;
use crate::lifecycle::fire_hook;

/// Stop `app`: pre-stop hook, stop and remove containers (force),
/// post-stop hook.
///
/// # Errors
///
/// Fails on a broken manifest or a failed container stop.
pub async fn stop(ctx: &AppContext, engine: &impl ComposeEngine, app: &str) -> Result<()> {
    let env = compose_env(&ctx.paths, &ctx.config, app)?;
    let data_dir = ctx.paths.app_data_dir(app);

    fire_hook(ctx, &data_dir, "pre-stop", &env).await;
    let project = ComposeProject::new(&ctx.paths, &ctx.config, app, env.clone())?;
    engine
        .stop(&project)
        .await
        .with_context(|| format!("stopping {app}"))?;
    fire_hook(ctx, &data_dir, "post-stop", &env).await;
    ctx.output.success(&format!("{app} stopped"));
    Ok(())
}
