//! The start transition: environment, templates, hidden-service wait,
//! hooks, containers up.

use std::time::Duration;

use anyhow::{Context, Result};

use crate::app::AppContext;
use crate::compose::{ComposeEngine, ComposeProject, declares_app_proxy};
use crate::environment::compose_env;
use crate::lifecycle::fire_hook;
use crate::template::render_templates;

/// Start `app`: compose + template the environment, wait for the
/// hidden-service address when applicable, then bring containers up
/// between the pre/post-start hooks.
///
/// # Errors
///
/// Fails on a broken manifest, a failed environment composition, or a
/// failed `up`. A hidden-service address that never appears is logged,
/// not fatal.
pub async fn start(ctx: &AppContext, engine: &impl ComposeEngine, app: &str) -> Result<()> {
    let env = compose_env(&ctx.paths, &ctx.config, app)?;
    let data_dir = ctx.paths.app_data_dir(app);
    render_templates(&data_dir, &env)
        .with_context(|| format!("rendering templates for {app}"))?;

    let proxied = declares_app_proxy(app, &ctx.paths.app_compose_file(app))?;
    if ctx.config.remote_access && proxied {
        wait_for_hidden_service(ctx, app).await;
    }

    fire_hook(ctx, &data_dir, "pre-start", &env).await;
    let project = ComposeProject::new(&ctx.paths, &ctx.config, app, env.clone())?;
    engine
        .up(&project)
        .await
        .with_context(|| format!("starting {app}"))?;
    fire_hook(ctx, &data_dir, "post-start", &env).await;
    ctx.output.success(&format!("{app} started"));
    Ok(())
}

/// Poll for the tor-provisioned hostname file with a bounded budget.
/// The file appears asynchronously; proceeding without it is fine — the
/// environment falls back to a placeholder domain.
async fn wait_for_hidden_service(ctx: &AppContext, app: &str) {
    let file = ctx.paths.hidden_service_hostname_file(app);
    let interval = Duration::from_millis(ctx.config.hidden_service_poll_interval_millis);
    for _ in 0..ctx.config.hidden_service_poll_attempts {
        if file.exists() {
            return;
        }
        tokio::time::sleep(interval).await;
    }
    ctx.output.warn(&format!(
        "hidden service address for {app} not provisioned yet, continuing with placeholder"
    ));
}
