//! The install transition.
//!
//! Registry registration is the last step: a failure anywhere earlier
//! leaves the app unregistered, so a retried install converges — file
//! copy and environment composition are idempotent.

use anyhow::{Context, Result};
use harbor_common::RepoRef;

use crate::app::AppContext;
use crate::compose::{ComposeEngine, ComposeProject};
use crate::environment::{Environment, compose_env};
use crate::error::LifecycleError;
use crate::lifecycle::{copy_recursive, fire_hook, start};
use crate::resolver::Resolver;
use crate::template::render_templates;

/// Install `app` from its store definition.
///
/// # Errors
///
/// Fails on a missing or invalid store definition, a dependency cycle,
/// a failed image pull, or a failed start. Hook failures never abort.
pub async fn install(
    ctx: &AppContext,
    engine: &impl ComposeEngine,
    app: &str,
    origin: RepoRef,
) -> Result<()> {
    let store = ctx.paths.store_dir(app);
    if !store.join("app.yml").exists() {
        return Err(LifecycleError::InvalidManifest {
            app: app.to_owned(),
            reason: format!("no app definition at {}", store.display()),
        }
        .into());
    }

    // Validate the manifest and the dependency chain before touching
    // anything on disk.
    let resolver = Resolver::new(&ctx.paths);
    resolver.load_manifest(app)?;
    resolver.transitive_dependencies_of(app)?;

    ctx.output.step(&format!("copying {app} files..."));
    let data_dir = ctx.paths.app_data_dir(app);
    copy_recursive(&store, &data_dir)
        .with_context(|| format!("copying app definition for {app}"))?;

    // The hook arrived with the copy above; the full environment does
    // not exist yet at this point.
    fire_hook(ctx, &data_dir, "pre-install", &Environment::new()).await;

    let env = compose_env(&ctx.paths, &ctx.config, app)?;
    render_templates(&data_dir, &env)
        .with_context(|| format!("rendering templates for {app}"))?;

    ctx.output.step(&format!("pulling images for {app}..."));
    let project = ComposeProject::new(&ctx.paths, &ctx.config, app, env.clone())?;
    engine
        .pull(&project)
        .await
        .with_context(|| format!("pulling images for {app}"))?;

    start::start(ctx, engine, app).await?;

    fire_hook(ctx, &data_dir, "post-install", &env).await;

    ctx.registry.add_installed_app(app, origin)?;
    ctx.output.success(&format!("{app} installed"));
    Ok(())
}
