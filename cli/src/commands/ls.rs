//! `harbor ls-*` — listing commands, one app id per line so the output
//! composes with shell pipelines.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::resolver::Resolver;

/// Run `harbor ls-installed`.
///
/// # Errors
///
/// Returns an error if the registry cannot be read.
pub fn installed(ctx: &AppContext) -> Result<ExitCode> {
    for app in ctx.registry.list_installed()? {
        ctx.output.line(&app);
    }
    Ok(ExitCode::SUCCESS)
}

/// Run `harbor ls-dependencies` — direct dependencies in declared
/// order, with the settings overlay applied.
///
/// # Errors
///
/// Returns an error if the app's manifest is missing or invalid.
pub fn dependencies(ctx: &AppContext, app: &str) -> Result<ExitCode> {
    let resolver = Resolver::new(&ctx.paths);
    for dep in resolver.dependencies_of(app)? {
        ctx.output.line(&dep);
    }
    Ok(ExitCode::SUCCESS)
}

/// Run `harbor ls-transitive-dependencies` — the full chain in start
/// order (each app after all of its own dependencies).
///
/// # Errors
///
/// Returns an error on a missing manifest or a dependency cycle.
pub fn transitive_dependencies(ctx: &AppContext, app: &str) -> Result<ExitCode> {
    let resolver = Resolver::new(&ctx.paths);
    for dep in resolver.transitive_dependencies_of(app)? {
        ctx.output.line(&dep);
    }
    Ok(ExitCode::SUCCESS)
}
