//! `harbor compose` — arbitrary compose subcommand against an app's
//! layered project, with pass-through stdio.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::{PassthroughArgs, exit_code_from};
use crate::compose::{ComposeEngine, ComposeProject};
use crate::environment::compose_env;

/// Run `harbor compose`. The forwarded arguments see the same file
/// chain and environment the lifecycle transitions use.
///
/// # Errors
///
/// Returns an error if the environment cannot be composed or the child
/// cannot be spawned.
pub async fn run(ctx: &AppContext, args: &PassthroughArgs) -> Result<ExitCode> {
    let env = compose_env(&ctx.paths, &ctx.config, &args.app)?;
    let project = ComposeProject::new(&ctx.paths, &ctx.config, &args.app, env)?;
    let status = ctx.engine.passthrough(&project, &args.args).await?;
    Ok(exit_code_from(status))
}
