//! `harbor logs` — stream an app's container logs.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::{PassthroughArgs, exit_code_from};
use crate::compose::{ComposeEngine, ComposeProject};
use crate::environment::compose_env;

/// Run `harbor logs`, forwarding any extra arguments (`--follow`,
/// `--tail`, service names) to the engine.
///
/// # Errors
///
/// Returns an error if the environment cannot be composed or the log
/// stream cannot be started.
pub async fn run(ctx: &AppContext, args: &PassthroughArgs) -> Result<ExitCode> {
    let env = compose_env(&ctx.paths, &ctx.config, &args.app)?;
    let project = ComposeProject::new(&ctx.paths, &ctx.config, &args.app, env)?;
    let status = ctx.engine.logs(&project, &args.args).await?;
    Ok(exit_code_from(status))
}
