//! `harbor uninstall` — remove an app, its containers, and its data.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::{AppArg, fanout};
use crate::lifecycle;

/// Run `harbor uninstall`.
///
/// # Errors
///
/// Returns an error if the app is not installed or cannot be removed.
pub async fn run(ctx: &AppContext, args: &AppArg) -> Result<ExitCode> {
    if fanout::is_fan_out(&args.app) {
        return fanout::fan_out(ctx, &["uninstall".to_owned()]).await;
    }
    let prompt = format!("remove {} and all of its data?", args.app);
    if !ctx.confirm(&prompt, true)? {
        ctx.output.info("aborted");
        return Ok(ExitCode::SUCCESS);
    }
    lifecycle::uninstall::uninstall(ctx, &ctx.engine, &args.app).await?;
    Ok(ExitCode::SUCCESS)
}
