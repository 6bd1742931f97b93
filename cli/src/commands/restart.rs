//! `harbor restart` — stop followed by start.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::{AppArg, fanout};
use crate::lifecycle;

/// Run `harbor restart`.
///
/// # Errors
///
/// Returns an error if either phase fails.
pub async fn run(ctx: &AppContext, args: &AppArg) -> Result<ExitCode> {
    if fanout::is_fan_out(&args.app) {
        return fanout::fan_out(ctx, &["restart".to_owned()]).await;
    }
    lifecycle::restart(ctx, &ctx.engine, &args.app).await?;
    Ok(ExitCode::SUCCESS)
}
