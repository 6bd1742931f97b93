//! `harbor start` — start an installed app.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::{AppArg, fanout};
use crate::lifecycle;

/// Run `harbor start`.
///
/// # Errors
///
/// Returns an error if the app cannot be started.
pub async fn run(ctx: &AppContext, args: &AppArg) -> Result<ExitCode> {
    if fanout::is_fan_out(&args.app) {
        return fanout::fan_out(ctx, &["start".to_owned()]).await;
    }
    lifecycle::start::start(ctx, &ctx.engine, &args.app).await?;
    Ok(ExitCode::SUCCESS)
}
