//! `harbor stop` — stop a running app, preserving its data.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::{AppArg, fanout};
use crate::lifecycle;

/// Run `harbor stop`.
///
/// # Errors
///
/// Returns an error if the app cannot be stopped.
pub async fn run(ctx: &AppContext, args: &AppArg) -> Result<ExitCode> {
    if fanout::is_fan_out(&args.app) {
        return fanout::fan_out(ctx, &["stop".to_owned()]).await;
    }
    lifecycle::stop::stop(ctx, &ctx.engine, &args.app).await?;
    Ok(ExitCode::SUCCESS)
}
