//! `harbor update` — update an app from its store definition.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::{UpdateArgs, fanout};
use crate::lifecycle::{self, UpdateOptions};

/// Run `harbor update`.
///
/// # Errors
///
/// Returns an error if the app cannot be updated.
pub async fn run(ctx: &AppContext, args: &UpdateArgs) -> Result<ExitCode> {
    if fanout::is_fan_out(&args.app) {
        let mut argv = vec!["update".to_owned()];
        if args.skip_stop {
            argv.push("--skip-stop".to_owned());
        }
        if args.skip_start {
            argv.push("--skip-start".to_owned());
        }
        return fanout::fan_out(ctx, &argv).await;
    }
    lifecycle::update::update(
        ctx,
        &ctx.engine,
        &args.app,
        UpdateOptions {
            skip_stop: args.skip_stop,
            skip_start: args.skip_start,
        },
    )
    .await?;
    Ok(ExitCode::SUCCESS)
}
