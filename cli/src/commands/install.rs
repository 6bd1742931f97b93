//! `harbor install` — install an app from its store definition.

use std::process::ExitCode;

use anyhow::Result;
use harbor_common::RepoRef;

use crate::app::AppContext;
use crate::commands::{InstallArgs, fanout};
use crate::lifecycle;

/// Run `harbor install`.
///
/// # Errors
///
/// Returns an error if the app cannot be installed.
pub async fn run(ctx: &AppContext, args: &InstallArgs) -> Result<ExitCode> {
    if fanout::is_fan_out(&args.app) {
        let argv = vec![
            "install".to_owned(),
            "--origin".to_owned(),
            args.origin.clone(),
        ];
        return fanout::fan_out(ctx, &argv).await;
    }
    lifecycle::install::install(
        ctx,
        &ctx.engine,
        &args.app,
        RepoRef::from(args.origin.as_str()),
    )
    .await?;
    Ok(ExitCode::SUCCESS)
}
