//! `harbor reinstall` — uninstall followed by a fresh install.

use std::process::ExitCode;

use anyhow::Result;
use harbor_common::RepoRef;

use crate::app::AppContext;
use crate::commands::{InstallArgs, fanout};
use crate::lifecycle;

/// Run `harbor reinstall`.
///
/// # Errors
///
/// Returns an error if either phase fails.
pub async fn run(ctx: &AppContext, args: &InstallArgs) -> Result<ExitCode> {
    if fanout::is_fan_out(&args.app) {
        let argv = vec![
            "reinstall".to_owned(),
            "--origin".to_owned(),
            args.origin.clone(),
        ];
        return fanout::fan_out(ctx, &argv).await;
    }
    lifecycle::reinstall(
        ctx,
        &ctx.engine,
        &args.app,
        RepoRef::from(args.origin.as_str()),
    )
    .await?;
    Ok(ExitCode::SUCCESS)
}
