//! Fan-out of a lifecycle command over every installed app.
//!
//! Fanning out re-invokes the current executable once per app as a
//! child process. Each child takes its own registry lock scope, and a
//! failure in one app never aborts the siblings; the parent waits for
//! all of them and reports per-app failures.

use std::process::ExitCode;

use anyhow::{Context, Result};
use tokio::task::JoinSet;

use crate::app::AppContext;

/// Literal app id that triggers the fan-out.
pub const ALL_APPS: &str = "all";

#[must_use]
pub fn is_fan_out(app: &str) -> bool {
    app == ALL_APPS
}

/// Run `subcommand` once per installed app, concurrently.
///
/// # Errors
///
/// Fails when the registry cannot be read or the current executable
/// cannot be located. A failing child is reported, not propagated.
pub async fn fan_out(ctx: &AppContext, subcommand: &[String]) -> Result<ExitCode> {
    let apps = ctx.registry.list_installed()?;
    if apps.is_empty() {
        ctx.output.info("no apps installed");
        return Ok(ExitCode::SUCCESS);
    }

    let exe = std::env::current_exe().context("locating current executable")?;
    let total = apps.len();
    let mut children = JoinSet::new();
    for app in apps {
        let exe = exe.clone();
        let mut args = vec!["--quiet".to_owned(), "--yes".to_owned()];
        args.extend(subcommand.iter().cloned());
        args.push(app.clone());
        children.spawn(async move {
            let status = tokio::process::Command::new(&exe).args(&args).status().await;
            (app, status)
        });
    }

    let mut failed = Vec::new();
    while let Some(joined) = children.join_next().await {
        let (app, status) = joined.context("joining fan-out child")?;
        match status {
            Ok(s) if s.success() => ctx.output.success(&app),
            Ok(s) => {
                ctx.output.error(&format!("{app}: {s}"));
                failed.push(app);
            }
            Err(e) => {
                ctx.output.error(&format!("{app}: {e}"));
                failed.push(app);
            }
        }
    }

    if failed.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        ctx.output
            .error(&format!("{} of {total} apps failed", failed.len()));
        Ok(ExitCode::FAILURE)
    }
}
