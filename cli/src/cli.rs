//! CLI argument parsing with clap derive

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// App lifecycle manager for a single host
#[derive(Parser)]
#[command(
    name = "harbor",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Skip interactive prompts
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install an app from the store
    Install(commands::InstallArgs),

    /// Remove an app, its containers, and its data
    Uninstall(commands::AppArg),

    /// Uninstall an app, then install it again
    Reinstall(commands::InstallArgs),

    /// Start an installed app
    Start(commands::AppArg),

    /// Stop a running app, preserving its data
    Stop(commands::AppArg),

    /// Stop an app, then start it again
    Restart(commands::AppArg),

    /// Update an app from its store definition
    Update(commands::UpdateArgs),

    /// Stream an app's container logs
    Logs(commands::PassthroughArgs),

    /// Run an arbitrary compose subcommand against an app
    Compose(commands::PassthroughArgs),

    /// List installed apps
    LsInstalled,

    /// List an app's direct dependencies
    LsDependencies(commands::AppArg),

    /// List an app's transitive dependencies in start order
    LsTransitiveDependencies(commands::AppArg),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the context cannot be constructed or the
    /// command fails.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            quiet,
            no_color,
            yes,
            command,
        } = self;
        let ctx = AppContext::new(&AppFlags {
            no_color,
            quiet,
            yes,
        })?;
        match command {
            Command::Install(args) => commands::install::run(&ctx, &args).await,
            Command::Uninstall(args) => commands::uninstall::run(&ctx, &args).await,
            Command::Reinstall(args) => commands::reinstall::run(&ctx, &args).await,
            Command::Start(args) => commands::start::run(&ctx, &args).await,
            Command::Stop(args) => commands::stop::run(&ctx, &args).await,
            Command::Restart(args) => commands::restart::run(&ctx, &args).await,
            Command::Update(args) => commands::update::run(&ctx, &args).await,
            Command::Logs(args) => commands::logs::run(&ctx, &args).await,
            Command::Compose(args) => commands::compose::run(&ctx, &args).await,
            Command::LsInstalled => commands::ls::installed(&ctx),
            Command::LsDependencies(args) => commands::ls::dependencies(&ctx, &args.app),
            Command::LsTransitiveDependencies(args) => {
                commands::ls::transitive_dependencies(&ctx, &args.app)
            }
        }
    }
}
