//! Command implementations

pub mod compose;
pub mod fanout;
pub mod install;
pub mod logs;
pub mod ls;
pub mod reinstall;
pub mod restart;
pub mod start;
pub mod stop;
pub mod uninstall;
pub mod update;

use std::process::{ExitCode, ExitStatus};

use clap::Args;

/// Target app argument shared by the lifecycle commands. The literal
/// `all` fans out over every installed app.
#[derive(Args)]
pub struct AppArg {
    /// App id, or `all` for every installed app
    pub app: String,
}

/// Arguments for install and reinstall.
#[derive(Args)]
pub struct InstallArgs {
    /// App id, or `all` for every installed app
    pub app: String,

    /// Store the app definition comes from
    #[arg(long, default_value = "harbor/community")]
    pub origin: String,
}

/// Arguments for the update command.
#[derive(Args)]
pub struct UpdateArgs {
    /// App id, or `all` for every installed app
    pub app: String,

    /// Leave the current containers running during the update
    #[arg(long)]
    pub skip_stop: bool,

    /// Do not start the app after replacing files and images
    #[arg(long)]
    pub skip_start: bool,
}

/// Arguments for commands that forward extra arguments to the engine.
#[derive(Args)]
pub struct PassthroughArgs {
    /// App id
    pub app: String,

    /// Arguments forwarded to docker compose
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

/// Map a child process exit status onto our own exit code.
pub(crate) fn exit_code_from(status: ExitStatus) -> ExitCode {
    if status.success() {
        ExitCode::SUCCESS
    } else {
        u8::try_from(status.code().unwrap_or(1)).map_or(ExitCode::FAILURE, ExitCode::from)
    }
}
