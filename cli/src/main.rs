//! Harbor CLI - app lifecycle manager for a single host

use std::process::ExitCode;

use clap::Parser;

use harbor_cli::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    // Racing the command against ctrl_c drops the in-flight future on
    // interrupt, so Drop guards (registry lock, update completion
    // guard) run before the process exits.
    let result = tokio::select! {
        res = cli.run() => res,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted");
            return ExitCode::FAILURE;
        }
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
