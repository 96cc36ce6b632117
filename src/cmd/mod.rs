//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`init`], [`validate`], [`check`], or
//! [`health`]. Each handler lives in its own submodule.

pub mod check;
pub mod health;
pub mod init;
pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::FriendgateError;

pub async fn dispatch(cli: Cli) -> Result<(), FriendgateError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Init(ref args)) => init::execute(args),
        Some(Commands::Validate(ref args)) => validate::execute(args),
        Some(Commands::Check(ref args)) => check::execute(args),
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  friendgate v{version} \u{2014} friend-link edge redirector\n\n  \
         No command provided. To get started:\n\n    \
         friendgate init                      Generate a starter config\n    \
         friendgate run                       Start (auto-detects ./friendgate.yaml)\n    \
         friendgate run --assets-dir dist     Start without a config file\n    \
         friendgate check / --referer URL     Preview a decision\n    \
         friendgate --help                    See all commands and options\n"
    );
}
