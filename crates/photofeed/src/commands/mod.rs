//! Command handlers. Each module is a thin presenter over `photofeed-core`.

pub mod auth;
pub mod config_cmd;
pub mod feed;
pub mod logout;
pub mod profile;
pub mod util;

use clap::CommandFactory;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

/// Route a session command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Auth(args) => auth::handle(args, global).await,
        Command::Feed(args) => feed::handle(args, global).await,
        Command::Profile => profile::handle(global).await,
        Command::Logout => logout::handle(global),
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Completions(args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "photofeed", &mut std::io::stdout());
            Ok(())
        }
    }
}
