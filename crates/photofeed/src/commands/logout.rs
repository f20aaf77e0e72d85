//! Logout handler.

use crate::cli::GlobalOpts;
use crate::config;
use crate::error::CliError;

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    match config::connect(global) {
        Ok((session, _dispatcher)) => session.logout()?,
        // Without app credentials there is no session to tear down, but a
        // stale token may still be stored.
        Err(CliError::NoCredentials { .. }) => config::credential_store(global).clear()?,
        Err(e) => return Err(e),
    }
    if !global.quiet {
        eprintln!("✓ Logged out");
    }
    Ok(())
}
