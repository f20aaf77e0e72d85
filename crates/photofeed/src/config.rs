//! Config resolution for CLI invocations.
//!
//! Layers `GlobalOpts` overrides on top of `photofeed_config` and picks the
//! token store.

use std::sync::Arc;

use photofeed_api::ApiClient;
use photofeed_config::{Config, KeyringStore};
use photofeed_core::{CredentialStore, Dispatcher, MemoryCredentialStore, Session};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load the config file + environment, then apply CLI flag overrides.
pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = photofeed_config::load_config()?;
    if let Some(timeout) = global.timeout {
        cfg.timeout = timeout;
    }
    if let Some(per_page) = global.per_page {
        cfg.per_page = per_page;
    }
    Ok(cfg)
}

/// The credential store this invocation reads and writes.
pub fn credential_store(global: &GlobalOpts) -> Arc<dyn CredentialStore> {
    match (&global.token, global.no_keyring) {
        (Some(token), _) => Arc::new(MemoryCredentialStore::with_token(token.clone())),
        (None, true) => Arc::new(MemoryCredentialStore::new()),
        (None, false) => Arc::new(KeyringStore::new()),
    }
}

/// Build a session against the configured API.
pub fn connect(global: &GlobalOpts) -> Result<(Session<ApiClient>, Dispatcher), CliError> {
    let cfg = load_config(global)?;
    let session_config = photofeed_config::to_session_config(&cfg)?;
    tracing::debug!(api_base = %session_config.api_base, "connecting");
    Ok(Session::connect(session_config, credential_store(global))?)
}
