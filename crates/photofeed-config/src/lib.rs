//! Configuration for the photofeed CLI.
//!
//! TOML settings layered under `PHOTOFEED_*` environment variables,
//! app-secret resolution (env + keyring + plaintext), translation to
//! `photofeed_core::SessionConfig`, and a keyring-backed
//! [`CredentialStore`] for the access token.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use photofeed_api::AppCredentials;
use photofeed_core::{
    CoreError, CredentialStore, DEFAULT_API_BASE, DEFAULT_AUTH_BASE, DEFAULT_PER_PAGE,
    DEFAULT_PREFETCH_THRESHOLD, SessionConfig,
};

/// Keyring service name shared by every entry this crate writes.
pub const KEYRING_SERVICE: &str = "photofeed";

const TOKEN_ENTRY: &str = "access-token";
const SECRET_KEY_ENTRY: &str = "secret-key";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {what} configured")]
    NoCredentials { what: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Everything the CLI reads from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// REST API root.
    pub api_base: String,

    /// OAuth root.
    pub auth_base: String,

    /// Public application key.
    pub access_key: Option<String>,

    /// Application secret (plaintext; prefer the keyring or
    /// `PHOTOFEED_SECRET_KEY`).
    pub secret_key: Option<String>,

    pub redirect_uri: String,

    pub scope: String,

    /// Photos per page.
    pub per_page: u32,

    /// Rows from the end at which the next page is fetched.
    pub prefetch_threshold: usize,

    /// Request timeout in seconds.
    pub timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            auth_base: DEFAULT_AUTH_BASE.into(),
            access_key: None,
            secret_key: None,
            redirect_uri: photofeed_api::auth::OOB_REDIRECT_URI.into(),
            scope: "public read_user write_likes".into(),
            per_page: DEFAULT_PER_PAGE,
            prefetch_threshold: DEFAULT_PREFETCH_THRESHOLD,
            timeout: 30,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "photofeed", "photofeed").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("photofeed");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path` (if present), then `PHOTOFEED_*`
/// environment variables.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PHOTOFEED_"));

    Ok(figment.extract()?)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Secret resolution ───────────────────────────────────────────────

/// Resolve the app secret: config value (which already includes
/// `PHOTOFEED_SECRET_KEY`), then the system keyring.
pub fn resolve_secret_key(cfg: &Config) -> Result<SecretString, ConfigError> {
    if let Some(ref secret) = cfg.secret_key {
        return Ok(SecretString::from(secret.clone()));
    }

    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, SECRET_KEY_ENTRY) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    Err(ConfigError::NoCredentials {
        what: "secret_key".into(),
    })
}

/// Store the app secret in the system keyring.
pub fn store_secret_key(secret: &SecretString) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, SECRET_KEY_ENTRY)?.set_password(secret.expose_secret())?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// The app credentials this config describes.
pub fn app_credentials(cfg: &Config) -> Result<AppCredentials, ConfigError> {
    let access_key = cfg
        .access_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ConfigError::NoCredentials {
            what: "access_key".into(),
        })?;
    let mut app = AppCredentials::new(access_key, resolve_secret_key(cfg)?);
    app.redirect_uri.clone_from(&cfg.redirect_uri);
    app.scope.clone_from(&cfg.scope);
    Ok(app)
}

/// Build a validated `SessionConfig`.
pub fn to_session_config(cfg: &Config) -> Result<SessionConfig, ConfigError> {
    let api_base = parse_url("api_base", &cfg.api_base)?;
    let auth_base = parse_url("auth_base", &cfg.auth_base)?;
    if cfg.per_page == 0 {
        return Err(ConfigError::Validation {
            field: "per_page".into(),
            reason: "must be at least 1".into(),
        });
    }

    let mut session = SessionConfig::new(api_base, auth_base, app_credentials(cfg)?);
    session.per_page = cfg.per_page;
    session.prefetch_threshold = cfg.prefetch_threshold;
    session.timeout = Duration::from_secs(cfg.timeout);
    Ok(session)
}

// ── Keyring token store ─────────────────────────────────────────────

/// Durable access-token storage in the OS keyring.
#[derive(Debug, Clone)]
pub struct KeyringStore {
    service: String,
    entry: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_entry(KEYRING_SERVICE, TOKEN_ENTRY)
    }

    pub fn with_entry(service: impl Into<String>, entry: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entry: entry.into(),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, CoreError> {
        keyring::Entry::new(&self.service, &self.entry).map_err(store_error)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

fn store_error(err: keyring::Error) -> CoreError {
    CoreError::CredentialStore {
        message: err.to_string(),
    }
}

impl CredentialStore for KeyringStore {
    fn get(&self) -> Result<Option<SecretString>, CoreError> {
        match self.entry()?.get_password() {
            Ok(token) => Ok(Some(SecretString::from(token))),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(store_error(e)),
        }
    }

    fn set(&self, token: &SecretString) -> Result<(), CoreError> {
        self.entry()?
            .set_password(token.expose_secret())
            .map_err(store_error)
    }

    fn clear(&self) -> Result<(), CoreError> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(store_error(e)),
        }
    }
}
