//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use photofeed_config::ConfigError;
use photofeed_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the photo API")]
    #[diagnostic(
        code(photofeed::connection_failed),
        help("Check your network connection and the api_base setting.\nDetails: {message}")
    )]
    ConnectionFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not signed in")]
    #[diagnostic(
        code(photofeed::unauthorized),
        help("Run: photofeed auth login")
    )]
    Unauthorized,

    #[error("No {what} configured")]
    #[diagnostic(
        code(photofeed::no_credentials),
        help(
            "Configure the app with: photofeed config init\n\
             Or set PHOTOFEED_ACCESS_KEY / PHOTOFEED_SECRET_KEY."
        )
    )]
    NoCredentials { what: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Photo '{id}' not found in the loaded feed")]
    #[diagnostic(
        code(photofeed::not_found),
        help("Run: photofeed feed list --pages <N> to see which photos are loaded, or raise --pages")
    )]
    PhotoNotFound { id: String },

    #[error("Another {operation} is already running")]
    #[diagnostic(code(photofeed::busy))]
    Busy { operation: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({status}): {message}")]
    #[diagnostic(code(photofeed::api_error))]
    Api { status: u16, message: String },

    #[error("Unexpected response: {message}")]
    #[diagnostic(
        code(photofeed::decode),
        help("Run with -vv to see the raw response.")
    )]
    Decode { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(photofeed::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(photofeed::config),
        help("Check the config file at: photofeed config path")
    )]
    Config(ConfigError),

    #[error("Credential store failed: {message}")]
    #[diagnostic(
        code(photofeed::keyring),
        help("Make sure a system keyring (Secret Service, Keychain, Credential Manager) is available.")
    )]
    CredentialStore { message: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(photofeed::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(photofeed::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Unauthorized | Self::NoCredentials { .. } | Self::Api { status: 401, .. } => {
                exit_code::AUTH
            }
            Self::PhotoNotFound { .. } | Self::Api { status: 404, .. } => exit_code::NOT_FOUND,
            Self::Busy { .. } => exit_code::CONFLICT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Work that was skipped because an equivalent request was already
    /// running or was superseded. Reported as a notice, not a diagnostic.
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Transport { message } => Self::ConnectionFailed { message },
            CoreError::HttpStatus { status: 401, .. } | CoreError::Unauthorized => {
                Self::Unauthorized
            }
            CoreError::HttpStatus { status, message } => Self::Api { status, message },
            CoreError::Decode { message, .. } => Self::Decode { message },
            CoreError::DuplicateRequest { operation } | CoreError::Superseded { operation } => {
                Self::Busy { operation }
            }
            CoreError::PhotoNotFound { id } => Self::PhotoNotFound { id },
            CoreError::CredentialStore { message } => Self::CredentialStore { message },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { what } => Self::NoCredentials { what },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Keyring(e) => Self::CredentialStore {
                message: e.to_string(),
            },
            other => Self::Config(other),
        }
    }
}
