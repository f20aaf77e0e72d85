// ── Credential storage ──
//
// The bearer token is the only state shared across synchronizers. It is
// written exclusively by `TokenSession`; everyone else reads it through
// `TokenSession::current_token()`. Durable storage is an injected
// collaborator so the core never picks a storage technology.

use std::sync::{Mutex, PoisonError};

use secrecy::SecretString;

use crate::error::CoreError;

/// The token obtained from one authorization-code exchange.
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: SecretString,
    /// The authorization code this token was issued for.
    pub issued_for_code: String,
}

/// Durable, tamper-resistant storage for the bearer token.
///
/// Implementations must be cheap enough to call from inside a critical
/// section (no network I/O).
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Result<Option<SecretString>, CoreError>;
    fn set(&self, token: &SecretString) -> Result<(), CoreError>;
    fn clear(&self) -> Result<(), CoreError>;
}

/// Process-local store. Forgets the token on exit.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<SecretString>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `token`.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(SecretString::from(token.into()))),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Result<Option<SecretString>, CoreError> {
        Ok(self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn set(&self, token: &SecretString) -> Result<(), CoreError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
