// ── Core error types ──
//
// The error taxonomy every synchronizer returns. Transport-layer errors
// from `photofeed-api` are translated by the `From` impl below so callers
// match on connectivity / status / decode without touching reqwest.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote failures ──────────────────────────────────────────────
    /// The request never produced a response (DNS, refused, timeout).
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The server answered with a non-2xx status.
    #[error("HTTP status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    /// The response body could not be decoded. `body` is the raw payload.
    #[error("Decode error: {message}")]
    Decode { message: String, body: String },

    // ── Admission ────────────────────────────────────────────────────
    /// An equivalent operation is already in flight. Expected, not a fault.
    #[error("Duplicate request: {operation} is already in flight")]
    DuplicateRequest { operation: String },

    /// The operation was cancelled in favour of a newer one, or by a reset,
    /// before it completed. Its result was discarded.
    #[error("Superseded: {operation} was cancelled before completion")]
    Superseded { operation: String },

    // ── State ────────────────────────────────────────────────────────
    /// No credential is available for an operation that needs one.
    #[error("Not authorized -- log in first")]
    Unauthorized,

    #[error("Photo not found: {id}")]
    PhotoNotFound { id: String },

    // ── Collaborators ────────────────────────────────────────────────
    #[error("Credential store error: {message}")]
    CredentialStore { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn duplicate(operation: impl Into<String>) -> Self {
        Self::DuplicateRequest {
            operation: operation.into(),
        }
    }

    pub(crate) fn superseded(operation: impl Into<String>) -> Self {
        Self::Superseded {
            operation: operation.into(),
        }
    }

    /// `true` for outcomes that mean "nothing went wrong, the work was
    /// simply not (re)done": presenters should not show an error for these.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            Self::DuplicateRequest { .. } | Self::Superseded { .. }
        )
    }

    /// The HTTP status code, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<photofeed_api::Error> for CoreError {
    fn from(err: photofeed_api::Error) -> Self {
        match err {
            photofeed_api::Error::Transport(e) => match e.status() {
                Some(status) => CoreError::HttpStatus {
                    status: status.as_u16(),
                    message: e.to_string(),
                },
                None => CoreError::Transport {
                    message: e.to_string(),
                },
            },
            photofeed_api::Error::HttpStatus { status, body } => CoreError::HttpStatus {
                status,
                message: body,
            },
            photofeed_api::Error::Deserialization { message, body } => {
                CoreError::Decode { message, body }
            }
            photofeed_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            photofeed_api::Error::Tls(message) => CoreError::Transport { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admission_outcomes_are_benign() {
        assert!(CoreError::duplicate("page 1").is_benign());
        assert!(CoreError::superseded("page 1").is_benign());
        assert!(!CoreError::Unauthorized.is_benign());
    }

    #[test]
    fn api_status_errors_keep_the_code() {
        let err = CoreError::from(photofeed_api::Error::HttpStatus {
            status: 403,
            body: "rate limit".into(),
        });
        assert_eq!(err.status(), Some(403));
        assert!(!err.is_benign());
    }

    #[test]
    fn api_decode_errors_keep_the_payload() {
        let err = CoreError::from(photofeed_api::Error::Deserialization {
            message: "expected array".into(),
            body: "{}".into(),
        });
        match err {
            CoreError::Decode { body, .. } => assert_eq!(body, "{}"),
            other => panic!("expected Decode, got {other:?}"),
        }
    }
}
