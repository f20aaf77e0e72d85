use thiserror::Error;

/// Top-level error type for the `photofeed-api` crate.
///
/// Consumers rely on three distinct failure kinds: the request never got a
/// response ([`Transport`](Self::Transport)), the server answered with a
/// non-2xx status ([`HttpStatus`](Self::HttpStatus)), or the body could not
/// be decoded ([`Deserialization`](Self::Deserialization)).
/// `photofeed-core` maps these into its own taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Failed to build the underlying HTTP client.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── HTTP ────────────────────────────────────────────────────────
    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// The HTTP status code, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the server rejected the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = Error::HttpStatus {
            status: 503,
            body: String::new(),
        };
        assert!(err.is_transient());
        assert_eq!(err.status(), Some(503));
    }

    #[test]
    fn client_errors_are_not_transient() {
        let err = Error::HttpStatus {
            status: 401,
            body: "OAuth error".into(),
        };
        assert!(!err.is_transient());
        assert!(err.is_unauthorized());
    }

    #[test]
    fn decode_errors_have_no_status() {
        let err = Error::Deserialization {
            message: "missing field `id`".into(),
            body: "{}".into(),
        };
        assert_eq!(err.status(), None);
    }
}
