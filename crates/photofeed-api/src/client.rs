// Photo API HTTP client
//
// Wraps `reqwest::Client` with base-URL construction, authorization headers,
// status checking and JSON decoding. Endpoint groups (auth, photos, users)
// are implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use bytes::Bytes;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::auth::AppCredentials;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Longest body excerpt kept in an `HttpStatus` error.
const ERROR_BODY_PREVIEW: usize = 200;

/// Raw HTTP client for the photo API.
///
/// `api_base` hosts the REST resources (`/photos`, `/me`, `/users/..`);
/// `auth_base` hosts the OAuth endpoints (`/oauth/authorize`, `/oauth/token`).
pub struct ApiClient {
    http: reqwest::Client,
    api_base: Url,
    auth_base: Url,
    app: AppCredentials,
}

impl ApiClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(
        api_base: Url,
        auth_base: Url,
        app: AppCredentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, api_base, auth_base, app))
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(
        http: reqwest::Client,
        api_base: Url,
        auth_base: Url,
        app: AppCredentials,
    ) -> Self {
        Self {
            http,
            api_base,
            auth_base,
            app,
        }
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The application credentials registered with the API.
    pub fn app(&self) -> &AppCredentials {
        &self.app
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for a REST resource path: `{api_base}/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Result<Url, Error> {
        join(&self.api_base, path)
    }

    /// Build a full URL for an OAuth path: `{auth_base}/{path}`.
    pub(crate) fn auth_url(&self, path: &str) -> Result<Url, Error> {
        join(&self.auth_base, path)
    }

    // ── Authorization ────────────────────────────────────────────────

    /// Attach `Authorization: Bearer <token>`.
    pub(crate) fn bearer(
        builder: reqwest::RequestBuilder,
        token: &SecretString,
    ) -> reqwest::RequestBuilder {
        builder.header(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {}", token.expose_secret()),
        )
    }

    /// Attach the anonymous `Authorization: Client-ID <access_key>`.
    pub(crate) fn client_id(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header(
            reqwest::header::AUTHORIZATION,
            format!("Client-ID {}", self.app.access_key),
        )
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a request and return the raw body of a 2xx response.
    ///
    /// Non-2xx responses become [`Error::HttpStatus`] with a body excerpt;
    /// connection-level failures become [`Error::Transport`].
    pub async fn send(&self, builder: reqwest::RequestBuilder) -> Result<Bytes, Error> {
        let request = builder.build().map_err(Error::Transport)?;
        debug!("{} {}", request.method(), request.url());

        let resp = self.http.execute(request).await.map_err(Error::Transport)?;
        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            debug!(status = status.as_u16(), "request rejected");
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: preview,
            });
        }

        let bytes = resp.bytes().await.map_err(Error::Transport)?;
        trace!(len = bytes.len(), "response body received");
        Ok(bytes)
    }

    /// Send a request and decode the 2xx body as JSON.
    ///
    /// Decode failures keep the raw payload in [`Error::Deserialization`].
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, Error> {
        let bytes = self.send(builder).await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }
}

/// Join `path` onto `base`, treating `base` as a directory even when it
/// lacks a trailing slash.
fn join(base: &Url, path: &str) -> Result<Url, Error> {
    let base = base.as_str().trim_end_matches('/');
    let path = path.trim_start_matches('/');
    Ok(Url::parse(&format!("{base}/{path}"))?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn join_handles_trailing_slashes() {
        let with = Url::parse("https://api.example.com/").unwrap();
        let without = Url::parse("https://api.example.com").unwrap();
        assert_eq!(
            join(&with, "/photos").unwrap().as_str(),
            "https://api.example.com/photos"
        );
        assert_eq!(
            join(&without, "me").unwrap().as_str(),
            "https://api.example.com/me"
        );
    }

    #[test]
    fn join_keeps_base_path_prefix() {
        let base = Url::parse("http://127.0.0.1:9000/v1").unwrap();
        assert_eq!(
            join(&base, "photos/abc/like").unwrap().as_str(),
            "http://127.0.0.1:9000/v1/photos/abc/like"
        );
    }
}
