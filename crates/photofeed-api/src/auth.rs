// OAuth authorization-code flow
//
// The user authorizes the app in a browser at `/oauth/authorize`; the
// provider redirects to `/oauth/authorize/native?code=...`, and the code is
// exchanged for a bearer token at `/oauth/token`.

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::TokenResponse;

/// Out-of-band redirect: the provider shows the code on a native page
/// instead of redirecting to an app-owned URL.
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Path of the page the provider lands on after a successful authorization.
pub const NATIVE_REDIRECT_PATH: &str = "/oauth/authorize/native";

/// Application credentials registered with the photo API.
#[derive(Debug, Clone)]
pub struct AppCredentials {
    /// Public access key. Also used as `client_id` and for anonymous reads.
    pub access_key: String,
    /// Client secret for the token exchange.
    pub secret_key: SecretString,
    pub redirect_uri: String,
    /// Space-separated OAuth scopes (e.g. `"public write_likes"`).
    pub scope: String,
}

impl AppCredentials {
    pub fn new(access_key: impl Into<String>, secret_key: SecretString) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key,
            redirect_uri: OOB_REDIRECT_URI.into(),
            scope: "public".into(),
        }
    }
}

/// Extract the authorization code from the provider's redirect URL.
///
/// Returns `None` unless the URL is the native redirect page and carries a
/// `code` query parameter.
pub fn code_from_redirect(url: &Url) -> Option<String> {
    if url.path() != NATIVE_REDIRECT_PATH {
        return None;
    }
    url.query_pairs()
        .find(|(name, _)| name == "code")
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
}

impl ApiClient {
    /// The URL the user opens to authorize this application.
    pub fn authorize_url(&self) -> Result<Url, Error> {
        let mut url = self.auth_url("oauth/authorize")?;
        let app = self.app();
        url.query_pairs_mut()
            .append_pair("client_id", &app.access_key)
            .append_pair("redirect_uri", &app.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &app.scope);
        Ok(url)
    }

    /// Exchange an authorization code for an access token.
    ///
    /// `POST /oauth/token` with a form body; the response carries
    /// `access_token`.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, Error> {
        let url = self.auth_url("oauth/token")?;
        let app = self.app();

        debug!("exchanging authorization code at {}", url);

        let form = [
            ("client_id", app.access_key.as_str()),
            ("client_secret", app.secret_key.expose_secret()),
            ("redirect_uri", app.redirect_uri.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
        ];

        self.send_json(self.http().post(url).form(&form)).await
    }
}
