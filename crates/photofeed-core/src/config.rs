// ── Runtime session configuration ──
//
// Describes *where* the API lives and how the feed pages. Carries the app
// credentials but never touches disk: the CLI (via photofeed-config)
// constructs a `SessionConfig` and hands it in.

use std::time::Duration;

use photofeed_api::AppCredentials;
use url::Url;

use crate::error::CoreError;

/// Photos requested per page when nothing else is configured.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Public REST API root.
pub const DEFAULT_API_BASE: &str = "https://api.unsplash.com";

/// Public OAuth root.
pub const DEFAULT_AUTH_BASE: &str = "https://unsplash.com";

/// Default distance from the end of the list at which the next page is
/// fetched.
pub const DEFAULT_PREFETCH_THRESHOLD: usize = 3;

/// Configuration for one authenticated session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// REST API root (e.g. `https://api.unsplash.com`).
    pub api_base: Url,
    /// OAuth root (e.g. `https://unsplash.com`).
    pub auth_base: Url,
    pub app: AppCredentials,
    pub per_page: u32,
    pub prefetch_threshold: usize,
    pub timeout: Duration,
}

impl SessionConfig {
    pub fn new(api_base: Url, auth_base: Url, app: AppCredentials) -> Self {
        Self {
            api_base,
            auth_base,
            app,
            per_page: DEFAULT_PER_PAGE,
            prefetch_threshold: DEFAULT_PREFETCH_THRESHOLD,
            timeout: Duration::from_secs(30),
        }
    }

    /// Reject values the API or the feed cannot work with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.per_page == 0 {
            return Err(CoreError::Config {
                message: "per_page must be at least 1".into(),
            });
        }
        if self.app.access_key.is_empty() {
            return Err(CoreError::Config {
                message: "access_key is empty".into(),
            });
        }
        Ok(())
    }

    /// Build the HTTP client this configuration describes.
    pub fn build_client(&self) -> Result<photofeed_api::ApiClient, CoreError> {
        let transport = photofeed_api::TransportConfig::default().with_timeout(self.timeout);
        Ok(photofeed_api::ApiClient::new(
            self.api_base.clone(),
            self.auth_base.clone(),
            self.app.clone(),
            &transport,
        )?)
    }
}
