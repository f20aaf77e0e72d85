// ── Transport seam ──
//
// Synchronizers are generic over `PhotoApi` so the single-flight logic can
// be driven by scripted fakes in tests. The production implementation is
// `photofeed_api::ApiClient`.

use std::future::Future;

use photofeed_api::{ApiClient, Error, PhotoResult, ProfileResult, TokenResponse, UserResult};
use secrecy::SecretString;

/// The remote operations the synchronizers rely on.
pub trait PhotoApi: Send + Sync + 'static {
    fn exchange_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<TokenResponse, Error>> + Send;

    fn fetch_me(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<ProfileResult, Error>> + Send;

    fn fetch_user(
        &self,
        token: &SecretString,
        username: &str,
    ) -> impl Future<Output = Result<UserResult, Error>> + Send;

    fn list_photos(
        &self,
        token: Option<&SecretString>,
        page: u32,
        per_page: u32,
    ) -> impl Future<Output = Result<Vec<PhotoResult>, Error>> + Send;

    fn set_like(
        &self,
        token: &SecretString,
        photo_id: &str,
        liked: bool,
    ) -> impl Future<Output = Result<(), Error>> + Send;
}

impl PhotoApi for ApiClient {
    fn exchange_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<TokenResponse, Error>> + Send {
        ApiClient::exchange_code(self, code)
    }

    fn fetch_me(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<ProfileResult, Error>> + Send {
        ApiClient::fetch_me(self, token)
    }

    fn fetch_user(
        &self,
        token: &SecretString,
        username: &str,
    ) -> impl Future<Output = Result<UserResult, Error>> + Send {
        ApiClient::fetch_user(self, token, username)
    }

    fn list_photos(
        &self,
        token: Option<&SecretString>,
        page: u32,
        per_page: u32,
    ) -> impl Future<Output = Result<Vec<PhotoResult>, Error>> + Send {
        ApiClient::list_photos(self, token, page, per_page)
    }

    fn set_like(
        &self,
        token: &SecretString,
        photo_id: &str,
        liked: bool,
    ) -> impl Future<Output = Result<(), Error>> + Send {
        ApiClient::set_like(self, token, photo_id, liked)
    }
}
