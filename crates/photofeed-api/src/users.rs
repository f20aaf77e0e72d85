// User profile endpoints

use secrecy::SecretString;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{ProfileResult, UserResult};

impl ApiClient {
    /// The profile of the user owning `token`. `GET /me`.
    pub async fn fetch_me(&self, token: &SecretString) -> Result<ProfileResult, Error> {
        let url = self.api_url("me")?;
        self.send_json(Self::bearer(self.http().get(url), token)).await
    }

    /// A public user record, used for the avatar URLs.
    /// `GET /users/{username}`.
    pub async fn fetch_user(
        &self,
        token: &SecretString,
        username: &str,
    ) -> Result<UserResult, Error> {
        let url = self.api_url(&format!("users/{username}"))?;
        self.send_json(Self::bearer(self.http().get(url), token)).await
    }
}
