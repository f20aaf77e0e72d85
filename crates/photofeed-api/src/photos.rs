// Photo listing and like endpoints

use secrecy::SecretString;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::PhotoResult;

impl ApiClient {
    /// List one page of the editorial feed.
    ///
    /// `GET /photos?page={page}&per_page={per_page}`. Pages are 1-based.
    /// With a token the request is made on behalf of the user (so
    /// `liked_by_user` is meaningful); without one the app's access key is
    /// used.
    pub async fn list_photos(
        &self,
        token: Option<&SecretString>,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<PhotoResult>, Error> {
        let url = self.api_url("photos")?;
        debug!(page, per_page, "listing photos");

        let builder = self.http().get(url).query(&[("page", page), ("per_page", per_page)]);
        let builder = match token {
            Some(token) => Self::bearer(builder, token),
            None => self.client_id(builder),
        };
        self.send_json(builder).await
    }

    /// Like (`POST`) or unlike (`DELETE`) a photo.
    ///
    /// `/photos/{id}/like`. The response body is discarded.
    pub async fn set_like(
        &self,
        token: &SecretString,
        photo_id: &str,
        liked: bool,
    ) -> Result<(), Error> {
        let url = self.api_url(&format!("photos/{photo_id}/like"))?;
        let builder = if liked {
            self.http().post(url)
        } else {
            self.http().delete(url)
        };
        self.send(Self::bearer(builder, token)).await?;
        Ok(())
    }
}
