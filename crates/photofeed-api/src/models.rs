// Wire types for the photo API.
//
// Field names follow the JSON payloads (snake_case). URL variants are typed
// as `Url` so a malformed link surfaces as a decode error at the boundary.

use serde::{Deserialize, Serialize};
use url::Url;

/// Response body of `POST /oauth/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
}

/// A photo record from `GET /photos`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PhotoResult {
    pub id: String,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub liked_by_user: bool,
    pub urls: PhotoUrls,
}

/// Size variants of a photo.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PhotoUrls {
    pub full: Url,
    pub regular: Url,
    pub small: Url,
    pub thumb: Url,
}

/// The authenticated user, from `GET /me`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResult {
    pub username: String,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

/// A public user record, from `GET /users/{username}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UserResult {
    pub profile_image: ProfileImage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileImage {
    pub small: Url,
    pub medium: Url,
    pub large: Url,
}
