// photofeed-api: Async Rust client for the photo-sharing REST API

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod photos;
pub mod transport;
pub mod users;

pub use auth::{AppCredentials, code_from_redirect};
pub use client::ApiClient;
pub use error::Error;
pub use models::{PhotoResult, PhotoUrls, ProfileImage, ProfileResult, TokenResponse, UserResult};
pub use transport::TransportConfig;
