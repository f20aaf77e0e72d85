use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

/// A photo in the feed.
///
/// Only `is_liked` ever changes after the record is appended; every other
/// field is fixed by the page fetch that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Photo {
    pub id: String,
    pub width: u32,
    pub height: u32,
    pub created_at: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub thumb_url: Url,
    pub regular_url: Url,
    pub large_url: Url,
    pub is_liked: bool,
}
