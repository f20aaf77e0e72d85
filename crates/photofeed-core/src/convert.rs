// ── API-to-domain type conversions ──
//
// Bridges raw `photofeed_api` wire types into canonical `crate::model`
// domain types. Conversions are infallible: anything that could fail
// (URL syntax) was already enforced by deserialization.

use chrono::{DateTime, Utc};

use photofeed_api::{PhotoResult, ProfileResult};

use crate::model::{Photo, UserProfile};

/// Parse an RFC 3339 timestamp. Unparsable values yield `None` so a bad
/// date never rejects a whole page.
fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

impl From<PhotoResult> for Photo {
    fn from(p: PhotoResult) -> Self {
        Self {
            created_at: parse_timestamp(p.created_at.as_deref()),
            id: p.id,
            width: p.width,
            height: p.height,
            description: p.description,
            thumb_url: p.urls.thumb,
            regular_url: p.urls.regular,
            large_url: p.urls.full,
            is_liked: p.liked_by_user,
        }
    }
}

impl From<ProfileResult> for UserProfile {
    fn from(p: ProfileResult) -> Self {
        let display_name = match p.last_name.as_deref().map(str::trim) {
            Some(last) if !last.is_empty() => format!("{} {last}", p.first_name.trim()),
            _ => p.first_name.trim().to_owned(),
        };
        Self {
            handle: format!("@{}", p.username),
            username: p.username,
            display_name,
            bio: p.bio.filter(|b| !b.trim().is_empty()),
            avatar_url: None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use photofeed_api::PhotoUrls;
    use url::Url;

    fn urls(id: &str) -> PhotoUrls {
        let u = |variant: &str| Url::parse(&format!("https://img.example.com/{id}/{variant}")).unwrap();
        PhotoUrls {
            full: u("full"),
            regular: u("regular"),
            small: u("small"),
            thumb: u("thumb"),
        }
    }

    fn result(created_at: Option<&str>) -> PhotoResult {
        PhotoResult {
            id: "p1".into(),
            width: 300,
            height: 200,
            created_at: created_at.map(String::from),
            description: Some("Dunes".into()),
            likes: 4,
            liked_by_user: true,
            urls: urls("p1"),
        }
    }

    #[test]
    fn photo_maps_full_variant_to_large() {
        let photo = Photo::from(result(Some("2024-06-15T10:30:00-04:00")));
        assert_eq!(photo.large_url.as_str(), "https://img.example.com/p1/full");
        assert_eq!(photo.thumb_url.as_str(), "https://img.example.com/p1/thumb");
        assert!(photo.is_liked);
        assert_eq!(
            photo.created_at.unwrap().to_rfc3339(),
            "2024-06-15T14:30:00+00:00"
        );
    }

    #[test]
    fn unparsable_date_becomes_none() {
        let photo = Photo::from(result(Some("yesterday")));
        assert!(photo.created_at.is_none());
    }

    #[test]
    fn profile_joins_names_and_prefixes_handle() {
        let profile = UserProfile::from(ProfileResult {
            username: "jdoe".into(),
            first_name: "Jane".into(),
            last_name: Some("Doe".into()),
            bio: Some("  ".into()),
        });
        assert_eq!(profile.display_name, "Jane Doe");
        assert_eq!(profile.handle, "@jdoe");
        assert!(profile.bio.is_none());
        assert!(profile.avatar_url.is_none());
    }

    #[test]
    fn profile_without_last_name_has_no_trailing_space() {
        let profile = UserProfile::from(ProfileResult {
            username: "solo".into(),
            first_name: "Cher".into(),
            last_name: None,
            bio: None,
        });
        assert_eq!(profile.display_name, "Cher");
    }
}
