use serde::Serialize;
use url::Url;

/// The signed-in user's profile.
///
/// `avatar_url` comes from a second, later fetch and is `None` until that
/// fetch succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub username: String,
    /// First and last name joined by a space.
    pub display_name: String,
    /// `@username`.
    pub handle: String,
    pub bio: Option<String>,
    pub avatar_url: Option<Url>,
}
