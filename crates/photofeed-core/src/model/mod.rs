// ── Domain model ──
//
// Canonical types handed to presenters. Wire types from `photofeed-api`
// are converted in `crate::convert`.

pub mod photo;
pub mod profile;

pub use photo::Photo;
pub use profile::UserProfile;
