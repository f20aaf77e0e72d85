//! Single-flight synchronizers between `photofeed-api` and UI consumers.
//!
//! This crate owns the session state of the photo-feed client and the
//! rules for mutating it:
//!
//! - **[`RequestGuard`]**: single-slot admission. At most one operation
//!   per key; a different key supersedes the outstanding ticket, and a
//!   stale ticket's completion is dropped.
//!
//! - **Synchronizers** ([`sync`]): [`TokenSession`] (code-to-token
//!   exchange, sole writer of the credential), [`ProfileSynchronizer`]
//!   (profile and avatar), [`FeedSynchronizer`] (append-only paginated
//!   feed with optimistic likes) and [`SessionReset`] (logout teardown).
//!
//! - **[`ChangeBus`]**: typed publish/subscribe. Events are queued from
//!   any task and delivered by a single [`Dispatcher`] on the consumer's
//!   execution context. No replay; handlers are held weakly.
//!
//! - **[`Session`]**: wires all of the above from a [`SessionConfig`], a
//!   [`PhotoApi`] transport and a [`CredentialStore`].

pub mod api;
pub mod bus;
pub mod config;
pub mod convert;
pub mod credential;
pub mod error;
pub mod guard;
pub mod model;
pub mod session;
pub mod sync;

#[cfg(test)]
mod test_support;

// ── Primary re-exports ──────────────────────────────────────────────
pub use api::PhotoApi;
pub use bus::{ChangeBus, ChangeEvent, ChangeHandler, Dispatcher, SubscriptionHandle, Topic};
pub use config::{
    DEFAULT_API_BASE, DEFAULT_AUTH_BASE, DEFAULT_PER_PAGE, DEFAULT_PREFETCH_THRESHOLD,
    SessionConfig,
};
pub use credential::{Credential, CredentialStore, MemoryCredentialStore};
pub use error::CoreError;
pub use guard::{Admission, InFlightGuard, InFlightSet, RequestGuard, Ticket};
pub use model::{Photo, UserProfile};
pub use session::Session;
pub use sync::{
    FeedSynchronizer, LoadOutcome, PrefetchPolicy, ProfileSynchronizer, SessionReset,
    TokenSession,
};
