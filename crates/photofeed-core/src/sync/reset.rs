// ── Logout teardown ──

use std::sync::Arc;

use tracing::info;

use crate::api::PhotoApi;
use crate::bus::{ChangeBus, ChangeEvent};
use crate::error::CoreError;
use crate::sync::{FeedSynchronizer, ProfileSynchronizer, TokenSession};

/// Returns every synchronizer to its signed-out state.
pub struct SessionReset<A> {
    tokens: Arc<TokenSession<A>>,
    profile: Arc<ProfileSynchronizer<A>>,
    feed: Arc<FeedSynchronizer<A>>,
    bus: ChangeBus,
}

impl<A: PhotoApi> SessionReset<A> {
    pub fn new(
        tokens: Arc<TokenSession<A>>,
        profile: Arc<ProfileSynchronizer<A>>,
        feed: Arc<FeedSynchronizer<A>>,
        bus: ChangeBus,
    ) -> Self {
        Self {
            tokens,
            profile,
            feed,
            bus,
        }
    }

    /// Reset the feed, then the profile, then revoke the credential, and
    /// publish one empty event per topic.
    ///
    /// The events are published even if clearing the credential store
    /// fails; that error is returned afterwards.
    pub fn perform_logout(&self) -> Result<(), CoreError> {
        self.feed.reset();
        self.profile.reset();
        let revoked = self.tokens.revoke();

        self.bus.publish(ChangeEvent::Feed(Arc::new(Vec::new())));
        self.bus.publish(ChangeEvent::Profile(None));
        self.bus.publish(ChangeEvent::Avatar(None));
        info!("logged out");
        revoked
    }
}
