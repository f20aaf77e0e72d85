// ── Session facade ──
//
// Wires one bus, the three synchronizers and the logout coordinator to a
// shared transport and credential store. The caller keeps the returned
// `Dispatcher` on its UI context.

use std::sync::Arc;

use photofeed_api::ApiClient;
use tracing::{debug, info};

use crate::api::PhotoApi;
use crate::bus::{ChangeBus, Dispatcher};
use crate::config::SessionConfig;
use crate::credential::{Credential, CredentialStore};
use crate::error::CoreError;
use crate::model::UserProfile;
use crate::sync::{FeedSynchronizer, PrefetchPolicy, ProfileSynchronizer, SessionReset, TokenSession};

/// Everything one signed-in (or anonymous) user session needs.
pub struct Session<A: PhotoApi> {
    config: SessionConfig,
    api: Arc<A>,
    bus: ChangeBus,
    tokens: Arc<TokenSession<A>>,
    profile: Arc<ProfileSynchronizer<A>>,
    feed: Arc<FeedSynchronizer<A>>,
    reset: SessionReset<A>,
}

impl Session<ApiClient> {
    /// Build a session talking to the real API described by `config`.
    pub fn connect(
        config: SessionConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<(Self, Dispatcher), CoreError> {
        let api = Arc::new(config.build_client()?);
        Self::new(config, api, store)
    }
}

impl<A: PhotoApi> Session<A> {
    pub fn new(
        config: SessionConfig,
        api: Arc<A>,
        store: Arc<dyn CredentialStore>,
    ) -> Result<(Self, Dispatcher), CoreError> {
        config.validate()?;
        let (bus, dispatcher) = ChangeBus::channel();
        let tokens = Arc::new(TokenSession::new(Arc::clone(&api), store));
        let profile = Arc::new(ProfileSynchronizer::new(
            Arc::clone(&api),
            Arc::clone(&tokens),
            bus.clone(),
        ));
        let feed = Arc::new(FeedSynchronizer::new(
            Arc::clone(&api),
            Arc::clone(&tokens),
            bus.clone(),
            config.per_page,
            PrefetchPolicy::new(config.prefetch_threshold),
        ));
        let reset = SessionReset::new(
            Arc::clone(&tokens),
            Arc::clone(&profile),
            Arc::clone(&feed),
            bus.clone(),
        );
        debug!(per_page = config.per_page, "session created");
        let session = Self {
            config,
            api,
            bus,
            tokens,
            profile,
            feed,
            reset,
        };
        Ok((session, dispatcher))
    }

    /// Exchange an authorization code and store the resulting token.
    pub async fn sign_in(&self, code: &str) -> Result<Credential, CoreError> {
        let credential = self.tokens.exchange(code).await?;
        info!("signed in");
        Ok(credential)
    }

    /// Load the profile for the stored token, then its avatar.
    pub async fn refresh_profile(&self) -> Result<UserProfile, CoreError> {
        let token = self.tokens.require_token()?;
        let profile = self.profile.load_profile(&token).await?;
        let avatar = self.profile.load_avatar(&profile.username).await?;
        Ok(UserProfile {
            avatar_url: Some(avatar),
            ..profile
        })
    }

    pub fn is_signed_in(&self) -> Result<bool, CoreError> {
        Ok(self.tokens.current_token()?.is_some())
    }

    pub fn logout(&self) -> Result<(), CoreError> {
        self.reset.perform_logout()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn bus(&self) -> &ChangeBus {
        &self.bus
    }

    pub fn tokens(&self) -> &Arc<TokenSession<A>> {
        &self.tokens
    }

    pub fn profile(&self) -> &Arc<ProfileSynchronizer<A>> {
        &self.profile
    }

    pub fn feed(&self) -> &Arc<FeedSynchronizer<A>> {
        &self.feed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use photofeed_api::AppCredentials;
    use pretty_assertions::assert_eq;
    use secrecy::SecretString;
    use url::Url;

    use super::Session;
    use crate::bus::{ChangeEvent, Topic};
    use crate::config::{DEFAULT_API_BASE, DEFAULT_AUTH_BASE, SessionConfig};
    use crate::credential::{CredentialStore, MemoryCredentialStore};
    use crate::error::CoreError;
    use crate::test_support::{url, FakeApi, Recorder};

    fn config(per_page: u32) -> SessionConfig {
        let mut config = SessionConfig::new(
            Url::parse(DEFAULT_API_BASE).unwrap(),
            Url::parse(DEFAULT_AUTH_BASE).unwrap(),
            AppCredentials::new("key", SecretString::from("secret")),
        );
        config.per_page = per_page;
        config
    }

    #[tokio::test]
    async fn sign_in_profile_and_logout_round() {
        let store = Arc::new(MemoryCredentialStore::new());
        let (session, mut dispatcher) =
            Session::new(config(5), Arc::new(FakeApi::new()), store.clone()).unwrap();
        let recorder = Arc::new(Recorder::default());
        session.bus().subscribe(Topic::Profile, &recorder);

        assert!(!session.is_signed_in().unwrap());
        session.sign_in("abc").await.unwrap();
        assert!(session.is_signed_in().unwrap());

        let profile = session.refresh_profile().await.unwrap();
        assert_eq!(profile.username, "user-token-for-abc");
        assert_eq!(profile.avatar_url, Some(url("user-token-for-abc/l")));

        session.feed().load_next_page().await.unwrap();
        assert_eq!(session.feed().len(), 5);

        session.logout().unwrap();
        dispatcher.dispatch_pending();

        assert!(store.get().unwrap().is_none());
        assert!(session.feed().is_empty());
        assert!(matches!(
            &recorder.events(Topic::Profile)[..],
            [ChangeEvent::Profile(Some(_)), ChangeEvent::Profile(None)]
        ));
    }

    #[tokio::test]
    async fn refresh_profile_without_token_is_unauthorized() {
        let (session, _dispatcher) = Session::new(
            config(5),
            Arc::new(FakeApi::new()),
            Arc::new(MemoryCredentialStore::new()),
        )
        .unwrap();

        assert!(matches!(
            session.refresh_profile().await,
            Err(CoreError::Unauthorized)
        ));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = Session::new(
            config(0),
            Arc::new(FakeApi::new()),
            Arc::new(MemoryCredentialStore::new()),
        );
        assert!(matches!(result, Err(CoreError::Config { .. })));
    }
}
