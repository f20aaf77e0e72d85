// ── Profile and avatar synchronizer ──
//
// Two independent guards: the profile fetch is keyed by the bearer token it
// was issued with, the avatar fetch by username. The avatar arrives later
// than the profile and is stored separately so neither fetch can clobber
// the other.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};
use url::Url;

use crate::api::PhotoApi;
use crate::bus::{ChangeBus, ChangeEvent};
use crate::error::CoreError;
use crate::guard::{Admission, RequestGuard};
use crate::model::UserProfile;
use crate::sync::TokenSession;

const PROFILE_OP: &str = "profile fetch";
const AVATAR_OP: &str = "avatar fetch";

/// Guard key for the profile fetch. Redacted in debug output.
#[derive(Clone, PartialEq, Eq)]
struct TokenKey(String);

impl fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenKey(..)")
    }
}

#[derive(Default)]
struct ProfileState {
    profile: Option<UserProfile>,
    /// `(username, url)` of the last avatar fetch.
    avatar: Option<(String, Url)>,
}

/// Holds the last-known profile and avatar URL.
pub struct ProfileSynchronizer<A> {
    api: Arc<A>,
    tokens: Arc<TokenSession<A>>,
    bus: ChangeBus,
    profile_guard: RequestGuard<TokenKey>,
    avatar_guard: RequestGuard<String>,
    state: Mutex<ProfileState>,
}

impl<A: PhotoApi> ProfileSynchronizer<A> {
    pub fn new(api: Arc<A>, tokens: Arc<TokenSession<A>>, bus: ChangeBus) -> Self {
        Self {
            api,
            tokens,
            bus,
            profile_guard: RequestGuard::new(PROFILE_OP),
            avatar_guard: RequestGuard::new(AVATAR_OP),
            state: Mutex::new(ProfileState::default()),
        }
    }

    /// Fetch the profile of the user `token` belongs to.
    ///
    /// On success the stored profile is replaced wholesale and a
    /// [`ChangeEvent::Profile`] is published. A known avatar is carried
    /// over when the username is unchanged.
    pub async fn load_profile(&self, token: &SecretString) -> Result<UserProfile, CoreError> {
        let key = TokenKey(token.expose_secret().to_owned());
        let ticket = match self.profile_guard.begin(key) {
            Admission::Granted(ticket) => ticket,
            Admission::AlreadyInFlight(_) => return Err(CoreError::duplicate(PROFILE_OP)),
        };
        let cancel = ticket.cancellation().clone();

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(CoreError::superseded(PROFILE_OP)),
            result = self.api.fetch_me(token) => result,
        };

        let mut state = self.lock_state();
        let Some(result) = self.profile_guard.complete(ticket, result) else {
            return Err(CoreError::superseded(PROFILE_OP));
        };
        let mut profile = UserProfile::from(result.map_err(|e| {
            warn!(error = %e, "profile fetch failed");
            CoreError::from(e)
        })?);
        profile.avatar_url = state
            .avatar
            .as_ref()
            .filter(|(username, _)| *username == profile.username)
            .map(|(_, url)| url.clone());
        state.profile = Some(profile.clone());
        self.bus.publish(ChangeEvent::Profile(Some(profile.clone())));
        info!(username = %profile.username, "profile loaded");
        Ok(profile)
    }

    /// Fetch the avatar URL for `username` using the stored token.
    ///
    /// On success the URL is stored, merged into the stored profile if it
    /// belongs to the same user, and published in a
    /// [`ChangeEvent::Avatar`].
    pub async fn load_avatar(&self, username: &str) -> Result<Url, CoreError> {
        let token = self.tokens.require_token()?;
        let ticket = match self.avatar_guard.begin(username.to_owned()) {
            Admission::Granted(ticket) => ticket,
            Admission::AlreadyInFlight(_) => return Err(CoreError::duplicate(AVATAR_OP)),
        };
        let cancel = ticket.cancellation().clone();

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(CoreError::superseded(AVATAR_OP)),
            result = self.api.fetch_user(&token, username) => result,
        };

        let mut state = self.lock_state();
        let Some(result) = self.avatar_guard.complete(ticket, result) else {
            return Err(CoreError::superseded(AVATAR_OP));
        };
        let url = result
            .map_err(|e| {
                warn!(error = %e, username, "avatar fetch failed");
                CoreError::from(e)
            })?
            .profile_image
            .large;
        if let Some(profile) = state.profile.as_mut().filter(|p| p.username == username) {
            profile.avatar_url = Some(url.clone());
        }
        state.avatar = Some((username.to_owned(), url.clone()));
        self.bus.publish(ChangeEvent::Avatar(Some(url.clone())));
        debug!(username, "avatar loaded");
        Ok(url)
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.lock_state().profile.clone()
    }

    pub fn avatar_url(&self) -> Option<Url> {
        self.lock_state().avatar.as_ref().map(|(_, url)| url.clone())
    }

    /// Clear both stored values and cancel outstanding fetches. Publishes
    /// nothing.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        self.profile_guard.cancel_all();
        self.avatar_guard.cancel_all();
        *state = ProfileState::default();
        debug!("profile state reset");
    }

    fn lock_state(&self) -> MutexGuard<'_, ProfileState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
