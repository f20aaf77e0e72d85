// ── Paginated photo feed ──
//
// Append-only photo sequence fetched one page at a time. At most one page
// request is outstanding; a page only counts as loaded once its completion
// has been accepted under the state lock. Likes are applied optimistically
// and rolled back on failure.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::api::PhotoApi;
use crate::bus::{ChangeBus, ChangeEvent};
use crate::config::DEFAULT_PREFETCH_THRESHOLD;
use crate::error::CoreError;
use crate::guard::{Admission, InFlightSet, RequestGuard};
use crate::model::Photo;
use crate::sync::TokenSession;

const PAGE_OP: &str = "page fetch";
const LIKE_OP: &str = "like toggle";

/// When to fetch the next page while the user scrolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchPolicy {
    /// Fetch once the visible index is within this many rows of the end.
    pub threshold: usize,
}

impl PrefetchPolicy {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// `true` if showing row `visible_index` of `len` known rows should
    /// trigger a fetch. An empty list always does.
    pub fn should_prefetch(self, visible_index: usize, len: usize) -> bool {
        visible_index.saturating_add(self.threshold) >= len
    }
}

impl Default for PrefetchPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_PREFETCH_THRESHOLD)
    }
}

/// Result of a [`FeedSynchronizer::load_next_page`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// `page` was fetched; `added` new photos were appended.
    Appended { page: u32, added: usize },
    /// A fetch for `page` was already outstanding. Nothing was sent.
    AlreadyInFlight { page: u32 },
    /// The fetch was cancelled by a reset; its result was dropped.
    Discarded,
}

#[derive(Default)]
struct FeedState {
    /// Insertion-ordered, unique by id.
    photos: IndexMap<String, Photo>,
    snapshot: Arc<Vec<Photo>>,
    last_loaded_page: u32,
    /// Bumped by every reset; survives it.
    generation: u64,
}

impl FeedState {
    fn refresh_snapshot(&mut self) -> Arc<Vec<Photo>> {
        self.snapshot = Arc::new(self.photos.values().cloned().collect());
        Arc::clone(&self.snapshot)
    }
}

/// Owns the photo sequence and the like state of every photo in it.
pub struct FeedSynchronizer<A> {
    api: Arc<A>,
    tokens: Arc<TokenSession<A>>,
    bus: ChangeBus,
    per_page: u32,
    policy: PrefetchPolicy,
    pages: RequestGuard<u32>,
    likes: InFlightSet<String>,
    state: Mutex<FeedState>,
}

impl<A: PhotoApi> FeedSynchronizer<A> {
    pub fn new(
        api: Arc<A>,
        tokens: Arc<TokenSession<A>>,
        bus: ChangeBus,
        per_page: u32,
        policy: PrefetchPolicy,
    ) -> Self {
        Self {
            api,
            tokens,
            bus,
            per_page,
            policy,
            pages: RequestGuard::new(PAGE_OP),
            likes: InFlightSet::new(),
            state: Mutex::new(FeedState::default()),
        }
    }

    /// Fetch `last_loaded_page + 1` and append it.
    ///
    /// A no-op returning [`LoadOutcome::AlreadyInFlight`] while any page is
    /// outstanding. On failure nothing changes, so the next call retries
    /// the same page. Every accepted page publishes a
    /// [`ChangeEvent::Feed`], even an empty one.
    pub async fn load_next_page(&self) -> Result<LoadOutcome, CoreError> {
        let token = self.tokens.current_token()?;
        let ticket = {
            let state = self.lock_state();
            match self.pages.begin_exclusive(state.last_loaded_page + 1) {
                Admission::Granted(ticket) => ticket,
                Admission::AlreadyInFlight(page) => {
                    debug!(page, "page fetch already in flight");
                    return Ok(LoadOutcome::AlreadyInFlight { page });
                }
            }
        };
        let page = *ticket.key();
        let cancel = ticket.cancellation().clone();
        debug!(page, per_page = self.per_page, "fetching page");

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(LoadOutcome::Discarded),
            result = self.api.list_photos(token.as_ref(), page, self.per_page) => result,
        };

        let mut state = self.lock_state();
        let Some(result) = self.pages.complete(ticket, result) else {
            debug!(page, "stale page discarded");
            return Ok(LoadOutcome::Discarded);
        };
        let results = result.map_err(|e| {
            warn!(error = %e, page, "page fetch failed");
            CoreError::from(e)
        })?;

        let before = state.photos.len();
        for photo in results.into_iter().map(Photo::from) {
            if state.photos.contains_key(&photo.id) {
                debug!(id = %photo.id, page, "skipping photo already in feed");
                continue;
            }
            state.photos.insert(photo.id.clone(), photo);
        }
        let added = state.photos.len() - before;
        state.last_loaded_page = page;
        let snapshot = state.refresh_snapshot();
        self.bus.publish(ChangeEvent::Feed(snapshot));
        info!(page, added, total = state.photos.len(), "page appended");
        Ok(LoadOutcome::Appended { page, added })
    }

    /// Scroll hook: fetch the next page if row `index` is near the end.
    /// Returns `None` when the policy did not fire.
    pub async fn on_item_visible(&self, index: usize) -> Result<Option<LoadOutcome>, CoreError> {
        if !self.policy.should_prefetch(index, self.len()) {
            return Ok(None);
        }
        self.load_next_page().await.map(Some)
    }

    /// Set the like state of `photo_id` to `desired`.
    ///
    /// The local flip is published before the remote call. If the call
    /// fails the previous value is restored, a second
    /// [`ChangeEvent::Feed`] is published, and the error is returned. A
    /// failure that lands after a [`reset`](Self::reset) leaves the feed
    /// untouched and publishes nothing. A second toggle for the same photo
    /// while one is outstanding fails with [`CoreError::DuplicateRequest`].
    pub async fn toggle_like(&self, photo_id: &str, desired: bool) -> Result<(), CoreError> {
        let token = self.tokens.require_token()?;
        let Some(_exclusive) = self.likes.try_acquire(photo_id.to_owned()) else {
            return Err(CoreError::duplicate(LIKE_OP));
        };

        let (previous, generation) = {
            let mut state = self.lock_state();
            let photo = state
                .photos
                .get_mut(photo_id)
                .ok_or_else(|| CoreError::PhotoNotFound {
                    id: photo_id.to_owned(),
                })?;
            let previous = std::mem::replace(&mut photo.is_liked, desired);
            let snapshot = state.refresh_snapshot();
            self.bus.publish(ChangeEvent::Feed(snapshot));
            (previous, state.generation)
        };
        debug!(id = photo_id, desired, "like applied optimistically");

        let Err(e) = self.api.set_like(&token, photo_id, desired).await else {
            return Ok(());
        };

        let mut state = self.lock_state();
        if state.generation != generation {
            warn!(id = photo_id, error = %e, "like failed after reset");
            return Err(e.into());
        }
        if let Some(photo) = state.photos.get_mut(photo_id) {
            photo.is_liked = previous;
            let snapshot = state.refresh_snapshot();
            self.bus.publish(ChangeEvent::Feed(snapshot));
            warn!(id = photo_id, error = %e, "like failed, rolled back");
        }
        Err(e.into())
    }

    /// Empty the feed and cancel any outstanding page fetch. Publishes
    /// nothing.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        if self.pages.cancel_all() {
            debug!("in-flight page fetch cancelled by reset");
        }
        let generation = state.generation.wrapping_add(1);
        *state = FeedState {
            generation,
            ..FeedState::default()
        };
        debug!(generation, "feed state reset");
    }

    /// Immutable snapshot of the whole sequence.
    pub fn photos(&self) -> Arc<Vec<Photo>> {
        Arc::clone(&self.lock_state().snapshot)
    }

    pub fn photo(&self, id: &str) -> Option<Photo> {
        self.lock_state().photos.get(id).cloned()
    }

    pub fn is_liked(&self, id: &str) -> Option<bool> {
        self.lock_state().photos.get(id).map(|p| p.is_liked)
    }

    pub fn last_loaded_page(&self) -> u32 {
        self.lock_state().last_loaded_page
    }

    pub fn in_flight_page(&self) -> Option<u32> {
        self.pages.in_flight()
    }

    pub fn len(&self) -> usize {
        self.lock_state().photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn prefetch_policy(&self) -> PrefetchPolicy {
        self.policy
    }

    fn lock_state(&self) -> MutexGuard<'_, FeedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
