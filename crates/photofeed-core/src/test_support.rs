// Scripted `PhotoApi` fake and event recorder for synchronizer tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use photofeed_api::{
    Error, PhotoResult, PhotoUrls, ProfileImage, ProfileResult, TokenResponse, UserResult,
};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::watch;
use url::Url;

use crate::api::PhotoApi;
use crate::bus::{ChangeBus, ChangeEvent, ChangeHandler, Dispatcher, Topic};
use crate::credential::{CredentialStore, MemoryCredentialStore};
use crate::sync::{FeedSynchronizer, PrefetchPolicy, ProfileSynchronizer, TokenSession};

pub(crate) fn url(path: &str) -> Url {
    Url::parse(&format!("https://img.example.com/{path}")).unwrap()
}

pub(crate) fn photo_result(id: &str) -> PhotoResult {
    PhotoResult {
        id: id.into(),
        width: 400,
        height: 300,
        created_at: Some("2024-06-15T10:30:00Z".into()),
        description: None,
        likes: 0,
        liked_by_user: false,
        urls: PhotoUrls {
            full: url(&format!("{id}/full")),
            regular: url(&format!("{id}/regular")),
            small: url(&format!("{id}/small")),
            thumb: url(&format!("{id}/thumb")),
        },
    }
}

fn server_error() -> Error {
    Error::HttpStatus {
        status: 500,
        body: "boom".into(),
    }
}

/// A `PhotoApi` that answers from memory.
///
/// Page `n` of size `s` yields ids `(n-1)*s+1 ..= n*s` unless scripted with
/// [`script_page`](Self::script_page). While the gate is closed every call
/// waits for [`open`](Self::open).
pub(crate) struct FakeApi {
    gate: watch::Sender<bool>,
    pub fail_exchange: AtomicBool,
    pub fail_pages: AtomicBool,
    pub fail_likes: AtomicBool,
    pub fail_profile: AtomicBool,
    pages: Mutex<HashMap<u32, Vec<String>>>,
    exchange_calls: Mutex<Vec<String>>,
    page_calls: Mutex<Vec<u32>>,
    like_calls: Mutex<Vec<(String, bool)>>,
    profile_calls: AtomicUsize,
    avatar_calls: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self {
            gate: watch::channel(true).0,
            fail_exchange: AtomicBool::new(false),
            fail_pages: AtomicBool::new(false),
            fail_likes: AtomicBool::new(false),
            fail_profile: AtomicBool::new(false),
            pages: Mutex::new(HashMap::new()),
            exchange_calls: Mutex::new(Vec::new()),
            page_calls: Mutex::new(Vec::new()),
            like_calls: Mutex::new(Vec::new()),
            profile_calls: AtomicUsize::new(0),
            avatar_calls: AtomicUsize::new(0),
        }
    }

    /// A fake whose calls block until [`open`](Self::open).
    pub fn held() -> Self {
        let api = Self::new();
        api.gate.send_replace(false);
        api
    }

    pub fn open(&self) {
        self.gate.send_replace(true);
    }

    pub fn close(&self) {
        self.gate.send_replace(false);
    }

    pub fn script_page(&self, page: u32, ids: &[&str]) {
        self.pages
            .lock()
            .unwrap()
            .insert(page, ids.iter().map(|id| (*id).to_owned()).collect());
    }

    pub fn exchange_calls(&self) -> Vec<String> {
        self.exchange_calls.lock().unwrap().clone()
    }

    pub fn page_calls(&self) -> Vec<u32> {
        self.page_calls.lock().unwrap().clone()
    }

    pub fn like_calls(&self) -> Vec<(String, bool)> {
        self.like_calls.lock().unwrap().clone()
    }

    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    pub fn avatar_calls(&self) -> usize {
        self.avatar_calls.load(Ordering::SeqCst)
    }

    async fn pass_gate(&self) {
        let mut rx = self.gate.subscribe();
        let _ = rx.wait_for(|open| *open).await;
    }
}

impl PhotoApi for FakeApi {
    fn exchange_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<TokenResponse, Error>> + Send {
        self.exchange_calls.lock().unwrap().push(code.to_owned());
        let code = code.to_owned();
        async move {
            self.pass_gate().await;
            if self.fail_exchange.load(Ordering::SeqCst) {
                return Err(server_error());
            }
            Ok(TokenResponse {
                access_token: format!("token-for-{code}"),
                token_type: Some("Bearer".into()),
                scope: Some("public".into()),
                created_at: None,
            })
        }
    }

    fn fetch_me(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<ProfileResult, Error>> + Send {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        let token = token.expose_secret().to_owned();
        async move {
            self.pass_gate().await;
            if self.fail_profile.load(Ordering::SeqCst) {
                return Err(server_error());
            }
            Ok(ProfileResult {
                username: format!("user-{token}"),
                first_name: "Ada".into(),
                last_name: Some("Lovelace".into()),
                bio: Some("Analyst".into()),
            })
        }
    }

    fn fetch_user(
        &self,
        _token: &SecretString,
        username: &str,
    ) -> impl Future<Output = Result<UserResult, Error>> + Send {
        self.avatar_calls.fetch_add(1, Ordering::SeqCst);
        let username = username.to_owned();
        async move {
            self.pass_gate().await;
            if self.fail_profile.load(Ordering::SeqCst) {
                return Err(server_error());
            }
            Ok(UserResult {
                profile_image: ProfileImage {
                    small: url(&format!("{username}/s")),
                    medium: url(&format!("{username}/m")),
                    large: url(&format!("{username}/l")),
                },
            })
        }
    }

    fn list_photos(
        &self,
        _token: Option<&SecretString>,
        page: u32,
        per_page: u32,
    ) -> impl Future<Output = Result<Vec<PhotoResult>, Error>> + Send {
        self.page_calls.lock().unwrap().push(page);
        async move {
            self.pass_gate().await;
            if self.fail_pages.load(Ordering::SeqCst) {
                return Err(server_error());
            }
            let scripted = self.pages.lock().unwrap().get(&page).cloned();
            let ids = scripted.unwrap_or_else(|| {
                let first = (page - 1) * per_page + 1;
                (first..first + per_page).map(|n| n.to_string()).collect()
            });
            Ok(ids.iter().map(|id| photo_result(id)).collect())
        }
    }

    fn set_like(
        &self,
        _token: &SecretString,
        photo_id: &str,
        liked: bool,
    ) -> impl Future<Output = Result<(), Error>> + Send {
        self.like_calls
            .lock()
            .unwrap()
            .push((photo_id.to_owned(), liked));
        async move {
            self.pass_gate().await;
            if self.fail_likes.load(Ordering::SeqCst) {
                return Err(server_error());
            }
            Ok(())
        }
    }
}

/// Records every event it receives.
#[derive(Default)]
pub(crate) struct Recorder {
    events: Mutex<Vec<ChangeEvent>>,
}

impl ChangeHandler for Recorder {
    fn on_change(&self, event: &ChangeEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

impl Recorder {
    pub fn events(&self, topic: Topic) -> Vec<ChangeEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.topic() == topic)
            .cloned()
            .collect()
    }

    pub fn count(&self, topic: Topic) -> usize {
        self.events(topic).len()
    }
}

/// Every synchronizer wired to one fake and one bus, with a recorder
/// subscribed to all topics.
pub(crate) struct Harness {
    pub api: Arc<FakeApi>,
    pub store: Arc<MemoryCredentialStore>,
    pub tokens: Arc<TokenSession<FakeApi>>,
    pub profile: Arc<ProfileSynchronizer<FakeApi>>,
    pub feed: Arc<FeedSynchronizer<FakeApi>>,
    pub bus: ChangeBus,
    pub dispatcher: Dispatcher,
    pub recorder: Arc<Recorder>,
}

impl Harness {
    pub fn new(api: FakeApi, per_page: u32) -> Self {
        Self::with_store(api, per_page, MemoryCredentialStore::new())
    }

    pub fn signed_in(api: FakeApi, per_page: u32) -> Self {
        Self::with_store(api, per_page, MemoryCredentialStore::with_token("stored-token"))
    }

    fn with_store(api: FakeApi, per_page: u32, store: MemoryCredentialStore) -> Self {
        let api = Arc::new(api);
        let store = Arc::new(store);
        let (bus, dispatcher) = ChangeBus::channel();
        let dyn_store: Arc<dyn CredentialStore> = Arc::<MemoryCredentialStore>::clone(&store);
        let tokens = Arc::new(TokenSession::new(Arc::clone(&api), dyn_store));
        let profile = Arc::new(ProfileSynchronizer::new(
            Arc::clone(&api),
            Arc::clone(&tokens),
            bus.clone(),
        ));
        let feed = Arc::new(FeedSynchronizer::new(
            Arc::clone(&api),
            Arc::clone(&tokens),
            bus.clone(),
            per_page,
            PrefetchPolicy::default(),
        ));
        let recorder = Arc::new(Recorder::default());
        for topic in [Topic::Feed, Topic::Profile, Topic::Avatar] {
            bus.subscribe(topic, &recorder);
        }
        Self {
            api,
            store,
            tokens,
            profile,
            feed,
            bus,
            dispatcher,
            recorder,
        }
    }

    /// Deliver queued events to the recorder.
    pub fn pump(&mut self) {
        self.dispatcher.dispatch_pending();
    }
}
