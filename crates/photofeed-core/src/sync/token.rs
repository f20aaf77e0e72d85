// ── OAuth token session ──
//
// Exchanges authorization codes for bearer tokens, one code at a time, and
// is the only writer of the credential store.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::api::PhotoApi;
use crate::credential::{Credential, CredentialStore};
use crate::error::CoreError;
use crate::guard::{Admission, RequestGuard};

const OPERATION: &str = "token exchange";

/// Owns the code-to-token exchange and the stored credential.
pub struct TokenSession<A> {
    api: Arc<A>,
    store: Arc<dyn CredentialStore>,
    guard: RequestGuard<String>,
    /// Critical section for every credential mutation.
    credential: Mutex<Option<Credential>>,
}

impl<A: PhotoApi> TokenSession<A> {
    pub fn new(api: Arc<A>, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            api,
            store,
            guard: RequestGuard::new(OPERATION),
            credential: Mutex::new(None),
        }
    }

    /// Exchange `code` for a bearer token and persist it.
    ///
    /// A second call with the same code while the first is outstanding
    /// fails with [`CoreError::DuplicateRequest`]. A call with a different
    /// code supersedes the outstanding one, which then fails with
    /// [`CoreError::Superseded`] and stores nothing. Transport and decode
    /// errors are returned as-is and leave the stored credential untouched.
    pub async fn exchange(&self, code: &str) -> Result<Credential, CoreError> {
        let ticket = match self.guard.begin(code.to_owned()) {
            Admission::Granted(ticket) => ticket,
            Admission::AlreadyInFlight(_) => return Err(CoreError::duplicate(OPERATION)),
        };
        let cancel = ticket.cancellation().clone();

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("token exchange superseded in flight");
                return Err(CoreError::superseded(OPERATION));
            }
            result = self.api.exchange_code(code) => result,
        };

        let mut credential = self.lock_credential();
        let Some(result) = self.guard.complete(ticket, result) else {
            return Err(CoreError::superseded(OPERATION));
        };
        let response = result.map_err(|e| {
            warn!(error = %e, "token exchange failed");
            CoreError::from(e)
        })?;

        let token = SecretString::from(response.access_token);
        self.store.set(&token)?;
        let issued = Credential {
            token,
            issued_for_code: code.to_owned(),
        };
        *credential = Some(issued.clone());
        info!("access token stored");
        Ok(issued)
    }

    /// The stored bearer token, read straight from the credential store.
    pub fn current_token(&self) -> Result<Option<SecretString>, CoreError> {
        self.store.get()
    }

    /// Like [`current_token`](Self::current_token), but a missing token is
    /// [`CoreError::Unauthorized`].
    pub fn require_token(&self) -> Result<SecretString, CoreError> {
        self.current_token()?.ok_or(CoreError::Unauthorized)
    }

    /// The credential produced by the last successful exchange in this
    /// process, if any.
    pub fn credential(&self) -> Option<Credential> {
        self.lock_credential().clone()
    }

    /// The code currently being exchanged, if any.
    pub fn exchange_in_flight(&self) -> Option<String> {
        self.guard.in_flight()
    }

    /// Forget the credential and cancel any in-flight exchange.
    pub fn revoke(&self) -> Result<(), CoreError> {
        let mut credential = self.lock_credential();
        if self.guard.cancel_all() {
            debug!("in-flight token exchange cancelled by revoke");
        }
        *credential = None;
        self.store.clear()?;
        info!("credential revoked");
        Ok(())
    }

    fn lock_credential(&self) -> MutexGuard<'_, Option<Credential>> {
        self.credential
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
