// ── Single-flight admission ──
//
// `RequestGuard` admits at most one operation at a time and hands out a
// `Ticket` per admitted operation. A ticket that has been superseded or
// cancelled yields nothing when completed, so late network responses can
// never overwrite newer state.

mod in_flight;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::debug;

pub use in_flight::{InFlightGuard, InFlightSet};

/// Outcome of asking a guard to admit an operation.
#[derive(Debug)]
pub enum Admission<K> {
    /// The operation may proceed. Complete the ticket when it finishes.
    Granted(Ticket<K>),
    /// An operation for this key (or, for exclusive admission, any key) is
    /// already outstanding. Carries the key that is in flight.
    AlreadyInFlight(K),
}

struct Slot<K> {
    key: K,
    id: u64,
    cancel: CancellationToken,
}

struct GuardState<K> {
    current: Option<Slot<K>>,
    next_id: u64,
}

/// Single-slot, single-flight admission primitive.
///
/// All bookkeeping happens under one short critical section; no method
/// waits on I/O. The guard never stores domain data, only the key and id
/// of the outstanding ticket.
pub struct RequestGuard<K> {
    label: &'static str,
    state: Arc<Mutex<GuardState<K>>>,
}

impl<K: Clone + Eq> RequestGuard<K> {
    /// `label` names the guarded operation in logs.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            state: Arc::new(Mutex::new(GuardState {
                current: None,
                next_id: 1,
            })),
        }
    }

    /// Admit an operation for `key`.
    ///
    /// Returns [`Admission::AlreadyInFlight`] if `key` is the key currently
    /// in flight. A different in-flight key is cancelled (its ticket goes
    /// stale) before the new ticket is issued.
    pub fn begin(&self, key: K) -> Admission<K> {
        let mut state = lock(&self.state);
        if let Some(slot) = state.current.as_ref() {
            if slot.key == key {
                debug!(guard = self.label, "duplicate admission rejected");
                return Admission::AlreadyInFlight(key);
            }
            debug!(guard = self.label, ticket = slot.id, "superseding in-flight ticket");
            slot.cancel.cancel();
        }
        Admission::Granted(self.issue(&mut state, key))
    }

    /// Admit an operation only if nothing at all is in flight.
    ///
    /// Unlike [`begin`](Self::begin) this never supersedes: a different
    /// in-flight key also yields [`Admission::AlreadyInFlight`] carrying
    /// that key.
    pub fn begin_exclusive(&self, key: K) -> Admission<K> {
        let mut state = lock(&self.state);
        if let Some(slot) = state.current.as_ref() {
            debug!(guard = self.label, ticket = slot.id, "exclusive admission rejected");
            return Admission::AlreadyInFlight(slot.key.clone());
        }
        Admission::Granted(self.issue(&mut state, key))
    }

    /// Settle `ticket` with the operation's `result`.
    ///
    /// Returns `Some(result)` if the ticket was still current, `None` if it
    /// had been superseded or cancelled. Consuming the ticket makes a second
    /// completion impossible.
    pub fn complete<T>(&self, ticket: Ticket<K>, result: T) -> Option<T> {
        ticket.settle().then_some(result)
    }

    /// Cancel the in-flight operation if its key equals `key`.
    /// Returns `true` if something was cancelled.
    pub fn cancel_current(&self, key: &K) -> bool {
        let mut state = lock(&self.state);
        if state.current.as_ref().is_some_and(|slot| slot.key == *key) {
            if let Some(slot) = state.current.take() {
                debug!(guard = self.label, ticket = slot.id, "cancelling in-flight ticket");
                slot.cancel.cancel();
            }
            return true;
        }
        false
    }

    /// Cancel whatever is in flight. Returns `true` if something was.
    pub fn cancel_all(&self) -> bool {
        let mut state = lock(&self.state);
        match state.current.take() {
            Some(slot) => {
                debug!(guard = self.label, ticket = slot.id, "cancelling in-flight ticket");
                slot.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// The key currently in flight, if any.
    pub fn in_flight(&self) -> Option<K> {
        lock(&self.state).current.as_ref().map(|slot| slot.key.clone())
    }

    fn issue(&self, state: &mut GuardState<K>, key: K) -> Ticket<K> {
        let id = state.next_id;
        state.next_id += 1;
        let cancel = CancellationToken::new();
        state.current = Some(Slot {
            key: key.clone(),
            id,
            cancel: cancel.clone(),
        });
        debug!(guard = self.label, ticket = id, "ticket issued");
        Ticket {
            key,
            id,
            cancel,
            state: Arc::clone(&self.state),
            settled: false,
        }
    }
}

/// Handle for one admitted, in-flight operation.
///
/// Dropping a ticket without completing it releases the slot, so an
/// abandoned future never wedges the guard.
#[must_use = "an unsettled ticket releases its slot on drop"]
pub struct Ticket<K> {
    key: K,
    id: u64,
    cancel: CancellationToken,
    state: Arc<Mutex<GuardState<K>>>,
    settled: bool,
}

impl<K> Ticket<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Fires when this ticket is superseded or cancelled. Race the
    /// transport future against it to abandon stale work early.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Release the slot. `true` if this ticket was still the current one.
    fn settle(mut self) -> bool {
        self.settled = true;
        release(&self.state, self.id)
    }
}

impl<K> Drop for Ticket<K> {
    fn drop(&mut self) {
        if !self.settled {
            release(&self.state, self.id);
        }
    }
}

impl<K: std::fmt::Debug> std::fmt::Debug for Ticket<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ticket")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

fn release<K>(state: &Mutex<GuardState<K>>, id: u64) -> bool {
    let mut state = lock(state);
    if state.current.as_ref().is_some_and(|slot| slot.id == id) {
        state.current = None;
        return true;
    }
    false
}

fn lock<K>(state: &Mutex<GuardState<K>>) -> MutexGuard<'_, GuardState<K>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn granted<K: std::fmt::Debug>(admission: Admission<K>) -> Ticket<K> {
        match admission {
            Admission::Granted(ticket) => ticket,
            Admission::AlreadyInFlight(key) => panic!("expected a ticket, {key:?} is in flight"),
        }
    }

    #[test]
    fn same_key_is_rejected_while_in_flight() {
        let guard = RequestGuard::new("test");
        let ticket = granted(guard.begin("code-a"));

        assert!(matches!(
            guard.begin("code-a"),
            Admission::AlreadyInFlight("code-a")
        ));
        assert_eq!(guard.complete(ticket, 7), Some(7));
        assert!(guard.in_flight().is_none());
    }

    #[test]
    fn same_key_is_admitted_again_after_completion() {
        let guard = RequestGuard::new("test");
        let first = granted(guard.begin(1));
        assert_eq!(guard.complete(first, ()), Some(()));

        let second = granted(guard.begin(1));
        assert_eq!(guard.complete(second, ()), Some(()));
    }

    #[test]
    fn different_key_supersedes_and_stale_completion_is_ignored() {
        let guard = RequestGuard::new("test");
        let old = granted(guard.begin("a"));
        let new = granted(guard.begin("b"));

        assert!(old.is_cancelled());
        assert!(!new.is_cancelled());
        assert_eq!(guard.in_flight(), Some("b"));

        assert_eq!(guard.complete(old, "stale"), None);
        // The stale completion must not release the newer ticket's slot.
        assert_eq!(guard.in_flight(), Some("b"));
        assert_eq!(guard.complete(new, "fresh"), Some("fresh"));
    }

    #[test]
    fn exclusive_admission_never_supersedes() {
        let guard = RequestGuard::new("test");
        let first = granted(guard.begin_exclusive(1u32));

        match guard.begin_exclusive(2) {
            Admission::AlreadyInFlight(key) => assert_eq!(key, 1),
            Admission::Granted(_) => panic!("second exclusive admission was granted"),
        }
        assert!(!first.is_cancelled());
        assert_eq!(guard.complete(first, ()), Some(()));
    }

    #[test]
    fn cancel_current_only_matches_its_key() {
        let guard = RequestGuard::new("test");
        let ticket = granted(guard.begin("a"));

        assert!(!guard.cancel_current(&"b"));
        assert!(!ticket.is_cancelled());

        assert!(guard.cancel_current(&"a"));
        assert!(ticket.is_cancelled());
        assert_eq!(guard.complete(ticket, ()), None);
    }

    #[test]
    fn cancel_all_frees_the_slot() {
        let guard = RequestGuard::new("test");
        let ticket = granted(guard.begin_exclusive(3u32));

        assert!(guard.cancel_all());
        assert!(!guard.cancel_all());
        assert!(guard.in_flight().is_none());

        let next = granted(guard.begin_exclusive(3));
        assert_eq!(guard.complete(ticket, ()), None);
        assert_eq!(guard.complete(next, ()), Some(()));
    }

    #[test]
    fn dropped_ticket_releases_its_slot() {
        let guard = RequestGuard::new("test");
        drop(granted(guard.begin("x")));
        assert!(guard.in_flight().is_none());
        let _again = granted(guard.begin("x"));
    }
}
