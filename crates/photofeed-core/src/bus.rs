// ── Change fan-out ──
//
// Synchronizers publish typed `ChangeEvent`s from any task; a single
// `Dispatcher`, owned by whoever owns the UI loop, delivers them to
// subscribers. All handlers therefore run on one execution context
// regardless of where `publish` was called.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use strum::Display;
use tokio::sync::mpsc;
use tracing::{debug, trace};
use url::Url;

use crate::model::{Photo, UserProfile};

/// What changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Topic {
    Feed,
    Profile,
    Avatar,
}

/// A state change announced by a synchronizer, with the new state attached
/// so handlers never have to read back from the synchronizer.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    /// Full, immutable snapshot of the photo sequence.
    Feed(Arc<Vec<Photo>>),
    /// The current profile, `None` after logout.
    Profile(Option<UserProfile>),
    /// The current avatar URL, `None` after logout.
    Avatar(Option<Url>),
}

impl ChangeEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::Feed(_) => Topic::Feed,
            Self::Profile(_) => Topic::Profile,
            Self::Avatar(_) => Topic::Avatar,
        }
    }
}

/// Receives events for the topics it subscribed to.
pub trait ChangeHandler: Send + Sync {
    fn on_change(&self, event: &ChangeEvent);
}

impl<F> ChangeHandler for F
where
    F: Fn(&ChangeEvent) + Send + Sync,
{
    fn on_change(&self, event: &ChangeEvent) {
        self(event);
    }
}

/// Returned by [`ChangeBus::subscribe`]; pass to
/// [`ChangeBus::unsubscribe`] to stop delivery early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: u64,
    topic: Topic,
}

impl SubscriptionHandle {
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

struct Subscriber {
    id: u64,
    topic: Topic,
    /// Sequence number of the last event published before this
    /// subscription. Only later events are delivered.
    since: u64,
    handler: Weak<dyn ChangeHandler>,
}

struct Registry {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
    published: AtomicU64,
}

impl Registry {
    fn subscribers(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

struct Envelope {
    seq: u64,
    event: ChangeEvent,
}

/// Publish side of the bus. Cheap to clone; every synchronizer holds one.
///
/// The bus keeps only weak references to handlers: a handler whose owner
/// drops its `Arc` stops receiving events without unsubscribing.
#[derive(Clone)]
pub struct ChangeBus {
    tx: mpsc::UnboundedSender<Envelope>,
    registry: Arc<Registry>,
}

impl ChangeBus {
    /// Create a bus and the dispatcher that delivers its events.
    pub fn channel() -> (Self, Dispatcher) {
        let (tx, rx) = mpsc::unbounded_channel();
        let registry = Arc::new(Registry {
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            published: AtomicU64::new(0),
        });
        let dispatcher = Dispatcher {
            rx,
            registry: Arc::clone(&registry),
        };
        (Self { tx, registry }, dispatcher)
    }

    /// Queue `event` for delivery on the dispatcher's context. Never blocks.
    pub fn publish(&self, event: ChangeEvent) {
        let seq = self.registry.published.fetch_add(1, Ordering::SeqCst) + 1;
        let topic = event.topic();
        if self.tx.send(Envelope { seq, event }).is_err() {
            debug!(%topic, "dispatcher gone, change event dropped");
            return;
        }
        trace!(%topic, seq, "change event published");
    }

    /// Deliver future events on `topic` to `handler`.
    ///
    /// Events published before this call are never replayed: check the
    /// synchronizer's current state right after subscribing.
    pub fn subscribe<H>(&self, topic: Topic, handler: &Arc<H>) -> SubscriptionHandle
    where
        H: ChangeHandler + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let weak: Weak<dyn ChangeHandler> = Arc::<H>::downgrade(handler);
        let mut subscribers = self.registry.subscribers();
        let since = self.registry.published.load(Ordering::SeqCst);
        subscribers.push(Subscriber {
            id,
            topic,
            since,
            handler: weak,
        });
        debug!(%topic, id, "subscribed");
        SubscriptionHandle { id, topic }
    }

    /// Stop delivery. Returns `false` if the handle was already removed.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut subscribers = self.registry.subscribers();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != handle.id);
        before != subscribers.len()
    }

    /// Live subscribers for `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.registry
            .subscribers()
            .iter()
            .filter(|s| s.topic == topic && s.handler.strong_count() > 0)
            .count()
    }
}

/// Delivery side of the bus.
///
/// Lives on the designated execution context (the UI task): either drive
/// it with [`run`](Self::run), or pump it from an existing loop with
/// [`dispatch_pending`](Self::dispatch_pending).
pub struct Dispatcher {
    rx: mpsc::UnboundedReceiver<Envelope>,
    registry: Arc<Registry>,
}

impl Dispatcher {
    /// Deliver every queued event without waiting. Returns how many events
    /// were dispatched.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(envelope) = self.rx.try_recv() {
            self.deliver(&envelope);
            count += 1;
        }
        count
    }

    /// Wait for the next event and deliver it. Returns `false` once every
    /// `ChangeBus` clone has been dropped and the queue is empty.
    pub async fn dispatch_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(envelope) => {
                self.deliver(&envelope);
                true
            }
            None => false,
        }
    }

    /// Deliver events until every `ChangeBus` clone is dropped.
    pub async fn run(mut self) {
        while self.dispatch_next().await {}
        debug!("change dispatcher stopped");
    }

    fn deliver(&self, envelope: &Envelope) {
        let topic = envelope.event.topic();
        // Collect under the lock, call outside it so handlers may
        // (un)subscribe.
        let handlers: Vec<Arc<dyn ChangeHandler>> = {
            let mut subscribers = self.registry.subscribers();
            subscribers.retain(|s| s.handler.strong_count() > 0);
            subscribers
                .iter()
                .filter(|s| s.topic == topic && envelope.seq > s.since)
                .filter_map(|s| s.handler.upgrade())
                .collect()
        };
        trace!(%topic, seq = envelope.seq, receivers = handlers.len(), "dispatching");
        for handler in handlers {
            handler.on_change(&envelope.event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[derive(Default)]
    struct Counter {
        seen: AtomicUsize,
    }

    impl ChangeHandler for Counter {
        fn on_change(&self, _event: &ChangeEvent) {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Counter {
        fn seen(&self) -> usize {
            self.seen.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn delivers_only_matching_topic() {
        let (bus, mut dispatcher) = ChangeBus::channel();
        let feed = Arc::new(Counter::default());
        let avatar = Arc::new(Counter::default());
        bus.subscribe(Topic::Feed, &feed);
        bus.subscribe(Topic::Avatar, &avatar);

        bus.publish(ChangeEvent::Feed(Arc::new(Vec::new())));
        assert_eq!(dispatcher.dispatch_pending(), 1);

        assert_eq!(feed.seen(), 1);
        assert_eq!(avatar.seen(), 0);
    }

    #[test]
    fn late_subscribers_get_no_replay() {
        let (bus, mut dispatcher) = ChangeBus::channel();
        bus.publish(ChangeEvent::Profile(None));

        let late = Arc::new(Counter::default());
        bus.subscribe(Topic::Profile, &late);
        dispatcher.dispatch_pending();
        assert_eq!(late.seen(), 0);

        bus.publish(ChangeEvent::Profile(None));
        dispatcher.dispatch_pending();
        assert_eq!(late.seen(), 1);
    }

    #[test]
    fn dropped_handlers_are_not_kept_alive() {
        let (bus, mut dispatcher) = ChangeBus::channel();
        let handler = Arc::new(Counter::default());
        bus.subscribe(Topic::Feed, &handler);
        assert_eq!(bus.subscriber_count(Topic::Feed), 1);

        drop(handler);
        assert_eq!(bus.subscriber_count(Topic::Feed), 0);

        bus.publish(ChangeEvent::Feed(Arc::new(Vec::new())));
        assert_eq!(dispatcher.dispatch_pending(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let (bus, mut dispatcher) = ChangeBus::channel();
        let handler = Arc::new(Counter::default());
        let handle = bus.subscribe(Topic::Avatar, &handler);

        assert!(bus.unsubscribe(handle));
        assert!(!bus.unsubscribe(handle));

        bus.publish(ChangeEvent::Avatar(None));
        dispatcher.dispatch_pending();
        assert_eq!(handler.seen(), 0);
    }

    #[test]
    fn closures_can_subscribe() {
        let (bus, mut dispatcher) = ChangeBus::channel();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_in_handler = Arc::clone(&hits);
        let handler = Arc::new(move |event: &ChangeEvent| {
            assert_eq!(event.topic(), Topic::Profile);
            hits_in_handler.fetch_add(1, Ordering::SeqCst);
        });
        bus.subscribe(Topic::Profile, &handler);

        bus.publish(ChangeEvent::Profile(None));
        dispatcher.dispatch_pending();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handlers_run_on_the_dispatcher_task() {
        let (bus, dispatcher) = ChangeBus::channel();
        let handler = Arc::new(Counter::default());
        bus.subscribe(Topic::Feed, &handler);

        let publisher = bus.clone();
        tokio::spawn(async move {
            publisher.publish(ChangeEvent::Feed(Arc::new(Vec::new())));
        })
        .await
        .ok();
        drop(bus);

        dispatcher.run().await;
        assert_eq!(handler.seen(), 1);
    }
}
