//! In-process publish/subscribe hub for registry events.
//!
//! [`EventBroker`] keeps a registry of subscriptions, each backed by its own
//! bounded [`tokio::sync::mpsc`] queue. Publishing serializes the event once,
//! snapshots the registry under the lock, and then delivers to every queue
//! with a non-blocking `try_send` outside the lock. A full queue drops the
//! event for that subscriber only, so producers never wait on consumers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::event::{RegistryEvent, WireEvent};
use super::{Subscription, SubscriptionId};

/// Default per-subscription queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Outcome of a single [`EventBroker::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    /// Subscriptions that accepted the event into their queue.
    pub delivered: usize,
    /// Subscriptions whose queue was full; the event was dropped for them.
    pub dropped: usize,
}

/// Point-in-time broker counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BrokerStats {
    /// Currently registered subscriptions.
    pub subscribers: usize,
    /// Events accepted by `publish` since start.
    pub published: u64,
    /// Per-subscriber enqueues since start.
    pub delivered: u64,
    /// Per-subscriber drops on a full queue since start.
    pub dropped: u64,
}

/// State shared between the broker handle and live subscriptions.
#[derive(Debug)]
pub(crate) struct BrokerInner {
    subscribers: Mutex<HashMap<SubscriptionId, mpsc::Sender<WireEvent>>>,
    queue_capacity: usize,
    shut_down: AtomicBool,
    published: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl BrokerInner {
    /// Locks the registry. A poisoned lock still guards a consistent map:
    /// no code path panics while holding it with the map half-updated.
    fn registry(&self) -> MutexGuard<'_, HashMap<SubscriptionId, mpsc::Sender<WireEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes a registration. Returns `false` if it was already gone.
    pub(crate) fn remove(&self, id: SubscriptionId) -> bool {
        self.registry().remove(&id).is_some()
    }
}

/// Cloneable handle to the shared broker.
///
/// Constructed once at server start and injected into handlers through
/// [`crate::app_state::AppState`].
#[derive(Debug, Clone)]
pub struct EventBroker {
    inner: Arc<BrokerInner>,
}

impl EventBroker {
    /// Creates a broker whose subscriptions each buffer up to
    /// `queue_capacity` pending events (at least 1).
    #[must_use]
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            inner: Arc::new(BrokerInner {
                subscribers: Mutex::new(HashMap::new()),
                queue_capacity: queue_capacity.max(1),
                shut_down: AtomicBool::new(false),
                published: AtomicU64::new(0),
                delivered: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
            }),
        }
    }

    /// Registers a new subscription with an empty queue.
    ///
    /// Never fails. After [`EventBroker::shutdown`] the returned
    /// subscription is not registered and yields nothing.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let id = SubscriptionId::new();
        let (sender, receiver) = mpsc::channel(self.inner.queue_capacity);

        let registered = {
            let mut registry = self.inner.registry();
            // Checked under the lock so a concurrent shutdown cannot miss us.
            let open = !self.inner.shut_down.load(Ordering::Acquire);
            if open {
                registry.insert(id, sender);
            }
            open
        };

        if registered {
            tracing::debug!(subscription_id = %id, "subscription registered");
        } else {
            tracing::debug!(subscription_id = %id, "broker shut down, subscription not registered");
        }
        Subscription::new(id, receiver, Arc::downgrade(&self.inner))
    }

    /// Removes a subscription from the registry.
    ///
    /// Returns `true` if it was registered. Removing an absent subscription
    /// is a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.inner.remove(id);
        if removed {
            tracing::debug!(subscription_id = %id, "subscription removed");
        }
        removed
    }

    /// Relays an event to every current subscription.
    ///
    /// The registry lock is held only while copying the sender list.
    /// Delivery never blocks: a subscription whose queue is full misses
    /// this event and nothing else happens.
    ///
    /// # Errors
    ///
    /// Returns the [`serde_json::Error`] if the event cannot be encoded.
    /// Nothing is delivered and the published counter is unchanged.
    pub fn publish(&self, event: &RegistryEvent) -> Result<PublishReport, serde_json::Error> {
        let wire = event.to_wire()?;

        let snapshot = {
            let registry = self.inner.registry();
            let mut senders = Vec::with_capacity(registry.len());
            senders.extend(registry.iter().map(|(id, sender)| (*id, sender.clone())));
            senders
        };

        let mut report = PublishReport::default();
        for (id, sender) in snapshot {
            match sender.try_send(WireEvent::clone(&wire)) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    report.dropped += 1;
                    tracing::trace!(subscription_id = %id, "subscriber queue full, event dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::trace!(subscription_id = %id, "subscriber closed during publish");
                }
            }
        }

        self.inner.published.fetch_add(1, Ordering::Relaxed);
        self.inner
            .delivered
            .fetch_add(report.delivered as u64, Ordering::Relaxed);
        self.inner
            .dropped
            .fetch_add(report.dropped as u64, Ordering::Relaxed);

        tracing::debug!(
            event_type = event.event_type(),
            delivered = report.delivered,
            dropped = report.dropped,
            "event published"
        );
        Ok(report)
    }

    /// Closes every subscription queue and refuses new registrations.
    ///
    /// Consumers drain what is already queued and then observe end of
    /// stream. Called when the server stops.
    pub fn shutdown(&self) {
        let closed = {
            let mut registry = self.inner.registry();
            self.inner.shut_down.store(true, Ordering::Release);
            let count = registry.len();
            registry.clear();
            count
        };
        tracing::info!(closed, "event broker shut down");
    }

    /// Returns `true` once [`EventBroker::shutdown`] has run.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::Acquire)
    }

    /// Returns the number of registered subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.registry().len()
    }

    /// Returns the per-subscription queue capacity.
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.inner.queue_capacity
    }

    /// Returns a snapshot of the broker counters.
    #[must_use]
    pub fn stats(&self) -> BrokerStats {
        BrokerStats {
            subscribers: self.subscriber_count(),
            published: self.inner.published.load(Ordering::Relaxed),
            delivered: self.inner.delivered.load(Ordering::Relaxed),
            dropped: self.inner.dropped.load(Ordering::Relaxed),
        }
    }
}

impl Default for EventBroker {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::{Map, Value, json};

    fn payload(value: Value) -> Map<String, Value> {
        let Value::Object(map) = value else {
            panic!("payload must be an object");
        };
        map
    }

    fn publish(broker: &EventBroker, event: &RegistryEvent) -> PublishReport {
        let Ok(report) = broker.publish(event) else {
            panic!("event failed to encode");
        };
        report
    }

    fn parse(wire: &WireEvent) -> Value {
        let Ok(value) = serde_json::from_str::<Value>(wire) else {
            panic!("wire event is not JSON");
        };
        value
    }

    #[test]
    fn publish_without_subscribers_delivers_nothing() {
        let broker = EventBroker::new(10);
        let report = publish(&broker, &RegistryEvent::project_created(1, "a"));
        assert_eq!(report, PublishReport::default());
        assert_eq!(broker.stats().published, 1);
    }

    #[tokio::test]
    async fn subscriber_receives_events_in_publish_order() {
        let broker = EventBroker::new(100);
        let mut sub = broker.subscribe();

        for id in 0..50 {
            publish(&broker, &RegistryEvent::project_created(id, "p"));
        }

        for id in 0..50 {
            let Some(wire) = sub.recv().await else {
                panic!("expected event {id}");
            };
            assert_eq!(parse(&wire)["payload"]["id"], id);
        }
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn project_created_then_unsubscribe_scenario() {
        let broker = EventBroker::new(100);
        let mut s1 = broker.subscribe();

        let event = RegistryEvent::new("project_created", payload(json!({"id": 1})));
        let report = publish(&broker, &event);
        assert_eq!(report.delivered, 1);

        let Some(wire) = s1.recv().await else {
            panic!("s1 should receive the event");
        };
        assert_eq!(parse(&wire), json!({"type": "project_created", "payload": {"id": 1}}));

        assert!(broker.unsubscribe(s1.id()));
        let report = publish(&broker, &event);
        assert_eq!(report.delivered, 0);
        assert!(s1.try_recv().is_none());
    }

    #[tokio::test]
    async fn two_subscribers_receive_identical_copies() {
        let broker = EventBroker::new(100);
        let mut s1 = broker.subscribe();
        let mut s2 = broker.subscribe();

        let report = publish(&broker, &RegistryEvent::carbon_credit_issued(9, 1, 250.0));
        assert_eq!(report.delivered, 2);

        let (Some(a), Some(b)) = (s1.recv().await, s2.recv().await) else {
            panic!("both subscribers should receive");
        };
        assert_eq!(parse(&a), parse(&b));
        assert_eq!(parse(&a)["payload"]["amount"], 250.0);
    }

    #[test]
    fn full_queue_drops_only_for_that_subscriber() {
        let capacity = 4;
        let broker = EventBroker::new(capacity);
        let mut slow = broker.subscribe();
        let mut fast = broker.subscribe();

        let mut fast_seen = 0;
        let mut dropped = 0;
        for id in 0..=capacity as i64 {
            let report = publish(&broker, &RegistryEvent::project_created(id, "p"));
            dropped += report.dropped;
            while fast.try_recv().is_some() {
                fast_seen += 1;
            }
        }

        assert_eq!(fast_seen, capacity + 1);
        assert_eq!(dropped, 1);
        assert_eq!(broker.stats().dropped, 1);

        let mut slow_seen = 0;
        while slow.try_recv().is_some() {
            slow_seen += 1;
        }
        assert_eq!(slow_seen, capacity);
    }

    #[test]
    fn dropped_event_is_the_newest_one() {
        let broker = EventBroker::new(2);
        let mut sub = broker.subscribe();
        for id in 0..3 {
            publish(&broker, &RegistryEvent::project_created(id, "p"));
        }
        let ids: Vec<Value> = std::iter::from_fn(|| sub.try_recv())
            .map(|wire| parse(&wire)["payload"]["id"].clone())
            .collect();
        assert_eq!(ids, vec![json!(0), json!(1)]);
    }

    #[test]
    fn unsubscribe_absent_is_noop() {
        let broker = EventBroker::new(10);
        let mut other = broker.subscribe();
        let gone = broker.subscribe();
        let gone_id = gone.id();

        assert!(broker.unsubscribe(gone_id));
        assert!(!broker.unsubscribe(gone_id));
        assert!(!broker.unsubscribe(SubscriptionId::new()));
        drop(gone);

        assert_eq!(broker.subscriber_count(), 1);
        let report = publish(&broker, &RegistryEvent::project_created(1, "p"));
        assert_eq!(report.delivered, 1);
        assert!(other.try_recv().is_some());
    }

    #[test]
    fn subscriber_count_tracks_subscriptions() {
        let broker = EventBroker::new(10);
        assert_eq!(broker.subscriber_count(), 0);

        let s1 = broker.subscribe();
        let _s2 = broker.subscribe();
        assert_eq!(broker.subscriber_count(), 2);

        drop(s1);
        assert_eq!(broker.subscriber_count(), 1);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let broker = EventBroker::new(0);
        assert_eq!(broker.queue_capacity(), 1);
    }

    #[tokio::test]
    async fn shutdown_ends_streams_and_refuses_new_registrations() {
        let broker = EventBroker::new(10);
        let mut sub = broker.subscribe();
        publish(&broker, &RegistryEvent::project_created(1, "p"));

        broker.shutdown();
        assert!(broker.is_shut_down());
        assert_eq!(broker.subscriber_count(), 0);

        assert!(sub.recv().await.is_some());
        assert!(sub.recv().await.is_none());

        let mut late = broker.subscribe();
        assert_eq!(broker.subscriber_count(), 0);
        assert!(late.recv().await.is_none());
    }

    #[test]
    fn stats_accumulate() {
        let broker = EventBroker::new(1);
        let _s1 = broker.subscribe();
        let _s2 = broker.subscribe();

        publish(&broker, &RegistryEvent::project_created(1, "p"));
        publish(&broker, &RegistryEvent::project_created(2, "p"));

        let stats = broker.stats();
        assert_eq!(stats.subscribers, 2);
        assert_eq!(stats.published, 2);
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.dropped, 2);
    }
}
