//! One consumer's registration with the [`super::EventBroker`].
//!
//! A [`Subscription`] owns the receiving end of a bounded queue. Dropping it
//! unregisters it from the broker, so every exit path of a consumer loop
//! (normal end, client disconnect, panic unwinding) cleans up exactly once.

use std::sync::Weak;

use tokio::sync::mpsc;

use super::SubscriptionId;
use super::broker::BrokerInner;
use super::event::WireEvent;

/// Lifecycle of a subscription. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Registered; nothing dequeued yet.
    Created,
    /// The consumer has started dequeuing.
    Active,
    /// Unregistered or the broker closed the queue. Terminal.
    Closed,
}

/// Receiving side of a broker registration.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::Receiver<WireEvent>,
    broker: Weak<BrokerInner>,
    state: SubscriptionState,
    released: bool,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriptionId,
        receiver: mpsc::Receiver<WireEvent>,
        broker: Weak<BrokerInner>,
    ) -> Self {
        Self {
            id,
            receiver,
            broker,
            state: SubscriptionState::Created,
            released: false,
        }
    }

    /// Returns this subscription's identifier.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SubscriptionState {
        self.state
    }

    /// Number of events waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    /// Waits for the next event.
    ///
    /// Returns `None` once the subscription is closed, either locally via
    /// [`Subscription::close`] or because the broker dropped the
    /// registration and the queue is drained.
    pub async fn recv(&mut self) -> Option<WireEvent> {
        if self.state == SubscriptionState::Closed {
            return None;
        }
        self.state = SubscriptionState::Active;
        let next = self.receiver.recv().await;
        if next.is_none() {
            self.state = SubscriptionState::Closed;
        }
        next
    }

    /// Takes the next event if one is queued, without waiting.
    pub fn try_recv(&mut self) -> Option<WireEvent> {
        if self.state == SubscriptionState::Closed {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(wire) => {
                self.state = SubscriptionState::Active;
                Some(wire)
            }
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.state = SubscriptionState::Closed;
                None
            }
        }
    }

    /// Blocking variant of [`Subscription::recv`] for consumers running on
    /// plain OS threads.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous execution context, as
    /// [`mpsc::Receiver::blocking_recv`] does.
    pub fn blocking_recv(&mut self) -> Option<WireEvent> {
        if self.state == SubscriptionState::Closed {
            return None;
        }
        self.state = SubscriptionState::Active;
        let next = self.receiver.blocking_recv();
        if next.is_none() {
            self.state = SubscriptionState::Closed;
        }
        next
    }

    /// Unregisters from the broker and discards anything still queued.
    ///
    /// Idempotent; also run on drop.
    pub fn close(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Some(broker) = self.broker.upgrade() {
            broker.remove(self.id);
        }
        self.receiver.close();
        self.state = SubscriptionState::Closed;
        tracing::debug!(subscription_id = %self.id, "subscription closed");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.close();
    }
}
