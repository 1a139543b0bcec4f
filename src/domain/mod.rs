//! Domain layer: registry events and the publish/subscribe broker.
//!
//! This module contains the event model shared by producers and the
//! stream endpoint, the subscription identifier, the broker that fans
//! events out to subscribers, and the per-consumer subscription handle.

pub mod broker;
pub mod event;
pub mod subscription;
pub mod subscription_id;

pub use broker::{BrokerStats, EventBroker, PublishReport};
pub use event::{EventKind, RegistryEvent, WireEvent};
pub use subscription::{Subscription, SubscriptionState};
pub use subscription_id::SubscriptionId;
