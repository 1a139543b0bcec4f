//! Per-connection consumer loop.
//!
//! Turns a [`Subscription`] into the SSE frame stream of one client. The
//! stream owns the subscription: when Axum drops the response body (the
//! client went away and a write failed) or the stream ends on its own, the
//! subscription is dropped and unregisters itself from the broker.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::Event;
use futures_util::stream::{self, Stream};

use super::messages::{HELLO_EVENT, StreamGreeting};
use crate::config::StreamSettings;
use crate::domain::{Subscription, WireEvent};

/// Builds the frame stream for one connection.
///
/// Yields an optional `hello` frame, then one unnamed frame per broker
/// event in queue order. Ends when the broker closes the queue or the idle
/// timeout elapses.
pub fn event_stream(
    subscription: Subscription,
    settings: StreamSettings,
) -> impl Stream<Item = Result<Event, Infallible>> + Send + 'static {
    let greeting = if settings.hello {
        hello_frame(&subscription)
    } else {
        None
    };
    let consumer = Consumer {
        subscription,
        greeting,
        idle_timeout: settings.idle_timeout,
        forwarded: 0,
    };
    stream::unfold(consumer, Consumer::next_frame)
}

/// Builds the greeting frame, or `None` (logged) if it cannot be encoded.
fn hello_frame(subscription: &Subscription) -> Option<Event> {
    let greeting = StreamGreeting::connected(subscription.id());
    match serde_json::to_string(&greeting) {
        Ok(data) => Some(Event::default().event(HELLO_EVENT).data(data)),
        Err(err) => {
            tracing::warn!(
                subscription_id = %subscription.id(),
                error = %err,
                "hello frame not encodable, skipping"
            );
            None
        }
    }
}

#[derive(Debug)]
struct Consumer {
    subscription: Subscription,
    greeting: Option<Event>,
    idle_timeout: Option<Duration>,
    forwarded: u64,
}

impl Consumer {
    async fn next_frame(mut self) -> Option<(Result<Event, Infallible>, Self)> {
        if let Some(hello) = self.greeting.take() {
            return Some((Ok(hello), self));
        }
        let wire = self.next_event().await?;
        self.forwarded += 1;
        Some((Ok(Event::default().data(&*wire)), self))
    }

    async fn next_event(&mut self) -> Option<WireEvent> {
        let Some(limit) = self.idle_timeout else {
            return self.subscription.recv().await;
        };
        match tokio::time::timeout(limit, self.subscription.recv()).await {
            Ok(next) => next,
            Err(_) => {
                tracing::info!(
                    subscription_id = %self.subscription.id(),
                    idle_secs = limit.as_secs_f64(),
                    "event stream idle, closing"
                );
                None
            }
        }
    }
}

impl Drop for Consumer {
    fn drop(&mut self) {
        tracing::debug!(
            subscription_id = %self.subscription.id(),
            forwarded = self.forwarded,
            "event stream closed"
        );
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use futures_util::StreamExt;

    use super::*;
    use crate::domain::{EventBroker, PublishReport, RegistryEvent};

    fn publish(broker: &EventBroker, event: &RegistryEvent) -> PublishReport {
        let Ok(report) = broker.publish(event) else {
            panic!("event failed to encode");
        };
        report
    }

    fn settings(hello: bool, idle_timeout: Option<Duration>) -> StreamSettings {
        StreamSettings {
            keep_alive: Duration::from_secs(15),
            idle_timeout,
            hello,
        }
    }

    #[tokio::test]
    async fn yields_hello_then_events_until_shutdown() {
        let broker = EventBroker::new(10);
        let frames = event_stream(broker.subscribe(), settings(true, None));

        publish(&broker, &RegistryEvent::project_created(1, "p"));
        publish(&broker, &RegistryEvent::project_created(2, "p"));
        broker.shutdown();

        let frames: Vec<_> = frames.collect().await;
        assert_eq!(frames.len(), 3);
    }

    #[test]
    fn hello_frame_is_built_for_open_subscription() {
        let broker = EventBroker::new(10);
        let subscription = broker.subscribe();
        assert!(hello_frame(&subscription).is_some());
        assert_eq!(broker.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn hello_can_be_disabled() {
        let broker = EventBroker::new(10);
        let frames = event_stream(broker.subscribe(), settings(false, None));
        broker.shutdown();

        let frames: Vec<_> = frames.collect().await;
        assert!(frames.is_empty());
    }

    #[tokio::test]
    async fn dropping_stream_unsubscribes() {
        let broker = EventBroker::new(10);
        let mut frames = Box::pin(event_stream(broker.subscribe(), settings(true, None)));
        assert_eq!(broker.subscriber_count(), 1);

        assert!(frames.next().await.is_some());
        drop(frames);

        assert_eq!(broker.subscriber_count(), 0);
        let report = publish(&broker, &RegistryEvent::project_created(1, "p"));
        assert_eq!(report.delivered, 0);
    }

    #[tokio::test]
    async fn idle_timeout_ends_stream() {
        let broker = EventBroker::new(10);
        let mut frames = Box::pin(event_stream(
            broker.subscribe(),
            settings(false, Some(Duration::from_millis(20))),
        ));

        let ended = tokio::time::timeout(Duration::from_secs(5), frames.next()).await;
        let Ok(next) = ended else {
            panic!("idle stream did not end");
        };
        assert!(next.is_none());

        drop(frames);
        assert_eq!(broker.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn traffic_resets_idle_timeout() {
        let broker = EventBroker::new(10);
        let mut frames = Box::pin(event_stream(
            broker.subscribe(),
            settings(false, Some(Duration::from_millis(200))),
        ));

        publish(&broker, &RegistryEvent::project_created(1, "p"));
        let Ok(Some(_)) = tokio::time::timeout(Duration::from_secs(5), frames.next()).await else {
            panic!("expected the published event");
        };
        assert_eq!(broker.subscriber_count(), 1);
    }
}
