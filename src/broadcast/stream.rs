//! Channel-backed subscriber.
//!
//! [`ChannelSubscriber`] forwards matching notifications into a bounded
//! crossbeam channel so they can be consumed on another thread through a
//! [`NotificationStream`]. Forwarding never blocks the notifying thread: a
//! full or disconnected channel drops the notification, counts it and reports
//! a subscriber fault.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use serde::{Deserialize, Serialize};

use crate::error::{BoxError, ExecutionError, MeteoError, MeteoResult};
use crate::event::{EventKind, EventPayload, EventSource};

use super::subscriber::Subscriber;

/// One forwarded notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Who broadcast it.
    pub source: EventSource,
    /// Event kind.
    pub kind: EventKind,
    /// Payload as delivered.
    pub payload: EventPayload,
    /// When the subscriber forwarded it.
    pub received_at: DateTime<Utc>,
}

/// Subscriber that forwards into a bounded channel.
#[derive(Debug)]
pub struct ChannelSubscriber {
    name: String,
    kinds: HashSet<EventKind>,
    tx: Sender<Notification>,
    dropped: AtomicU64,
}

impl ChannelSubscriber {
    /// Create a subscriber and the stream that drains it.
    ///
    /// An empty `kinds` set means "interested in every kind".
    #[must_use]
    pub fn channel(
        name: impl Into<String>,
        kinds: impl IntoIterator<Item = EventKind>,
        capacity: usize,
    ) -> (Arc<Self>, NotificationStream) {
        let (tx, rx) = bounded::<Notification>(capacity.max(1));
        let sub = Arc::new(Self {
            name: name.into(),
            kinds: kinds.into_iter().collect(),
            tx,
            dropped: AtomicU64::new(0),
        });
        (sub, NotificationStream { rx })
    }

    /// Notifications dropped because the channel was full or closed.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Subscriber for ChannelSubscriber {
    fn name(&self) -> &str {
        &self.name
    }

    fn interested(&self, kind: EventKind) -> bool {
        self.kinds.is_empty() || self.kinds.contains(&kind)
    }

    fn receive(&self, source: &EventSource, kind: EventKind, payload: &EventPayload) -> Result<(), BoxError> {
        let notification = Notification {
            source: source.clone(),
            kind,
            payload: payload.clone(),
            received_at: Utc::now(),
        };

        match self.tx.try_send(notification) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(format!("stream '{}' is full", self.name).into())
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                Err(format!("stream '{}' is disconnected", self.name).into())
            }
        }
    }
}

/// Receiving side of a [`ChannelSubscriber`].
#[derive(Debug)]
pub struct NotificationStream {
    rx: Receiver<Notification>,
}

impl NotificationStream {
    /// Receive the next notification (blocking).
    pub fn recv(&self) -> MeteoResult<Notification> {
        self.rx.recv().map_err(|_| disconnected())
    }

    /// Receive the next notification with a timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> MeteoResult<Notification> {
        self.rx.recv_timeout(timeout).map_err(|err| match err {
            RecvTimeoutError::Timeout => MeteoError::Execution(ExecutionError::Timeout {
                duration_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
            RecvTimeoutError::Disconnected => disconnected(),
        })
    }

    /// Drain whatever is buffered right now without blocking.
    pub fn try_iter(&self) -> impl Iterator<Item = Notification> + '_ {
        self.rx.try_iter()
    }

    /// Number of buffered notifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Returns true if nothing is buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

fn disconnected() -> MeteoError {
    MeteoError::Execution(ExecutionError::Disconnected {
        path: "notification_stream".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::SubscriberRegistry;

    #[test]
    fn forwards_only_selected_kinds() {
        let registry = SubscriberRegistry::new(EventSource::new("station"));
        let (sub, stream) = ChannelSubscriber::channel("temps", [EventKind::TemperatureChanged], 8);
        registry.register(sub.clone());

        registry.notify_all(EventKind::TemperatureChanged, &EventPayload::Scalar(12.0)).unwrap();
        registry.notify_all(EventKind::PressureChanged, &EventPayload::Scalar(990.0)).unwrap();

        let got = stream.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(got.kind, EventKind::TemperatureChanged);
        assert_eq!(got.payload.as_scalar(), Some(12.0));
        assert_eq!(got.source.name, "station");
        assert!(stream.is_empty());
    }

    #[test]
    fn full_channel_drops_and_counts() {
        let registry = SubscriberRegistry::new(EventSource::new("station"));
        let (sub, stream) = ChannelSubscriber::channel("tiny", [], 1);
        registry.register(sub.clone());

        for v in [1.0, 2.0, 3.0] {
            registry.notify_all(EventKind::HumidityChanged, &EventPayload::Scalar(v)).unwrap();
        }

        assert_eq!(sub.dropped(), 2);
        let buffered: Vec<_> = stream.try_iter().collect();
        assert_eq!(buffered.len(), 1);
        assert_eq!(buffered[0].payload.as_scalar(), Some(1.0));
    }

    #[test]
    fn recv_timeout_reports_timeout() {
        let (_sub, stream) = ChannelSubscriber::channel("idle", [], 4);
        let err = stream.recv_timeout(Duration::from_millis(5)).unwrap_err();
        assert!(matches!(err, MeteoError::Execution(ExecutionError::Timeout { duration_ms: 5 })));
    }

    #[test]
    fn dropping_subscriber_disconnects_stream() {
        let (sub, stream) = ChannelSubscriber::channel("gone", [], 4);
        drop(sub);
        assert!(matches!(
            stream.recv().unwrap_err(),
            MeteoError::Execution(ExecutionError::Disconnected { .. })
        ));
    }
}
