//! Subscriber registry and synchronous fan-out.
//!
//! The live set is an `Arc<Vec<_>>` behind an `RwLock`. Mutations copy the
//! vector, edit the copy and swap it in under the write lock; a notification
//! pass clones the `Arc` under a short read lock and iterates that snapshot
//! with no lock held. Consequences:
//! - `register`, `unregister` and `clear` are mutually exclusive.
//! - A pass never observes a partial add/remove, and a subscriber that
//!   unregisters itself mid-pass still completes the current pass.
//! - Concurrent passes may interleave their callbacks.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use crate::error::{recover, MeteoResult, SubscriberFault};
use crate::event::{check_pairing, EventKind, EventPayload, EventSource};

use super::hooks::{DefaultHooks, RegistryHooks};
use super::subscriber::Subscriber;

type Snapshot = Arc<Vec<Arc<dyn Subscriber>>>;

fn same_instance<S: Subscriber + ?Sized>(a: &Arc<dyn Subscriber>, b: &Arc<S>) -> bool {
    Arc::as_ptr(a).cast::<()>() == Arc::as_ptr(b).cast::<()>()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Thread-safe set of subscribers with isolated, snapshot-based notification.
pub struct SubscriberRegistry {
    source: EventSource,
    subscribers: RwLock<Snapshot>,
    hooks: Arc<dyn RegistryHooks>,
}

impl fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("source", &self.source)
            .field("subscribers", &self.subscriber_names())
            .finish_non_exhaustive()
    }
}

impl SubscriberRegistry {
    /// Empty registry with [`DefaultHooks`].
    #[must_use]
    pub fn new(source: EventSource) -> Self {
        Self::with_hooks(source, Arc::new(DefaultHooks))
    }

    /// Empty registry with custom hooks.
    #[must_use]
    pub fn with_hooks(source: EventSource, hooks: Arc<dyn RegistryHooks>) -> Self {
        Self {
            source,
            subscribers: RwLock::new(Arc::new(Vec::new())),
            hooks,
        }
    }

    /// Identity passed to every `receive` call.
    #[must_use]
    pub const fn source(&self) -> &EventSource {
        &self.source
    }

    fn current(&self) -> Snapshot {
        let guard = recover(self.subscribers.read());
        Arc::clone(&guard)
    }

    /// Add `subscriber`. Returns false, without mutation, if this instance is
    /// already registered.
    ///
    /// On success the `on_registered` hook runs before this returns.
    pub fn register(&self, subscriber: Arc<dyn Subscriber>) -> bool {
        {
            let mut guard = recover(self.subscribers.write());
            if guard.iter().any(|s| same_instance(s, &subscriber)) {
                tracing::debug!(subscriber = subscriber.name(), "subscriber already registered");
                return false;
            }
            let mut next = Vec::with_capacity(guard.len() + 1);
            next.extend(guard.iter().cloned());
            next.push(Arc::clone(&subscriber));
            *guard = Arc::new(next);
        }

        tracing::debug!(subscriber = subscriber.name(), source = %self.source.name, "subscriber registered");
        self.hooks.on_registered(self, &subscriber);
        true
    }

    /// Remove `subscriber`. Returns true iff a live registration was removed.
    pub fn unregister<S: Subscriber + ?Sized>(&self, subscriber: &Arc<S>) -> bool {
        let removed = {
            let mut guard = recover(self.subscribers.write());
            let Some(idx) = guard.iter().position(|s| same_instance(s, subscriber)) else {
                tracing::debug!(subscriber = subscriber.name(), "subscriber not found");
                return false;
            };
            let mut next: Vec<Arc<dyn Subscriber>> = guard.iter().cloned().collect();
            let removed = next.remove(idx);
            *guard = Arc::new(next);
            removed
        };

        tracing::debug!(subscriber = removed.name(), source = %self.source.name, "subscriber removed");
        self.hooks.on_unregistered(self, &removed);
        true
    }

    /// Remove every subscriber. Passes already in flight finish on their old
    /// snapshot. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let removed = {
            let mut guard = recover(self.subscribers.write());
            std::mem::replace(&mut *guard, Arc::new(Vec::new())).len()
        };
        tracing::debug!(removed, source = %self.source.name, "subscribers cleared");
        removed
    }

    /// Returns true if this exact instance is registered.
    #[must_use]
    pub fn contains<S: Subscriber + ?Sized>(&self, subscriber: &Arc<S>) -> bool {
        self.current().iter().any(|s| same_instance(s, subscriber))
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn count(&self) -> usize {
        self.current().len()
    }

    /// Returns true if at least one subscriber is registered.
    #[must_use]
    pub fn has_subscribers(&self) -> bool {
        self.count() > 0
    }

    /// Names of registered subscribers in registration order.
    #[must_use]
    pub fn subscriber_names(&self) -> Vec<String> {
        self.current().iter().map(|s| s.name().to_string()).collect()
    }

    /// Deliver one notification to every interested subscriber in the current
    /// snapshot, in registration order.
    ///
    /// Returns an error only if `payload` is not the shape `kind` carries; in
    /// that case nothing is delivered. Subscriber faults are reported through
    /// the error hook and never surface here.
    pub fn notify_all(&self, kind: EventKind, payload: &EventPayload) -> MeteoResult<()> {
        check_pairing(kind, payload)?;

        let snapshot = self.current();
        if snapshot.is_empty() {
            tracing::trace!(%kind, "no subscribers to notify");
            return Ok(());
        }

        tracing::trace!(%kind, subscribers = snapshot.len(), "notifying subscribers");
        for subscriber in snapshot.iter() {
            self.deliver(subscriber, kind, payload);
        }
        Ok(())
    }

    /// Deliver one notification to a single subscriber with the same fault
    /// isolation as [`Self::notify_all`]. Returns true if `receive` ran and
    /// succeeded.
    ///
    /// Intended for hooks that push state to a newly registered subscriber.
    pub fn notify_one(&self, subscriber: &Arc<dyn Subscriber>, kind: EventKind, payload: &EventPayload) -> MeteoResult<bool> {
        check_pairing(kind, payload)?;
        Ok(self.deliver(subscriber, kind, payload))
    }

    fn deliver(&self, subscriber: &Arc<dyn Subscriber>, kind: EventKind, payload: &EventPayload) -> bool {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            if subscriber.interested(kind) {
                subscriber.receive(&self.source, kind, payload).map(|()| true)
            } else {
                Ok(false)
            }
        }));

        let fault = match outcome {
            Ok(Ok(delivered)) => return delivered,
            Ok(Err(err)) => SubscriberFault::Failed {
                subscriber: subscriber.name().to_string(),
                kind,
                message: err.to_string(),
            },
            Err(panic_payload) => SubscriberFault::Panicked {
                subscriber: subscriber.name().to_string(),
                kind,
                message: panic_message(panic_payload.as_ref()),
            },
        };

        self.hooks.on_subscriber_error(subscriber, &fault);
        false
    }
}
