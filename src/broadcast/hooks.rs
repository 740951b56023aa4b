//! Registry extension points.

use std::sync::Arc;

use crate::error::SubscriberFault;

use super::registry::SubscriberRegistry;
use super::subscriber::Subscriber;

/// Hooks invoked by a [`SubscriberRegistry`] around membership changes and
/// subscriber faults.
///
/// Hooks run on the caller's thread after the registry's internal lock has
/// been released, so they may call back into the registry.
pub trait RegistryHooks: Send + Sync {
    /// Called after `subscriber` was added.
    fn on_registered(&self, registry: &SubscriberRegistry, subscriber: &Arc<dyn Subscriber>) {
        let _ = (registry, subscriber);
    }

    /// Called after `subscriber` was removed by `unregister`.
    fn on_unregistered(&self, registry: &SubscriberRegistry, subscriber: &Arc<dyn Subscriber>) {
        let _ = (registry, subscriber);
    }

    /// Called once per contained subscriber fault.
    ///
    /// Default: log at `warn`.
    fn on_subscriber_error(&self, subscriber: &Arc<dyn Subscriber>, fault: &SubscriberFault) {
        tracing::warn!(
            subscriber = subscriber.name(),
            kind = %fault.kind(),
            panicked = fault.is_panic(),
            "subscriber fault: {fault}"
        );
    }
}

/// No-op membership hooks with the default logging error hook.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHooks;

impl RegistryHooks for DefaultHooks {}
