//! Broadcast core: subscriber capability, registry and built-in subscribers.
//!
//! ```text
//!   producer ── notify_all(kind, payload) ──► SubscriberRegistry
//!                                                 │ snapshot (Arc<Vec<_>>)
//!                                   ┌─────────────┼─────────────┐
//!                                   ▼             ▼             ▼
//!                               interested?   interested?   interested?
//!                                   │             │             │
//!                               receive()     receive()     receive()
//!                                   └── fault ──► RegistryHooks::on_subscriber_error
//! ```

/// Registry extension points.
pub mod hooks;
/// Notification logger.
pub mod log;
/// Subscriber set and fan-out.
pub mod registry;
/// Channel-backed subscriber.
pub mod stream;
/// Subscriber trait.
pub mod subscriber;

pub use hooks::{DefaultHooks, RegistryHooks};
pub use log::LogSubscriber;
pub use registry::SubscriberRegistry;
pub use stream::{ChannelSubscriber, Notification, NotificationStream};
pub use subscriber::Subscriber;
