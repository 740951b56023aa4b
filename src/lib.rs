//! # meteocast - thread-safe measurement broadcast core
//!
//! meteocast pairs a publish/subscribe registry with a stateful weather
//! producer. The producer turns raw measurement vectors into derived events
//! (threshold crossings, condition changes, extreme-weather alerts) and fans
//! them out to subscribers synchronously, with every subscriber isolated from
//! the failures of the others.
//!
//! ## Core Concepts
//!
//! - **Subscriber**: declares interest in event kinds and receives notifications
//! - **SubscriberRegistry**: the live subscriber set; snapshot-per-pass fan-out
//! - **MeasurementProducer**: owns the current measurements and derives events
//! - **EventKind / EventPayload**: the closed vocabulary and its payload shapes
//!
//! ## Usage
//!
//! ```rust
//! use meteocast::{ChannelSubscriber, EventKind, MeasurementProducer, Measurements};
//!
//! let station = MeasurementProducer::for_location("Harbor")?;
//! let (alerts, stream) = ChannelSubscriber::channel("alerts", [EventKind::ExtremeWeather], 16);
//! station.register(alerts);
//!
//! station.update_measurements(Measurements::new(45.0, 60.0, 970.0))?;
//!
//! let alert = stream.recv()?;
//! assert_eq!(alert.kind, EventKind::ExtremeWeather);
//! # Ok::<(), meteocast::MeteoError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod broadcast;
pub mod config;
pub mod error;
pub mod event;
pub mod producer;
pub mod sample;

// Re-export primary types at crate root for convenience
pub use broadcast::{
    ChannelSubscriber, DefaultHooks, LogSubscriber, Notification, NotificationStream, RegistryHooks, Subscriber,
    SubscriberRegistry,
};
pub use config::{ConditionRules, ExtremeLimits, FieldThresholds, ProducerConfig};
pub use error::{BoxError, ExecutionError, MeteoError, MeteoResult, SubscriberFault, ValidationError};
pub use event::{EventKind, EventPayload, EventSource, SourceId};
pub use producer::{ConditionChange, MeasurementProducer, UpdateOutcome};
pub use sample::{Condition, ExtremeAlert, ExtremeKind, Field, MeasurementSample, Measurements, TriggeredPredicate};
