//! Measurement producer.
//!
//! [`MeasurementProducer`] owns the current measurement state and derives
//! events from each update:
//!
//! ```text
//! update_measurements(next)
//!   ├─► lock state: diff vs stored (per-field threshold, strict >)
//!   │               store next, reclassify condition, capture sample
//!   ├─► WEATHER_CHANGED(condition)        if the label changed
//!   ├─► <FIELD>_CHANGED(value)            per changed field, Field::ALL order
//!   ├─► MEASUREMENTS_CHANGED(sample)      always
//!   └─► EXTREME_WEATHER(alert)            if any extremity predicate fired
//! ```
//!
//! The state lock covers only the diff/store/classify step. Notifications are
//! sent after it is released, so subscribers may call back into the producer.
//! Callers that need label transitions strictly ordered across threads should
//! serialize their own calls to `update_measurements`.
//!
//! Registration through [`MeasurementProducer::register`] is fenced against
//! in-flight updates: the new subscriber's initial `MEASUREMENTS_CHANGED`
//! push always arrives before any broadcast from a later update.

/// Extremity predicate evaluation.
pub mod alerts;
mod gate;
/// Producer state and transitions.
pub mod state;

use std::sync::{Arc, Mutex};

use gate::DeliveryGate;

use crate::broadcast::{DefaultHooks, RegistryHooks, Subscriber, SubscriberRegistry};
use crate::config::ProducerConfig;
use crate::error::{recover, MeteoResult, SubscriberFault, ValidationError};
use crate::event::{EventKind, EventPayload, EventSource};
use crate::sample::{Condition, ExtremeAlert, Field, MeasurementSample, Measurements};

pub use state::{ConditionChange, ProducerState, Transition};

/// Result of one `update_measurements` call.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    /// Fields whose change exceeded their threshold.
    pub changed: Vec<Field>,
    /// Condition label transition, if any.
    pub condition: Option<ConditionChange>,
    /// The heartbeat snapshot that was broadcast.
    pub sample: MeasurementSample,
    /// The alert that was broadcast, if any.
    pub alert: Option<ExtremeAlert>,
    /// Number of `notify_all` passes performed.
    pub notifications: usize,
}

#[derive(Debug)]
struct SharedState {
    location: String,
    state: Mutex<ProducerState>,
}

impl SharedState {
    fn snapshot(&self) -> MeasurementSample {
        let state = recover(self.state.lock());
        MeasurementSample::capture(state.values(), state.condition(), self.location.as_str())
    }
}

/// Pushes the current snapshot to each newly registered subscriber, then
/// defers to the caller's hooks.
struct ProducerHooks {
    shared: Arc<SharedState>,
    inner: Arc<dyn RegistryHooks>,
}

impl RegistryHooks for ProducerHooks {
    fn on_registered(&self, registry: &SubscriberRegistry, subscriber: &Arc<dyn Subscriber>) {
        let payload = EventPayload::Measurements(self.shared.snapshot());
        if let Err(err) = registry.notify_one(subscriber, EventKind::MeasurementsChanged, &payload) {
            tracing::error!(subscriber = subscriber.name(), "initial push rejected: {err}");
        }
        self.inner.on_registered(registry, subscriber);
    }

    fn on_unregistered(&self, registry: &SubscriberRegistry, subscriber: &Arc<dyn Subscriber>) {
        self.inner.on_unregistered(registry, subscriber);
    }

    fn on_subscriber_error(&self, subscriber: &Arc<dyn Subscriber>, fault: &SubscriberFault) {
        self.inner.on_subscriber_error(subscriber, fault);
    }
}

/// Stateful weather producer built on a [`SubscriberRegistry`].
#[derive(Debug)]
pub struct MeasurementProducer {
    config: ProducerConfig,
    shared: Arc<SharedState>,
    registry: SubscriberRegistry,
    gate: DeliveryGate,
}

impl MeasurementProducer {
    /// Create a producer with default registry hooks.
    pub fn new(config: ProducerConfig) -> MeteoResult<Self> {
        Self::with_hooks(config, Arc::new(DefaultHooks))
    }

    /// Create a producer whose registry reports membership changes and
    /// subscriber faults to `hooks`.
    pub fn with_hooks(config: ProducerConfig, hooks: Arc<dyn RegistryHooks>) -> MeteoResult<Self> {
        config.validate()?;

        let shared = Arc::new(SharedState {
            location: config.location.clone(),
            state: Mutex::new(ProducerState::new(config.initial)),
        });
        let registry = SubscriberRegistry::with_hooks(
            EventSource::new(config.location.clone()),
            Arc::new(ProducerHooks {
                shared: Arc::clone(&shared),
                inner: hooks,
            }),
        );

        Ok(Self {
            config,
            shared,
            registry,
            gate: DeliveryGate::default(),
        })
    }

    /// Producer for `location` with default thresholds and limits.
    pub fn for_location(location: impl Into<String>) -> MeteoResult<Self> {
        Self::new(ProducerConfig::for_location(location))
    }

    /// The validated configuration.
    #[must_use]
    pub const fn config(&self) -> &ProducerConfig {
        &self.config
    }

    /// Location stamped on every sample.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.shared.location
    }

    /// The underlying registry.
    ///
    /// Subscribers registered directly on it still get the initial push, but
    /// without the ordering fence [`Self::register`] provides.
    #[must_use]
    pub const fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    /// Register a subscriber. A newly registered subscriber immediately
    /// receives `MEASUREMENTS_CHANGED` with the current snapshot.
    ///
    /// Waits for updates already broadcasting to finish, so that push is the
    /// first thing the subscriber sees from this producer.
    pub fn register(&self, subscriber: Arc<dyn Subscriber>) -> bool {
        let _fence = self.gate.exclusive();
        self.registry.register(subscriber)
    }

    /// Remove a subscriber by instance identity.
    pub fn unregister<S: Subscriber + ?Sized>(&self, subscriber: &Arc<S>) -> bool {
        self.registry.unregister(subscriber)
    }

    /// Remove every subscriber; returns how many were removed.
    pub fn clear_subscribers(&self) -> usize {
        self.registry.clear()
    }

    /// Number of registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.count()
    }

    /// Current snapshot. Sends nothing.
    #[must_use]
    pub fn current_snapshot(&self) -> MeasurementSample {
        self.shared.snapshot()
    }

    /// Current condition label.
    #[must_use]
    pub fn condition(&self) -> Condition {
        recover(self.shared.state.lock()).condition()
    }

    /// Push a full measurement vector.
    ///
    /// Non-finite input is rejected before the state is touched.
    pub fn update_measurements(&self, values: Measurements) -> MeteoResult<UpdateOutcome> {
        values.validate()?;
        self.apply(|_| values)
    }

    /// Push a partial update by field name. Unnamed fields keep their stored
    /// value; a repeated name takes its last value.
    ///
    /// Unknown names and non-finite values are rejected before the state is
    /// touched.
    pub fn update_fields<I, K>(&self, fields: I) -> MeteoResult<UpdateOutcome>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for (name, value) in fields {
            let field: Field = name.as_ref().parse()?;
            if !value.is_finite() {
                return Err(ValidationError::NonFiniteMeasurement {
                    field: field.as_str().to_string(),
                    value,
                }
                .into());
            }
            parsed.push((field, value));
        }

        self.apply(|mut current| {
            for (field, value) in parsed {
                current.set(field, value);
            }
            current
        })
    }

    fn apply(&self, next: impl FnOnce(Measurements) -> Measurements) -> MeteoResult<UpdateOutcome> {
        let _fence = self.gate.shared();
        let (transition, sample) = {
            let mut state = recover(self.shared.state.lock());
            let values = next(state.values());
            let transition = state.apply(values, &self.config.thresholds, &self.config.condition_rules);
            let sample = MeasurementSample::capture(state.values(), state.condition(), self.shared.location.as_str());
            (transition, sample)
        };

        let mut notifications = 0;

        if let Some(change) = transition.condition {
            tracing::debug!(location = %sample.location, from = %change.from, to = %change.to, "condition changed");
            self.registry
                .notify_all(EventKind::WeatherChanged, &EventPayload::Condition(change.to))?;
            notifications += 1;
        }

        for &field in &transition.changed {
            self.registry.notify_all(
                EventKind::field_changed(field),
                &EventPayload::Scalar(sample.measurements().get(field)),
            )?;
            notifications += 1;
        }

        self.registry
            .notify_all(EventKind::MeasurementsChanged, &EventPayload::Measurements(sample.clone()))?;
        notifications += 1;

        let triggered = alerts::evaluate(&sample.measurements(), &self.config.extreme_limits);
        let alert = ExtremeAlert::from_triggered(sample.clone(), triggered);
        if let Some(alert) = &alert {
            tracing::info!(location = %sample.location, "{}", alert.message);
            self.registry
                .notify_all(EventKind::ExtremeWeather, &EventPayload::Alert(alert.clone()))?;
            notifications += 1;
        }

        Ok(UpdateOutcome {
            changed: transition.changed,
            condition: transition.condition,
            sample,
            alert,
            notifications,
        })
    }
}
