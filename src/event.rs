//! Event vocabulary shared by producers and subscribers.
//!
//! [`EventKind`] is the closed set of notifications the core emits. Each kind
//! has exactly one [`EventPayload`] shape; [`EventKind::accepts`] enforces the
//! pairing before anything is broadcast.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::sample::{Condition, ExtremeAlert, Field, MeasurementSample};

/// Unique identifier for a notification source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(Uuid);

impl SourceId {
    /// Create a new random source id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of whoever is broadcasting, as seen by subscribers.
///
/// Subscribers get this and nothing else about the producer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventSource {
    /// Random per-source id.
    pub id: SourceId,
    /// Display name, e.g. the producer's location.
    pub name: String,
}

impl EventSource {
    /// Source named `name` with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SourceId::new(),
            name: name.into(),
        }
    }
}

/// Closed vocabulary of notification kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Temperature moved by more than its threshold. Payload: scalar.
    TemperatureChanged,
    /// Humidity moved by more than its threshold. Payload: scalar.
    HumidityChanged,
    /// Pressure moved by more than its threshold. Payload: scalar.
    PressureChanged,
    /// Derived condition label changed. Payload: condition.
    WeatherChanged,
    /// Unconditional per-update heartbeat. Payload: full sample.
    MeasurementsChanged,
    /// One or more extremity predicates fired. Payload: alert.
    ExtremeWeather,
}

impl EventKind {
    /// Every kind, in a stable order.
    pub const ALL: [Self; 6] = [
        Self::TemperatureChanged,
        Self::HumidityChanged,
        Self::PressureChanged,
        Self::WeatherChanged,
        Self::MeasurementsChanged,
        Self::ExtremeWeather,
    ];

    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TemperatureChanged => "TEMPERATURE_CHANGED",
            Self::HumidityChanged => "HUMIDITY_CHANGED",
            Self::PressureChanged => "PRESSURE_CHANGED",
            Self::WeatherChanged => "WEATHER_CHANGED",
            Self::MeasurementsChanged => "MEASUREMENTS_CHANGED",
            Self::ExtremeWeather => "EXTREME_WEATHER",
        }
    }

    /// The dedicated "changed" kind for a field.
    #[must_use]
    pub const fn field_changed(field: Field) -> Self {
        match field {
            Field::Temperature => Self::TemperatureChanged,
            Field::Humidity => Self::HumidityChanged,
            Field::Pressure => Self::PressureChanged,
        }
    }

    /// Returns true if `payload` has the shape this kind carries.
    #[must_use]
    pub fn accepts(self, payload: &EventPayload) -> bool {
        matches!(
            (self, payload),
            (
                Self::TemperatureChanged | Self::HumidityChanged | Self::PressureChanged,
                EventPayload::Scalar(_)
            ) | (Self::WeatherChanged, EventPayload::Condition(_))
                | (Self::MeasurementsChanged, EventPayload::Measurements(_))
                | (Self::ExtremeWeather, EventPayload::Alert(_))
        )
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyEventKind);
        }
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| ValidationError::UnknownEventKind { name: name.to_string() })
    }
}

/// Payload delivered alongside an [`EventKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum EventPayload {
    /// New value of a single field.
    Scalar(f64),
    /// New condition label.
    Condition(Condition),
    /// Full snapshot.
    Measurements(MeasurementSample),
    /// Aggregated extreme-condition alert.
    Alert(ExtremeAlert),
}

impl EventPayload {
    /// Short name of the payload shape, for diagnostics.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            Self::Condition(_) => "condition",
            Self::Measurements(_) => "measurements",
            Self::Alert(_) => "alert",
        }
    }

    /// The scalar value, if this is a scalar payload.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// The label, if this is a condition payload.
    #[must_use]
    pub const fn as_condition(&self) -> Option<Condition> {
        match self {
            Self::Condition(c) => Some(*c),
            _ => None,
        }
    }

    /// The snapshot, if this is a measurements payload.
    #[must_use]
    pub const fn as_sample(&self) -> Option<&MeasurementSample> {
        match self {
            Self::Measurements(s) => Some(s),
            _ => None,
        }
    }

    /// The alert, if this is an alert payload.
    #[must_use]
    pub const fn as_alert(&self) -> Option<&ExtremeAlert> {
        match self {
            Self::Alert(a) => Some(a),
            _ => None,
        }
    }
}

/// Reject a kind/payload pair that does not belong together.
pub(crate) fn check_pairing(kind: EventKind, payload: &EventPayload) -> Result<(), ValidationError> {
    if kind.accepts(payload) {
        Ok(())
    } else {
        Err(ValidationError::PayloadMismatch {
            kind,
            payload: payload.shape(),
        })
    }
}
