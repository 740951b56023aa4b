//! Measurement values, snapshots, condition labels and alerts.
//!
//! Everything in this module is plain data. Samples and alerts are
//! immutable once constructed and serializable so subscribers may forward
//! them as JSON.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A tracked measurement field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Air temperature in degrees Celsius.
    Temperature,
    /// Relative humidity in percent.
    Humidity,
    /// Barometric pressure in hPa.
    Pressure,
}

impl Field {
    /// All tracked fields in notification order.
    pub const ALL: [Self; 3] = [Self::Temperature, Self::Humidity, Self::Pressure];

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Pressure => "pressure",
        }
    }

    /// Display unit.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Temperature => "°C",
            Self::Humidity => "%",
            Self::Pressure => "hPa",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == key)
            .ok_or_else(|| ValidationError::UnknownField { name: s.to_string() })
    }
}

/// The measurement vector: one value per tracked field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Barometric pressure, hPa.
    pub pressure: f64,
}

impl Measurements {
    /// Standard atmospheric pressure in hPa.
    pub const STANDARD_PRESSURE: f64 = 1013.25;

    /// Measurement vector from its three components.
    #[must_use]
    pub const fn new(temperature: f64, humidity: f64, pressure: f64) -> Self {
        Self {
            temperature,
            humidity,
            pressure,
        }
    }

    /// Value of one field.
    #[must_use]
    pub const fn get(&self, field: Field) -> f64 {
        match field {
            Field::Temperature => self.temperature,
            Field::Humidity => self.humidity,
            Field::Pressure => self.pressure,
        }
    }

    /// Overwrite one field.
    pub fn set(&mut self, field: Field, value: f64) {
        match field {
            Field::Temperature => self.temperature = value,
            Field::Humidity => self.humidity = value,
            Field::Pressure => self.pressure = value,
        }
    }

    /// Reject any non-finite component.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for field in Field::ALL {
            let value = self.get(field);
            if !value.is_finite() {
                return Err(ValidationError::NonFiniteMeasurement {
                    field: field.as_str().to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

impl Default for Measurements {
    fn default() -> Self {
        Self::new(0.0, 0.0, Self::STANDARD_PRESSURE)
    }
}

/// Categorical weather condition derived from the current measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Condition {
    /// No measurement has been classified yet.
    #[default]
    Unknown,
    /// Temperature above the hot limit.
    Hot,
    /// Temperature below the freezing limit.
    Freezing,
    /// High humidity on a warm day.
    Humid,
    /// Low humidity.
    Dry,
    /// Low pressure.
    Stormy,
    /// High pressure.
    Clear,
    /// None of the other rules matched.
    Mild,
}

impl Condition {
    /// Label name, e.g. `"Stormy"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::Hot => "Hot",
            Self::Freezing => "Freezing",
            Self::Humid => "Humid",
            Self::Dry => "Dry",
            Self::Stormy => "Stormy",
            Self::Clear => "Clear",
            Self::Mild => "Mild",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable point-in-time snapshot of the producer's measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSample {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Barometric pressure, hPa.
    pub pressure: f64,
    /// Condition label at capture time.
    pub condition: Condition,
    /// Producer location.
    pub location: String,
    /// When the sample was captured.
    pub timestamp: DateTime<Utc>,
}

impl MeasurementSample {
    /// Build a sample stamped with the current time.
    #[must_use]
    pub fn capture(values: Measurements, condition: Condition, location: impl Into<String>) -> Self {
        Self {
            temperature: values.temperature,
            humidity: values.humidity,
            pressure: values.pressure,
            condition,
            location: location.into(),
            timestamp: Utc::now(),
        }
    }

    /// The numeric fields as a measurement vector.
    #[must_use]
    pub const fn measurements(&self) -> Measurements {
        Measurements::new(self.temperature, self.humidity, self.pressure)
    }
}

impl fmt::Display for MeasurementSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.1}°C, {:.1}%, {:.1}hPa ({})",
            self.location, self.temperature, self.humidity, self.pressure, self.condition
        )
    }
}

/// One extremity predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtremeKind {
    /// Temperature above the heat limit.
    ExtremeHeat,
    /// Temperature below the cold limit.
    ExtremeCold,
    /// Humidity above the humidity limit.
    ExtremeHumidity,
    /// Pressure below the low-pressure limit.
    VeryLowPressure,
    /// Pressure above the high-pressure limit.
    VeryHighPressure,
}

impl ExtremeKind {
    /// All predicates in evaluation order.
    pub const ALL: [Self; 5] = [
        Self::ExtremeHeat,
        Self::ExtremeCold,
        Self::ExtremeHumidity,
        Self::VeryLowPressure,
        Self::VeryHighPressure,
    ];

    /// Field the predicate is evaluated against.
    #[must_use]
    pub const fn field(self) -> Field {
        match self {
            Self::ExtremeHeat | Self::ExtremeCold => Field::Temperature,
            Self::ExtremeHumidity => Field::Humidity,
            Self::VeryLowPressure | Self::VeryHighPressure => Field::Pressure,
        }
    }

    /// Human-readable title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::ExtremeHeat => "Extreme heat",
            Self::ExtremeCold => "Extreme cold",
            Self::ExtremeHumidity => "Extreme humidity",
            Self::VeryLowPressure => "Very low pressure",
            Self::VeryHighPressure => "Very high pressure",
        }
    }
}

/// A triggered extremity predicate with the values that tripped it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredPredicate {
    /// Which predicate fired.
    pub kind: ExtremeKind,
    /// The measured value.
    pub value: f64,
    /// The configured limit it crossed.
    pub limit: f64,
}

impl TriggeredPredicate {
    /// e.g. `Extreme heat: temperature 45.0°C above 40.0°C`.
    #[must_use]
    pub fn describe(&self) -> String {
        let field = self.kind.field();
        let relation = match self.kind {
            ExtremeKind::ExtremeHeat | ExtremeKind::ExtremeHumidity | ExtremeKind::VeryHighPressure => "above",
            ExtremeKind::ExtremeCold | ExtremeKind::VeryLowPressure => "below",
        };
        format!(
            "{}: {} {:.1}{} {} {:.1}{}",
            self.kind.title(),
            field,
            self.value,
            field.unit(),
            relation,
            self.limit,
            field.unit()
        )
    }
}

/// Alert raised when the current sample trips one or more extremity predicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtremeAlert {
    /// The sample that tripped the predicates.
    pub sample: MeasurementSample,
    /// Every predicate that fired, in evaluation order.
    pub triggered: Vec<TriggeredPredicate>,
    /// Human-readable summary naming each triggered predicate.
    pub message: String,
}

impl ExtremeAlert {
    /// Aggregate triggered predicates into one alert. Returns `None` when nothing fired.
    #[must_use]
    pub fn from_triggered(sample: MeasurementSample, triggered: Vec<TriggeredPredicate>) -> Option<Self> {
        if triggered.is_empty() {
            return None;
        }

        let parts: Vec<String> = triggered.iter().map(TriggeredPredicate::describe).collect();
        let message = format!("EXTREME WEATHER ALERT at {}: {}", sample.location, parts.join("; "));

        Some(Self {
            sample,
            triggered,
            message,
        })
    }

    /// Returns true if the given predicate contributed to this alert.
    #[must_use]
    pub fn has(&self, kind: ExtremeKind) -> bool {
        self.triggered.iter().any(|t| t.kind == kind)
    }
}
