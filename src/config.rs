//! Producer configuration.
//!
//! Thresholds, condition rules and extremity limits are plain numbers carried
//! in config rather than hard-coded, so deployments can tune them. The
//! defaults reproduce the reference station's behaviour.

use serde::{Deserialize, Serialize};

use crate::error::{MeteoResult, ValidationError};
use crate::sample::{Field, Measurements};

/// Minimum absolute delta per field that counts as "changed" (strict `>`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldThresholds {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Percentage points.
    pub humidity: f64,
    /// hPa.
    pub pressure: f64,
}

impl FieldThresholds {
    /// Threshold for `field`.
    #[must_use]
    pub const fn get(&self, field: Field) -> f64 {
        match field {
            Field::Temperature => self.temperature,
            Field::Humidity => self.humidity,
            Field::Pressure => self.pressure,
        }
    }

    /// Same threshold for every field.
    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self {
            temperature: value,
            humidity: value,
            pressure: value,
        }
    }
}

impl Default for FieldThresholds {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            humidity: 1.0,
            pressure: 1.0,
        }
    }
}

/// Ordered condition classification rules, evaluated top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionRules {
    /// temperature > this → Hot
    pub hot_above: f64,
    /// temperature < this → Freezing
    pub freezing_below: f64,
    /// humidity > this and temperature > `humid_min_temperature` → Humid
    pub humid_above: f64,
    /// Minimum temperature for the Humid rule.
    pub humid_min_temperature: f64,
    /// humidity < this → Dry
    pub dry_below: f64,
    /// pressure < this → Stormy
    pub stormy_below: f64,
    /// pressure > this → Clear
    pub clear_above: f64,
}

impl Default for ConditionRules {
    fn default() -> Self {
        Self {
            hot_above: 35.0,
            freezing_below: 0.0,
            humid_above: 80.0,
            humid_min_temperature: 20.0,
            dry_below: 30.0,
            stormy_below: 1000.0,
            clear_above: 1020.0,
        }
    }
}

/// Extremity predicate limits. `None` disables a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtremeLimits {
    /// temperature > this → extreme heat
    pub heat_above: Option<f64>,
    /// temperature < this → extreme cold
    pub cold_below: Option<f64>,
    /// humidity > this → extreme humidity
    pub humidity_above: Option<f64>,
    /// pressure < this → very low pressure
    pub pressure_below: Option<f64>,
    /// pressure > this → very high pressure
    pub pressure_above: Option<f64>,
}

impl ExtremeLimits {
    /// All predicates disabled.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            heat_above: None,
            cold_below: None,
            humidity_above: None,
            pressure_below: None,
            pressure_above: None,
        }
    }
}

impl Default for ExtremeLimits {
    fn default() -> Self {
        Self {
            heat_above: Some(40.0),
            cold_below: Some(-20.0),
            humidity_above: Some(95.0),
            pressure_below: Some(980.0),
            pressure_above: Some(1040.0),
        }
    }
}

/// Complete producer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Location label stamped on every sample.
    pub location: String,
    /// Stored values before the first update.
    pub initial: Measurements,
    /// Per-field change thresholds.
    pub thresholds: FieldThresholds,
    /// Condition label rules.
    pub condition_rules: ConditionRules,
    /// Extremity predicate limits.
    pub extreme_limits: ExtremeLimits,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            location: "Unknown".to_string(),
            initial: Measurements::default(),
            thresholds: FieldThresholds::default(),
            condition_rules: ConditionRules::default(),
            extreme_limits: ExtremeLimits::default(),
        }
    }
}

impl ProducerConfig {
    /// Default config for a named location.
    #[must_use]
    pub fn for_location(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document. Missing keys fall back to defaults.
    pub fn from_json_str(json: &str) -> MeteoResult<Self> {
        let cfg: Self = serde_json::from_str(json).map_err(|e| ValidationError::InvalidConfig {
            reason: format!("invalid producer config: {e}"),
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject negative or non-finite thresholds and non-finite limits.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.initial.validate()?;

        for field in Field::ALL {
            let value = self.thresholds.get(field);
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidThreshold {
                    field: field.as_str().to_string(),
                    value,
                });
            }
        }

        let r = &self.condition_rules;
        let rules = [
            ("hot_above", r.hot_above),
            ("freezing_below", r.freezing_below),
            ("humid_above", r.humid_above),
            ("humid_min_temperature", r.humid_min_temperature),
            ("dry_below", r.dry_below),
            ("stormy_below", r.stormy_below),
            ("clear_above", r.clear_above),
        ];
        for (name, value) in rules {
            if !value.is_finite() {
                return Err(ValidationError::InvalidConfig {
                    reason: format!("condition rule '{name}' must be finite, got {value}"),
                });
            }
        }

        let l = &self.extreme_limits;
        let limits = [
            ("heat_above", l.heat_above),
            ("cold_below", l.cold_below),
            ("humidity_above", l.humidity_above),
            ("pressure_below", l.pressure_below),
            ("pressure_above", l.pressure_above),
        ];
        for (name, value) in limits {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(ValidationError::InvalidConfig {
                        reason: format!("extreme limit '{name}' must be finite, got {v}"),
                    });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ProducerConfig::default().validate().is_ok());
    }

    #[test]
    fn json_overrides_merge_with_defaults() {
        let cfg = ProducerConfig::from_json_str(
            r#"{
                "location": "Harbor",
                "thresholds": { "temperature": 1.0 },
                "extreme_limits": { "humidity_above": null }
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.location, "Harbor");
        assert_eq!(cfg.thresholds.temperature, 1.0);
        assert_eq!(cfg.thresholds.humidity, 1.0);
        assert_eq!(cfg.extreme_limits.humidity_above, None);
        assert_eq!(cfg.extreme_limits.heat_above, Some(40.0));
        assert_eq!(cfg.initial.pressure, Measurements::STANDARD_PRESSURE);
    }

    #[test]
    fn negative_threshold_is_rejected() {
        let mut cfg = ProducerConfig::default();
        cfg.thresholds.pressure = -1.0;
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidThreshold { ref field, .. } if field == "pressure"));
    }

    #[test]
    fn malformed_json_is_a_validation_error() {
        let err = ProducerConfig::from_json_str("{ not json").unwrap_err();
        assert!(err.is_validation());
    }
}
