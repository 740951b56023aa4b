//! Producer state and its per-update transition.

use serde::{Deserialize, Serialize};

use crate::config::{ConditionRules, FieldThresholds};
use crate::sample::{Condition, Field, Measurements};

/// Classify measurements. Rules are evaluated top to bottom; first match wins.
#[must_use]
pub fn classify(values: &Measurements, rules: &ConditionRules) -> Condition {
    let Measurements {
        temperature,
        humidity,
        pressure,
    } = *values;

    if temperature > rules.hot_above {
        Condition::Hot
    } else if temperature < rules.freezing_below {
        Condition::Freezing
    } else if humidity > rules.humid_above && temperature > rules.humid_min_temperature {
        Condition::Humid
    } else if humidity < rules.dry_below {
        Condition::Dry
    } else if pressure < rules.stormy_below {
        Condition::Stormy
    } else if pressure > rules.clear_above {
        Condition::Clear
    } else {
        Condition::Mild
    }
}

/// Fields whose absolute delta strictly exceeds their threshold, in
/// [`Field::ALL`] order.
#[must_use]
pub fn changed_fields(previous: &Measurements, next: &Measurements, thresholds: &FieldThresholds) -> Vec<Field> {
    Field::ALL
        .into_iter()
        .filter(|&f| (next.get(f) - previous.get(f)).abs() > thresholds.get(f))
        .collect()
}

/// A condition label transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionChange {
    /// Label before the update.
    pub from: Condition,
    /// Label after the update.
    pub to: Condition,
}

/// What one update did to the state.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Fields that crossed their threshold.
    pub changed: Vec<Field>,
    /// Set when the condition label changed.
    pub condition: Option<ConditionChange>,
}

/// Mutable producer state: the latest values and the label derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerState {
    values: Measurements,
    condition: Condition,
}

impl ProducerState {
    /// Initial state. The label starts as [`Condition::Unknown`] until the
    /// first update classifies real measurements.
    #[must_use]
    pub const fn new(initial: Measurements) -> Self {
        Self {
            values: initial,
            condition: Condition::Unknown,
        }
    }

    /// Stored measurements.
    #[must_use]
    pub const fn values(&self) -> Measurements {
        self.values
    }

    /// Current label.
    #[must_use]
    pub const fn condition(&self) -> Condition {
        self.condition
    }

    /// Diff against `next`, store `next` unconditionally and reclassify.
    ///
    /// Thresholds gate only which fields are reported as changed; the stored
    /// values always become `next`.
    pub fn apply(&mut self, next: Measurements, thresholds: &FieldThresholds, rules: &ConditionRules) -> Transition {
        let changed = changed_fields(&self.values, &next, thresholds);
        self.values = next;

        let condition = classify(&self.values, rules);
        let change = (condition != self.condition).then_some(ConditionChange {
            from: self.condition,
            to: condition,
        });
        self.condition = condition;

        Transition {
            changed,
            condition: change,
        }
    }
}
