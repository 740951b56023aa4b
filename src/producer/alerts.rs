//! Extremity predicate evaluation.

use crate::config::ExtremeLimits;
use crate::sample::{ExtremeKind, Measurements, TriggeredPredicate};

/// Evaluate every configured predicate against `values`, in
/// [`ExtremeKind::ALL`] order. Disabled predicates never fire.
#[must_use]
pub fn evaluate(values: &Measurements, limits: &ExtremeLimits) -> Vec<TriggeredPredicate> {
    ExtremeKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let value = values.get(kind.field());
            let (limit, tripped) = match kind {
                ExtremeKind::ExtremeHeat => above(limits.heat_above, value)?,
                ExtremeKind::ExtremeCold => below(limits.cold_below, value)?,
                ExtremeKind::ExtremeHumidity => above(limits.humidity_above, value)?,
                ExtremeKind::VeryLowPressure => below(limits.pressure_below, value)?,
                ExtremeKind::VeryHighPressure => above(limits.pressure_above, value)?,
            };
            tripped.then_some(TriggeredPredicate { kind, value, limit })
        })
        .collect()
}

fn above(limit: Option<f64>, value: f64) -> Option<(f64, bool)> {
    limit.map(|l| (l, value > l))
}

fn below(limit: Option<f64>, value: f64) -> Option<(f64, bool)> {
    limit.map(|l| (l, value < l))
}
