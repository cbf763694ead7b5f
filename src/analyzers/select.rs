//! Partial-key selection and removal rules for grouped and aggregated data.
//!
//! Every function returns a new collection; inputs are never modified in place.

use std::collections::HashMap;
use tracing::debug;

use crate::analyzers::types::{Metric, SurveyDeltaSummary, SurveySummary};
use crate::survey::{GroupedSamples, KeyFilter, SurveyKey};

/// Keeps the entries whose key matches `filter` on every restricted field.
pub fn select<V: Clone>(entries: &HashMap<SurveyKey, V>, filter: &KeyFilter) -> HashMap<SurveyKey, V> {
    entries
        .iter()
        .filter(|(key, _)| filter.matches(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Selects from a summary, rebuilding the running range from the kept entries.
pub fn select_summary(summary: &SurveySummary, filter: &KeyFilter) -> SurveySummary {
    let mut selected = SurveySummary::new(&summary.survey_type, summary.tracked_metric);
    for (key, stats) in select(&summary.stats, filter) {
        selected.insert(key, stats);
    }
    selected
}

/// Selects from a comparison, rebuilding the running range from the kept entries.
pub fn select_deltas(summary: &SurveyDeltaSummary, filter: &KeyFilter) -> SurveyDeltaSummary {
    let mut selected = SurveyDeltaSummary::new(
        &summary.survey_type,
        summary.delta_type,
        summary.tracked_metric,
    );
    for (key, deltas) in select(&summary.deltas, filter) {
        selected.insert(key, deltas);
    }
    selected
}

/// Drops entries whose `metric` mean is at or below `threshold`.
///
/// Entries that do not carry `metric` are kept.
pub fn remove_below_threshold(summary: &SurveySummary, metric: Metric, threshold: f64) -> SurveySummary {
    let mut kept = SurveySummary::new(&summary.survey_type, summary.tracked_metric);

    for (key, stats) in &summary.stats {
        match stats.get(&metric) {
            Some(s) if s.mean <= threshold => {
                debug!(key = %key, %metric, mean = s.mean, threshold, "Removing group below threshold");
            }
            _ => kept.insert(key.clone(), stats.clone()),
        }
    }

    kept
}

/// Drops groups with fewer than `min_count + 1` readings.
pub fn remove_small_groups(groups: GroupedSamples, min_count: usize) -> GroupedSamples {
    groups
        .into_iter()
        .filter(|(key, samples)| {
            let keep = samples.len() > min_count;
            if !keep {
                debug!(key = %key, samples = samples.len(), min_count, "Removing small group");
            }
            keep
        })
        .collect()
}
