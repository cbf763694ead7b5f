//! Multi-key ordering of survey keys.
//!
//! A [`KeyComparator`] orders keys on a single field. Comparator lists are
//! applied lexicographically: the first non-equal comparison decides, and
//! keys that tie on every comparator keep their input order.

use std::cmp::Ordering;

use crate::analyzers::types::{DeltaType, Metric, SurveyDeltaSummary, SurveySummary};
use crate::survey::SurveyKey;

/// Total ordering of two keys on one field.
pub type KeyComparator = fn(&SurveyKey, &SurveyKey) -> Ordering;

pub fn by_generation(a: &SurveyKey, b: &SurveyKey) -> Ordering {
    a.generation.cmp(&b.generation)
}

pub fn by_operator(a: &SurveyKey, b: &SurveyKey) -> Ordering {
    a.operator.cmp(&b.operator)
}

pub fn by_band(a: &SurveyKey, b: &SurveyKey) -> Ordering {
    a.band.cmp(&b.band)
}

pub fn by_cell_id(a: &SurveyKey, b: &SurveyKey) -> Ordering {
    a.cell_id.cmp(&b.cell_id)
}

/// Generation, operator, band, cell id.
pub const OPERATOR_ORDER: [KeyComparator; 4] = [by_generation, by_operator, by_band, by_cell_id];

/// Generation, band, operator, cell id.
pub const BAND_ORDER: [KeyComparator; 4] = [by_generation, by_band, by_operator, by_cell_id];

/// Picks the band-first or operator-first composition.
pub fn key_order(group_by_band: bool) -> &'static [KeyComparator] {
    if group_by_band { &BAND_ORDER } else { &OPERATOR_ORDER }
}

/// Compares two keys with each comparator in turn until one discriminates.
pub fn compare_keys(a: &SurveyKey, b: &SurveyKey, order: &[KeyComparator]) -> Ordering {
    order
        .iter()
        .map(|compare| compare(a, b))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Stable sort of `keys` by `order`.
pub fn sort_keys(mut keys: Vec<SurveyKey>, order: &[KeyComparator]) -> Vec<SurveyKey> {
    keys.sort_by(|a, b| compare_keys(a, b, order));
    keys
}

/// Primary column requested by the report layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    /// Operator name first
    Mno,
    /// Frequency band first
    Band,
    /// Signal value only
    #[default]
    Signal,
}

impl SortColumn {
    /// Parses `"MNO"` or `"BAND"` (case-insensitive); anything else sorts by signal.
    pub fn from_hint(hint: &str) -> Self {
        match hint.trim().to_ascii_uppercase().as_str() {
            "MNO" => SortColumn::Mno,
            "BAND" => SortColumn::Band,
            _ => SortColumn::Signal,
        }
    }

    fn compare(&self, a: &SurveyKey, b: &SurveyKey) -> Ordering {
        match self {
            SortColumn::Mno => by_operator(a, b),
            SortColumn::Band => by_band(a, b),
            SortColumn::Signal => Ordering::Equal,
        }
    }
}

/// Orders two optional values, missing values last.
fn compare_values(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) if descending => y.total_cmp(&x),
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Report order for a summary: `column` ascending, then the mean of `metric`
/// descending (strongest signal first), then `order`, then the derived key order.
pub fn rank_stats(
    summary: &SurveySummary,
    column: SortColumn,
    metric: Metric,
    order: &[KeyComparator],
) -> Vec<SurveyKey> {
    let mut keys: Vec<SurveyKey> = summary.stats.keys().cloned().collect();
    keys.sort_by(|a, b| {
        column
            .compare(a, b)
            .then_with(|| compare_values(summary.mean_of(a, metric), summary.mean_of(b, metric), true))
            .then_with(|| compare_keys(a, b, order))
            .then_with(|| a.cmp(b))
    });
    keys
}

/// Report order for a comparison: `column` ascending, then the delta of
/// `metric`, then `order`, then the derived key order.
///
/// Booster comparisons list the largest gain first; indoor/outdoor
/// comparisons list the strongest attenuation (most negative delta) first.
pub fn rank_deltas(
    summary: &SurveyDeltaSummary,
    column: SortColumn,
    metric: Metric,
    order: &[KeyComparator],
) -> Vec<SurveyKey> {
    let descending = summary.delta_type == DeltaType::IndoorBooster;
    let mut keys: Vec<SurveyKey> = summary.deltas.keys().cloned().collect();
    keys.sort_by(|a, b| {
        column
            .compare(a, b)
            .then_with(|| {
                compare_values(summary.delta_of(a, metric), summary.delta_of(b, metric), descending)
            })
            .then_with(|| compare_keys(a, b, order))
            .then_with(|| a.cmp(b))
    });
    keys
}
