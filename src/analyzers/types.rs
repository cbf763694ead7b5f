//! Data types produced by the aggregation and comparison pipeline.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::analyzers::utility::{mean, sample_variance};
use crate::survey::SurveyKey;

/// Signal quality measurement carried by a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Metric {
    Dbm,
    Rssi,
    Rsrp,
    Rsrq,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Dbm => "DBM",
            Metric::Rssi => "RSSI",
            Metric::Rsrp => "RSRP",
            Metric::Rsrq => "RSRQ",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DBM" => Ok(Metric::Dbm),
            "RSSI" => Ok(Metric::Rssi),
            "RSRP" => Ok(Metric::Rsrp),
            "RSRQ" => Ok(Metric::Rsrq),
            other => Err(format!("unknown metric {other:?}")),
        }
    }
}

/// Descriptive statistics of one metric over one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub count: u64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    /// Sample variance (n - 1 denominator); 0 for a single value.
    pub variance: f64,
    pub standard_deviation: f64,
}

impl MetricStats {
    /// Computes statistics over `values`. Returns `None` for empty input.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mean = mean(values)?;
        let variance = sample_variance(values, mean);
        let (min, max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        Some(MetricStats {
            count: values.len() as u64,
            mean,
            min,
            max,
            variance,
            standard_deviation: variance.sqrt(),
        })
    }
}

/// Per-metric statistics for one key.
pub type SurveyStats = BTreeMap<Metric, MetricStats>;

/// Running extremum of a tracked value.
///
/// Starts empty; `merge` is associative so partial ranges can be reduced in
/// any grouping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunningRange {
    pub min: f64,
    pub max: f64,
}

impl Default for RunningRange {
    fn default() -> Self {
        RunningRange {
            min: f64::MAX,
            max: -f64::MAX,
        }
    }
}

impl RunningRange {
    pub fn observe(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn merge(self, other: RunningRange) -> RunningRange {
        RunningRange {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }
}

/// Statistics for every key of one survey.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveySummary {
    pub survey_type: String,
    /// Metric whose mean feeds `range`.
    pub tracked_metric: Metric,
    pub stats: HashMap<SurveyKey, SurveyStats>,
    pub range: RunningRange,
}

impl SurveySummary {
    pub fn new(survey_type: &str, tracked_metric: Metric) -> Self {
        SurveySummary {
            survey_type: survey_type.to_string(),
            tracked_metric,
            stats: HashMap::new(),
            range: RunningRange::default(),
        }
    }

    /// Stores the statistics for `key` and widens the running range.
    pub fn insert(&mut self, key: SurveyKey, stats: SurveyStats) {
        if let Some(tracked) = stats.get(&self.tracked_metric) {
            self.range.observe(tracked.mean);
        }
        self.stats.insert(key, stats);
    }

    pub fn get(&self, key: &SurveyKey) -> Option<&SurveyStats> {
        self.stats.get(key)
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Mean of `metric` for `key`, if both exist.
    pub fn mean_of(&self, key: &SurveyKey, metric: Metric) -> Option<f64> {
        self.stats.get(key)?.get(&metric).map(|s| s.mean)
    }

    /// Range of `metric` means across all keys.
    ///
    /// The tracked metric answers from the running range; any other metric
    /// is reduced from the stored statistics.
    pub fn range_of(&self, metric: Metric) -> RunningRange {
        if metric == self.tracked_metric {
            return self.range;
        }
        self.stats
            .values()
            .filter_map(|stats| stats.get(&metric))
            .fold(RunningRange::default(), |mut range, s| {
                range.observe(s.mean);
                range
            })
    }
}

/// Semantic direction of a comparison. Only affects report ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaType {
    /// Outdoor (first) against indoor (second)
    IndoorOutdoor,
    /// Plain indoor (first) against indoor with a booster (second)
    IndoorBooster,
}

/// Comparison of one metric between two surveys for the same key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DeltaStats {
    pub count1: u64,
    pub count2: u64,
    /// Not computed; samples are unpaired.
    pub correlation: f64,
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
    /// `mean2 - mean1`
    pub delta: f64,
    pub alpha: f64,
    pub significantly_different: bool,
}

/// Per-metric comparison for one key.
pub type SurveyDeltaStats = BTreeMap<Metric, DeltaStats>;

/// Comparison of every key common to two surveys.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyDeltaSummary {
    pub survey_type: String,
    pub delta_type: DeltaType,
    pub tracked_metric: Metric,
    pub deltas: HashMap<SurveyKey, SurveyDeltaStats>,
    /// Range of the tracked metric's delta.
    pub range: RunningRange,
}

impl SurveyDeltaSummary {
    pub fn new(survey_type: &str, delta_type: DeltaType, tracked_metric: Metric) -> Self {
        SurveyDeltaSummary {
            survey_type: survey_type.to_string(),
            delta_type,
            tracked_metric,
            deltas: HashMap::new(),
            range: RunningRange::default(),
        }
    }

    pub fn insert(&mut self, key: SurveyKey, deltas: SurveyDeltaStats) {
        if let Some(tracked) = deltas.get(&self.tracked_metric) {
            self.range.observe(tracked.delta);
        }
        self.deltas.insert(key, deltas);
    }

    pub fn get(&self, key: &SurveyKey) -> Option<&SurveyDeltaStats> {
        self.deltas.get(key)
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    pub fn delta_of(&self, key: &SurveyKey, metric: Metric) -> Option<f64> {
        self.deltas.get(key)?.get(&metric).map(|d| d.delta)
    }

    /// Range of `metric` deltas across all keys, see [`SurveySummary::range_of`].
    pub fn range_of(&self, metric: Metric) -> RunningRange {
        if metric == self.tracked_metric {
            return self.range;
        }
        self.deltas
            .values()
            .filter_map(|deltas| deltas.get(&metric))
            .fold(RunningRange::default(), |mut range, d| {
                range.observe(d.delta);
                range
            })
    }
}

/// Partition of two surveys into common and exclusive keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub common: SurveyDeltaSummary,
    pub only_in_first: SurveySummary,
    pub only_in_second: SurveySummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::NetworkGeneration;

    #[test]
    fn test_metric_stats_empty_is_none() {
        assert!(MetricStats::from_values(&[]).is_none());
    }

    #[test]
    fn test_metric_stats_single_value_has_zero_variance() {
        let s = MetricStats::from_values(&[-95.5]).unwrap();
        assert_eq!(s.count, 1);
        assert_eq!(s.mean, -95.5);
        assert_eq!(s.min, -95.5);
        assert_eq!(s.max, -95.5);
        assert_eq!(s.variance, 0.0);
        assert_eq!(s.standard_deviation, 0.0);
    }

    #[test]
    fn test_metric_stats_sample_variance() {
        let s = MetricStats::from_values(&[-80.0, -82.0, -81.0]).unwrap();
        assert_eq!(s.count, 3);
        assert!((s.mean + 81.0).abs() < 1e-12);
        assert_eq!(s.min, -82.0);
        assert_eq!(s.max, -80.0);
        assert!((s.variance - 1.0).abs() < 1e-12);
        assert!((s.standard_deviation - s.variance.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_running_range_merge_is_associative() {
        let mut a = RunningRange::default();
        a.observe(-90.0);
        let mut b = RunningRange::default();
        b.observe(-70.0);
        let mut c = RunningRange::default();
        c.observe(-110.0);
        c.observe(-100.0);

        assert_eq!(a.merge(b).merge(c), a.merge(b.merge(c)));
        assert_eq!(a.merge(b).merge(c).min, -110.0);
        assert_eq!(a.merge(b).merge(c).max, -70.0);
        assert!(RunningRange::default().is_empty());
        assert_eq!(RunningRange::default().merge(a), a);
    }

    #[test]
    fn test_summary_insert_tracks_range() {
        let mut summary = SurveySummary::new("Full", Metric::Dbm);
        let key = |cell| SurveyKey::new(NetworkGeneration::TwoG, 900, cell, "Orange");

        let mut stats = SurveyStats::new();
        stats.insert(Metric::Dbm, MetricStats::from_values(&[-60.0]).unwrap());
        summary.insert(key(1), stats.clone());
        stats.insert(Metric::Dbm, MetricStats::from_values(&[-100.0]).unwrap());
        summary.insert(key(2), stats);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary.range.min, -100.0);
        assert_eq!(summary.range.max, -60.0);
        assert_eq!(summary.mean_of(&key(1), Metric::Dbm), Some(-60.0));
        assert_eq!(summary.mean_of(&key(1), Metric::Rsrp), None);
    }

    #[test]
    fn test_range_of_untracked_metric() {
        let mut summary = SurveySummary::new("Full", Metric::Dbm);
        let key = |cell| SurveyKey::new(NetworkGeneration::TwoG, 900, cell, "Orange");
        for (cell, dbm, rssi) in [(1, -60.0, 50.0), (2, -100.0, 10.0), (3, -80.0, 30.0)] {
            let mut stats = SurveyStats::new();
            stats.insert(Metric::Dbm, MetricStats::from_values(&[dbm]).unwrap());
            stats.insert(Metric::Rssi, MetricStats::from_values(&[rssi]).unwrap());
            summary.insert(key(cell), stats);
        }

        assert_eq!(summary.range_of(Metric::Dbm), summary.range);
        let rssi = summary.range_of(Metric::Rssi);
        assert_eq!((rssi.min, rssi.max), (10.0, 50.0));
        assert!(summary.range_of(Metric::Rsrp).is_empty());
    }

    #[test]
    fn test_metric_parse_roundtrip_names() {
        for m in [Metric::Dbm, Metric::Rssi, Metric::Rsrp, Metric::Rsrq] {
            assert_eq!(m.name().parse::<Metric>().unwrap(), m);
        }
        assert!("SINR".parse::<Metric>().is_err());
    }
}
