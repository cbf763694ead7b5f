//! Per-generation metric calculators.

use crate::analyzers::types::{Metric, MetricStats, SurveyStats};
use crate::survey::{NetworkGeneration, RawSample};

/// Computes the descriptive statistics a network generation reports.
pub trait MetricCalculator: Send + Sync {
    /// Metrics this calculator produces.
    fn metrics(&self) -> &'static [Metric];

    /// Computes statistics for every metric with at least one value in `samples`.
    fn compute(&self, samples: &[RawSample]) -> SurveyStats {
        self.metrics()
            .iter()
            .filter_map(|&metric| {
                let values: Vec<f64> = samples
                    .iter()
                    .filter_map(|s| metric_value(s, metric))
                    .collect();
                MetricStats::from_values(&values).map(|stats| (metric, stats))
            })
            .collect()
    }
}

pub struct TwoGCalculator;
pub struct ThreeGCalculator;
pub struct FourGCalculator;

impl MetricCalculator for TwoGCalculator {
    fn metrics(&self) -> &'static [Metric] {
        &[Metric::Dbm, Metric::Rssi]
    }
}

impl MetricCalculator for ThreeGCalculator {
    fn metrics(&self) -> &'static [Metric] {
        &[Metric::Dbm, Metric::Rssi]
    }
}

impl MetricCalculator for FourGCalculator {
    fn metrics(&self) -> &'static [Metric] {
        &[Metric::Dbm, Metric::Rssi, Metric::Rsrp, Metric::Rsrq]
    }
}

/// Returns the calculator for `generation`.
pub fn calculator_for(generation: NetworkGeneration) -> &'static dyn MetricCalculator {
    match generation {
        NetworkGeneration::TwoG => &TwoGCalculator,
        NetworkGeneration::ThreeG => &ThreeGCalculator,
        NetworkGeneration::FourG => &FourGCalculator,
    }
}

/// Reads `metric` from a sample; `None` when the sample does not carry it.
pub fn metric_value(sample: &RawSample, metric: Metric) -> Option<f64> {
    match metric {
        Metric::Dbm => Some(sample.metrics.dbm),
        Metric::Rssi => Some(sample.metrics.rssi),
        Metric::Rsrp => sample.metrics.rsrp,
        Metric::Rsrq => sample.metrics.rsrq,
    }
}
