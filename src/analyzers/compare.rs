use std::collections::HashMap;
use tracing::{debug, info};

use crate::analyzers::types::{
    Comparison, DeltaStats, DeltaType, MetricStats, SurveyDeltaStats, SurveyDeltaSummary,
    SurveyStats, SurveySummary,
};
use crate::distribution::welch_t_test;
use crate::survey::SurveyKey;

/// Significance level used when the caller has no preference.
pub const DEFAULT_ALPHA: f64 = 0.05;

const IN_FIRST: u8 = 1 << 0;
const IN_SECOND: u8 = 1 << 1;
const IN_BOTH: u8 = IN_FIRST | IN_SECOND;

/// Reconciles two summaries into common keys and keys exclusive to either side.
///
/// For each common key, every metric present on both sides gets a
/// [`DeltaStats`] with `delta = mean_second - mean_first` and a Welch's t-test.
/// Exclusive keys keep only their originating side's statistics.
pub fn compare_summaries(
    first: &SurveySummary,
    second: &SurveySummary,
    alpha: f64,
    delta_type: DeltaType,
) -> Comparison {
    let mut membership: HashMap<&SurveyKey, u8> =
        HashMap::with_capacity(first.len().max(second.len()));
    for key in first.stats.keys() {
        *membership.entry(key).or_default() |= IN_FIRST;
    }
    for key in second.stats.keys() {
        *membership.entry(key).or_default() |= IN_SECOND;
    }

    let survey_type = if first.survey_type == second.survey_type {
        first.survey_type.clone()
    } else {
        format!("{}/{}", first.survey_type, second.survey_type)
    };

    let mut comparison = Comparison {
        common: SurveyDeltaSummary::new(&survey_type, delta_type, first.tracked_metric),
        only_in_first: SurveySummary::new(&first.survey_type, first.tracked_metric),
        only_in_second: SurveySummary::new(&second.survey_type, second.tracked_metric),
    };

    for (key, mask) in membership {
        match mask {
            IN_BOTH => {
                if let (Some(a), Some(b)) = (first.get(key), second.get(key)) {
                    comparison.common.insert(key.clone(), delta_stats(a, b, alpha));
                }
            }
            IN_FIRST => {
                if let Some(a) = first.get(key) {
                    comparison.only_in_first.insert(key.clone(), a.clone());
                }
            }
            _ => {
                if let Some(b) = second.get(key) {
                    comparison.only_in_second.insert(key.clone(), b.clone());
                }
            }
        }
    }

    info!(
        common = comparison.common.len(),
        only_in_first = comparison.only_in_first.len(),
        only_in_second = comparison.only_in_second.len(),
        "Surveys compared"
    );

    comparison
}

/// Per-metric deltas for metrics present on both sides.
pub fn delta_stats(first: &SurveyStats, second: &SurveyStats, alpha: f64) -> SurveyDeltaStats {
    first
        .iter()
        .filter_map(|(metric, a)| second.get(metric).map(|b| (*metric, metric_delta(a, b, alpha))))
        .collect()
}

/// Compares one metric between two groups.
///
/// When the t-test is undefined (single sample, zero spread) the p-value is
/// `NaN` and the difference is reported as not significant. This is
/// conservative: a shift between two groups with no spread keeps its `delta`
/// but is never flagged.
pub fn metric_delta(first: &MetricStats, second: &MetricStats, alpha: f64) -> DeltaStats {
    let test = welch_t_test(first, second);
    if test.p_value.is_nan() {
        debug!(count1 = first.count, count2 = second.count, "Degenerate t-test");
    }

    DeltaStats {
        count1: first.count,
        count2: second.count,
        correlation: 0.0,
        t_statistic: test.t,
        degrees_of_freedom: test.degrees_of_freedom,
        p_value: test.p_value,
        delta: second.mean - first.mean,
        alpha,
        // false for NaN
        significantly_different: test.p_value < alpha,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::aggregate::aggregate;
    use crate::analyzers::types::Metric;
    use crate::survey::fixtures::{lte_sample, sample};
    use crate::survey::{NetworkGeneration, group_samples};

    fn lte_summary(cells: Vec<(u64, Vec<f64>)>) -> SurveySummary {
        let samples = cells
            .iter()
            .flat_map(|(cell, values)| {
                values
                    .iter()
                    .map(move |v| lte_sample(800, *cell, "SFR", *v, -10.0))
            })
            .collect();
        aggregate("4G", &group_samples(samples).unwrap(), Metric::Dbm)
    }

    fn key(cell: u64) -> SurveyKey {
        SurveyKey::new(NetworkGeneration::FourG, 800, cell, "SFR")
    }

    #[test]
    fn test_significant_shift() {
        let outdoor = lte_summary(vec![(1, vec![-80.0, -82.0, -81.0])]);
        let indoor = lte_summary(vec![(1, vec![-70.0, -71.0, -69.0])]);

        let comparison = compare_summaries(&outdoor, &indoor, DEFAULT_ALPHA, DeltaType::IndoorOutdoor);

        let rsrp = comparison.common.get(&key(1)).unwrap()[&Metric::Rsrp];
        assert!((rsrp.delta - 11.0).abs() < 1e-9);
        assert_eq!(rsrp.count1, 3);
        assert_eq!(rsrp.count2, 3);
        assert!(rsrp.t_statistic > 0.0);
        assert!(rsrp.p_value < 0.05);
        assert!(rsrp.significantly_different);
        assert_eq!(rsrp.alpha, 0.05);
    }

    #[test]
    fn test_zero_spread_shift_is_not_flagged() {
        let outdoor = lte_summary(vec![(1, vec![-80.0; 5])]);
        let indoor = lte_summary(vec![(1, vec![-60.0; 5])]);

        let comparison = compare_summaries(&outdoor, &indoor, DEFAULT_ALPHA, DeltaType::IndoorOutdoor);

        let rsrp = comparison.common.get(&key(1)).unwrap()[&Metric::Rsrp];
        assert_eq!(rsrp.delta, 20.0);
        assert_eq!(rsrp.count1, 5);
        assert!(rsrp.p_value.is_nan());
        assert!(!rsrp.significantly_different);
    }

    #[test]
    fn test_key_only_in_first() {
        let outdoor = lte_summary(vec![(1, vec![-80.0, -82.0]), (2, vec![-90.0, -91.0])]);
        let indoor = lte_summary(vec![(1, vec![-85.0, -86.0])]);

        let comparison = compare_summaries(&outdoor, &indoor, DEFAULT_ALPHA, DeltaType::IndoorOutdoor);

        assert!(comparison.common.get(&key(2)).is_none());
        assert_eq!(comparison.only_in_first.len(), 1);
        assert_eq!(
            comparison.only_in_first.get(&key(2)),
            outdoor.get(&key(2))
        );
        assert!(comparison.only_in_second.is_empty());
    }

    #[test]
    fn test_key_only_in_second() {
        let indoor = lte_summary(vec![(1, vec![-85.0, -86.0])]);
        let boosted = lte_summary(vec![(1, vec![-75.0, -76.0]), (3, vec![-70.0, -72.0])]);

        let comparison = compare_summaries(&indoor, &boosted, DEFAULT_ALPHA, DeltaType::IndoorBooster);

        assert_eq!(comparison.common.len(), 1);
        assert_eq!(comparison.only_in_second.get(&key(3)), boosted.get(&key(3)));
        assert_eq!(comparison.common.delta_type, DeltaType::IndoorBooster);
    }

    #[test]
    fn test_single_sample_group_is_not_significant() {
        let outdoor = lte_summary(vec![(1, vec![-80.0])]);
        let indoor = lte_summary(vec![(1, vec![-60.0, -61.0, -59.0])]);

        let comparison = compare_summaries(&outdoor, &indoor, DEFAULT_ALPHA, DeltaType::IndoorOutdoor);

        let rsrp = comparison.common.get(&key(1)).unwrap()[&Metric::Rsrp];
        assert!(rsrp.p_value.is_nan());
        assert!(!rsrp.significantly_different);
        assert!((rsrp.delta - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_only_shared_metrics_compared() {
        let gsm = group_samples(vec![
            sample("2G", 900, 1, "Orange", -70.0),
            sample("2G", 900, 1, "Orange", -72.0),
        ])
        .unwrap();
        let a = aggregate("2G", &gsm, Metric::Dbm);
        let b = aggregate("2G", &gsm, Metric::Dbm);

        let comparison = compare_summaries(&a, &b, DEFAULT_ALPHA, DeltaType::IndoorOutdoor);

        let k = SurveyKey::new(NetworkGeneration::TwoG, 900, 1, "Orange");
        let deltas = comparison.common.get(&k).unwrap();
        assert_eq!(deltas.keys().copied().collect::<Vec<_>>(), vec![Metric::Dbm, Metric::Rssi]);
        assert_eq!(deltas[&Metric::Dbm].delta, 0.0);
        assert!(!deltas[&Metric::Dbm].significantly_different);
    }

    #[test]
    fn test_partition_counts() {
        let a = lte_summary(vec![(1, vec![-80.0, -81.0]), (2, vec![-82.0, -83.0]), (3, vec![-84.0, -85.0])]);
        let b = lte_summary(vec![(2, vec![-70.0, -71.0]), (3, vec![-72.0, -73.0]), (4, vec![-74.0, -75.0])]);

        let c = compare_summaries(&a, &b, DEFAULT_ALPHA, DeltaType::IndoorOutdoor);

        assert_eq!(c.common.len() + c.only_in_first.len(), a.len());
        assert_eq!(c.common.len() + c.only_in_second.len(), b.len());
        assert_eq!(c.common.len(), 2);
        // tracked metric is DBM: deltas are +12 for both common cells
        assert!((c.common.range.min - 12.0).abs() < 1e-9);
        assert!((c.common.range.max - 12.0).abs() < 1e-9);
    }
}
