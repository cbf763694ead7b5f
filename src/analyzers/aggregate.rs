use tracing::{debug, warn};

use crate::analyzers::calculator::calculator_for;
use crate::analyzers::types::{Metric, SurveySummary};
use crate::survey::GroupedSamples;

/// Aggregates grouped readings into a [`SurveySummary`].
///
/// Each group is handed to the calculator of its key's network generation.
/// Groups without any sample, or whose calculator yields no statistic, are
/// dropped rather than stored with empty statistics. The running range is
/// fed with the mean of `tracked_metric` as entries are inserted.
pub fn aggregate(survey_type: &str, groups: &GroupedSamples, tracked_metric: Metric) -> SurveySummary {
    let mut summary = SurveySummary::new(survey_type, tracked_metric);

    for (key, samples) in groups {
        let stats = calculator_for(key.generation).compute(samples);

        if stats.is_empty() {
            warn!(key = %key, samples = samples.len(), "Dropping group without statistics");
            continue;
        }

        debug!(key = %key, samples = samples.len(), metrics = stats.len(), "Group aggregated");
        summary.insert(key.clone(), stats);
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::fixtures::{lte_sample, sample};
    use crate::survey::{NetworkGeneration, SurveyKey, group_samples};

    #[test]
    fn test_aggregate_one_record_per_group() {
        let groups = group_samples(vec![
            sample("2G", 900, 1, "Orange", -70.0),
            sample("2G", 900, 1, "Orange", -72.0),
            sample("3G", 2100, 2, "SFR", -85.0),
            lte_sample(800, 3, "Free", -100.0, -12.0),
            lte_sample(800, 3, "Free", -102.0, -14.0),
        ])
        .unwrap();

        let summary = aggregate("Full", &groups, Metric::Dbm);

        assert_eq!(summary.survey_type, "Full");
        assert_eq!(summary.len(), 3);

        let lte = SurveyKey::new(NetworkGeneration::FourG, 800, 3, "Free");
        assert_eq!(summary.mean_of(&lte, Metric::Rsrp), Some(-101.0));
        assert_eq!(summary.get(&lte).unwrap()[&Metric::Rsrp].count, 2);

        let umts = SurveyKey::new(NetworkGeneration::ThreeG, 2100, 2, "SFR");
        assert!(summary.get(&umts).unwrap().get(&Metric::Rsrp).is_none());
    }

    #[test]
    fn test_aggregate_identical_values_zero_spread() {
        let groups = group_samples(vec![sample("3G", 2100, 9, "Free", -88.0); 5]).unwrap();

        let summary = aggregate("3G", &groups, Metric::Dbm);
        let key = SurveyKey::new(NetworkGeneration::ThreeG, 2100, 9, "Free");
        let dbm = summary.get(&key).unwrap()[&Metric::Dbm];

        assert_eq!(dbm.count, 5);
        assert_eq!(dbm.variance, 0.0);
        assert_eq!(dbm.standard_deviation, 0.0);
    }

    #[test]
    fn test_aggregate_single_sample_has_zero_variance() {
        let groups = group_samples(vec![lte_sample(1800, 4, "SFR", -95.0, -9.0)]).unwrap();

        let summary = aggregate("4G", &groups, Metric::Dbm);
        let key = SurveyKey::new(NetworkGeneration::FourG, 1800, 4, "SFR");
        let rsrp = summary.get(&key).unwrap()[&Metric::Rsrp];

        assert_eq!(rsrp.variance, 0.0);
        assert_eq!(rsrp.standard_deviation, 0.0);
        assert!(!rsrp.standard_deviation.is_nan());
    }

    #[test]
    fn test_aggregate_drops_empty_groups() {
        let mut groups = GroupedSamples::new();
        groups.insert(SurveyKey::new(NetworkGeneration::TwoG, 900, 1, "Orange"), Vec::new());

        let summary = aggregate("2G", &groups, Metric::Dbm);

        assert!(summary.is_empty());
        assert!(summary.range.is_empty());
    }

    #[test]
    fn test_aggregate_tracks_range_of_designated_metric() {
        let groups = group_samples(vec![
            sample("2G", 900, 1, "Orange", -60.0),
            sample("2G", 900, 2, "Orange", -90.0),
            sample("2G", 900, 3, "Orange", -75.0),
        ])
        .unwrap();

        let summary = aggregate("2G", &groups, Metric::Dbm);

        assert_eq!(summary.range.min, -90.0);
        assert_eq!(summary.range.max, -60.0);
    }

    #[test]
    fn test_aggregate_does_not_mutate_input() {
        let groups = group_samples(vec![sample("2G", 900, 1, "Orange", -60.0)]).unwrap();
        let before = groups.clone();

        let _ = aggregate("2G", &groups, Metric::Dbm);

        assert_eq!(groups, before);
    }
}
