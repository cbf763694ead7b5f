use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analyzers::aggregate::aggregate;
use crate::analyzers::compare::compare_summaries;
use crate::analyzers::order::{SortColumn, key_order, rank_deltas, rank_stats, sort_keys};
use crate::analyzers::select::{remove_below_threshold, remove_small_groups};
use crate::analyzers::types::{Comparison, DeltaType, SurveyDeltaSummary, SurveySummary};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::output::{
    ATTENUATION_PREFIX, GAIN_PREFIX, ONLY_IN_FIRST_PREFIX, ONLY_IN_SECOND_PREFIX, STATS_PREFIX,
    log_deltas, log_stats, report_file_name, write_delta_report, write_stats_report,
};
use crate::parser::read_survey_file;
use crate::survey::{RawSample, SurveyKey, group_samples};

/// Groups, filters and aggregates one survey's readings.
///
/// Small groups are removed before aggregation when the config asks for it;
/// keys whose tracked metric mean is at or below the minimum signal level
/// are removed afterwards.
pub fn summarize_samples(
    survey_type: &str,
    samples: Vec<RawSample>,
    config: &EngineConfig,
) -> Result<SurveySummary> {
    let mut groups = group_samples(samples)?;
    if config.exclude_small_groups {
        groups = remove_small_groups(groups, config.min_sample_count);
    }

    let summary = aggregate(survey_type, &groups, config.tracked_metric);
    Ok(remove_below_threshold(
        &summary,
        config.tracked_metric,
        config.min_signal_level,
    ))
}

/// Parses and summarizes the survey file at `path`.
#[tracing::instrument(skip(path, config), fields(path = %path.display()))]
pub fn summarize_file(path: &Path, config: &EngineConfig) -> Result<SurveySummary> {
    let survey = read_survey_file(path)?;
    let summary = summarize_samples(&survey.survey_type, survey.samples, config)?;
    info!(keys = summary.len(), "Survey summarized");
    Ok(summary)
}

/// Summarizes two survey files and compares them, `first` as the baseline.
pub fn compare_files(
    first: &Path,
    second: &Path,
    config: &EngineConfig,
    delta_type: DeltaType,
) -> Result<Comparison> {
    let a = summarize_file(first, config)?;
    let b = summarize_file(second, config)?;
    Ok(compare_summaries(&a, &b, config.alpha, delta_type))
}

/// Report order for a summary: ranked by `sort` when given, otherwise the
/// configured composite key order.
pub fn ordered_keys(
    summary: &SurveySummary,
    sort: Option<SortColumn>,
    config: &EngineConfig,
) -> Vec<SurveyKey> {
    match sort {
        Some(column) => rank_stats(
            summary,
            column,
            config.tracked_metric,
            key_order(config.group_by_band),
        ),
        None => sort_keys(
            summary.stats.keys().cloned().collect(),
            key_order(config.group_by_band),
        ),
    }
}

/// Report order for a comparison, see [`ordered_keys`].
pub fn ordered_delta_keys(
    summary: &SurveyDeltaSummary,
    sort: Option<SortColumn>,
    config: &EngineConfig,
) -> Vec<SurveyKey> {
    match sort {
        Some(column) => rank_deltas(
            summary,
            column,
            config.tracked_metric,
            key_order(config.group_by_band),
        ),
        None => sort_keys(
            summary.deltas.keys().cloned().collect(),
            key_order(config.group_by_band),
        ),
    }
}

/// Logs and writes the report of one survey into `output_dir`.
pub fn report_survey(
    summary: &SurveySummary,
    sort: Option<SortColumn>,
    config: &EngineConfig,
    output_dir: &Path,
    now: NaiveDateTime,
) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    let keys = ordered_keys(summary, sort, config);
    log_stats(summary, &keys, config.tier_metric);

    let path = output_dir.join(report_file_name(STATS_PREFIX, now));
    write_stats_report(&path, summary, &keys, config.tier_metric)?;
    info!(path = %path.display(), keys = keys.len(), "Survey report written");
    Ok(path)
}

/// Logs and writes the three reports of a comparison into `output_dir`.
///
/// Returns the paths of the common, only-in-first and only-in-second reports.
pub fn report_comparison(
    comparison: &Comparison,
    sort: Option<SortColumn>,
    config: &EngineConfig,
    output_dir: &Path,
    now: NaiveDateTime,
) -> Result<[PathBuf; 3]> {
    std::fs::create_dir_all(output_dir)?;

    let prefix = match comparison.common.delta_type {
        DeltaType::IndoorOutdoor => ATTENUATION_PREFIX,
        DeltaType::IndoorBooster => GAIN_PREFIX,
    };
    let common_keys = ordered_delta_keys(&comparison.common, sort, config);
    log_deltas(&comparison.common, &common_keys, config.tier_metric);
    let common_path = output_dir.join(report_file_name(prefix, now));
    write_delta_report(
        &common_path,
        &comparison.common,
        &common_keys,
        config.tier_metric,
    )?;

    let first_path = output_dir.join(report_file_name(ONLY_IN_FIRST_PREFIX, now));
    let first_keys = ordered_keys(&comparison.only_in_first, sort, config);
    write_stats_report(
        &first_path,
        &comparison.only_in_first,
        &first_keys,
        config.tier_metric,
    )?;

    let second_path = output_dir.join(report_file_name(ONLY_IN_SECOND_PREFIX, now));
    let second_keys = ordered_keys(&comparison.only_in_second, sort, config);
    write_stats_report(
        &second_path,
        &comparison.only_in_second,
        &second_keys,
        config.tier_metric,
    )?;

    info!(
        common = common_keys.len(),
        only_in_first = first_keys.len(),
        only_in_second = second_keys.len(),
        "Comparison reports written"
    );
    Ok([common_path, first_path, second_path])
}
