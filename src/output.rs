//! Report emission for survey statistics and comparisons.
//!
//! Reports are CSV files with one row per (key, metric), written in the key
//! order the caller supplies. The same rows can be logged as structured
//! events instead of printed as a table.

use chrono::NaiveDateTime;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

use crate::analyzers::tier::{Tier, tier};
use crate::analyzers::types::{Metric, SurveyDeltaSummary, SurveySummary};
use crate::error::Result;
use crate::survey::{NetworkGeneration, SurveyKey};

/// Report name prefix for a single survey.
pub const STATS_PREFIX: &str = "SR";
/// Report name prefix for a booster gain comparison.
pub const GAIN_PREFIX: &str = "GA";
/// Report name prefix for keys seen only in the first survey of a comparison.
pub const ONLY_IN_FIRST_PREFIX: &str = "RJ1-";
/// Report name prefix for keys seen only in the second survey of a comparison.
pub const ONLY_IN_SECOND_PREFIX: &str = "RJ2-";
/// Report name prefix for an indoor/outdoor attenuation comparison.
pub const ATTENUATION_PREFIX: &str = "AT";

/// `<prefix><MMDDYYYYHHMM>.csv`
pub fn report_file_name(prefix: &str, now: NaiveDateTime) -> String {
    format!("{}{}.csv", prefix, now.format("%m%d%Y%H%M"))
}

/// One row of a statistics report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsRow {
    pub survey_type: String,
    pub generation: NetworkGeneration,
    pub operator: String,
    pub band: u32,
    pub cell_id: u64,
    pub metric: Metric,
    pub count: u64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub variance: f64,
    pub standard_deviation: f64,
    /// Only set on the tier metric's rows.
    pub tier: Option<Tier>,
}

/// One row of a comparison report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaRow {
    pub survey_type: String,
    pub generation: NetworkGeneration,
    pub operator: String,
    pub band: u32,
    pub cell_id: u64,
    pub metric: Metric,
    pub count1: u64,
    pub count2: u64,
    pub delta: f64,
    pub t_statistic: f64,
    pub degrees_of_freedom: f64,
    pub p_value: f64,
    pub alpha: f64,
    pub significantly_different: bool,
    pub tier: Option<Tier>,
}

/// Flattens `summary` into report rows, following `keys`.
///
/// Keys absent from the summary are skipped. Rows of `tier_metric` are
/// banded against that metric's range over the whole summary.
pub fn stats_rows(summary: &SurveySummary, keys: &[SurveyKey], tier_metric: Metric) -> Vec<StatsRow> {
    let range = summary.range_of(tier_metric);
    keys.iter()
        .filter_map(|key| summary.get(key).map(|stats| (key, stats)))
        .flat_map(|(key, stats)| {
            stats.iter().map(move |(metric, s)| StatsRow {
                survey_type: summary.survey_type.clone(),
                generation: key.generation,
                operator: key.operator.clone(),
                band: key.band,
                cell_id: key.cell_id,
                metric: *metric,
                count: s.count,
                mean: s.mean,
                min: s.min,
                max: s.max,
                variance: s.variance,
                standard_deviation: s.standard_deviation,
                tier: (*metric == tier_metric).then(|| tier(s.mean, &range)),
            })
        })
        .collect()
}

/// Flattens `summary` into comparison rows, following `keys`.
pub fn delta_rows(
    summary: &SurveyDeltaSummary,
    keys: &[SurveyKey],
    tier_metric: Metric,
) -> Vec<DeltaRow> {
    let range = summary.range_of(tier_metric);
    keys.iter()
        .filter_map(|key| summary.get(key).map(|deltas| (key, deltas)))
        .flat_map(|(key, deltas)| {
            deltas.iter().map(move |(metric, d)| DeltaRow {
                survey_type: summary.survey_type.clone(),
                generation: key.generation,
                operator: key.operator.clone(),
                band: key.band,
                cell_id: key.cell_id,
                metric: *metric,
                count1: d.count1,
                count2: d.count2,
                delta: d.delta,
                t_statistic: d.t_statistic,
                degrees_of_freedom: d.degrees_of_freedom,
                p_value: d.p_value,
                alpha: d.alpha,
                significantly_different: d.significantly_different,
                tier: (*metric == tier_metric).then(|| tier(d.delta, &range)),
            })
        })
        .collect()
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    debug!(path = %path.display(), rows = rows.len(), "Report written");
    Ok(())
}

/// Writes a statistics report to `path`, replacing any existing file.
pub fn write_stats_report(
    path: &Path,
    summary: &SurveySummary,
    keys: &[SurveyKey],
    tier_metric: Metric,
) -> Result<()> {
    write_rows(path, &stats_rows(summary, keys, tier_metric))
}

/// Writes a comparison report to `path`, replacing any existing file.
pub fn write_delta_report(
    path: &Path,
    summary: &SurveyDeltaSummary,
    keys: &[SurveyKey],
    tier_metric: Metric,
) -> Result<()> {
    write_rows(path, &delta_rows(summary, keys, tier_metric))
}

/// Logs a statistics report, one event per row.
pub fn log_stats(summary: &SurveySummary, keys: &[SurveyKey], tier_metric: Metric) {
    for row in stats_rows(summary, keys, tier_metric) {
        info!(
            generation = %row.generation,
            operator = %row.operator,
            band = row.band,
            cell_id = row.cell_id,
            metric = %row.metric,
            count = row.count,
            mean = row.mean,
            min = row.min,
            max = row.max,
            standard_deviation = row.standard_deviation,
            tier = row.tier.map(|t| t.label()),
            "Survey stats"
        );
    }
}

/// Logs a comparison report, one event per row.
pub fn log_deltas(summary: &SurveyDeltaSummary, keys: &[SurveyKey], tier_metric: Metric) {
    for row in delta_rows(summary, keys, tier_metric) {
        info!(
            generation = %row.generation,
            operator = %row.operator,
            band = row.band,
            cell_id = row.cell_id,
            metric = %row.metric,
            count1 = row.count1,
            count2 = row.count2,
            delta = row.delta,
            p_value = row.p_value,
            significant = row.significantly_different,
            tier = row.tier.map(|t| t.label()),
            "Survey delta"
        );
    }
}
