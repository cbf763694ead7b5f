//! Reader for Siretta-style survey CSV exports.
//!
//! A file starts with 14 header rows of `label,value` metadata, followed by
//! one row per observed cell. Rows whose first field is `Survey:` separate
//! survey passes and carry no reading.

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord};
use regex::Regex;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::error::{Result, SurveyError};
use crate::survey::{RawSample, SignalMetrics};

const HEADER_ROWS: usize = 14;
const HEADER_DATE_FORMAT: &str = "%d/%m/%y %H:%M:%S";
const SAMPLE_DATE_FORMAT: &str = "%m/%d/%y %H:%M:%S";

const COL_TIMESTAMP: usize = 1;
const COL_NETWORK: usize = 2;
const COL_DBM: usize = 5;
const COL_RSSI: usize = 7;
const COL_CELL_ID: usize = 10;
const COL_BAND: usize = 13;
const COL_RSRP: usize = 19;
const COL_RSRQ: usize = 20;
const COL_OPERATOR: usize = 24;

static FILENAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^L\d{7}\.csv$").expect("valid file name pattern"));

/// Header metadata and readings of one survey file.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyFile {
    pub survey_type: String,
    pub file_created: NaiveDateTime,
    pub imei: String,
    pub hardware_version: String,
    pub application_version: String,
    pub firmware_version: String,
    pub filename: String,
    pub samples: Vec<RawSample>,
}

/// Returns `true` for names like `L0012345.csv` (case-insensitive).
pub fn is_survey_filename(name: &str) -> bool {
    FILENAME_PATTERN.is_match(name)
}

/// Opens and parses the survey file at `path`.
///
/// # Errors
///
/// Fails if the file name does not follow the `L<7 digits>.csv` convention,
/// the file cannot be read, or any header or reading is malformed.
pub fn read_survey_file(path: &Path) -> Result<SurveyFile> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if !is_survey_filename(name) {
        return Err(SurveyError::InvalidFilename(path.display().to_string()));
    }

    let survey = parse_survey(File::open(path)?)?;
    info!(
        path = %path.display(),
        survey_type = %survey.survey_type,
        samples = survey.samples.len(),
        "Survey file parsed"
    );
    Ok(survey)
}

/// Parses survey CSV content.
pub fn parse_survey<R: Read>(input: R) -> Result<SurveyFile> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let mut records = reader.records();

    let mut header = Vec::with_capacity(HEADER_ROWS);
    for row in 0..HEADER_ROWS {
        match records.next() {
            Some(record) => header.push(record?),
            None => return Err(SurveyError::MissingHeader { row }),
        }
    }

    let header_value = |row: usize| -> Result<String> {
        let record = &header[row];
        field(record, 1, "header value", line_of(record)).map(str::to_string)
    };

    let created = header_value(7)?;
    let file_created = NaiveDateTime::parse_from_str(&created, HEADER_DATE_FORMAT).map_err(|e| {
        SurveyError::InputShape {
            line: line_of(&header[7]),
            reason: format!("invalid file creation date {created:?}: {e}"),
        }
    })?;

    let mut survey = SurveyFile {
        survey_type: header_value(6)?,
        file_created,
        imei: header_value(8)?,
        hardware_version: header_value(9)?,
        application_version: header_value(10)?,
        firmware_version: header_value(11)?,
        filename: header_value(12)?,
        samples: Vec::new(),
    };

    for record in records {
        let record = record?;
        if record.get(0).map(str::trim) == Some("Survey:") {
            continue;
        }
        survey.samples.push(parse_sample(&record)?);
    }

    debug!(samples = survey.samples.len(), "Survey readings parsed");
    Ok(survey)
}

/// Parses one reading row.
pub fn parse_sample(record: &StringRecord) -> Result<RawSample> {
    let line = line_of(record);

    let timestamp_raw = field(record, COL_TIMESTAMP, "timestamp", line)?;
    let timestamp = NaiveDateTime::parse_from_str(timestamp_raw, SAMPLE_DATE_FORMAT).map_err(|e| {
        SurveyError::InputShape {
            line,
            reason: format!("invalid timestamp {timestamp_raw:?}: {e}"),
        }
    })?;

    let network = field(record, COL_NETWORK, "network", line)?.to_string();

    // "800 MHz" -> 800
    let band_raw = field(record, COL_BAND, "band", line)?;
    let band = band_raw
        .split_whitespace()
        .next()
        .and_then(|token| token.parse::<u32>().ok())
        .ok_or_else(|| SurveyError::InputShape {
            line,
            reason: format!("invalid band {band_raw:?}"),
        })?;

    let rsrp = parse_optional(record, COL_RSRP, "RSRP", line)?;
    let rsrq = parse_optional(record, COL_RSRQ, "RSRQ", line)?;
    if network == "4G" && (rsrp.is_none() || rsrq.is_none()) {
        return Err(SurveyError::InputShape {
            line,
            reason: "4G reading without RSRP/RSRQ".to_string(),
        });
    }

    Ok(RawSample {
        timestamp,
        network,
        band,
        cell_id: parse_field(record, COL_CELL_ID, "cell id", line)?,
        operator: field(record, COL_OPERATOR, "operator", line)?.to_string(),
        metrics: SignalMetrics {
            dbm: parse_field(record, COL_DBM, "DBM", line)?,
            rssi: parse_field(record, COL_RSSI, "RSSI", line)?,
            rsrp,
            rsrq,
        },
    })
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or_default()
}

fn field<'a>(record: &'a StringRecord, index: usize, name: &str, line: u64) -> Result<&'a str> {
    match record.get(index).map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(SurveyError::InputShape {
            line,
            reason: format!("missing {name} (column {index})"),
        }),
    }
}

fn parse_field<T: FromStr>(record: &StringRecord, index: usize, name: &str, line: u64) -> Result<T> {
    let raw = field(record, index, name, line)?;
    raw.parse().map_err(|_| SurveyError::InputShape {
        line,
        reason: format!("invalid {name} {raw:?}"),
    })
}

fn parse_optional<T: FromStr>(
    record: &StringRecord,
    index: usize,
    name: &str,
    line: u64,
) -> Result<Option<T>> {
    match record.get(index).map(str::trim) {
        None | Some("") => Ok(None),
        Some(_) => parse_field(record, index, name, line).map(Some),
    }
}
