//! Survey key model: grouping identity, raw readings and grouping.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SurveyError};

/// Radio access generation of an observed cell.
///
/// Variant order is the sort order used when keys are ordered by generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NetworkGeneration {
    #[serde(rename = "2G")]
    TwoG,
    #[serde(rename = "3G")]
    ThreeG,
    #[serde(rename = "4G")]
    FourG,
}

impl NetworkGeneration {
    pub fn label(&self) -> &'static str {
        match self {
            NetworkGeneration::TwoG => "2G",
            NetworkGeneration::ThreeG => "3G",
            NetworkGeneration::FourG => "4G",
        }
    }
}

impl fmt::Display for NetworkGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for NetworkGeneration {
    type Err = SurveyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "2G" => Ok(NetworkGeneration::TwoG),
            "3G" => Ok(NetworkGeneration::ThreeG),
            "4G" => Ok(NetworkGeneration::FourG),
            other => Err(SurveyError::UnknownNetworkGeneration(other.to_string())),
        }
    }
}

/// Composite grouping identity of an observed cell.
///
/// The derived `Ord` (generation, operator, band, cell id) is only used as a
/// tie-break of last resort; report ordering goes through [`crate::analyzers::order`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurveyKey {
    pub generation: NetworkGeneration,
    pub operator: String,
    pub band: u32,
    pub cell_id: u64,
}

impl SurveyKey {
    pub fn new(generation: NetworkGeneration, band: u32, cell_id: u64, operator: &str) -> Self {
        SurveyKey {
            generation,
            operator: operator.to_string(),
            band,
            cell_id,
        }
    }
}

impl fmt::Display for SurveyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/band {}/cell {}",
            self.generation, self.operator, self.band, self.cell_id
        )
    }
}

/// Partial key used to select groups. `None` fields match any value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyFilter {
    pub generation: Option<NetworkGeneration>,
    pub band: Option<u32>,
    pub cell_id: Option<u64>,
    pub operator: Option<String>,
}

impl KeyFilter {
    /// Filter that matches every key.
    pub fn any() -> Self {
        Self::default()
    }

    /// Builds a filter from zero/empty-means-any parts.
    ///
    /// # Errors
    ///
    /// Returns [`SurveyError::UnknownNetworkGeneration`] for a non-empty label
    /// that is not 2G, 3G or 4G.
    pub fn from_parts(generation: &str, band: u32, cell_id: u64, operator: &str) -> Result<Self> {
        let generation = if generation.trim().is_empty() {
            None
        } else {
            Some(generation.parse()?)
        };

        Ok(KeyFilter {
            generation,
            band: (band != 0).then_some(band),
            cell_id: (cell_id != 0).then_some(cell_id),
            operator: (!operator.is_empty()).then(|| operator.to_string()),
        })
    }

    pub fn generation(mut self, generation: NetworkGeneration) -> Self {
        self.generation = Some(generation);
        self
    }

    pub fn band(mut self, band: u32) -> Self {
        self.band = Some(band);
        self
    }

    pub fn cell_id(mut self, cell_id: u64) -> Self {
        self.cell_id = Some(cell_id);
        self
    }

    pub fn operator(mut self, operator: &str) -> Self {
        self.operator = Some(operator.to_string());
        self
    }

    /// Conjunctive partial match: every restricted field must equal the key's.
    pub fn matches(&self, key: &SurveyKey) -> bool {
        self.generation.is_none_or(|g| g == key.generation)
            && self.band.is_none_or(|b| b == key.band)
            && self.cell_id.is_none_or(|c| c == key.cell_id)
            && self.operator.as_deref().is_none_or(|o| o == key.operator)
    }
}

/// Signal measurements carried by one reading.
///
/// RSRP and RSRQ are only reported by 4G cells.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SignalMetrics {
    pub dbm: f64,
    pub rssi: f64,
    pub rsrp: Option<f64>,
    pub rsrq: Option<f64>,
}

/// One observed reading as handed over by the parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    pub timestamp: NaiveDateTime,
    pub network: String,
    pub band: u32,
    pub cell_id: u64,
    pub operator: String,
    pub metrics: SignalMetrics,
}

impl RawSample {
    /// Derives the grouping key for this reading.
    ///
    /// # Errors
    ///
    /// Returns [`SurveyError::UnknownNetworkGeneration`] when the network label
    /// is not a supported generation.
    pub fn key(&self) -> Result<SurveyKey> {
        Ok(SurveyKey::new(
            self.network.parse()?,
            self.band,
            self.cell_id,
            &self.operator,
        ))
    }
}

/// Readings grouped by their key. Order inside a group is not significant.
pub type GroupedSamples = HashMap<SurveyKey, Vec<RawSample>>;

/// Groups readings by key, independent of input order.
///
/// # Errors
///
/// Fails on the first reading whose network label is unknown; no partial
/// grouping is returned.
pub fn group_samples(samples: Vec<RawSample>) -> Result<GroupedSamples> {
    let mut groups = GroupedSamples::new();

    for sample in samples {
        let key = sample.key()?;
        groups.entry(key).or_default().push(sample);
    }

    Ok(groups)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::NaiveDate;

    pub fn sample(network: &str, band: u32, cell_id: u64, operator: &str, dbm: f64) -> RawSample {
        RawSample {
            timestamp: NaiveDate::from_ymd_opt(2023, 11, 2)
                .and_then(|d| d.and_hms_opt(10, 30, 0))
                .unwrap(),
            network: network.to_string(),
            band,
            cell_id,
            operator: operator.to_string(),
            metrics: SignalMetrics {
                dbm,
                rssi: dbm + 113.0,
                rsrp: None,
                rsrq: None,
            },
        }
    }

    pub fn lte_sample(band: u32, cell_id: u64, operator: &str, rsrp: f64, rsrq: f64) -> RawSample {
        let mut s = sample("4G", band, cell_id, operator, rsrp + 20.0);
        s.metrics.rsrp = Some(rsrp);
        s.metrics.rsrq = Some(rsrq);
        s
    }
}
