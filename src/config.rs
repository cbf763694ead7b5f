//! Engine configuration.
//!
//! Stored as a JSON object on disk; missing fields take their defaults:
//! ```json
//! {
//!   "alpha": 0.01,
//!   "min_sample_count": 2,
//!   "min_signal_level": -129.99,
//!   "tracked_metric": "DBM",
//!   "tier_metric": "RSSI",
//!   "group_by_band": true,
//!   "exclude_small_groups": false
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::analyzers::compare::DEFAULT_ALPHA;
use crate::analyzers::types::Metric;
use crate::error::Result;

/// Groups need more than this many readings to survive small-group removal.
pub const MINIMUM_SAMPLE_COUNT: usize = 2;
/// Mean signal at or below this level is treated as no signal.
pub const MINIMUM_SIGNAL_LEVEL: f64 = -129.99;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub alpha: f64,
    pub min_sample_count: usize,
    pub min_signal_level: f64,
    pub tracked_metric: Metric,
    /// Metric whose range bands report rows into tiers.
    pub tier_metric: Metric,
    pub group_by_band: bool,
    pub exclude_small_groups: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            alpha: DEFAULT_ALPHA,
            min_sample_count: MINIMUM_SAMPLE_COUNT,
            min_signal_level: MINIMUM_SIGNAL_LEVEL,
            tracked_metric: Metric::Dbm,
            tier_metric: Metric::Rssi,
            group_by_band: false,
            exclude_small_groups: false,
        }
    }
}

impl EngineConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
