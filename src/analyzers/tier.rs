use serde::Serialize;
use std::fmt;

use crate::analyzers::types::RunningRange;

/// Relative signal band of a value within a survey's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Low,
    Medium,
    High,
}

impl Tier {
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Low => "low",
            Tier::Medium => "medium",
            Tier::High => "high",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bands `value` by thirds of `range`.
///
/// | Position in range          | Tier   |
/// |----------------------------|--------|
/// | <= min + 1/3 (max - min)   | Low    |
/// | <= min + 2/3 (max - min)   | Medium |
/// | above                      | High   |
///
/// An empty range puts every value in `Medium`.
pub fn tier(value: f64, range: &RunningRange) -> Tier {
    if range.is_empty() {
        return Tier::Medium;
    }

    let span = range.max - range.min;
    match value {
        v if v <= range.min + span / 3.0 => Tier::Low,
        v if v <= range.min + 2.0 * span / 3.0 => Tier::Medium,
        _ => Tier::High,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(min: f64, max: f64) -> RunningRange {
        RunningRange { min, max }
    }

    #[test]
    fn test_tier_boundaries() {
        let r = range(-120.0, -60.0);
        assert_eq!(tier(-120.0, &r), Tier::Low);
        assert_eq!(tier(-100.0, &r), Tier::Low);
        assert_eq!(tier(-99.0, &r), Tier::Medium);
        assert_eq!(tier(-80.0, &r), Tier::Medium);
        assert_eq!(tier(-79.0, &r), Tier::High);
        assert_eq!(tier(-60.0, &r), Tier::High);
    }

    #[test]
    fn test_tier_degenerate_ranges() {
        assert_eq!(tier(-70.0, &RunningRange::default()), Tier::Medium);
        // single observed value: min == max, everything is at the floor
        assert_eq!(tier(-70.0, &range(-70.0, -70.0)), Tier::Low);
    }
}
