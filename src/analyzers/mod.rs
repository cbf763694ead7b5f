//! Survey aggregation, selection, ordering and comparison.
//!
//! Grouped readings are reduced to per-key statistics by a calculator chosen
//! from the key's network generation. Two summaries are then reconciled key
//! by key, with a Welch's t-test per shared metric.

pub mod aggregate;
pub mod analyzer;
pub mod calculator;
pub mod compare;
pub mod order;
pub mod select;
pub mod tier;
pub mod types;
pub mod utility;
