//! Per-class score distribution entries.

use serde::{Deserialize, Serialize};

/// One class of a score distribution.
///
/// The probability of the class is taken from `probability` when declared,
/// otherwise derived from `recordCount` relative to the sibling entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScoreDistribution {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

impl ScoreDistribution {
    pub fn with_probability(value: impl Into<String>, probability: f64) -> Self {
        Self {
            value: value.into(),
            record_count: None,
            confidence: None,
            probability: Some(probability),
        }
    }

    pub fn with_record_count(value: impl Into<String>, record_count: f64) -> Self {
        Self {
            value: value.into(),
            record_count: Some(record_count),
            confidence: None,
            probability: None,
        }
    }
}
