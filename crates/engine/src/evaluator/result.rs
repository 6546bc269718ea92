//! Evaluation outputs.

use indexmap::IndexMap;
use serde::Serialize;

use crate::coercion::parse_number;
use crate::schema::ScoreDistribution;

/// Class label -> probability, in declared order.
pub type Distribution = IndexMap<String, f64>;

/// The scored outcome of evaluating one model against one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    /// Name of the model that produced this result.
    pub model: String,
    /// Predicted label or numeric score in its text form.
    pub score: String,
    /// Confidence of the predicted score, when the model provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub distribution: Distribution,
    /// Id of the tree node reached or the rule that fired.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    /// Per-segment results of a mining model.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<SegmentResult>,
}

/// Result of one participating segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_id: Option<String>,
    pub weight: f64,
    pub result: EvaluationResult,
}

impl EvaluationResult {
    pub fn new(model: impl Into<String>, score: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            score: score.into(),
            confidence: None,
            distribution: Distribution::new(),
            entity_id: None,
            segments: Vec::new(),
        }
    }

    /// The score as a number, if it is one.
    pub fn numeric_score(&self) -> Option<f64> {
        parse_number(&self.model, &self.score).ok()
    }

    /// Probability of a class in the distribution.
    pub fn probability(&self, class: &str) -> Option<f64> {
        self.distribution.get(class).copied()
    }
}

/// Turn declared score distribution entries into class probabilities.
///
/// A declared `probability` wins; otherwise `recordCount` relative to the
/// total of all entries; otherwise the entry's `confidence`.
pub fn to_distribution(entries: &[ScoreDistribution]) -> Distribution {
    let total: f64 = entries.iter().filter_map(|e| e.record_count).sum();
    entries
        .iter()
        .map(|e| {
            let p = e
                .probability
                .or_else(|| {
                    e.record_count
                        .filter(|_| total > 0.0)
                        .map(|count| count / total)
                })
                .or(e.confidence)
                .unwrap_or(0.0);
            (e.value.clone(), p)
        })
        .collect()
}

/// Normalize accumulated weights into a distribution.
pub(crate) fn normalize(totals: &IndexMap<String, f64>) -> Distribution {
    let sum: f64 = totals.values().sum();
    if sum <= 0.0 {
        return Distribution::new();
    }
    totals.iter().map(|(k, v)| (k.clone(), v / sum)).collect()
}

/// Key with the highest value; ties go to the earliest entry.
pub(crate) fn arg_max(totals: &IndexMap<String, f64>) -> Option<(&String, f64)> {
    let mut best: Option<(&String, f64)> = None;
    for (key, &value) in totals {
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((key, value)),
        }
    }
    best
}
