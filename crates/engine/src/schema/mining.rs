//! Mining (ensemble) model types.

use serde::{Deserialize, Serialize};

use super::{default_weight, Model, Predicate};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MiningModel {
    #[serde(rename = "modelName")]
    pub name: String,
    pub segmentation: Segmentation,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Segmentation {
    pub multiple_model_method: MultipleModelMethod,
    pub segments: Vec<Segment>,
}

/// How participating segments are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MultipleModelMethod {
    SelectFirst,
    SelectAll,
    ModelChain,
    MajorityVote,
    WeightedMajorityVote,
    Average,
    WeightedAverage,
    Median,
    Max,
    Sum,
}

impl MultipleModelMethod {
    /// Whether the method needs numeric segment scores.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            MultipleModelMethod::Average
                | MultipleModelMethod::WeightedAverage
                | MultipleModelMethod::Median
                | MultipleModelMethod::Max
                | MultipleModelMethod::Sum
        )
    }
}

/// A gating predicate paired with one sub-model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Segment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub predicate: Predicate,
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Field name the segment's score is published under for `modelChain`.
    /// Defaults to the sub-model's name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_field: Option<String>,
    pub model: Model,
}

impl Segment {
    pub fn new(predicate: Predicate, model: impl Into<Model>) -> Self {
        Self {
            id: None,
            predicate,
            weight: 1.0,
            output_field: None,
            model: model.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_output_field(mut self, field: impl Into<String>) -> Self {
        self.output_field = Some(field.into());
        self
    }

    /// Name under which a chained segment publishes its score.
    pub fn output_name(&self) -> &str {
        self.output_field
            .as_deref()
            .unwrap_or_else(|| self.model.name())
    }
}

impl MiningModel {
    pub fn new(
        name: impl Into<String>,
        multiple_model_method: MultipleModelMethod,
        segments: Vec<Segment>,
    ) -> Self {
        Self {
            name: name.into(),
            segmentation: Segmentation {
                multiple_model_method,
                segments,
            },
        }
    }
}
