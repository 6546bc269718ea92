//! Decision tree model types.

use serde::{Deserialize, Serialize};

use super::{Predicate, ScoreDistribution};

/// A decision tree: one root node plus the traversal strategies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TreeModel {
    #[serde(rename = "modelName")]
    pub name: String,
    #[serde(default)]
    pub missing_value_strategy: MissingValueStrategy,
    #[serde(default)]
    pub no_true_child_strategy: NoTrueChildStrategy,
    /// Root node; its predicate is assumed to hold.
    pub node: Node,
}

/// What to do when a child's predicate evaluates to Unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingValueStrategy {
    /// Treat the child as a non-match and try the next sibling.
    #[default]
    #[serde(rename = "none")]
    Skip,
    /// Stop and return the current node's score.
    LastPrediction,
    /// Stop and fail the evaluation.
    NullPrediction,
    /// Descend into the current node's declared `defaultChild`.
    DefaultChild,
}

/// What to do when no child of a non-leaf node matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoTrueChildStrategy {
    #[default]
    ReturnLastPrediction,
    ReturnNullPrediction,
}

/// A tree node. Terminal when it has no children.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Node {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    #[serde(default)]
    pub predicate: Predicate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_child: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub score_distributions: Vec<ScoreDistribution>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,
}

impl Node {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            ..Self::default()
        }
    }

    pub fn leaf(predicate: Predicate, score: impl Into<String>) -> Self {
        Self::new(predicate).with_score(score)
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_score(mut self, score: impl Into<String>) -> Self {
        self.score = Some(score.into());
        self
    }

    pub fn with_default_child(mut self, id: impl Into<String>) -> Self {
        self.default_child = Some(id.into());
        self
    }

    pub fn with_distribution(mut self, distribution: Vec<ScoreDistribution>) -> Self {
        self.score_distributions = distribution;
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.nodes.push(child);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The child whose `id` matches.
    pub fn child(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id.as_deref() == Some(id))
    }
}

impl TreeModel {
    pub fn new(name: impl Into<String>, node: Node) -> Self {
        Self {
            name: name.into(),
            missing_value_strategy: MissingValueStrategy::default(),
            no_true_child_strategy: NoTrueChildStrategy::default(),
            node,
        }
    }

    pub fn with_missing_value_strategy(mut self, strategy: MissingValueStrategy) -> Self {
        self.missing_value_strategy = strategy;
        self
    }

    pub fn with_no_true_child_strategy(mut self, strategy: NoTrueChildStrategy) -> Self {
        self.no_true_child_strategy = strategy;
        self
    }
}
