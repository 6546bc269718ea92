//! Rule set model types.

use serde::{Deserialize, Serialize};

use super::{default_weight, Predicate, ScoreDistribution};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleSetModel {
    #[serde(rename = "modelName")]
    pub name: String,
    pub rule_set: RuleSet,
}

/// Ordered rules plus the selection method and default outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuleSet {
    #[serde(default)]
    pub selection_method: SelectionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_score: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_confidence: Option<f64>,
    pub rules: Vec<Rule>,
}

/// How fired rules are turned into one result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionMethod {
    /// First rule (in declared order) whose predicate is True.
    #[default]
    FirstHit,
    /// Sum of weights per distinct score; the highest total wins.
    WeightedSum,
    /// Weighted mean of the fired rules' numeric scores.
    WeightedAverage,
    /// Fired rule with the highest weight wins.
    WeightedMax,
}

/// A simple rule, or a compound rule nesting further rules behind a predicate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Rule {
    #[serde(rename = "SimpleRule")]
    Simple(SimpleRule),
    #[serde(rename = "CompoundRule")]
    Compound(CompoundRule),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SimpleRule {
    pub id: String,
    pub predicate: Predicate,
    pub score: String,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default = "default_weight")]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub score_distributions: Vec<ScoreDistribution>,
}

/// Nested rules, considered only when `predicate` is True.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompoundRule {
    #[serde(default)]
    pub predicate: Predicate,
    pub rules: Vec<Rule>,
}

impl SimpleRule {
    pub fn new(id: impl Into<String>, predicate: Predicate, score: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            predicate,
            score: score.into(),
            weight: 1.0,
            confidence: 1.0,
            score_distributions: Vec::new(),
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }
}

impl RuleSet {
    pub fn new(selection_method: SelectionMethod, rules: Vec<Rule>) -> Self {
        Self {
            selection_method,
            default_score: None,
            default_confidence: None,
            rules,
        }
    }

    pub fn with_default(mut self, score: impl Into<String>) -> Self {
        self.default_score = Some(score.into());
        self
    }
}

impl RuleSetModel {
    pub fn new(name: impl Into<String>, rule_set: RuleSet) -> Self {
        Self {
            name: name.into(),
            rule_set,
        }
    }
}

impl From<SimpleRule> for Rule {
    fn from(rule: SimpleRule) -> Self {
        Rule::Simple(rule)
    }
}

impl From<CompoundRule> for Rule {
    fn from(rule: CompoundRule) -> Self {
        Rule::Compound(rule)
    }
}
