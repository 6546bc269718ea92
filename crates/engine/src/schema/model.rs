//! The closed set of model variants.

use serde::{Deserialize, Serialize};

use super::{MiningModel, ModelKind, RuleSetModel, TreeModel};

/// A top-level or segment-level model.
///
/// Externally tagged by element name, e.g. `TreeModel: { modelName: ..., node: ... }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Model {
    TreeModel(TreeModel),
    RuleSetModel(RuleSetModel),
    MiningModel(MiningModel),
}

impl Model {
    /// Model name, unique within its document.
    pub fn name(&self) -> &str {
        match self {
            Model::TreeModel(m) => &m.name,
            Model::RuleSetModel(m) => &m.name,
            Model::MiningModel(m) => &m.name,
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Model::TreeModel(_) => ModelKind::TreeModel,
            Model::RuleSetModel(_) => ModelKind::RuleSetModel,
            Model::MiningModel(_) => ModelKind::MiningModel,
        }
    }

    pub fn as_tree(&self) -> Option<&TreeModel> {
        match self {
            Model::TreeModel(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_rule_set(&self) -> Option<&RuleSetModel> {
        match self {
            Model::RuleSetModel(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_mining(&self) -> Option<&MiningModel> {
        match self {
            Model::MiningModel(m) => Some(m),
            _ => None,
        }
    }
}

impl From<TreeModel> for Model {
    fn from(m: TreeModel) -> Self {
        Model::TreeModel(m)
    }
}

impl From<RuleSetModel> for Model {
    fn from(m: RuleSetModel) -> Self {
        Model::RuleSetModel(m)
    }
}

impl From<MiningModel> for Model {
    fn from(m: MiningModel) -> Self {
        Model::MiningModel(m)
    }
}
