//! Model kind enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three supported model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    TreeModel,
    RuleSetModel,
    MiningModel,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::TreeModel => write!(f, "TreeModel"),
            ModelKind::RuleSetModel => write!(f, "RuleSetModel"),
            ModelKind::MiningModel => write!(f, "MiningModel"),
        }
    }
}
