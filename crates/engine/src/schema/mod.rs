//! Model document schema types with serde (de)serialization.
//!
//! Defines the complete type hierarchy for model documents:
//! - `DocumentEnvelope`: lightweight first-pass header (apiVersion, kind, metadata)
//! - `ModelDocument`: data dictionary plus the top-level models
//! - `Model`: tree, rule set or mining model, externally tagged by element name
//! - `Predicate`: constant, simple, set-membership and compound predicates
//!
//! All structures are built once at load time and never mutated by evaluation.

mod distribution;
mod document;
mod envelope;
mod kind;
mod metadata;
mod mining;
mod model;
mod predicate;
mod ruleset;
mod tree;

pub mod yaml;

pub use distribution::*;
pub use document::*;
pub use envelope::*;
pub use kind::*;
pub use metadata::*;
pub use mining::*;
pub use model::*;
pub use predicate::*;
pub use ruleset::*;
pub use tree::*;


pub(crate) fn default_weight() -> f64 {
    1.0
}
