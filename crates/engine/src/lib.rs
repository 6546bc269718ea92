//! Interpreter for declarative predictive models.
//!
//! This crate provides:
//! - serde schema for model documents (tree, rule set and mining models)
//! - type coercion of raw record values to declared field types
//! - tri-state predicate evaluation, tree traversal, rule firing and
//!   segment combination
//! - a name-indexed model registry as the evaluation entry point
//! - filesystem loader with validation and hot-reload via `notify`

pub mod coercion;
pub mod evaluator;
pub mod loader;
pub mod registry;
pub mod schema;
pub mod validation;

pub use evaluator::{EvaluationResult, ModelEvaluator, PredicateEvaluator, PredicateResult};
pub use registry::ModelRegistry;
pub use schema::{Model, ModelDocument, Predicate};
