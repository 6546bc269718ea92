//! Model evaluation: predicates, tree traversal, rule firing and segment
//! combination.
//!
//! Evaluation is synchronous and read-only over the model graph. The same
//! model can be evaluated concurrently from many threads, each with its own
//! record. Nesting depth (tree levels, compound rules, mining segments) is
//! bounded by a configurable guard that fails with a structural error
//! instead of recursing without limit.

mod mining;
mod predicate;
mod result;
mod ruleset;
mod tree;

use sylva_core::config::DEFAULT_MAX_DEPTH;
use sylva_core::{EvalError, FieldLookup, Record, Result};
use tracing::trace;

use crate::schema::Model;

pub use predicate::{PredicateEvaluator, PredicateResult};
pub use result::{to_distribution, Distribution, EvaluationResult, SegmentResult};

// ── Model evaluator ─────────────────────────────────────────────────

/// Evaluates models against records, dispatching on the model kind.
#[derive(Clone, Copy)]
pub struct ModelEvaluator<'a> {
    fields: &'a dyn FieldLookup,
    max_depth: usize,
}

impl<'a> ModelEvaluator<'a> {
    pub fn new(fields: &'a dyn FieldLookup) -> Self {
        Self {
            fields,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Predicate evaluator sharing this evaluator's field dictionary.
    pub fn predicates(&self) -> PredicateEvaluator<'a> {
        PredicateEvaluator::new(self.fields)
    }

    /// Evaluate one model against one record.
    pub fn evaluate(&self, model: &Model, record: &Record) -> Result<EvaluationResult> {
        self.evaluate_at(model, record, 0)
    }

    pub(crate) fn evaluate_at(
        &self,
        model: &Model,
        record: &Record,
        depth: usize,
    ) -> Result<EvaluationResult> {
        self.check_depth(depth, model.name())?;
        trace!(model = model.name(), kind = %model.kind(), depth, "evaluating model");
        match model {
            Model::TreeModel(tree) => tree::evaluate_tree(self, tree, record, depth),
            Model::RuleSetModel(rules) => ruleset::evaluate_rule_set(self, rules, record, depth),
            Model::MiningModel(mining) => mining::evaluate_mining(self, mining, record, depth),
        }
    }

    pub(crate) fn check_depth(&self, depth: usize, model: &str) -> Result<()> {
        if depth > self.max_depth {
            return Err(EvalError::Structural(format!(
                "model '{}' nests deeper than the maximum depth of {}",
                model, self.max_depth
            )));
        }
        Ok(())
    }
}
