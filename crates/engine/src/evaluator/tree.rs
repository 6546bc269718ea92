//! Decision tree traversal.
//!
//! Starting at the root, children are tested in declared order and the
//! traversal descends into the first child whose predicate is True. Unknown
//! children are handled by the tree's missing value strategy. When no child
//! matches, the current node's own score is the result.

use sylva_core::{EvalError, Record, Result};
use tracing::{debug, trace};

use crate::schema::{MissingValueStrategy, Node, NoTrueChildStrategy, TreeModel};

use super::predicate::PredicateResult;
use super::result::to_distribution;
use super::{EvaluationResult, ModelEvaluator};

pub(super) fn evaluate_tree(
    evaluator: &ModelEvaluator<'_>,
    model: &TreeModel,
    record: &Record,
    depth: usize,
) -> Result<EvaluationResult> {
    let predicates = evaluator.predicates();
    let mut node = &model.node;
    let mut level = 0usize;

    loop {
        evaluator.check_depth(depth + level, &model.name)?;

        let mut next = None;
        for child in &node.nodes {
            match predicates.evaluate(&child.predicate, record) {
                PredicateResult::True => {
                    next = Some(child);
                    break;
                }
                PredicateResult::False => {}
                PredicateResult::Unknown => match model.missing_value_strategy {
                    MissingValueStrategy::Skip => {
                        debug!(model = %model.name, node = ?child.id, "unknown child predicate, skipping");
                    }
                    MissingValueStrategy::LastPrediction => {
                        debug!(model = %model.name, node = ?node.id, "unknown child predicate, returning last prediction");
                        return node_result(model, node);
                    }
                    MissingValueStrategy::NullPrediction => {
                        return Err(unknown_child(model, child));
                    }
                    MissingValueStrategy::DefaultChild => {
                        next = Some(default_child(model, node)?);
                        break;
                    }
                },
            }
        }

        match next {
            Some(child) => {
                trace!(model = %model.name, node = ?child.id, level, "descending");
                node = child;
                level += 1;
            }
            None if node.is_leaf() => return node_result(model, node),
            None => {
                return match model.no_true_child_strategy {
                    NoTrueChildStrategy::ReturnLastPrediction => node_result(model, node),
                    NoTrueChildStrategy::ReturnNullPrediction => Err(EvalError::Evaluation(format!(
                        "no child of node {} in tree '{}' matched",
                        describe(node),
                        model.name
                    ))),
                };
            }
        }
    }
}

fn default_child<'m>(model: &'m TreeModel, node: &'m Node) -> Result<&'m Node> {
    let id = node.default_child.as_deref().ok_or_else(|| {
        EvalError::Structural(format!(
            "node {} in tree '{}' has no defaultChild",
            describe(node),
            model.name
        ))
    })?;
    node.child(id).ok_or_else(|| {
        EvalError::Structural(format!(
            "defaultChild '{}' of node {} in tree '{}' is not one of its children",
            id,
            describe(node),
            model.name
        ))
    })
}

fn node_result(model: &TreeModel, node: &Node) -> Result<EvaluationResult> {
    let score = node.score.as_ref().ok_or_else(|| {
        EvalError::Structural(format!(
            "node {} in tree '{}' has no score",
            describe(node),
            model.name
        ))
    })?;

    let mut result = EvaluationResult::new(&model.name, score);
    result.distribution = to_distribution(&node.score_distributions);
    result.confidence = result.probability(score);
    result.entity_id = node.id.clone();
    Ok(result)
}

fn unknown_child(model: &TreeModel, child: &Node) -> EvalError {
    EvalError::Evaluation(format!(
        "predicate of node {} in tree '{}' is unknown and the strategy is nullPrediction",
        describe(child),
        model.name
    ))
}

fn describe(node: &Node) -> String {
    match &node.id {
        Some(id) => format!("'{}'", id),
        None => "<anonymous>".to_string(),
    }
}

// ── Tests ───────────────────────────────────────────────────────────
