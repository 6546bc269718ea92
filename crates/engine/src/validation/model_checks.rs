//! Per-model structural checks: trees, rule sets and segmentations.
//!
//! Depth is counted the way the evaluator counts it: one level per tree
//! level, per compound rule and per mining segment.

use std::collections::HashSet;

use crate::schema::{
    MiningModel, MissingValueStrategy, Model, ModelDocument, MultipleModelMethod, Node,
    Predicate, Rule, RuleSetModel, ScoreDistribution, TreeModel,
};

use super::predicate_checks::{validate_predicate, FieldScope};
use super::ValidationResult;

const PROBABILITY_TOLERANCE: f64 = 1e-6;

pub(super) fn validate_models(doc: &ModelDocument, max_depth: usize, result: &mut ValidationResult) {
    let scope = FieldScope::new(&doc.data_dictionary);
    let mut checker = ModelChecker {
        max_depth,
        result,
        depth_reported: false,
    };
    for (i, model) in doc.models.iter().enumerate() {
        checker.depth_reported = false;
        checker.model(model, &format!("models[{i}]"), &scope, 0);
    }
}

struct ModelChecker<'r> {
    max_depth: usize,
    result: &'r mut ValidationResult,
    /// Only the first over-deep location of each top-level model is reported.
    depth_reported: bool,
}

impl ModelChecker<'_> {
    fn model(&mut self, model: &Model, path: &str, scope: &FieldScope<'_>, depth: usize) {
        if !self.within_depth(depth, path) {
            return;
        }
        match model {
            Model::TreeModel(tree) => self.tree(tree, &format!("{path}.TreeModel"), scope, depth),
            Model::RuleSetModel(rules) => {
                self.rule_set(rules, &format!("{path}.RuleSetModel"), scope, depth)
            }
            Model::MiningModel(mining) => {
                self.mining(mining, &format!("{path}.MiningModel"), scope, depth)
            }
        }
    }

    fn within_depth(&mut self, depth: usize, path: &str) -> bool {
        if depth <= self.max_depth {
            return true;
        }
        if !self.depth_reported {
            self.depth_reported = true;
            self.result.error(
                path,
                format!("Nesting exceeds the maximum depth of {}", self.max_depth),
            );
        }
        false
    }

    // ── Trees ───────────────────────────────────────────────────────

    fn tree(&mut self, tree: &TreeModel, path: &str, scope: &FieldScope<'_>, depth: usize) {
        if !matches!(tree.node.predicate, Predicate::True) {
            self.result.warn(
                format!("{path}.node.predicate"),
                "Root node predicate is ignored; the root always matches",
            );
        }
        self.node(tree, &tree.node, &format!("{path}.node"), scope, depth);
    }

    fn node(
        &mut self,
        tree: &TreeModel,
        node: &Node,
        path: &str,
        scope: &FieldScope<'_>,
        depth: usize,
    ) {
        if !self.within_depth(depth, path) {
            return;
        }

        match (&node.score, node.is_leaf()) {
            (None, true) => self
                .result
                .error(format!("{path}.score"), "Terminal node has no score"),
            (None, false) => self.result.warn(
                format!("{path}.score"),
                "Node has no score; evaluation fails if no child matches",
            ),
            _ => {}
        }

        if let Some(id) = &node.default_child {
            if node.child(id).is_none() {
                self.result.error(
                    format!("{path}.defaultChild"),
                    format!("defaultChild '{id}' names no child of this node"),
                );
            }
        } else if tree.missing_value_strategy == MissingValueStrategy::DefaultChild
            && !node.is_leaf()
        {
            self.result.warn(
                format!("{path}.defaultChild"),
                "Strategy is defaultChild but this node declares none",
            );
        }

        let mut ids = HashSet::new();
        for (i, child) in node.nodes.iter().enumerate() {
            if let Some(id) = &child.id {
                if !ids.insert(id.as_str()) {
                    self.result.warn(
                        format!("{path}.nodes[{i}].id"),
                        format!("Duplicate sibling node id '{id}'"),
                    );
                }
            }
        }

        self.distributions(&node.score_distributions, &format!("{path}.scoreDistributions"));

        for (i, child) in node.nodes.iter().enumerate() {
            let child_path = format!("{path}.nodes[{i}]");
            validate_predicate(
                &child.predicate,
                &format!("{child_path}.predicate"),
                scope,
                self.result,
            );
            self.node(tree, child, &child_path, scope, depth + 1);
        }
    }

    // ── Rule sets ───────────────────────────────────────────────────

    fn rule_set(&mut self, model: &RuleSetModel, path: &str, scope: &FieldScope<'_>, depth: usize) {
        let rule_set = &model.rule_set;
        if rule_set.default_score.is_none() {
            self.result.warn(
                format!("{path}.ruleSet.defaultScore"),
                "Rule set has no defaultScore; evaluation fails when no rule fires",
            );
        }
        if let Some(confidence) = rule_set.default_confidence {
            if !(0.0..=1.0).contains(&confidence) {
                self.result.warn(
                    format!("{path}.ruleSet.defaultConfidence"),
                    format!("defaultConfidence {confidence} is outside [0, 1]"),
                );
            }
        }

        let mut ids = HashSet::new();
        self.rules(&rule_set.rules, &format!("{path}.ruleSet"), scope, depth, &mut ids);
    }

    fn rules<'m>(
        &mut self,
        rules: &'m [Rule],
        path: &str,
        scope: &FieldScope<'_>,
        depth: usize,
        ids: &mut HashSet<&'m str>,
    ) {
        if !self.within_depth(depth, path) {
            return;
        }

        for (i, rule) in rules.iter().enumerate() {
            match rule {
                Rule::Simple(simple) => {
                    let rule_path = format!("{path}.rules[{i}].SimpleRule");
                    if simple.id.is_empty() {
                        self.result
                            .error(format!("{rule_path}.id"), "Rule id must not be empty");
                    } else if !ids.insert(simple.id.as_str()) {
                        self.result.error(
                            format!("{rule_path}.id"),
                            format!("Duplicate rule id '{}'", simple.id),
                        );
                    }
                    if simple.weight < 0.0 {
                        self.result.error(
                            format!("{rule_path}.weight"),
                            format!("Rule weight must not be negative, got {}", simple.weight),
                        );
                    }
                    validate_predicate(
                        &simple.predicate,
                        &format!("{rule_path}.predicate"),
                        scope,
                        self.result,
                    );
                    self.distributions(
                        &simple.score_distributions,
                        &format!("{rule_path}.scoreDistributions"),
                    );
                }
                Rule::Compound(compound) => {
                    let rule_path = format!("{path}.rules[{i}].CompoundRule");
                    if compound.rules.is_empty() {
                        self.result
                            .warn(&rule_path, "Compound rule has no nested rules");
                    }
                    validate_predicate(
                        &compound.predicate,
                        &format!("{rule_path}.predicate"),
                        scope,
                        self.result,
                    );
                    self.rules(&compound.rules, &rule_path, scope, depth + 1, ids);
                }
            }
        }
    }

    // ── Segmentations ───────────────────────────────────────────────

    fn mining(&mut self, model: &MiningModel, path: &str, scope: &FieldScope<'_>, depth: usize) {
        let segmentation = &model.segmentation;
        let path = format!("{path}.segmentation");
        let method = segmentation.multiple_model_method;

        if segmentation.segments.is_empty() {
            self.result
                .error(format!("{path}.segments"), "Segmentation has no segments");
            return;
        }

        let mut chained: Vec<String> = Vec::new();
        for (i, segment) in segmentation.segments.iter().enumerate() {
            let segment_path = format!("{path}.segments[{i}]");
            if segment.weight < 0.0 {
                self.result.error(
                    format!("{segment_path}.weight"),
                    format!("Segment weight must not be negative, got {}", segment.weight),
                );
            }

            let segment_scope = scope.with_derived(chained.iter().cloned());
            validate_predicate(
                &segment.predicate,
                &format!("{segment_path}.predicate"),
                &segment_scope,
                self.result,
            );
            self.model(
                &segment.model,
                &format!("{segment_path}.model"),
                &segment_scope,
                depth + 1,
            );

            if method == MultipleModelMethod::ModelChain {
                chained.push(segment.output_name().to_string());
            }
        }

        if method == MultipleModelMethod::WeightedAverage
            && segmentation.segments.iter().all(|s| s.weight == 0.0)
        {
            self.result.error(
                format!("{path}.segments"),
                "weightedAverage needs at least one segment with a non-zero weight",
            );
        }
    }

    // ── Distributions ───────────────────────────────────────────────

    fn distributions(&mut self, entries: &[ScoreDistribution], path: &str) {
        if entries.is_empty() {
            return;
        }
        let mut values = HashSet::new();
        for (i, entry) in entries.iter().enumerate() {
            if !values.insert(entry.value.as_str()) {
                self.result.warn(
                    format!("{path}[{i}].value"),
                    format!("Duplicate distribution class '{}'", entry.value),
                );
            }
            if entry.record_count.is_some_and(|c| c < 0.0) {
                self.result.error(
                    format!("{path}[{i}].recordCount"),
                    "recordCount must not be negative",
                );
            }
        }

        if entries.iter().all(|e| e.probability.is_some()) {
            let sum: f64 = entries.iter().filter_map(|e| e.probability).sum();
            if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
                self.result.warn(
                    path,
                    format!("Probabilities sum to {sum}, expected 1"),
                );
            }
        }
    }
}
