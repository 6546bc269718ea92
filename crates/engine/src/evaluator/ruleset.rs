//! Rule set evaluation.
//!
//! Rules are considered in declared order. A rule fires only when its
//! predicate is True; False and Unknown rules contribute nothing. Compound
//! rules gate their nested rules behind their own predicate.

use indexmap::IndexMap;
use sylva_core::{EvalError, Record, Result};
use tracing::{debug, trace};

use crate::coercion::{format_number, parse_number};
use crate::schema::{Rule, RuleSetModel, SelectionMethod, SimpleRule};

use super::predicate::{PredicateEvaluator, PredicateResult};
use super::result::{arg_max, normalize, to_distribution};
use super::{EvaluationResult, ModelEvaluator};

pub(super) fn evaluate_rule_set(
    evaluator: &ModelEvaluator<'_>,
    model: &RuleSetModel,
    record: &Record,
    depth: usize,
) -> Result<EvaluationResult> {
    let rule_set = &model.rule_set;
    let first_only = rule_set.selection_method == SelectionMethod::FirstHit;

    let mut fired = Vec::new();
    let walk = RuleWalk {
        evaluator,
        predicates: evaluator.predicates(),
        model: &model.name,
        record,
        first_only,
    };
    walk.collect(&rule_set.rules, depth, &mut fired)?;

    if fired.is_empty() {
        return default_result(model);
    }
    trace!(model = %model.name, fired = fired.len(), "rules fired");

    match rule_set.selection_method {
        SelectionMethod::FirstHit => Ok(rule_result(&model.name, fired[0])),
        SelectionMethod::WeightedMax => {
            let mut best = fired[0];
            for &rule in &fired[1..] {
                if rule.weight > best.weight {
                    best = rule;
                }
            }
            Ok(rule_result(&model.name, best))
        }
        SelectionMethod::WeightedSum => weighted_sum(&model.name, &fired),
        SelectionMethod::WeightedAverage => weighted_average(&model.name, &fired),
    }
}

// ── Rule walk ───────────────────────────────────────────────────────

struct RuleWalk<'e, 'a> {
    evaluator: &'e ModelEvaluator<'a>,
    predicates: PredicateEvaluator<'a>,
    model: &'e str,
    record: &'e Record,
    first_only: bool,
}

impl<'e, 'a> RuleWalk<'e, 'a> {
    /// Push fired simple rules onto `out`. Returns `true` once a first hit
    /// has been found and the walk should stop.
    fn collect<'m>(
        &self,
        rules: &'m [Rule],
        depth: usize,
        out: &mut Vec<&'m SimpleRule>,
    ) -> Result<bool> {
        self.evaluator.check_depth(depth, self.model)?;

        for rule in rules {
            match rule {
                Rule::Simple(simple) => {
                    if self.predicates.evaluate(&simple.predicate, self.record).is_true() {
                        trace!(model = self.model, rule = %simple.id, "rule fired");
                        out.push(simple);
                        if self.first_only {
                            return Ok(true);
                        }
                    }
                }
                Rule::Compound(compound) => {
                    match self.predicates.evaluate(&compound.predicate, self.record) {
                        PredicateResult::True => {
                            if self.collect(&compound.rules, depth + 1, out)? {
                                return Ok(true);
                            }
                        }
                        PredicateResult::Unknown => {
                            debug!(model = self.model, "compound rule predicate unknown, skipping");
                        }
                        PredicateResult::False => {}
                    }
                }
            }
        }
        Ok(false)
    }
}

// ── Selection ───────────────────────────────────────────────────────

fn rule_result(model: &str, rule: &SimpleRule) -> EvaluationResult {
    let mut result = EvaluationResult::new(model, &rule.score);
    result.confidence = Some(rule.confidence);
    result.distribution = to_distribution(&rule.score_distributions);
    result.entity_id = Some(rule.id.clone());
    result
}

fn weighted_sum(model: &str, fired: &[&SimpleRule]) -> Result<EvaluationResult> {
    let mut totals: IndexMap<String, f64> = IndexMap::new();
    for rule in fired {
        *totals.entry(rule.score.clone()).or_insert(0.0) += rule.weight;
    }

    let (winner, _) = arg_max(&totals)
        .ok_or_else(|| EvalError::Evaluation(format!("rule set '{}' has no weights", model)))?;
    let winner = winner.clone();

    let distribution = normalize(&totals);
    let mut result = EvaluationResult::new(model, &winner);
    result.confidence = distribution.get(&winner).copied();
    result.entity_id = fired
        .iter()
        .find(|rule| rule.score == winner)
        .map(|rule| rule.id.clone());
    result.distribution = distribution;
    Ok(result)
}

fn weighted_average(model: &str, fired: &[&SimpleRule]) -> Result<EvaluationResult> {
    let mut weighted = 0.0;
    let mut confidence = 0.0;
    let mut total_weight = 0.0;

    for rule in fired {
        let value = parse_number(&rule.id, &rule.score).map_err(|e| {
            EvalError::Evaluation(format!("rule set '{}' uses weightedAverage: {}", model, e))
        })?;
        weighted += value * rule.weight;
        confidence += rule.confidence * rule.weight;
        total_weight += rule.weight;
    }

    if total_weight == 0.0 {
        return Err(EvalError::Evaluation(format!(
            "fired rules of rule set '{}' have a total weight of zero",
            model
        )));
    }

    let mut result = EvaluationResult::new(model, format_number(weighted / total_weight));
    result.confidence = Some(confidence / total_weight);
    Ok(result)
}

fn default_result(model: &RuleSetModel) -> Result<EvaluationResult> {
    let rule_set = &model.rule_set;
    match &rule_set.default_score {
        Some(score) => {
            debug!(model = %model.name, "no rule fired, using default score");
            let mut result = EvaluationResult::new(&model.name, score);
            result.confidence = rule_set.default_confidence;
            Ok(result)
        }
        None => Err(EvalError::Evaluation(format!(
            "no rule of rule set '{}' fired and no defaultScore is declared",
            model.name
        ))),
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CompoundRule, Model, Predicate, RuleSet};
    use sylva_core::{DataDictionary, FieldSpec};

    fn dictionary() -> DataDictionary {
        DataDictionary::new()
            .with_field(FieldSpec::categorical("color"))
            .with_field(FieldSpec::continuous("speed"))
    }

    fn eval(model: RuleSetModel, record: &Record) -> Result<EvaluationResult> {
        let dict = dictionary();
        ModelEvaluator::new(&dict).evaluate(&Model::RuleSetModel(model), record)
    }

    fn traffic_light() -> RuleSetModel {
        RuleSetModel::new(
            "traffic",
            RuleSet::new(
                SelectionMethod::FirstHit,
                vec![
                    SimpleRule::new("R1", Predicate::equal("color", "red"), "stop").into(),
                    SimpleRule::new("R2", Predicate::True, "go").into(),
                ],
            ),
        )
    }

    #[test]
    fn first_hit_stops_on_red() {
        let result = eval(traffic_light(), &Record::new().with("color", "red")).unwrap();
        assert_eq!(result.score, "stop");
        assert_eq!(result.entity_id.as_deref(), Some("R1"));

        let result = eval(traffic_light(), &Record::new().with("color", "blue")).unwrap();
        assert_eq!(result.score, "go");
        assert_eq!(result.entity_id.as_deref(), Some("R2"));
    }

    #[test]
    fn unknown_rules_do_not_fire() {
        // Missing color makes R1 Unknown, so R2 wins.
        let result = eval(traffic_light(), &Record::new()).unwrap();
        assert_eq!(result.score, "go");
    }

    #[test]
    fn nothing_fired_without_default_is_an_error() {
        let model = RuleSetModel::new(
            "strict",
            RuleSet::new(
                SelectionMethod::FirstHit,
                vec![SimpleRule::new("R1", Predicate::equal("color", "red"), "stop").into()],
            ),
        );
        assert!(matches!(
            eval(model, &Record::new().with("color", "blue")),
            Err(EvalError::Evaluation(_))
        ));
    }

    #[test]
    fn default_score_and_confidence() {
        let mut rule_set = RuleSet::new(
            SelectionMethod::FirstHit,
            vec![SimpleRule::new("R1", Predicate::equal("color", "red"), "stop").into()],
        )
        .with_default("go");
        rule_set.default_confidence = Some(0.4);

        let result = eval(
            RuleSetModel::new("defaulted", rule_set),
            &Record::new().with("color", "green"),
        )
        .unwrap();
        assert_eq!(result.score, "go");
        assert_eq!(result.confidence, Some(0.4));
        assert_eq!(result.entity_id, None);
    }

    #[test]
    fn weighted_sum_groups_by_score() {
        let model = RuleSetModel::new(
            "votes",
            RuleSet::new(
                SelectionMethod::WeightedSum,
                vec![
                    SimpleRule::new("a", Predicate::True, "yes").with_weight(1.0).into(),
                    SimpleRule::new("b", Predicate::True, "no").with_weight(1.5).into(),
                    SimpleRule::new("c", Predicate::True, "yes").with_weight(1.0).into(),
                    SimpleRule::new("d", Predicate::False, "no").with_weight(5.0).into(),
                ],
            ),
        );
        let result = eval(model, &Record::new()).unwrap();
        assert_eq!(result.score, "yes");
        assert_eq!(result.entity_id.as_deref(), Some("a"));
        assert_eq!(result.probability("yes"), Some(2.0 / 3.5));
        assert_eq!(result.confidence, Some(2.0 / 3.5));
    }

    #[test]
    fn weighted_sum_tie_goes_to_first_declared() {
        let model = RuleSetModel::new(
            "tie",
            RuleSet::new(
                SelectionMethod::WeightedSum,
                vec![
                    SimpleRule::new("a", Predicate::True, "left").into(),
                    SimpleRule::new("b", Predicate::True, "right").into(),
                ],
            ),
        );
        assert_eq!(eval(model, &Record::new()).unwrap().score, "left");
    }

    #[test]
    fn weighted_average_of_numeric_scores() {
        let model = RuleSetModel::new(
            "avg",
            RuleSet::new(
                SelectionMethod::WeightedAverage,
                vec![
                    SimpleRule::new("a", Predicate::True, "10").with_weight(1.0).into(),
                    SimpleRule::new("b", Predicate::True, "40").with_weight(2.0).into(),
                    SimpleRule::new("c", Predicate::is_missing("speed"), "1000").into(),
                ],
            ),
        );
        let result = eval(model, &Record::new().with("speed", "3")).unwrap();
        assert_eq!(result.score, "30");
        assert_eq!(result.confidence, Some(1.0));
    }

    #[test]
    fn weighted_average_rejects_labels() {
        let model = RuleSetModel::new(
            "avg",
            RuleSet::new(
                SelectionMethod::WeightedAverage,
                vec![SimpleRule::new("a", Predicate::True, "high").into()],
            ),
        );
        assert!(matches!(
            eval(model, &Record::new()),
            Err(EvalError::Evaluation(_))
        ));
    }

    #[test]
    fn weighted_max_picks_heaviest_rule() {
        let model = RuleSetModel::new(
            "max",
            RuleSet::new(
                SelectionMethod::WeightedMax,
                vec![
                    SimpleRule::new("a", Predicate::True, "low").with_weight(0.2).into(),
                    SimpleRule::new("b", Predicate::True, "high")
                        .with_weight(0.9)
                        .with_confidence(0.7)
                        .into(),
                    SimpleRule::new("c", Predicate::True, "mid").with_weight(0.9).into(),
                ],
            ),
        );
        let result = eval(model, &Record::new()).unwrap();
        assert_eq!(result.score, "high");
        assert_eq!(result.confidence, Some(0.7));
    }

    #[test]
    fn compound_rules_gate_nested_rules() {
        let model = RuleSetModel::new(
            "nested",
            RuleSet::new(
                SelectionMethod::FirstHit,
                vec![
                    CompoundRule {
                        predicate: Predicate::equal("color", "red"),
                        rules: vec![
                            SimpleRule::new("fast", Predicate::greater_or_equal("speed", "50"), "brake")
                                .into(),
                            SimpleRule::new("slow", Predicate::True, "stop").into(),
                        ],
                    }
                    .into(),
                    SimpleRule::new("other", Predicate::True, "go").into(),
                ],
            )
            .with_default("idle"),
        );
        let red_fast = Record::new().with("color", "red").with("speed", "80");
        let red_slow = Record::new().with("color", "red").with("speed", "10");
        let green = Record::new().with("color", "green").with("speed", "80");

        assert_eq!(eval(model.clone(), &red_fast).unwrap().score, "brake");
        assert_eq!(eval(model.clone(), &red_slow).unwrap().score, "stop");
        assert_eq!(eval(model, &green).unwrap().score, "go");
    }

    #[test]
    fn compound_nesting_is_depth_guarded() {
        let mut rules: Vec<Rule> = vec![SimpleRule::new("leaf", Predicate::True, "deep").into()];
        for _ in 0..8 {
            rules = vec![CompoundRule {
                predicate: Predicate::True,
                rules,
            }
            .into()];
        }
        let model = Model::RuleSetModel(RuleSetModel::new(
            "nested",
            RuleSet::new(SelectionMethod::FirstHit, rules),
        ));
        let dict = dictionary();

        assert!(matches!(
            ModelEvaluator::new(&dict)
                .with_max_depth(4)
                .evaluate(&model, &Record::new()),
            Err(EvalError::Structural(_))
        ));
        assert_eq!(
            ModelEvaluator::new(&dict)
                .evaluate(&model, &Record::new())
                .unwrap()
                .score,
            "deep"
        );
    }
}
