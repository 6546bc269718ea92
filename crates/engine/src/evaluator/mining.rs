//! Mining model (ensemble) evaluation.
//!
//! Segments are visited in declared order. A segment participates only when
//! its gating predicate is True; its sub-model is then evaluated one level
//! deeper and the participating results are combined by the declared method.

use std::borrow::Cow;

use indexmap::IndexMap;
use sylva_core::{EvalError, Record, Result};
use tracing::{debug, trace};

use crate::coercion::{format_number, parse_number};
use crate::schema::{MiningModel, MultipleModelMethod};

use super::predicate::PredicateResult;
use super::result::{arg_max, normalize};
use super::{EvaluationResult, ModelEvaluator, SegmentResult};

pub(super) fn evaluate_mining(
    evaluator: &ModelEvaluator<'_>,
    model: &MiningModel,
    record: &Record,
    depth: usize,
) -> Result<EvaluationResult> {
    let method = model.segmentation.multiple_model_method;
    let predicates = evaluator.predicates();

    // modelChain feeds each segment the record extended with earlier outputs.
    let mut input: Cow<'_, Record> = Cow::Borrowed(record);
    let mut participants: Vec<SegmentResult> = Vec::new();

    for (index, segment) in model.segmentation.segments.iter().enumerate() {
        match predicates.evaluate(&segment.predicate, &input) {
            PredicateResult::True => {}
            gate => {
                debug!(model = %model.name, segment = index, ?gate, "segment does not participate");
                continue;
            }
        }

        let result = evaluator.evaluate_at(&segment.model, &input, depth + 1)?;
        trace!(model = %model.name, segment = index, score = %result.score, "segment scored");

        if method == MultipleModelMethod::ModelChain {
            input
                .to_mut()
                .insert(segment.output_name(), result.score.clone());
        }

        participants.push(SegmentResult {
            segment_id: segment.id.clone(),
            weight: segment.weight,
            result,
        });

        if method == MultipleModelMethod::SelectFirst {
            break;
        }
    }

    if participants.is_empty() {
        return Err(EvalError::Evaluation(format!(
            "no segment of mining model '{}' participated",
            model.name
        )));
    }

    let mut result = combine(&model.name, method, &participants)?;
    result.segments = participants;
    Ok(result)
}

// ── Combination ─────────────────────────────────────────────────────

fn combine(
    name: &str,
    method: MultipleModelMethod,
    participants: &[SegmentResult],
) -> Result<EvaluationResult> {
    if method.is_numeric() {
        let values = numeric_scores(name, method, participants)?;
        let value = aggregate(name, method, &values)?;
        return Ok(EvaluationResult::new(name, format_number(value)));
    }
    match method {
        MultipleModelMethod::SelectFirst => Ok(headline(name, &participants[0])),
        MultipleModelMethod::SelectAll | MultipleModelMethod::ModelChain => {
            Ok(headline(name, &participants[participants.len() - 1]))
        }
        MultipleModelMethod::MajorityVote => Ok(vote(name, participants, |_| 1.0)),
        MultipleModelMethod::WeightedMajorityVote => Ok(vote(name, participants, |s| s.weight)),
        numeric => Err(EvalError::Evaluation(format!(
            "{:?} has no scalar combination rule",
            numeric
        ))),
    }
}

/// Re-label a segment's result as the mining model's own result.
fn headline(name: &str, segment: &SegmentResult) -> EvaluationResult {
    let mut result = segment.result.clone();
    result.model = name.to_string();
    result.segments = Vec::new();
    result
}

fn vote(
    name: &str,
    participants: &[SegmentResult],
    weight: impl Fn(&SegmentResult) -> f64,
) -> EvaluationResult {
    let mut votes: IndexMap<String, f64> = IndexMap::new();
    for segment in participants {
        *votes.entry(segment.result.score.clone()).or_insert(0.0) += weight(segment);
    }

    // Ties go to the score that was voted for first.
    let winner = arg_max(&votes)
        .map(|(score, _)| score.clone())
        .unwrap_or_else(|| participants[0].result.score.clone());

    let distribution = normalize(&votes);
    let mut result = EvaluationResult::new(name, &winner);
    result.confidence = distribution.get(&winner).copied();
    result.distribution = distribution;
    result
}

/// `(value, weight)` per participating segment.
fn numeric_scores(
    name: &str,
    method: MultipleModelMethod,
    participants: &[SegmentResult],
) -> Result<Vec<(f64, f64)>> {
    participants
        .iter()
        .map(|segment| {
            parse_number(&segment.result.model, &segment.result.score)
                .map(|value| (value, segment.weight))
                .map_err(|e| {
                    EvalError::Evaluation(format!(
                        "mining model '{}' combines scores by {:?}: {}",
                        name, method, e
                    ))
                })
        })
        .collect()
}

fn aggregate(name: &str, method: MultipleModelMethod, values: &[(f64, f64)]) -> Result<f64> {
    let count = values.len() as f64;
    let value = match method {
        MultipleModelMethod::Average => values.iter().map(|(v, _)| v).sum::<f64>() / count,
        MultipleModelMethod::Sum => values.iter().map(|(v, _)| v).sum(),
        MultipleModelMethod::Max => values
            .iter()
            .map(|(v, _)| *v)
            .fold(f64::NEG_INFINITY, f64::max),
        MultipleModelMethod::Median => {
            let mut sorted: Vec<f64> = values.iter().map(|(v, _)| *v).collect();
            sorted.sort_by(f64::total_cmp);
            let mid = sorted.len() / 2;
            if sorted.len() % 2 == 0 {
                (sorted[mid - 1] + sorted[mid]) / 2.0
            } else {
                sorted[mid]
            }
        }
        MultipleModelMethod::WeightedAverage => {
            let total: f64 = values.iter().map(|(_, w)| w).sum();
            if total == 0.0 {
                return Err(EvalError::Evaluation(format!(
                    "participating segments of mining model '{}' have a total weight of zero",
                    name
                )));
            }
            values.iter().map(|(v, w)| v * w).sum::<f64>() / total
        }
        _ => {
            return Err(EvalError::Evaluation(format!(
                "{:?} is not a numeric combination",
                method
            )))
        }
    };
    Ok(value)
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        Model, Node, Predicate, RuleSet, RuleSetModel, Segment, SelectionMethod, SimpleRule,
        TreeModel,
    };
    use sylva_core::{DataDictionary, FieldSpec};

    fn dictionary() -> DataDictionary {
        DataDictionary::new()
            .with_field(FieldSpec::continuous("x"))
            .with_field(FieldSpec::categorical("color"))
    }

    /// A tree that always scores `score`.
    fn constant(name: &str, score: &str) -> TreeModel {
        TreeModel::new(name, Node::leaf(Predicate::True, score))
    }

    fn segment(gate: Predicate, name: &str, score: &str) -> Segment {
        Segment::new(gate, constant(name, score)).with_id(name)
    }

    fn eval(model: MiningModel, record: &Record) -> Result<EvaluationResult> {
        let dict = dictionary();
        ModelEvaluator::new(&dict).evaluate(&Model::MiningModel(model), record)
    }

    #[test]
    fn average_of_two_segments() {
        let model = MiningModel::new(
            "avg",
            MultipleModelMethod::Average,
            vec![
                segment(Predicate::True, "a", "2"),
                segment(Predicate::True, "b", "4"),
            ],
        );
        let result = eval(model, &Record::new()).unwrap();
        assert_eq!(result.score, "3");
        assert_eq!(result.segments.len(), 2);
    }

    #[test]
    fn gated_out_segment_does_not_participate() {
        let model = MiningModel::new(
            "avg",
            MultipleModelMethod::Average,
            vec![
                segment(Predicate::False, "a", "4"),
                segment(Predicate::True, "b", "2"),
            ],
        );
        let result = eval(model, &Record::new()).unwrap();
        assert_eq!(result.score, "2");
        assert_eq!(result.segments.len(), 1);
        assert_eq!(result.segments[0].segment_id.as_deref(), Some("b"));
    }

    #[test]
    fn unknown_gate_does_not_participate() {
        let model = MiningModel::new(
            "sum",
            MultipleModelMethod::Sum,
            vec![
                segment(Predicate::greater_or_equal("x", "0"), "a", "10"),
                segment(Predicate::True, "b", "1"),
            ],
        );
        assert_eq!(eval(model.clone(), &Record::new()).unwrap().score, "1");
        assert_eq!(eval(model, &Record::new().with("x", "5")).unwrap().score, "11");
    }

    #[test]
    fn no_participants_is_an_error() {
        let model = MiningModel::new(
            "empty",
            MultipleModelMethod::Average,
            vec![segment(Predicate::False, "a", "1")],
        );
        assert!(matches!(
            eval(model, &Record::new()),
            Err(EvalError::Evaluation(_))
        ));
    }

    #[test]
    fn select_first_stops_at_first_participant() {
        let model = MiningModel::new(
            "first",
            MultipleModelMethod::SelectFirst,
            vec![
                segment(Predicate::equal("color", "red"), "red", "warm"),
                segment(Predicate::True, "any", "neutral"),
                segment(Predicate::True, "unused", "never"),
            ],
        );
        let result = eval(model.clone(), &Record::new().with("color", "blue")).unwrap();
        assert_eq!(result.score, "neutral");
        assert_eq!(result.model, "first");
        assert_eq!(result.segments.len(), 1);

        let result = eval(model, &Record::new().with("color", "red")).unwrap();
        assert_eq!(result.score, "warm");
    }

    #[test]
    fn select_all_reports_last_and_lists_all() {
        let model = MiningModel::new(
            "all",
            MultipleModelMethod::SelectAll,
            vec![
                segment(Predicate::True, "a", "x"),
                segment(Predicate::True, "b", "y"),
            ],
        );
        let result = eval(model, &Record::new()).unwrap();
        assert_eq!(result.score, "y");
        let scores: Vec<_> = result.segments.iter().map(|s| s.result.score.as_str()).collect();
        assert_eq!(scores, vec!["x", "y"]);
    }

    #[test]
    fn model_chain_feeds_outputs_forward() {
        // Second segment reads the first segment's output.
        let doubler = TreeModel::new(
            "stage2",
            Node::new(Predicate::True)
                .with_score("low")
                .with_child(Node::leaf(Predicate::greater_or_equal("risk", "0.5"), "high")),
        );
        let model = MiningModel::new(
            "chain",
            MultipleModelMethod::ModelChain,
            vec![
                Segment::new(Predicate::True, constant("stage1", "0.8")).with_output_field("risk"),
                Segment::new(Predicate::True, doubler),
            ],
        );
        let result = eval(model, &Record::new()).unwrap();
        assert_eq!(result.score, "high");
        assert_eq!(result.segments.len(), 2);
    }

    #[test]
    fn model_chain_defaults_output_to_model_name() {
        let reader = RuleSetModel::new(
            "reader",
            RuleSet::new(
                SelectionMethod::FirstHit,
                vec![SimpleRule::new("seen", Predicate::equal("stage1", "yes"), "chained").into()],
            )
            .with_default("isolated"),
        );
        let model = MiningModel::new(
            "chain",
            MultipleModelMethod::ModelChain,
            vec![
                Segment::new(Predicate::True, constant("stage1", "yes")),
                Segment::new(Predicate::True, reader),
            ],
        );
        assert_eq!(eval(model, &Record::new()).unwrap().score, "chained");
    }

    #[test]
    fn select_all_does_not_chain() {
        let reader = RuleSetModel::new(
            "reader",
            RuleSet::new(
                SelectionMethod::FirstHit,
                vec![SimpleRule::new("seen", Predicate::equal("stage1", "yes"), "chained").into()],
            )
            .with_default("isolated"),
        );
        let model = MiningModel::new(
            "all",
            MultipleModelMethod::SelectAll,
            vec![
                Segment::new(Predicate::True, constant("stage1", "yes")),
                Segment::new(Predicate::True, reader),
            ],
        );
        assert_eq!(eval(model, &Record::new()).unwrap().score, "isolated");
    }

    #[test]
    fn majority_vote_counts_scores() {
        let model = MiningModel::new(
            "vote",
            MultipleModelMethod::MajorityVote,
            vec![
                segment(Predicate::True, "a", "cat"),
                segment(Predicate::True, "b", "dog"),
                segment(Predicate::True, "c", "dog"),
            ],
        );
        let result = eval(model, &Record::new()).unwrap();
        assert_eq!(result.score, "dog");
        assert_eq!(result.probability("cat"), Some(1.0 / 3.0));
        assert_eq!(result.confidence, Some(2.0 / 3.0));
    }

    #[test]
    fn weighted_majority_vote_uses_segment_weights() {
        let model = MiningModel::new(
            "vote",
            MultipleModelMethod::WeightedMajorityVote,
            vec![
                segment(Predicate::True, "a", "cat").with_weight(3.0),
                segment(Predicate::True, "b", "dog"),
                segment(Predicate::True, "c", "dog"),
            ],
        );
        assert_eq!(eval(model, &Record::new()).unwrap().score, "cat");
    }

    #[test]
    fn numeric_combinations() {
        let segments = || {
            vec![
                segment(Predicate::True, "a", "1").with_weight(1.0),
                segment(Predicate::True, "b", "7").with_weight(3.0),
                segment(Predicate::True, "c", "4").with_weight(0.0),
            ]
        };
        let run = |method| eval(MiningModel::new("m", method, segments()), &Record::new());

        assert_eq!(run(MultipleModelMethod::Average).unwrap().score, "4");
        assert_eq!(run(MultipleModelMethod::WeightedAverage).unwrap().score, "5.5");
        assert_eq!(run(MultipleModelMethod::Median).unwrap().score, "4");
        assert_eq!(run(MultipleModelMethod::Max).unwrap().score, "7");
        assert_eq!(run(MultipleModelMethod::Sum).unwrap().score, "12");
    }

    #[test]
    fn median_of_even_count_averages_middle_pair() {
        let model = MiningModel::new(
            "median",
            MultipleModelMethod::Median,
            vec![
                segment(Predicate::True, "a", "1"),
                segment(Predicate::True, "b", "10"),
                segment(Predicate::True, "c", "2"),
                segment(Predicate::True, "d", "3"),
            ],
        );
        assert_eq!(eval(model, &Record::new()).unwrap().score, "2.5");
    }

    #[test]
    fn numeric_method_over_labels_is_an_error() {
        let model = MiningModel::new(
            "avg",
            MultipleModelMethod::Average,
            vec![segment(Predicate::True, "a", "high")],
        );
        assert!(matches!(
            eval(model, &Record::new()),
            Err(EvalError::Evaluation(_))
        ));
    }

    #[test]
    fn zero_total_weight_is_an_error() {
        let model = MiningModel::new(
            "avg",
            MultipleModelMethod::WeightedAverage,
            vec![segment(Predicate::True, "a", "1").with_weight(0.0)],
        );
        assert!(matches!(
            eval(model, &Record::new()),
            Err(EvalError::Evaluation(_))
        ));
    }

    #[test]
    fn nested_mining_is_depth_guarded() {
        let mut model: Model = constant("leaf", "1").into();
        for level in 0..6 {
            model = MiningModel::new(
                format!("level{}", level),
                MultipleModelMethod::SelectFirst,
                vec![Segment::new(Predicate::True, model)],
            )
            .into();
        }
        let dict = dictionary();
        assert!(matches!(
            ModelEvaluator::new(&dict)
                .with_max_depth(3)
                .evaluate(&model, &Record::new()),
            Err(EvalError::Structural(_))
        ));
        assert_eq!(
            ModelEvaluator::new(&dict)
                .evaluate(&model, &Record::new())
                .unwrap()
                .score,
            "1"
        );
    }
}
