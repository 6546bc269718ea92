//! Behavioural scenarios: Kleene truth tables, missing-value handling and
//! the canonical tree / rule set / mining examples built in code.

use sylva_core::{DataDictionary, FieldSpec, Record};
use sylva_engine::schema::{
    BooleanOperator, DocumentMetadata, MiningModel, MultipleModelMethod, Node, Operator,
    RuleSet, RuleSetModel, Segment, SelectionMethod, SimpleRule, TreeModel,
};
use sylva_engine::{ModelDocument, ModelRegistry, Predicate, PredicateEvaluator, PredicateResult};

const VALUES: [PredicateResult; 3] = [
    PredicateResult::True,
    PredicateResult::False,
    PredicateResult::Unknown,
];

/// A predicate that evaluates to `value` against an empty record.
fn constant(value: PredicateResult) -> Predicate {
    match value {
        PredicateResult::True => Predicate::True,
        PredicateResult::False => Predicate::False,
        PredicateResult::Unknown => Predicate::less_than("absent", "1"),
    }
}

fn as_option(value: PredicateResult) -> Option<bool> {
    match value {
        PredicateResult::True => Some(true),
        PredicateResult::False => Some(false),
        PredicateResult::Unknown => None,
    }
}

fn from_option(value: Option<bool>) -> PredicateResult {
    value.map_or(PredicateResult::Unknown, PredicateResult::from_bool)
}

fn kleene(op: BooleanOperator, a: PredicateResult, b: PredicateResult) -> PredicateResult {
    let (a, b) = (as_option(a), as_option(b));
    from_option(match op {
        BooleanOperator::And => match (a, b) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        BooleanOperator::Or => match (a, b) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
        BooleanOperator::Xor => match (a, b) {
            (Some(x), Some(y)) => Some(x != y),
            _ => None,
        },
        BooleanOperator::Surrogate => unreachable!("not a binary connective"),
    })
}

// ── Kleene logic ────────────────────────────────────────────

#[test]
fn kleene_truth_tables() {
    let dictionary = DataDictionary::new();
    let evaluator = PredicateEvaluator::new(&dictionary);
    let record = Record::new();

    let mut cases = 0;
    for op in [BooleanOperator::And, BooleanOperator::Or, BooleanOperator::Xor] {
        for a in VALUES {
            for b in VALUES {
                let predicate = Predicate::compound(op, vec![constant(a), constant(b)]);
                assert_eq!(
                    evaluator.evaluate(&predicate, &record),
                    kleene(op, a, b),
                    "{op} over ({a:?}, {b:?})"
                );
                cases += 1;
            }
        }
    }
    assert_eq!(cases, 27);
}

#[test]
fn is_missing_and_is_not_missing_are_complementary() {
    let dictionary = DataDictionary::new()
        .with_field(FieldSpec::continuous("age").with_missing_values(["NA"]));
    let evaluator = PredicateEvaluator::new(&dictionary);

    let records = [
        Record::new(),
        Record::new().with("age", "10"),
        Record::new().with("age", "NA"),
        Record::new().with("age", "not a number"),
        Record::new().with("age", ""),
    ];
    for record in &records {
        let missing = evaluator.evaluate(&Predicate::is_missing("age"), record);
        let present = evaluator.evaluate(&Predicate::is_not_missing("age"), record);
        assert!(!missing.is_unknown(), "{record:?}");
        assert_eq!(missing.negate(), present, "{record:?}");
    }
}

#[test]
fn non_numeric_comparison_is_unknown_not_an_error() {
    let dictionary = DataDictionary::new().with_field(FieldSpec::continuous("income"));
    let evaluator = PredicateEvaluator::new(&dictionary);
    let record = Record::new().with("income", "plenty");

    let comparison = Predicate::simple("income", Operator::GreaterThan, "1000");
    assert_eq!(evaluator.evaluate(&comparison, &record), PredicateResult::Unknown);

    let gated = Predicate::and(vec![comparison, Predicate::True]);
    assert_eq!(evaluator.evaluate(&gated, &record), PredicateResult::Unknown);
}

// ── Canonical models ────────────────────────────────────────

fn registry(doc: ModelDocument) -> ModelRegistry {
    ModelRegistry::from_document(doc).unwrap()
}

fn age_tree() -> ModelDocument {
    let tree = TreeModel::new(
        "age",
        Node::new(Predicate::True)
            .with_id("root")
            .with_child(Node::leaf(Predicate::less_than("age", "18"), "child").with_id("young"))
            .with_child(Node::leaf(Predicate::True, "grown").with_id("rest")),
    );
    ModelDocument::new(DocumentMetadata::new("age", "Age"))
        .with_field(FieldSpec::continuous("age"))
        .with_model(tree)
}

#[test]
fn tree_scenario() {
    let registry = registry(age_tree());

    let young = registry.evaluate("age", &Record::new().with("age", "10")).unwrap();
    assert_eq!(young.score, "child");
    assert_eq!(young.entity_id.as_deref(), Some("young"));

    let absent = registry.evaluate("age", &Record::new()).unwrap();
    assert_eq!(absent.score, "grown");
    assert_eq!(absent.entity_id.as_deref(), Some("rest"));
}

#[test]
fn tree_traversal_is_deterministic() {
    let registry = registry(age_tree());
    for age in ["3", "17", "18", "99", "abc"] {
        let record = Record::new().with("age", age);
        let first = registry.evaluate("age", &record).unwrap();
        let second = registry.evaluate("age", &record).unwrap();
        assert_eq!(first, second, "age {age}");
    }
}

#[test]
fn rule_set_scenario() {
    let rules = RuleSet::new(
        SelectionMethod::FirstHit,
        vec![
            SimpleRule::new("R1", Predicate::equal("color", "red"), "stop").into(),
            SimpleRule::new("R2", Predicate::True, "go").into(),
        ],
    );
    let doc = ModelDocument::new(DocumentMetadata::new("lights", "Lights"))
        .with_field(FieldSpec::categorical("color"))
        .with_model(RuleSetModel::new("traffic", rules));
    let registry = registry(doc);

    let red = registry.evaluate("traffic", &Record::new().with("color", "red")).unwrap();
    assert_eq!(red.score, "stop");
    let blue = registry.evaluate("traffic", &Record::new().with("color", "blue")).unwrap();
    assert_eq!(blue.score, "go");
}

fn averaging(gate: Predicate) -> ModelDocument {
    let mining = MiningModel::new(
        "avg",
        MultipleModelMethod::Average,
        vec![
            Segment::new(gate, TreeModel::new("two", Node::leaf(Predicate::True, "2"))),
            Segment::new(Predicate::True, TreeModel::new("four", Node::leaf(Predicate::True, "4"))),
        ],
    );
    ModelDocument::new(DocumentMetadata::new("avg", "Average")).with_model(mining)
}

#[test]
fn mining_average_scenario() {
    let both = registry(averaging(Predicate::True))
        .evaluate("avg", &Record::new())
        .unwrap();
    assert_eq!(both.numeric_score(), Some(3.0));

    let one = registry(averaging(Predicate::False))
        .evaluate("avg", &Record::new())
        .unwrap();
    assert_eq!(one.numeric_score(), Some(4.0));
    assert_eq!(one.segments.len(), 1);
}

// ── Concurrency ─────────────────────────────────────────────

#[test]
fn shared_registry_serves_many_threads() {
    let registry = std::sync::Arc::new(registry(age_tree()));
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                (0..200)
                    .map(|n| {
                        let age = (i * 200 + n) % 40;
                        let record = Record::new().with("age", age.to_string());
                        let expected = if age < 18 { "child" } else { "grown" };
                        registry.evaluate("age", &record).unwrap().score == expected
                    })
                    .all(|ok| ok)
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}

#[test]
fn batch_matches_sequential_evaluation() {
    let registry = registry(age_tree());
    let records: Vec<Record> = (0..50)
        .map(|age| Record::new().with("age", age.to_string()))
        .collect();
    let batch = registry.evaluate_batch("age", &records).unwrap();
    for (record, result) in records.iter().zip(batch) {
        assert_eq!(result.unwrap(), registry.evaluate("age", record).unwrap());
    }
}
