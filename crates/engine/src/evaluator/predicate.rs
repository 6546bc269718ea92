//! Tri-state predicate evaluation.
//!
//! Predicates evaluate to True, False or Unknown under Kleene logic. Missing
//! fields and unusable values make comparisons Unknown instead of failing,
//! so evaluation is total over any syntactically valid predicate.

use std::cmp::Ordering;

use serde::Serialize;
use sylva_core::{FieldLookup, Record};
use tracing::trace;

use crate::coercion::{coerce, coerce_field, is_missing, resolve_spec, TypedValue};
use crate::schema::{
    BooleanOperator, CompoundPredicate, Operator, Predicate, SetOperator, SimplePredicate,
    SimpleSetPredicate,
};

/// Outcome of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PredicateResult {
    True,
    False,
    Unknown,
}

impl PredicateResult {
    pub fn from_bool(value: bool) -> Self {
        if value {
            PredicateResult::True
        } else {
            PredicateResult::False
        }
    }

    pub fn is_true(self) -> bool {
        self == PredicateResult::True
    }

    pub fn is_unknown(self) -> bool {
        self == PredicateResult::Unknown
    }

    /// Kleene negation; Unknown stays Unknown.
    pub fn negate(self) -> Self {
        match self {
            PredicateResult::True => PredicateResult::False,
            PredicateResult::False => PredicateResult::True,
            PredicateResult::Unknown => PredicateResult::Unknown,
        }
    }
}

/// Evaluates predicates against records using a field dictionary.
#[derive(Clone, Copy)]
pub struct PredicateEvaluator<'a> {
    fields: &'a dyn FieldLookup,
}

impl<'a> PredicateEvaluator<'a> {
    pub fn new(fields: &'a dyn FieldLookup) -> Self {
        Self { fields }
    }

    pub fn evaluate(&self, predicate: &Predicate, record: &Record) -> PredicateResult {
        match predicate {
            Predicate::True => PredicateResult::True,
            Predicate::False => PredicateResult::False,
            Predicate::Simple(simple) => self.evaluate_simple(simple, record),
            Predicate::SetMembership(set) => self.evaluate_set(set, record),
            Predicate::Compound(compound) => self.evaluate_compound(compound, record),
        }
    }

    fn evaluate_simple(&self, predicate: &SimplePredicate, record: &Record) -> PredicateResult {
        let field = predicate.field.as_str();
        match predicate.operator {
            Operator::IsMissing => {
                return PredicateResult::from_bool(is_missing(record, field, self.fields))
            }
            Operator::IsNotMissing => {
                return PredicateResult::from_bool(!is_missing(record, field, self.fields))
            }
            _ => {}
        }

        let Some(literal) = predicate.value.as_deref() else {
            trace!(field, operator = %predicate.operator, "comparison without a value");
            return PredicateResult::Unknown;
        };

        let spec = resolve_spec(self.fields, field, Some(literal));
        let value = match coerce_field(record, &spec) {
            Ok(Some(value)) => value,
            Ok(None) => return PredicateResult::Unknown,
            Err(e) => {
                trace!(field, error = %e, "record value unusable, comparison is unknown");
                return PredicateResult::Unknown;
            }
        };
        let literal = match coerce(literal, &spec) {
            Ok(literal) => literal,
            Err(e) => {
                trace!(field, error = %e, "literal unusable, comparison is unknown");
                return PredicateResult::Unknown;
            }
        };

        compare(predicate.operator, &value, &literal)
    }

    fn evaluate_set(&self, predicate: &SimpleSetPredicate, record: &Record) -> PredicateResult {
        let field = predicate.field.as_str();
        let sample = predicate.values.first().map(String::as_str);
        let spec = resolve_spec(self.fields, field, sample);

        let value = match coerce_field(record, &spec) {
            Ok(Some(value)) => value,
            Ok(None) => return PredicateResult::Unknown,
            Err(e) => {
                trace!(field, error = %e, "record value unusable, membership is unknown");
                return PredicateResult::Unknown;
            }
        };

        // Set members that do not coerce can never match.
        let member = predicate
            .values
            .iter()
            .filter_map(|raw| coerce(raw, &spec).ok())
            .any(|candidate| value.equals(&candidate));

        match predicate.boolean_operator {
            SetOperator::IsIn => PredicateResult::from_bool(member),
            SetOperator::IsNotIn => PredicateResult::from_bool(!member),
        }
    }

    fn evaluate_compound(
        &self,
        predicate: &CompoundPredicate,
        record: &Record,
    ) -> PredicateResult {
        let children = &predicate.predicates;
        match predicate.boolean_operator {
            BooleanOperator::And => {
                let mut unknown = false;
                for child in children {
                    match self.evaluate(child, record) {
                        PredicateResult::False => return PredicateResult::False,
                        PredicateResult::Unknown => unknown = true,
                        PredicateResult::True => {}
                    }
                }
                if unknown {
                    PredicateResult::Unknown
                } else {
                    PredicateResult::True
                }
            }
            BooleanOperator::Or => {
                let mut unknown = false;
                for child in children {
                    match self.evaluate(child, record) {
                        PredicateResult::True => return PredicateResult::True,
                        PredicateResult::Unknown => unknown = true,
                        PredicateResult::False => {}
                    }
                }
                if unknown {
                    PredicateResult::Unknown
                } else {
                    PredicateResult::False
                }
            }
            BooleanOperator::Xor => {
                let mut parity = false;
                for child in children {
                    match self.evaluate(child, record) {
                        PredicateResult::Unknown => return PredicateResult::Unknown,
                        PredicateResult::True => parity = !parity,
                        PredicateResult::False => {}
                    }
                }
                PredicateResult::from_bool(parity)
            }
            BooleanOperator::Surrogate => children
                .iter()
                .map(|child| self.evaluate(child, record))
                .find(|result| !result.is_unknown())
                .unwrap_or(PredicateResult::Unknown),
        }
    }
}

fn compare(operator: Operator, value: &TypedValue, literal: &TypedValue) -> PredicateResult {
    match operator {
        Operator::Equal => PredicateResult::from_bool(value.equals(literal)),
        Operator::NotEqual => PredicateResult::from_bool(!value.equals(literal)),
        Operator::LessThan => ordered(value, literal, |o| o == Ordering::Less),
        Operator::LessOrEqual => ordered(value, literal, |o| o != Ordering::Greater),
        Operator::GreaterThan => ordered(value, literal, |o| o == Ordering::Greater),
        Operator::GreaterOrEqual => ordered(value, literal, |o| o != Ordering::Less),
        Operator::IsMissing | Operator::IsNotMissing => PredicateResult::Unknown,
    }
}

/// Unknown when the values have no ordering (categorical fields).
fn ordered(
    value: &TypedValue,
    literal: &TypedValue,
    test: impl Fn(Ordering) -> bool,
) -> PredicateResult {
    value
        .compare(literal)
        .map(|ordering| PredicateResult::from_bool(test(ordering)))
        .unwrap_or(PredicateResult::Unknown)
}

// ── Tests ───────────────────────────────────────────────────────────
