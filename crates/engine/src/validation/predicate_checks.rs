//! Predicate checks: literals, field references and compound arity.

use sylva_core::{DataDictionary, FieldLookup, FieldSpec, OpType};

use crate::coercion::parse_number;
use crate::schema::{BooleanOperator, Predicate, SimplePredicate, SimpleSetPredicate};

use super::fuzzy::{did_you_mean, fuzzy_match};
use super::ValidationResult;

/// Names a predicate may legally reference: the data dictionary plus the
/// outputs published by earlier segments of a model chain.
pub(super) struct FieldScope<'a> {
    dictionary: &'a DataDictionary,
    derived: Vec<String>,
}

impl<'a> FieldScope<'a> {
    pub(super) fn new(dictionary: &'a DataDictionary) -> Self {
        Self {
            dictionary,
            derived: Vec::new(),
        }
    }

    /// Scope extended with chained outputs.
    pub(super) fn with_derived(&self, names: impl IntoIterator<Item = String>) -> Self {
        let mut derived = self.derived.clone();
        derived.extend(names);
        Self {
            dictionary: self.dictionary,
            derived,
        }
    }

    fn declared(&self, name: &str) -> Option<&FieldSpec> {
        self.dictionary.field(name)
    }

    fn is_known(&self, name: &str) -> bool {
        self.declared(name).is_some() || self.derived.iter().any(|d| d == name)
    }

    fn candidates(&self) -> Vec<&str> {
        self.dictionary
            .names()
            .chain(self.derived.iter().map(String::as_str))
            .collect()
    }
}

pub(super) fn validate_predicate(
    predicate: &Predicate,
    path: &str,
    scope: &FieldScope<'_>,
    result: &mut ValidationResult,
) {
    match predicate {
        Predicate::True | Predicate::False => {}
        Predicate::Simple(simple) => validate_simple(simple, path, scope, result),
        Predicate::SetMembership(set) => validate_set(set, path, scope, result),
        Predicate::Compound(compound) => {
            let count = compound.predicates.len();
            if count == 0 {
                result.error(
                    path,
                    format!("'{}' compound predicate has no children", compound.boolean_operator),
                );
            } else if count == 1 && compound.boolean_operator != BooleanOperator::Surrogate {
                result.warn(
                    path,
                    format!(
                        "'{}' compound predicate has a single child",
                        compound.boolean_operator
                    ),
                );
            }
            for (i, child) in compound.predicates.iter().enumerate() {
                validate_predicate(
                    child,
                    &format!("{path}.CompoundPredicate.predicates[{i}]"),
                    scope,
                    result,
                );
            }
        }
    }
}

fn validate_simple(
    simple: &SimplePredicate,
    path: &str,
    scope: &FieldScope<'_>,
    result: &mut ValidationResult,
) {
    let path = format!("{path}.SimplePredicate");
    check_field(&simple.field, &path, scope, result);

    match (&simple.value, simple.operator.requires_value()) {
        (None, true) => result.error(
            format!("{path}.value"),
            format!("Operator '{}' requires a value", simple.operator),
        ),
        (Some(_), false) => result.warn(
            format!("{path}.value"),
            format!("Operator '{}' ignores its value", simple.operator),
        ),
        (Some(value), true) => {
            if let Some(spec) = scope.declared(&simple.field) {
                check_literal(spec, value, &format!("{path}.value"), result);
                if simple.operator.is_ordering() && spec.optype == OpType::Categorical {
                    result.warn(
                        &path,
                        format!(
                            "Operator '{}' on categorical field '{}' always evaluates to unknown",
                            simple.operator, spec.name
                        ),
                    );
                }
            }
        }
        (None, false) => {}
    }
}

fn validate_set(
    set: &SimpleSetPredicate,
    path: &str,
    scope: &FieldScope<'_>,
    result: &mut ValidationResult,
) {
    let path = format!("{path}.SimpleSetPredicate");
    check_field(&set.field, &path, scope, result);

    if set.values.is_empty() {
        result.error(format!("{path}.values"), "Set predicate has no values");
        return;
    }
    if let Some(spec) = scope.declared(&set.field) {
        for (i, value) in set.values.iter().enumerate() {
            check_literal(spec, value, &format!("{path}.values[{i}]"), result);
        }
    }
}

fn check_field(field: &str, path: &str, scope: &FieldScope<'_>, result: &mut ValidationResult) {
    if field.is_empty() {
        result.error(format!("{path}.field"), "Predicate field must not be empty");
        return;
    }
    if scope.is_known(field) {
        return;
    }
    let candidates = scope.candidates();
    result.warn_with_suggestion(
        format!("{path}.field"),
        format!("Field '{field}' is not declared in the data dictionary"),
        fuzzy_match(field, &candidates).map(did_you_mean),
    );
}

/// A literal that can never coerce makes the predicate permanently unknown.
fn check_literal(spec: &FieldSpec, value: &str, path: &str, result: &mut ValidationResult) {
    if spec.is_missing_marker(value) {
        result.warn(
            path,
            format!("Literal '{value}' is a missing-value marker of field '{}'", spec.name),
        );
        return;
    }
    match spec.optype {
        OpType::Continuous => {
            if parse_number(&spec.name, value).is_err() {
                result.warn(
                    path,
                    format!(
                        "Literal '{value}' is not numeric but field '{}' is continuous",
                        spec.name
                    ),
                );
            }
        }
        OpType::Categorical | OpType::Ordinal => {
            if spec.has_value_set() && spec.rank(value).is_none() {
                result.warn_with_suggestion(
                    path,
                    format!(
                        "Literal '{value}' is not a declared value of field '{}'",
                        spec.name
                    ),
                    fuzzy_match(value, &spec.values).map(did_you_mean),
                );
            }
        }
    }
}
