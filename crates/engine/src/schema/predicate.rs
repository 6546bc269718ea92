//! Predicate tree types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A tri-state test over a record.
///
/// Externally tagged by element name. Constants serialize as the plain
/// strings `"True"` / `"False"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub enum Predicate {
    #[default]
    True,
    False,
    #[serde(rename = "SimplePredicate")]
    Simple(SimplePredicate),
    #[serde(rename = "SimpleSetPredicate")]
    SetMembership(SimpleSetPredicate),
    #[serde(rename = "CompoundPredicate")]
    Compound(CompoundPredicate),
}

/// Comparison of one field against a literal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SimplePredicate {
    pub field: String,
    pub operator: Operator,
    /// Required for every operator except `isMissing` / `isNotMissing`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equal,
    NotEqual,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
    IsMissing,
    IsNotMissing,
}

impl Operator {
    /// Whether the operator compares against a literal value.
    pub fn requires_value(self) -> bool {
        !matches!(self, Operator::IsMissing | Operator::IsNotMissing)
    }

    /// Whether the operator needs an ordering (not just equality).
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Operator::LessThan
                | Operator::LessOrEqual
                | Operator::GreaterThan
                | Operator::GreaterOrEqual
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Equal => "equal",
            Operator::NotEqual => "notEqual",
            Operator::LessThan => "lessThan",
            Operator::LessOrEqual => "lessOrEqual",
            Operator::GreaterThan => "greaterThan",
            Operator::GreaterOrEqual => "greaterOrEqual",
            Operator::IsMissing => "isMissing",
            Operator::IsNotMissing => "isNotMissing",
        };
        f.write_str(s)
    }
}

/// Membership of one field's value in a literal set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SimpleSetPredicate {
    pub field: String,
    pub boolean_operator: SetOperator,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SetOperator {
    IsIn,
    IsNotIn,
}

/// Boolean composition of child predicates. Child order matters for `surrogate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompoundPredicate {
    pub boolean_operator: BooleanOperator,
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BooleanOperator {
    And,
    Or,
    Xor,
    Surrogate,
}

impl fmt::Display for BooleanOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BooleanOperator::And => write!(f, "and"),
            BooleanOperator::Or => write!(f, "or"),
            BooleanOperator::Xor => write!(f, "xor"),
            BooleanOperator::Surrogate => write!(f, "surrogate"),
        }
    }
}

// ── Constructors ────────────────────────────────────────────────────

impl Predicate {
    pub fn simple(field: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Predicate::Simple(SimplePredicate {
            field: field.into(),
            operator,
            value: Some(value.into()),
        })
    }

    pub fn equal(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::simple(field, Operator::Equal, value)
    }

    pub fn less_than(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::simple(field, Operator::LessThan, value)
    }

    pub fn greater_or_equal(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::simple(field, Operator::GreaterOrEqual, value)
    }

    pub fn is_missing(field: impl Into<String>) -> Self {
        Predicate::Simple(SimplePredicate {
            field: field.into(),
            operator: Operator::IsMissing,
            value: None,
        })
    }

    pub fn is_not_missing(field: impl Into<String>) -> Self {
        Predicate::Simple(SimplePredicate {
            field: field.into(),
            operator: Operator::IsNotMissing,
            value: None,
        })
    }

    pub fn is_in<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::set(field, SetOperator::IsIn, values)
    }

    pub fn is_not_in<I, S>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::set(field, SetOperator::IsNotIn, values)
    }

    fn set<I, S>(field: impl Into<String>, boolean_operator: SetOperator, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::SetMembership(SimpleSetPredicate {
            field: field.into(),
            boolean_operator,
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    pub fn compound(boolean_operator: BooleanOperator, predicates: Vec<Predicate>) -> Self {
        Predicate::Compound(CompoundPredicate {
            boolean_operator,
            predicates,
        })
    }

    pub fn and(predicates: Vec<Predicate>) -> Self {
        Self::compound(BooleanOperator::And, predicates)
    }

    pub fn or(predicates: Vec<Predicate>) -> Self {
        Self::compound(BooleanOperator::Or, predicates)
    }

    pub fn xor(predicates: Vec<Predicate>) -> Self {
        Self::compound(BooleanOperator::Xor, predicates)
    }

    pub fn surrogate(predicates: Vec<Predicate>) -> Self {
        Self::compound(BooleanOperator::Surrogate, predicates)
    }
}
