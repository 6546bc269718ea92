//! Type coercion of raw record values to declared field types.
//!
//! Raw values arrive as text. Before any comparison both the record value
//! and the predicate literal are coerced with the same [`FieldSpec`] into a
//! [`TypedValue`], so comparisons never work on unchecked text.
//!
//! Numbers use the locale-invariant decimal form accepted by `f64::from_str`
//! (`.` as decimal point, no thousands separators). Non-finite values are
//! rejected so comparisons stay reproducible.

use std::borrow::Cow;
use std::cmp::Ordering;

use sylva_core::{CoercionError, FieldLookup, FieldSpec, OpType, Record};

/// A raw value converted to its declared semantic type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Number(f64),
    /// Ordinal value with its position in the declared value list, if any.
    Ordinal { text: String, rank: Option<usize> },
    Category(String),
}

impl TypedValue {
    /// Equality under the field's semantics: numeric for continuous,
    /// exact string match for ordinal and categorical.
    pub fn equals(&self, other: &TypedValue) -> bool {
        match (self, other) {
            (TypedValue::Number(a), TypedValue::Number(b)) => a == b,
            (TypedValue::Ordinal { text: a, .. }, TypedValue::Ordinal { text: b, .. }) => a == b,
            (TypedValue::Category(a), TypedValue::Category(b)) => a == b,
            _ => false,
        }
    }

    /// Ordering under the field's semantics. `None` when the values are not
    /// ordered (categorical values, or mixed kinds).
    pub fn compare(&self, other: &TypedValue) -> Option<Ordering> {
        match (self, other) {
            (TypedValue::Number(a), TypedValue::Number(b)) => a.partial_cmp(b),
            (
                TypedValue::Ordinal { text: a, rank: ra },
                TypedValue::Ordinal { text: b, rank: rb },
            ) => match (ra, rb) {
                (Some(ra), Some(rb)) => Some(ra.cmp(rb)),
                _ => match (parse_decimal(a), parse_decimal(b)) {
                    (Some(x), Some(y)) => x.partial_cmp(&y),
                    _ => Some(a.cmp(b)),
                },
            },
            _ => None,
        }
    }
}

/// Coerce one raw value according to `spec`.
pub fn coerce(raw: &str, spec: &FieldSpec) -> Result<TypedValue, CoercionError> {
    match spec.optype {
        OpType::Continuous => parse_number(&spec.name, raw).map(TypedValue::Number),
        OpType::Ordinal => {
            let rank = spec.rank(raw);
            if spec.has_value_set() && rank.is_none() {
                return Err(invalid(spec, raw));
            }
            Ok(TypedValue::Ordinal {
                text: raw.to_string(),
                rank,
            })
        }
        OpType::Categorical => {
            if spec.has_value_set() && spec.rank(raw).is_none() {
                return Err(invalid(spec, raw));
            }
            Ok(TypedValue::Category(raw.to_string()))
        }
    }
}

/// Look up and coerce a field of `record`.
///
/// `Ok(None)` means the field is absent (or holds a declared missing-value
/// marker); `Err` means it is present but unusable.
pub fn coerce_field(
    record: &Record,
    spec: &FieldSpec,
) -> Result<Option<TypedValue>, CoercionError> {
    match record.get(&spec.name) {
        None => Ok(None),
        Some(raw) if spec.is_missing_marker(raw) => Ok(None),
        Some(raw) => coerce(raw, spec).map(Some),
    }
}

/// Whether a field counts as missing in `record`.
pub fn is_missing(record: &Record, field: &str, fields: &dyn FieldLookup) -> bool {
    match record.get(field) {
        None => true,
        Some(raw) => fields
            .field(field)
            .map(|spec| spec.is_missing_marker(raw))
            .unwrap_or(false),
    }
}

/// Resolve the spec used to compare `field`.
///
/// Declared fields use their declaration. Undeclared fields (such as outputs
/// published by chained segments) are continuous when the literal parses as
/// a number, categorical otherwise.
pub fn resolve_spec<'a>(
    fields: &'a dyn FieldLookup,
    field: &str,
    literal: Option<&str>,
) -> Cow<'a, FieldSpec> {
    match fields.field(field) {
        Some(spec) => Cow::Borrowed(spec),
        None => {
            let numeric = literal.map(|l| parse_decimal(l).is_some()).unwrap_or(false);
            let optype = if numeric {
                OpType::Continuous
            } else {
                OpType::Categorical
            };
            Cow::Owned(FieldSpec::new(field, optype))
        }
    }
}

/// Parse a locale-invariant decimal number.
pub fn parse_number(field: &str, raw: &str) -> Result<f64, CoercionError> {
    let trimmed = raw.trim();
    let value: f64 = trimmed.parse().map_err(|_| CoercionError::NotNumeric {
        field: field.to_string(),
        value: raw.to_string(),
    })?;
    if !value.is_finite() {
        return Err(CoercionError::NonFinite {
            field: field.to_string(),
            value: raw.to_string(),
        });
    }
    Ok(value)
}

fn parse_decimal(raw: &str) -> Option<f64> {
    parse_number("", raw).ok()
}

fn invalid(spec: &FieldSpec, raw: &str) -> CoercionError {
    CoercionError::InvalidValue {
        field: spec.name.clone(),
        value: raw.to_string(),
    }
}

/// Render a numeric result the way scores are written in documents
/// (`3` rather than `3.0`).
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}
