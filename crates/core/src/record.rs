use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::RecordError;

/// One input record: field name -> raw text value.
///
/// A field that is not present is *absent*, which is distinct from a field
/// that is present but holds unparsable text. Records are immutable during
/// evaluation; model chaining produces an extended copy via [`Record::extended`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: HashMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Raw value of a field, `None` when the field is absent.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Copy of this record with one extra (or replaced) field.
    pub fn extended(&self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.clone().with(field, value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Build a record from a JSON object.
    ///
    /// All source data arrives as text: numbers and booleans are rendered to
    /// their string form, `null` leaves the field absent.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, RecordError> {
        let obj = value
            .as_object()
            .ok_or_else(|| RecordError::NotAnObject(value.to_string()))?;

        let mut record = Record::new();
        for (key, v) in obj {
            match v {
                serde_json::Value::Null => {}
                serde_json::Value::String(s) => record.insert(key.clone(), s.clone()),
                serde_json::Value::Number(n) => record.insert(key.clone(), n.to_string()),
                serde_json::Value::Bool(b) => record.insert(key.clone(), b.to_string()),
                other => {
                    return Err(RecordError::NonScalar {
                        field: key.clone(),
                        value: other.to_string(),
                    })
                }
            }
        }
        Ok(record)
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
