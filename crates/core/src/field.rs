use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Declared semantic type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpType {
    Continuous,
    Ordinal,
    Categorical,
}

impl std::fmt::Display for OpType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpType::Continuous => write!(f, "continuous"),
            OpType::Ordinal => write!(f, "ordinal"),
            OpType::Categorical => write!(f, "categorical"),
        }
    }
}

/// Declaration of a single input field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldSpec {
    pub name: String,
    pub optype: OpType,
    /// Valid values. For ordinal fields the order defines the ranking.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    /// Raw values that count as absent (e.g. `"NA"`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_values: Vec<String>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, optype: OpType) -> Self {
        Self {
            name: name.into(),
            optype,
            values: Vec::new(),
            missing_values: Vec::new(),
        }
    }

    pub fn continuous(name: impl Into<String>) -> Self {
        Self::new(name, OpType::Continuous)
    }

    pub fn categorical(name: impl Into<String>) -> Self {
        Self::new(name, OpType::Categorical)
    }

    pub fn ordinal(name: impl Into<String>) -> Self {
        Self::new(name, OpType::Ordinal)
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_missing_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_values = values.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `raw` is one of the declared missing-value markers.
    pub fn is_missing_marker(&self, raw: &str) -> bool {
        self.missing_values.iter().any(|m| m == raw)
    }

    /// Position of `raw` in the declared value list.
    pub fn rank(&self, raw: &str) -> Option<usize> {
        self.values.iter().position(|v| v == raw)
    }

    /// Whether the field restricts its values to a declared set.
    pub fn has_value_set(&self) -> bool {
        !self.values.is_empty()
    }
}

/// Read-only field declaration lookup queried during evaluation.
///
/// Shared across evaluation threads, hence `Send + Sync`.
pub trait FieldLookup: Send + Sync {
    fn field(&self, name: &str) -> Option<&FieldSpec>;
}

/// The set of declared fields of one model document.
///
/// Serialized as an ordered list of [`FieldSpec`]s; a later declaration of
/// the same name replaces an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "DictionaryRepr", into = "DictionaryRepr")]
pub struct DataDictionary {
    fields: IndexMap<String, FieldSpec>,
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DictionaryRepr {
    #[serde(default)]
    fields: Vec<FieldSpec>,
}

impl From<DictionaryRepr> for DataDictionary {
    fn from(repr: DictionaryRepr) -> Self {
        repr.fields.into_iter().collect()
    }
}

impl From<DataDictionary> for DictionaryRepr {
    fn from(dict: DataDictionary) -> Self {
        Self {
            fields: dict.fields.into_values().collect(),
        }
    }
}

impl FromIterator<FieldSpec> for DataDictionary {
    fn from_iter<I: IntoIterator<Item = FieldSpec>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|f| (f.name.clone(), f)).collect(),
        }
    }
}

impl DataDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, spec: FieldSpec) -> Self {
        self.fields.insert(spec.name.clone(), spec);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FieldLookup for DataDictionary {
    fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dictionary_serializes_as_ordered_list() {
        let dict = DataDictionary::new()
            .with_field(FieldSpec::continuous("age"))
            .with_field(FieldSpec::categorical("color").with_values(["red", "blue"]));

        let json = serde_json::to_value(&dict).unwrap();
        assert_eq!(json["fields"][0]["name"], "age");
        assert_eq!(json["fields"][0]["optype"], "continuous");
        assert_eq!(json["fields"][1]["values"][1], "blue");
        assert!(json["fields"][0].get("values").is_none());

        let back: DataDictionary = serde_json::from_value(json).unwrap();
        assert_eq!(back, dict);
    }

    #[test]
    fn lookup_and_rank() {
        let dict = DataDictionary::new()
            .with_field(FieldSpec::ordinal("size").with_values(["small", "medium", "large"]));
        let size = dict.field("size").unwrap();
        assert_eq!(size.rank("medium"), Some(1));
        assert_eq!(size.rank("huge"), None);
        assert!(dict.field("weight").is_none());
    }

    #[test]
    fn missing_markers() {
        let spec = FieldSpec::continuous("income").with_missing_values(["NA", "?"]);
        assert!(spec.is_missing_marker("NA"));
        assert!(!spec.is_missing_marker("0"));
    }
}
