//! YAML codec for model documents.
//!
//! Externally tagged enums (`Model`, `Rule`, `Predicate`) are written as
//! single-key maps (`TreeModel: {...}`) rather than YAML tags (`!TreeModel`),
//! at every nesting level.

use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use serde::Serialize;
use serde_yaml::with::singleton_map_recursive;

/// Deserialize a value from YAML text.
pub fn from_str<T: DeserializeOwned>(contents: &str) -> Result<T, serde_yaml::Error> {
    singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(contents))
}

/// Serialize a value to YAML text.
pub fn to_string<T: Serialize>(value: &T) -> Result<String, serde_yaml::Error> {
    let mut buf = Vec::new();
    let mut serializer = serde_yaml::Serializer::new(&mut buf);
    singleton_map_recursive::serialize(value, &mut serializer)?;
    String::from_utf8(buf).map_err(serde_yaml::Error::custom)
}
