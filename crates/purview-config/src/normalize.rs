//! Recursive conversion of permissive YAML trees into string-keyed maps.

use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};

use crate::error::ConfigError;

/// A canonical configuration map: string keys at every depth.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// A value in a canonical configuration tree.
///
/// Nested mappings are normalised into their own [`ConfigMap`]; everything
/// else — scalars and sequences alike — passes through as an opaque YAML
/// value. Sequences are deliberately not recursed into: a mapping inside a
/// sequence keeps its raw form.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// A scalar or sequence, carried over unchanged.
    Scalar(Value),
    /// A nested mapping with validated string keys.
    Map(ConfigMap),
}

impl ConfigValue {
    /// Returns the raw YAML value when this is a pass-through scalar.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(value) => Some(value),
            Self::Map(_) => None,
        }
    }

    /// Returns the nested map when this is a normalised mapping.
    #[must_use]
    pub const fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            Self::Scalar(_) => None,
            Self::Map(map) => Some(map),
        }
    }

    /// Returns the string content when this is a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Value::as_str)
    }
}

/// Normalises a permissive mapping into a canonical string-keyed map.
///
/// Walks the tree depth first. Every nested mapping is rebuilt into a fresh
/// map that is returned by value and inserted into its parent by the caller,
/// so no map in the output is reachable from two places. Non-mapping values
/// are cloned through unchanged.
///
/// # Errors
///
/// Returns [`ConfigError::KeyType`] on the first key that is not a string,
/// at any depth. Nothing is returned for the subtrees already processed.
pub fn normalize(raw: &Mapping) -> Result<ConfigMap, ConfigError> {
    let mut canonical = ConfigMap::new();

    for (key, value) in raw {
        let name = key.as_str().ok_or(ConfigError::KeyType {
            found: value_kind(key),
        })?;

        match value {
            Value::Mapping(nested) => {
                let converted = normalize(nested)?;
                canonical.insert(name.to_owned(), ConfigValue::Map(converted));
            }
            other => {
                canonical.insert(name.to_owned(), ConfigValue::Scalar(other.clone()));
            }
        }
    }

    Ok(canonical)
}

/// Names a YAML value's runtime type for diagnostics.
const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged value",
    }
}
