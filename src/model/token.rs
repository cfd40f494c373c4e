//! Design variables as the host stores them, and the numeric tokens derived from them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Per-document variable identifier (changes when a library variable is re-imported).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariableId(pub String);

impl VariableId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VariableId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Kind of value a variable resolves to. Only `Float` is relevant for spacing and radii.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResolvedType {
    Float,
    Color,
    String,
    Boolean,
}

/// RGBA color channel values in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    #[serde(default = "opaque")]
    pub a: f64,
}

fn opaque() -> f64 {
    1.0
}

/// A single mode's value.
///
/// Untagged so document snapshots can write `16`, `"x"`, `true`,
/// `{"r":..,"g":..,"b":..}` or `{"id": "VariableID:1:2"}` directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Float(f64),
    Boolean(bool),
    String(String),
    Color(Rgba),
    Alias { id: VariableId },
}

impl VariableValue {
    pub fn as_float(&self) -> Option<f64> {
        match self {
            VariableValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

/// Value of a variable in one mode. Order of `TokenRecord::values_by_mode` is significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeValue {
    pub mode_id: String,
    pub value: VariableValue,
}

/// A fully resolved design variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub id: VariableId,
    /// Natural key, stable across re-imports. Unique across a merged candidate set.
    pub key: String,
    pub name: String,
    pub resolved_type: ResolvedType,
    pub collection_id: String,
    #[serde(default)]
    pub values_by_mode: Vec<ModeValue>,
}

impl TokenRecord {
    /// Convenience constructor for a single-mode float variable.
    pub fn float(
        id: impl Into<String>,
        key: impl Into<String>,
        name: impl Into<String>,
        collection_id: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            id: VariableId(id.into()),
            key: key.into(),
            name: name.into(),
            resolved_type: ResolvedType::Float,
            collection_id: collection_id.into(),
            values_by_mode: vec![ModeValue {
                mode_id: "default".into(),
                value: VariableValue::Float(value),
            }],
        }
    }

    /// Value of the first mode in iteration order.
    pub fn first_mode_value(&self) -> Option<&VariableValue> {
        self.values_by_mode.first().map(|m| &m.value)
    }
}

/// An unresolved library variable: enough to decide whether it is worth importing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryVariableStub {
    pub key: String,
    pub name: String,
    pub resolved_type: ResolvedType,
}

/// A variable collection published by an external library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryCollection {
    pub key: String,
    pub name: String,
    pub library_name: String,
}

/// Where a collection comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CollectionSource {
    Local,
    Library {
        #[serde(rename = "libraryName")]
        library_name: String,
    },
}

/// A collection as shown to the UI for scoping detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDescriptor {
    pub id: String,
    pub name: String,
    pub source: CollectionSource,
}

impl CollectionDescriptor {
    pub fn local(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            source: CollectionSource::Local,
        }
    }
}

impl From<&LibraryCollection> for CollectionDescriptor {
    fn from(lc: &LibraryCollection) -> Self {
        Self {
            id: lc.key.clone(),
            name: lc.name.clone(),
            source: CollectionSource::Library {
                library_name: lc.library_name.clone(),
            },
        }
    }
}

/// A numeric token: a float record reduced to its first-mode value.
///
/// Derived, never mutated; rebuilt whenever the token cache repopulates.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub id: VariableId,
    pub key: String,
    pub name: String,
    pub value: f64,
    pub record: Arc<TokenRecord>,
}

impl Token {
    pub fn from_record(record: Arc<TokenRecord>, value: f64) -> Self {
        Self {
            id: record.id.clone(),
            key: record.key.clone(),
            name: record.name.clone(),
            value,
            record,
        }
    }
}
