//! Flat parameter maps rendered as query strings (GET) or form bodies (POST).

use std::fmt;

/// Primitive value carried by a single browser-binding parameter.
///
/// Booleans render as literal `true`/`false` on the wire, matching the
/// coercion the protocol expects for flags like `allVersions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Str(String),
    Bool(bool),
    Int(i64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(value) => f.write_str(value),
            ParamValue::Bool(value) => write!(f, "{value}"),
            ParamValue::Int(value) => write!(f, "{value}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        ParamValue::Int(value as i64)
    }
}

/// Ordered key/value parameter map with last-write-wins upserts.
///
/// Keys keep first-insertion order, so a given merge sequence renders the
/// same query string or form body every time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the value for `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Overlays every entry of `other` onto this map, key by key.
    pub fn merge(&mut self, other: &Params) {
        for (key, value) in &other.entries {
            self.set(key.clone(), value.clone());
        }
    }

    /// Renders the map into `(key, value)` string pairs for the transport.
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.entries
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect()
    }
}

/// Ordered CMIS property set, flattened to `propertyId[n]`/`propertyValue[n]`
/// form fields on the wire.
///
/// Index pairing is positional: the id and value of one property always share
/// the same `n`, whatever else surrounds them in the parameter map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    entries: Vec<(String, ParamValue)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the property `id`.
    pub fn set(&mut self, id: impl Into<String>, value: impl Into<ParamValue>) {
        let id = id.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((id, value)),
        }
    }

    /// Builder form of [`Properties::set`].
    pub fn with(mut self, id: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(id, value);
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the indexed `propertyId[n]`/`propertyValue[n]` pairs into `params`.
    pub fn apply_to(&self, params: &mut Params) {
        for (index, (id, value)) in self.entries.iter().enumerate() {
            params.set(format!("propertyId[{index}]"), id.as_str());
            params.set(format!("propertyValue[{index}]"), value.clone());
        }
    }
}

impl From<&str> for Properties {
    /// A bare string is a folder/object name: `{cmis:name: value}`.
    fn from(name: &str) -> Self {
        Properties::new().with(crate::wire::property::NAME, name)
    }
}

impl From<String> for Properties {
    fn from(name: String) -> Self {
        Properties::new().with(crate::wire::property::NAME, name)
    }
}
