//! Untyped configuration tree.
//!
//! # Responsibilities
//! - Represent every source (defaults, YAML file, environment) in one closed shape
//! - Convert parsed YAML into that shape
//! - Resolve dotted field paths with case-insensitive key matching
//!
//! # Design Decisions
//! - Mappings keep insertion order so header sets come out in document order
//! - Keys are matched ignoring ASCII case but stored as written
//! - `Null` means "unset" everywhere downstream

use std::fmt;

use thiserror::Error;

/// A node of a parsed, not yet typed, configuration source.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i128),
    Float(f64),
    Str(String),
    List(Vec<RawValue>),
    Map(RawMap),
}

/// The shape of a [`RawValue`], used in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Null,
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Null => "null",
            Shape::Bool => "boolean",
            Shape::Int => "integer",
            Shape::Float => "float",
            Shape::Str => "string",
            Shape::List => "list",
            Shape::Map => "mapping",
        };
        f.write_str(name)
    }
}

/// A record position in the tree held something other than a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected mapping at '{at}', got {found}")]
pub struct LookupError {
    pub at: String,
    pub found: Shape,
}

/// Failure converting YAML text into a [`RawValue`].
#[derive(Debug, Error)]
pub enum YamlError {
    #[error(transparent)]
    Syntax(#[from] serde_yaml::Error),

    #[error("unsupported mapping key: {0}")]
    Key(String),
}

impl RawValue {
    pub fn str(value: impl Into<String>) -> Self {
        RawValue::Str(value.into())
    }

    pub fn shape(&self) -> Shape {
        match self {
            RawValue::Null => Shape::Null,
            RawValue::Bool(_) => Shape::Bool,
            RawValue::Int(_) => Shape::Int,
            RawValue::Float(_) => Shape::Float,
            RawValue::Str(_) => Shape::Str,
            RawValue::List(_) => Shape::List,
            RawValue::Map(_) => Shape::Map,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RawValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&RawMap> {
        match self {
            RawValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Resolve a dotted path such as `tls.acme.email`.
    ///
    /// Returns `Ok(None)` when any segment is missing or null, and an error
    /// when an intermediate segment is a scalar or list.
    pub fn lookup(&self, path: &str) -> Result<Option<&RawValue>, LookupError> {
        let mut current = self;
        let mut walked = String::new();

        for segment in path.split('.') {
            match current {
                RawValue::Null => return Ok(None),
                RawValue::Map(map) => match map.get(segment) {
                    Some(next) => current = next,
                    None => return Ok(None),
                },
                other => {
                    return Err(LookupError {
                        at: walked,
                        found: other.shape(),
                    })
                }
            }
            if !walked.is_empty() {
                walked.push('.');
            }
            walked.push_str(segment);
        }

        Ok(Some(current).filter(|value| !value.is_null()))
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Str(value.to_string())
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Int(value.into())
    }
}

impl From<RawMap> for RawValue {
    fn from(value: RawMap) -> Self {
        RawValue::Map(value)
    }
}

impl<T: Into<RawValue>> From<Vec<T>> for RawValue {
    fn from(items: Vec<T>) -> Self {
        RawValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// An insertion-ordered mapping with case-insensitive keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMap {
    entries: Vec<(String, RawValue)>,
}

impl RawMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut RawValue> {
        self.position(key).map(move |i| &mut self.entries[i].1)
    }

    /// Insert or replace. A replaced entry keeps its position and takes the new key spelling.
    pub fn insert(&mut self, key: impl Into<String>, value: RawValue) {
        let key = key.into();
        match self.position(&key) {
            Some(i) => self.entries[i] = (key, value),
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style insert for literal trees.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<RawValue>) -> Self {
        self.insert(key, value.into());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))
    }
}

impl FromIterator<(String, RawValue)> for RawMap {
    fn from_iter<I: IntoIterator<Item = (String, RawValue)>>(iter: I) -> Self {
        let mut map = RawMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for RawMap {
    type Item = (String, RawValue);
    type IntoIter = std::vec::IntoIter<(String, RawValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Parse YAML (or JSON) text into a raw tree. Empty text yields `Null`.
pub fn parse_yaml(text: &str) -> Result<RawValue, YamlError> {
    if text.trim().is_empty() {
        return Ok(RawValue::Null);
    }
    let value: serde_yaml::Value = serde_yaml::from_str(text)?;
    from_yaml(value)
}

/// Convert an already parsed YAML value.
pub fn from_yaml(value: serde_yaml::Value) -> Result<RawValue, YamlError> {
    use serde_yaml::Value;

    Ok(match value {
        Value::Null => RawValue::Null,
        Value::Bool(b) => RawValue::Bool(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                RawValue::Int(i.into())
            } else if let Some(u) = n.as_u64() {
                RawValue::Int(u.into())
            } else {
                n.as_f64().map(RawValue::Float).unwrap_or(RawValue::Null)
            }
        }
        Value::String(s) => RawValue::Str(s),
        Value::Sequence(items) => RawValue::List(
            items
                .into_iter()
                .map(from_yaml)
                .collect::<Result<_, _>>()?,
        ),
        Value::Mapping(mapping) => {
            let mut map = RawMap::new();
            for (key, value) in mapping {
                map.insert(mapping_key(key)?, from_yaml(value)?);
            }
            RawValue::Map(map)
        }
        Value::Tagged(tagged) => from_yaml(tagged.value)?,
    })
}

pub(crate) fn mapping_key(key: serde_yaml::Value) -> Result<String, YamlError> {
    use serde_yaml::Value;

    match key {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(YamlError::Key(format!("{other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_document() {
        let text = "port: 8888\ntls:\n  minVersion: TLS1.3\n  curves: [P-256]\n";
        let raw = parse_yaml(text).unwrap();

        assert_eq!(raw.lookup("port").unwrap(), Some(&RawValue::Int(8888)));
        assert_eq!(
            raw.lookup("tls.minversion").unwrap(),
            Some(&RawValue::str("TLS1.3"))
        );
        assert_eq!(
            raw.lookup("tls.curves").unwrap(),
            Some(&RawValue::List(vec![RawValue::str("P-256")]))
        );
        assert_eq!(raw.lookup("tls.acme.email").unwrap(), None);
    }

    #[test]
    fn test_null_leaf_is_unset() {
        let raw = parse_yaml("tls:\n  crt: ~\n").unwrap();
        assert_eq!(raw.lookup("tls.crt").unwrap(), None);
    }

    #[test]
    fn test_lookup_through_scalar_fails() {
        let raw = parse_yaml("tls: enabled\n").unwrap();
        let err = raw.lookup("tls.minVersion").unwrap_err();
        assert_eq!(err.at, "tls");
        assert_eq!(err.found, Shape::Str);
    }

    #[test]
    fn test_map_keeps_order_and_replaces_case_insensitively() {
        let mut map = RawMap::new().with("b", "1").with("a", "2");
        map.insert("B", RawValue::str("3"));

        let keys: Vec<_> = map.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["B", "a"]);
        assert_eq!(map.get("b"), Some(&RawValue::str("3")));
    }

    #[test]
    fn test_empty_and_null_documents() {
        assert_eq!(parse_yaml("").unwrap(), RawValue::Null);
        assert_eq!(parse_yaml("null").unwrap(), RawValue::Null);
    }

    #[test]
    fn test_large_unsigned_kept_as_integer() {
        let raw = parse_yaml("18446744073709551615").unwrap();
        assert_eq!(raw, RawValue::Int(u64::MAX.into()));
    }

    #[test]
    fn test_broken_yaml_is_an_error() {
        assert!(parse_yaml("headers:\n  key:\n\t\tsub: key\n").is_err());
        assert!(parse_yaml("{").is_err());
    }
}
