//! Response header set injected by the server into every response.
//!
//! # Responsibilities
//! - Accept a YAML/JSON document in a string (environment) or a mapping (file)
//! - Accept single values and lists of values per header name
//! - Validate names and values before insertion
//!
//! # Design Decisions
//! - Every accepted shape funnels through [`HeaderSet::insert`], so equal data
//!   yields an equal set whatever its source shape
//! - Names keep first-seen order; values keep insertion order per name
//! - Empty or whitespace-only values are rejected

use http::header::{HeaderMap, HeaderName, HeaderValue};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::config::error::DecodeError;
use crate::config::hooks::{FromRaw, Hooked};
use crate::config::raw::{from_yaml, mapping_key, RawMap, RawValue, YamlError};

/// Ordered multimap from header name to one or more values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(HeaderName, Vec<HeaderValue>)>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append one value.
    pub fn insert(&mut self, name: &str, value: &str) -> Result<(), DecodeError> {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| DecodeError::InvalidHeaderName(name.to_string()))?;

        if value.trim().is_empty() {
            return Err(DecodeError::InvalidHeaderValue {
                name: name.to_string(),
                reason: "value is empty".to_string(),
            });
        }
        let value = HeaderValue::from_str(value).map_err(|_| DecodeError::InvalidHeaderValue {
            name: name.to_string(),
            reason: "value contains invalid characters".to_string(),
        })?;

        match self.entries.iter_mut().find(|(n, _)| *n == header) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((header, vec![value])),
        }
        Ok(())
    }

    /// Append one mapping entry: a string or a list of strings.
    fn insert_entry(&mut self, name: &str, value: &RawValue) -> Result<(), DecodeError> {
        let invalid = |reason| DecodeError::InvalidHeaderValue {
            name: name.to_string(),
            reason,
        };

        match value {
            RawValue::Str(s) => self.insert(name, s),
            RawValue::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    let s = item.as_str().ok_or_else(|| {
                        invalid(format!("expected string at index {index}, got {}", item.shape()))
                    })?;
                    self.insert(name, s)?;
                }
                Ok(())
            }
            other => Err(invalid(format!(
                "expected string or list of strings, got {}",
                other.shape()
            ))),
        }
    }

    /// Build from a mapping whose values are strings or lists of strings.
    pub fn from_map(map: &RawMap) -> Result<Self, DecodeError> {
        let mut headers = Self::new();
        for (name, value) in map.iter() {
            headers.insert_entry(name, value)?;
        }
        Ok(headers)
    }

    /// Build from a YAML (or JSON) document. `null` and `{}` give an empty set.
    ///
    /// Names that differ only in case accumulate into one header.
    pub fn from_yaml(text: &str) -> Result<Self, DecodeError> {
        if text.trim().is_empty() {
            return Ok(Self::new());
        }
        let document: serde_yaml::Value = serde_yaml::from_str(text)
            .map_err(|e| DecodeError::HeadersYaml(YamlError::from(e)))?;

        match document {
            serde_yaml::Value::Null => Ok(Self::new()),
            serde_yaml::Value::Mapping(mapping) => {
                let mut headers = Self::new();
                for (name, value) in mapping {
                    let name = mapping_key(name).map_err(DecodeError::HeadersYaml)?;
                    let value = from_yaml(value).map_err(DecodeError::HeadersYaml)?;
                    headers.insert_entry(&name, &value)?;
                }
                Ok(headers)
            }
            other => {
                let other = from_yaml(other).map_err(DecodeError::HeadersYaml)?;
                Err(DecodeError::shape("mapping of header names", &other))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Values for `name`, matched case-insensitively. Empty when absent.
    pub fn get_all(&self, name: &str) -> &[HeaderValue] {
        self.entries
            .iter()
            .find(|(n, _)| n.as_str().eq_ignore_ascii_case(name))
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &[HeaderValue])> {
        self.entries.iter().map(|(n, v)| (n, v.as_slice()))
    }

    /// The set as an `http::HeaderMap`, for the server to append to responses.
    pub fn to_header_map(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, values) in &self.entries {
            for value in values {
                map.append(name.clone(), value.clone());
            }
        }
        map
    }
}

impl Serialize for HeaderSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, values) in &self.entries {
            let values: Vec<_> = values
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()))
                .collect();
            map.serialize_entry(name.as_str(), &values)?;
        }
        map.end()
    }
}

impl FromRaw for HeaderSet {
    const EXPECTED: &'static str = "YAML string or mapping of header names";
}

/// Hook for `(string, HeaderSet)`.
pub fn from_str(raw: &RawValue) -> Result<Hooked<HeaderSet>, DecodeError> {
    match raw {
        RawValue::Str(s) => HeaderSet::from_yaml(s).map(Hooked::Decoded),
        _ => Ok(Hooked::NotApplicable),
    }
}

/// Hook for `(mapping, HeaderSet)`.
pub fn from_map(raw: &RawValue) -> Result<Hooked<HeaderSet>, DecodeError> {
    match raw {
        RawValue::Map(map) => HeaderSet::from_map(map).map(Hooked::Decoded),
        _ => Ok(Hooked::NotApplicable),
    }
}
