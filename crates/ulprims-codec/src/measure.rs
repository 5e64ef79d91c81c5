use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{ParseError, Result};
use crate::separator::{ASSIGN, FIELD, GROUP};

/// One reporting event: ordered key/value readings.
///
/// Keys are unique. Inserting an existing key replaces its value and keeps
/// the key at its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasureGroup {
    entries: Vec<(String, String)>,
}

impl MeasureGroup {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a reading, returning the previous value for `key` if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Look up the value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate readings in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Keys in first-insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MeasureGroup {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut group = Self::new();
        for (key, value) in iter {
            group.insert(key, value);
        }
        group
    }
}

impl Serialize for MeasureGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// All measure groups of one incoming message, in wire order.
pub type MeasurePayload = Vec<MeasureGroup>;

/// Parse a measure payload: `k=v|k=v#k=v`.
///
/// Every group must be a non-empty sequence of `key=value` fields with no
/// empty key or value.
pub fn parse_measures(payload: &str) -> Result<MeasurePayload> {
    payload.split(GROUP).map(parse_group).collect()
}

/// Parse a measure payload from raw bytes.
pub fn decode_measures(payload: &[u8]) -> Result<MeasurePayload> {
    let text = std::str::from_utf8(payload).map_err(|_| ParseError::InvalidUtf8)?;
    parse_measures(text)
}

fn parse_group(group: &str) -> Result<MeasureGroup> {
    let fields: Vec<Vec<&str>> = group
        .split(FIELD)
        .map(|field| field.split(ASSIGN).collect())
        .collect();

    if fields.iter().flatten().any(|token| token.is_empty()) {
        return Err(ParseError::EmptyToken {
            group: group.to_string(),
        });
    }
    if fields.iter().any(|tokens| tokens.len() != 2) {
        return Err(ParseError::UnpairedToken {
            group: group.to_string(),
        });
    }

    Ok(fields
        .into_iter()
        .map(|tokens| (tokens[0], tokens[1]))
        .collect())
}

/// Encode one group as `k=v|k=v`.
pub fn encode_group(group: &MeasureGroup) -> String {
    let mut out = String::new();
    for (i, (key, value)) in group.iter().enumerate() {
        if i > 0 {
            out.push(FIELD);
        }
        out.push_str(key);
        out.push(ASSIGN);
        out.push_str(value);
    }
    out
}

/// Encode a measure payload, joining groups with `#`.
pub fn encode_measures(payload: &[MeasureGroup]) -> String {
    payload
        .iter()
        .map(encode_group)
        .collect::<Vec<_>>()
        .join(&GROUP.to_string())
}
