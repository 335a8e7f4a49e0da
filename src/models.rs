//! Data models for the dataset summary.
//!
//! This module contains the record shape decoded from each JSONL line,
//! the frequency tables built during aggregation, and the final summary
//! document.

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

/// Field holding the record label.
pub const LABEL_FIELD: &str = "conspiracy";
/// Field holding the subreddit the post came from.
pub const SUBREDDIT_FIELD: &str = "subreddit";
/// Field holding the post body.
pub const TEXT_FIELD: &str = "text";
/// Field holding the extracted marker list.
pub const MARKERS_FIELD: &str = "markers";
/// Field holding a marker's type, inside each marker object.
pub const MARKER_TYPE_FIELD: &str = "type";

/// A present field whose value has a shape the summary cannot use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("field `{field}` {reason}")]
pub struct FieldError {
    /// Name of the offending field (dotted for nested fields).
    pub field: &'static str,
    /// What was wrong with it.
    pub reason: String,
}

impl FieldError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// A scalar JSON value used as a frequency-table key.
///
/// Labels and marker types are not guaranteed to be strings in the
/// dataset, so keys keep the JSON type they were decoded with. `null` is
/// never a key; it means the field is absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Bool(bool),
    Number(Number),
    Text(String),
}

impl Key {
    /// Interpret a JSON value as a key.
    ///
    /// Returns `Ok(None)` for `null`, and an error for arrays and objects.
    pub fn from_value(field: &'static str, value: Value) -> Result<Option<Self>, FieldError> {
        match value {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(Key::Bool(b))),
            Value::Number(n) => Ok(Some(Key::Number(n))),
            Value::String(s) => Ok(Some(Key::Text(s))),
            other => Err(FieldError::new(
                field,
                format!("must be a scalar, found {}", value_kind(&other)),
            )),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Bool(b) => write!(f, "{}", b),
            Key::Number(n) => write!(f, "{}", n),
            Key::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(s.to_string())
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Key::Bool(b) => serializer.serialize_bool(*b),
            Key::Number(n) => n.serialize(serializer),
            Key::Text(s) => serializer.serialize_str(s),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// `null`, `false`, zero, and empty strings, arrays and objects.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(obj) => obj.is_empty(),
    }
}

/// Remove `field` from `obj` and interpret it as an optional key.
fn take_key(
    obj: &mut Map<String, Value>,
    name: &str,
    field: &'static str,
) -> Result<Option<Key>, FieldError> {
    match obj.remove(name) {
        Some(value) => Key::from_value(field, value),
        None => Ok(None),
    }
}

/// An annotation attached to a record. Only its type is kept.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Marker {
    /// The marker type, `None` when absent or `null`.
    pub kind: Option<Key>,
}

impl Marker {
    /// Build a marker from one element of the `markers` array.
    pub fn from_value(value: Value) -> Result<Self, FieldError> {
        match value {
            Value::Object(mut obj) => Ok(Self {
                kind: take_key(&mut obj, MARKER_TYPE_FIELD, "markers.type")?,
            }),
            other => Err(FieldError::new(
                MARKERS_FIELD,
                format!("entries must be objects, found {}", value_kind(&other)),
            )),
        }
    }
}

/// One decoded dataset row.
///
/// Absent and `null` fields fall back as follows: label and subreddit
/// become `None`, text becomes the empty string, markers become an empty
/// list. Text and markers also fall back on any empty value (`false`, `0`,
/// `""`, `[]`, `{}`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    pub label: Option<Key>,
    pub subreddit: Option<Key>,
    pub text: String,
    pub markers: Vec<Marker>,
}

impl Record {
    /// Build a record from a decoded JSON object. Unknown fields are ignored.
    pub fn from_object(mut obj: Map<String, Value>) -> Result<Self, FieldError> {
        let label = take_key(&mut obj, LABEL_FIELD, LABEL_FIELD)?;
        let subreddit = take_key(&mut obj, SUBREDDIT_FIELD, SUBREDDIT_FIELD)?;

        let text = match obj.remove(TEXT_FIELD) {
            None => String::new(),
            Some(Value::String(s)) => s,
            Some(value) if is_empty_value(&value) => String::new(),
            Some(other) => {
                return Err(FieldError::new(
                    TEXT_FIELD,
                    format!("must be a string, found {}", value_kind(&other)),
                ))
            }
        };

        let markers = match obj.remove(MARKERS_FIELD) {
            None => Vec::new(),
            Some(value) if is_empty_value(&value) => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(Marker::from_value)
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => {
                return Err(FieldError::new(
                    MARKERS_FIELD,
                    format!("must be an array, found {}", value_kind(&other)),
                ))
            }
        };

        Ok(Self {
            label,
            subreddit,
            text,
            markers,
        })
    }

    /// Length of the text in characters (Unicode scalar values).
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A key -> count accumulator that remembers first-seen key order.
#[derive(Debug, Clone)]
pub struct FrequencyTable<K> {
    index: HashMap<K, usize>,
    entries: Vec<(K, u64)>,
}

impl<K> Default for FrequencyTable<K> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> FrequencyTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `key`.
    pub fn increment(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    /// Count for `key`, zero if never seen.
    #[allow(dead_code)] // Lookup utility
    pub fn get(&self, key: &K) -> u64 {
        self.index
            .get(key)
            .map(|&slot| self.entries[slot].1)
            .unwrap_or(0)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)] // Pairs with len()
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.entries.iter().map(|(key, count)| (key, *count))
    }

    /// The `n` highest counts, descending. Equal counts keep first-seen order.
    pub fn most_common(&self, n: usize) -> Vec<(K, u64)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
        ranked.truncate(n);
        ranked
    }
}

impl<K: fmt::Display> FrequencyTable<K> {
    /// Entries merged by textual form, in first-seen order.
    ///
    /// Keys that render the same (`1` and `"1"`) share one entry, carrying
    /// the first key seen and the summed count.
    pub fn merged_by_text(&self) -> Vec<(&K, u64)> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut merged: Vec<(&K, u64)> = Vec::with_capacity(self.entries.len());

        for (key, count) in &self.entries {
            match index.entry(key.to_string()) {
                Entry::Occupied(slot) => merged[*slot.get()].1 += count,
                Entry::Vacant(slot) => {
                    slot.insert(merged.len());
                    merged.push((key, *count));
                }
            }
        }

        merged
    }
}

impl<K: fmt::Display> Serialize for FrequencyTable<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let merged = self.merged_by_text();
        let mut map = serializer.serialize_map(Some(merged.len()))?;
        for (key, count) in merged {
            map.serialize_entry(&key.to_string(), &count)?;
        }
        map.end()
    }
}

/// Five-number summary of text lengths, in characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthStats {
    pub min: usize,
    pub p25: usize,
    pub median: usize,
    pub p75: usize,
    pub max: usize,
}

impl fmt::Display for LengthStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{min: {}, p25: {}, median: {}, p75: {}, max: {}}}",
            self.min, self.p25, self.median, self.p75, self.max
        )
    }
}

/// The aggregate summary written to the output document.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    /// Number of non-blank input lines.
    pub rows: u64,
    /// Full label frequency table.
    pub labels: FrequencyTable<Key>,
    /// Highest-count subreddits, descending.
    pub top_subreddits: Vec<(Key, u64)>,
    /// Full marker-type frequency table.
    pub marker_types: FrequencyTable<Key>,
    /// Text length distribution.
    pub text_length_chars: LengthStats,
}

/// Context for human-readable report rendering. Not part of the JSON document.
#[derive(Debug, Clone)]
pub struct ReportMetadata {
    /// Path of the analyzed dataset.
    pub input: String,
    /// When the summary was produced.
    pub generated_at: DateTime<Utc>,
    /// Wall-clock time spent reading and aggregating, in seconds.
    pub duration_seconds: f64,
}
