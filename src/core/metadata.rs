//! Image metadata dictionary.
//!
//! A volume carries a small keyed dictionary alongside its voxels. The
//! object map reader stores the decoded entry array here under
//! [`ENTRY_ARRAY_KEY`] so it travels with the label volume until a
//! [`LabelMap`](crate::labelmap::LabelMap) picks it up.

use smallvec::SmallVec;
use std::fmt;

use crate::entry::ObjectEntry;

/// Dictionary key of the object entry array.
pub const ENTRY_ARRAY_KEY: &str = "ANALYZE_OBJECT_LABEL_MAP_ENTRY_ARRAY";

/// Value stored in a [`MetaData`] dictionary.
#[derive(Clone, Debug, PartialEq)]
pub enum MetaValue {
    Text(String),
    Int(i64),
    Entries(Vec<ObjectEntry>),
}

/// Keyed metadata attached to a volume.
///
/// Uses SmallVec optimization for the common case of few entries.
#[derive(Clone, Default, PartialEq)]
pub struct MetaData {
    entries: SmallVec<[(String, MetaValue); 4]>,
}

impl MetaData {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value, replacing any previous value under the same key.
    pub fn set(&mut self, key: impl Into<String>, value: MetaValue) {
        let key = key.into();
        for (k, v) in &mut self.entries {
            if *k == key {
                *v = value;
                return;
            }
        }
        self.entries.push((key, value));
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Get a text value by key.
    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(MetaValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Get an integer value by key.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(MetaValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Check if a key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Remove a key and return its value.
    pub fn remove(&mut self, key: &str) -> Option<MetaValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over key-value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    // === Entry array ===

    /// Object entries attached by a reader, if any.
    pub fn entries(&self) -> Option<&[ObjectEntry]> {
        match self.get(ENTRY_ARRAY_KEY) {
            Some(MetaValue::Entries(e)) => Some(e),
            _ => None,
        }
    }

    /// Attach an entry array.
    pub fn set_entries(&mut self, entries: Vec<ObjectEntry>) {
        self.set(ENTRY_ARRAY_KEY, MetaValue::Entries(entries));
    }

    /// Detach and return the entry array.
    pub fn take_entries(&mut self) -> Option<Vec<ObjectEntry>> {
        if !matches!(self.get(ENTRY_ARRAY_KEY), Some(MetaValue::Entries(_))) {
            return None;
        }
        match self.remove(ENTRY_ARRAY_KEY) {
            Some(MetaValue::Entries(e)) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Debug for MetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}
