//! Per-field validation errors

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Validation errors keyed by field path.
///
/// A key is present only while its field is invalid. The first message
/// recorded for a field wins, so rules are checked from the most basic
/// (presence) to the most specific (shape, range).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMap<K: Ord> {
    entries: BTreeMap<K, String>,
}

impl<K: Ord> Default for ErrorMap<K> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy> ErrorMap<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for a field unless one is already present
    pub fn insert(&mut self, field: K, message: impl Into<String>) {
        self.entries.entry(field).or_insert_with(|| message.into());
    }

    /// Drop the error for a field, returning its message
    pub fn remove(&mut self, field: K) -> Option<String> {
        self.entries.remove(&field)
    }

    pub fn get(&self, field: K) -> Option<&str> {
        self.entries.get(&field).map(String::as_str)
    }

    #[allow(dead_code)]
    pub fn contains(&self, field: K) -> bool {
        self.entries.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Failing fields in path order
    pub fn fields(&self) -> impl Iterator<Item = K> + '_ {
        self.entries.keys().copied()
    }
}

impl<K: Ord + Copy + fmt::Display> ErrorMap<K> {
    /// Errors keyed by their dotted path (`"expediteur.nom"`)
    #[allow(dead_code)]
    pub fn to_dotted(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// A dotted field path that does not name a field of the form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldPathError {
    #[error("field path `{0}` must have the form `section.field`")]
    Malformed(String),
    #[error("unknown form section `{0}`")]
    UnknownSection(String),
    #[error("unknown field `{field}` in section `{section}`")]
    UnknownField { section: String, field: String },
}

/// Split `"section.field"` into its two halves
pub fn split_path(path: &str) -> Result<(&str, &str), FieldPathError> {
    match path.split_once('.') {
        Some((section, field)) if !section.is_empty() && !field.is_empty() => Ok((section, field)),
        _ => Err(FieldPathError::Malformed(path.to_string())),
    }
}
