//! Form field descriptors and leaf storage

use crate::state::wizard::FieldPathError;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How a field is edited and rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text input
    Text,
    /// Free text input, masked when displayed
    Secret,
    /// One value out of a list, cycled with the arrow keys
    Choice,
    /// Computed from other fields, never edited directly
    Derived,
}

impl FieldKind {
    pub fn is_editable(&self) -> bool {
        !matches!(self, FieldKind::Derived)
    }
}

/// A typed path to one leaf of a wizard form.
///
/// Displays as the dotted path (`"expediteur.nom"`) and parses back from it.
pub trait FieldPath:
    Copy
    + Ord
    + Eq
    + fmt::Debug
    + fmt::Display
    + FromStr<Err = FieldPathError>
    + Send
    + Sync
    + 'static
{
    fn label(&self) -> &'static str;

    fn kind(&self) -> FieldKind {
        FieldKind::Text
    }
}

/// One option of a choice field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A form section whose text leaves are addressable by field key
pub trait TextSection<K>: Clone {
    fn text(&self, key: K) -> Option<&str>;
    fn text_mut(&mut self, key: K) -> Option<&mut String>;
}

/// Replace one text leaf of a shared section.
///
/// The section is cloned only when the value actually changes, so untouched
/// sections and same-value writes keep their `Arc` identity. Returns whether
/// the leaf changed.
pub fn replace_leaf<S, K>(section: &mut Arc<S>, key: K, value: &str) -> bool
where
    S: TextSection<K>,
    K: Copy,
{
    match section.text(key) {
        Some(current) if current != value => {}
        _ => return false,
    }
    match Arc::make_mut(section).text_mut(key) {
        Some(slot) => {
            slot.clear();
            slot.push_str(value);
            true
        }
        None => false,
    }
}
