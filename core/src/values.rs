//! Named value buffer populated by generated `bind_values` code.

use crate::value::Value;

/// An ordered collection of `(column, value)` pairs for one row.
///
/// Insertion order is the adapter's column order, so the buffer can back
/// both named-parameter statements and diagnostic dumps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentValues {
    entries: Vec<(&'static str, Value)>,
}

impl ContentValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `column`, replacing an earlier put for the same
    /// column.
    pub fn put(&mut self, column: &'static str, value: impl Into<Value>) {
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(name, _)| *name == column) {
            entry.1 = value;
        } else {
            self.entries.push((column, value));
        }
    }

    /// Store SQL `NULL` under `column`.
    pub fn put_null(&mut self, column: &'static str) {
        self.put(column, Value::Null);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.entries.iter().map(|(name, value)| (*name, value))
    }
}
