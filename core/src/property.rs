//! Typed column properties and the minimal condition clauses generated
//! comparison code builds from them.

use std::marker::PhantomData;

use crate::value::Value;

/// A typed handle to one physical column of a table.
///
/// Generated adapters expose one `Property` constant per column, so query
/// code can say `BookTable::title` instead of repeating string names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Property<T> {
    name: &'static str,
    table: &'static str,
    _marker: PhantomData<T>,
}

impl<T> Property<T> {
    pub const fn new(table: &'static str, name: &'static str) -> Self {
        Self {
            name,
            table,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Build an equality condition against this column.
    pub fn eq(&self, value: impl Into<Value>) -> Condition {
        Condition {
            column: self.name,
            value: value.into(),
        }
    }
}

/// Object-safe view of a property, used by name-based lookups.
pub trait PropertyInfo {
    fn name(&self) -> &'static str;
    fn table(&self) -> &'static str;
}

impl<T> PropertyInfo for Property<T> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn table(&self) -> &'static str {
        self.table
    }
}

/// A single `"column" = ?` comparison with its bound value.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    column: &'static str,
    value: Value,
}

impl Condition {
    pub fn new(column: &'static str, value: impl Into<Value>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }

    pub fn column(&self) -> &'static str {
        self.column
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    fn clause(&self) -> String {
        format!("\"{}\"=?", self.column)
    }
}

/// An `AND`-joined group of conditions, e.g. a composite primary key match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OperatorGroup {
    conditions: Vec<Condition>,
}

impl OperatorGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Render the WHERE-clause text, values bound positionally via
    /// [`params`](Self::params).
    pub fn clause(&self) -> String {
        self.conditions
            .iter()
            .map(Condition::clause)
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    pub fn params(&self) -> Vec<&Value> {
        self.conditions.iter().map(|c| &c.value).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_renders_and_joined_clause() {
        let group = OperatorGroup::new()
            .and(Condition::new("id", 1i64))
            .and(Condition::new("name", "x"));
        assert_eq!(group.clause(), "\"id\"=? AND \"name\"=?");
        assert_eq!(group.params().len(), 2);
    }
}
