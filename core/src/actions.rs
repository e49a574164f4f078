//! Conflict and referential-action policies carried into generated DDL.

use std::fmt;

/// Policy applied when a `NOT NULL` (or other constrained) write conflicts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConflictAction {
    /// No explicit policy; SQLite's default applies.
    #[default]
    None,
    Rollback,
    Abort,
    Fail,
    Ignore,
    Replace,
}

impl ConflictAction {
    /// The SQL keyword, or `None` for the default policy.
    pub fn as_sql(&self) -> Option<&'static str> {
        match self {
            ConflictAction::None => None,
            ConflictAction::Rollback => Some("ROLLBACK"),
            ConflictAction::Abort => Some("ABORT"),
            ConflictAction::Fail => Some("FAIL"),
            ConflictAction::Ignore => Some("IGNORE"),
            ConflictAction::Replace => Some("REPLACE"),
        }
    }
}

impl fmt::Display for ConflictAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql().unwrap_or(""))
    }
}

/// Referential action for `ON DELETE` / `ON UPDATE` clauses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ForeignKeyAction {
    #[default]
    NoAction,
    Restrict,
    SetNull,
    SetDefault,
    Cascade,
}

impl ForeignKeyAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ForeignKeyAction::NoAction => "NO ACTION",
            ForeignKeyAction::Restrict => "RESTRICT",
            ForeignKeyAction::SetNull => "SET NULL",
            ForeignKeyAction::SetDefault => "SET DEFAULT",
            ForeignKeyAction::Cascade => "CASCADE",
        }
    }
}

impl fmt::Display for ForeignKeyAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}
