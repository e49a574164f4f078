//! Tracing utilities for generated persistence code.
//!
//! Enable the `tracing` feature to emit events via the `tracing` crate.
//! These macros no-op when the feature is disabled, avoiding `#[cfg]`
//! boilerplate at every call site.

/// Emit a debug-level tracing event with the SQL text about to execute.
///
/// ```ignore
/// loam_trace_sql!(Self::INSERT_SQL, "insert");
/// ```
#[macro_export]
macro_rules! loam_trace_sql {
    ($sql:expr, $op:literal) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(sql = %$sql, op = $op, "loam.statement");
    };
}

/// Emit a debug-level tracing event for a cascade save/delete hop.
///
/// ```ignore
/// loam_trace_cascade!("save", "authors");
/// ```
#[macro_export]
macro_rules! loam_trace_cascade {
    ($op:literal, $table:expr) => {
        #[cfg(feature = "tracing")]
        tracing::debug!(op = $op, table = $table, "loam.cascade");
    };
}
