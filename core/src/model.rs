//! The model trait implemented for `#[table(…, model)]` row structs.

use rusqlite::Connection;

use crate::error::Result;

/// Self-persisting row value.
///
/// Generated impls delegate to the table's
/// [`TableAdapter`](crate::adapter::TableAdapter); the trait exists so
/// cascade code (and user code) can persist a referenced row without
/// naming its adapter.
pub trait Model {
    /// Insert-or-update this row, cascading to referenced rows first.
    fn save(&mut self, conn: &Connection) -> Result<()>;

    /// Delete this row, then cascade deletes to referenced rows.
    fn delete(&self, conn: &Connection) -> Result<()>;

    /// True when a row with this primary key exists.
    fn exists(&self, conn: &Connection) -> Result<bool>;
}
