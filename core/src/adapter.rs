//! Adapter traits implemented by generated table bindings.
//!
//! The `#[SQLiteDatabase]` macro implements [`TableAdapter`] for every
//! `#[table]` struct and [`QueryAdapter`] for every `#[query_model]`
//! struct. The required items carry the generated SQL fragments and
//! per-row code; the provided methods compose them into the persistence
//! operations cascade code and [`Model`](crate::model::Model) impls call.

use rusqlite::Connection;

use crate::error::Result;
use crate::property::OperatorGroup;
use crate::values::ContentValues;
use crate::{loam_trace_cascade, loam_trace_sql};

/// Generated binding for one table.
pub trait TableAdapter {
    /// The row struct this adapter persists.
    type Row;

    /// Table name as used in SQL statements.
    const NAME: &'static str;
    /// Full `CREATE TABLE` statement.
    const CREATE_TABLE_SQL: &'static str;
    /// Physical column names, in declaration order (references expanded).
    const COLUMN_NAMES: &'static [&'static str];
    /// Quoted column-name list used as the select projection.
    const PROJECTION: &'static str;
    /// Quoted name list inside the `PRIMARY KEY(…)` clause.
    const PRIMARY_KEY: &'static str;
    /// `INSERT INTO … VALUES (…)` with one placeholder per column.
    const INSERT_SQL: &'static str;
    /// `"col"=?,…` fragment covering every column, declaration order.
    const UPDATE_CLAUSE: &'static str;

    /// Populate `values` with every column of `row`, in column order.
    fn bind_values(row: &Self::Row, values: &mut ContentValues);

    /// Bind every column of `row` positionally, starting at parameter 1.
    fn bind_row(row: &Self::Row, stmt: &mut rusqlite::Statement<'_>) -> Result<()>;

    /// Rehydrate one row from a result cursor.
    fn load_from_row(conn: &Connection, row: &rusqlite::Row<'_>) -> Result<Self::Row>;

    /// Primary-key match for `row`, used by UPDATE/DELETE/EXISTS.
    fn primary_conditions(row: &Self::Row) -> OperatorGroup;

    /// Cascade-save referenced rows before persisting `row` itself.
    fn save_references(row: &mut Self::Row, conn: &Connection) -> Result<()>;

    /// Cascade-delete referenced rows after deleting `row` itself.
    fn delete_references(row: &Self::Row, conn: &Connection) -> Result<()>;

    fn exists(row: &Self::Row, conn: &Connection) -> Result<bool> {
        let group = Self::primary_conditions(row);
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM \"{}\" WHERE {})",
            Self::NAME,
            group.clause()
        );
        loam_trace_sql!(&sql, "exists");
        let mut stmt = conn.prepare(&sql)?;
        for (i, value) in group.params().iter().enumerate() {
            stmt.raw_bind_parameter(i + 1, value)?;
        }
        let mut rows = stmt.raw_query();
        match rows.next()? {
            Some(row) => Ok(row.get::<_, i64>(0)? != 0),
            None => Ok(false),
        }
    }

    fn insert_row(row: &Self::Row, conn: &Connection) -> Result<usize> {
        loam_trace_sql!(Self::INSERT_SQL, "insert");
        let mut stmt = conn.prepare(Self::INSERT_SQL)?;
        Self::bind_row(row, &mut stmt)?;
        Ok(stmt.raw_execute()?)
    }

    fn update_row(row: &Self::Row, conn: &Connection) -> Result<usize> {
        let group = Self::primary_conditions(row);
        let sql = format!(
            "UPDATE \"{}\" SET {} WHERE {}",
            Self::NAME,
            Self::UPDATE_CLAUSE,
            group.clause()
        );
        loam_trace_sql!(&sql, "update");
        let mut stmt = conn.prepare(&sql)?;
        Self::bind_row(row, &mut stmt)?;
        let offset = Self::COLUMN_NAMES.len();
        for (i, value) in group.params().iter().enumerate() {
            stmt.raw_bind_parameter(offset + i + 1, value)?;
        }
        Ok(stmt.raw_execute()?)
    }

    /// Insert-or-update `row`, cascading saves to referenced rows first.
    fn save_row(row: &mut Self::Row, conn: &Connection) -> Result<()> {
        loam_trace_cascade!("save", Self::NAME);
        Self::save_references(row, conn)?;
        if Self::exists(row, conn)? {
            Self::update_row(row, conn)?;
        } else {
            Self::insert_row(row, conn)?;
        }
        Ok(())
    }

    /// Delete `row`, then cascade deletes to referenced rows.
    fn delete_row(row: &Self::Row, conn: &Connection) -> Result<()> {
        let group = Self::primary_conditions(row);
        let sql = format!("DELETE FROM \"{}\" WHERE {}", Self::NAME, group.clause());
        loam_trace_sql!(&sql, "delete");
        let mut stmt = conn.prepare(&sql)?;
        for (i, value) in group.params().iter().enumerate() {
            stmt.raw_bind_parameter(i + 1, value)?;
        }
        stmt.raw_execute()?;
        loam_trace_cascade!("delete", Self::NAME);
        Self::delete_references(row, conn)?;
        Ok(())
    }

    /// Load at most one row matching `group`, used by eager reference
    /// loading.
    fn select_one(conn: &Connection, group: &OperatorGroup) -> Result<Option<Self::Row>> {
        let sql = format!(
            "SELECT {} FROM \"{}\" WHERE {}",
            Self::PROJECTION,
            Self::NAME,
            group.clause()
        );
        loam_trace_sql!(&sql, "select");
        let mut stmt = conn.prepare(&sql)?;
        for (i, value) in group.params().iter().enumerate() {
            stmt.raw_bind_parameter(i + 1, value)?;
        }
        let mut rows = stmt.raw_query();
        match rows.next()? {
            Some(row) => Ok(Some(Self::load_from_row(conn, row)?)),
            None => Ok(None),
        }
    }
}

/// Generated binding for one load-only query model.
pub trait QueryAdapter {
    type Row;

    /// Column names, in declaration order.
    const COLUMN_NAMES: &'static [&'static str];

    fn load_from_row(conn: &Connection, row: &rusqlite::Row<'_>) -> Result<Self::Row>;
}
