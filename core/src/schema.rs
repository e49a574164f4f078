//! Database-level schema trait implemented by the generated database type.

use rusqlite::Connection;

use crate::error::Result;

/// The generated `<Name>Database` type implements this trait; the create
/// statements are ordered by declaration, so parent tables precede the
/// tables referencing them.
pub trait DatabaseSchema {
    const NAME: &'static str;
    /// One `CREATE TABLE` statement per table, declaration order.
    const CREATE_STATEMENTS: &'static [&'static str];

    fn create_all(conn: &Connection) -> Result<()> {
        for sql in Self::CREATE_STATEMENTS {
            conn.execute_batch(sql)?;
        }
        Ok(())
    }
}
