//! CREATE TABLE assembly.

use loam_core::ForeignKeyAction;

/// One table-level `FOREIGN KEY` constraint.
pub(crate) struct ForeignKeyClause {
    pub(crate) local_columns: Vec<String>,
    pub(crate) foreign_table: String,
    pub(crate) foreign_columns: Vec<String>,
    pub(crate) on_delete: ForeignKeyAction,
    pub(crate) on_update: ForeignKeyAction,
    pub(crate) deferred: bool,
}

impl ForeignKeyClause {
    pub(crate) fn render(&self) -> String {
        let mut sql = format!(
            "FOREIGN KEY({}) REFERENCES \"{}\"({})",
            quote_list(&self.local_columns),
            self.foreign_table,
            quote_list(&self.foreign_columns),
        );
        if self.on_update != ForeignKeyAction::NoAction {
            sql.push_str(" ON UPDATE ");
            sql.push_str(self.on_update.as_sql());
        }
        if self.on_delete != ForeignKeyAction::NoAction {
            sql.push_str(" ON DELETE ");
            sql.push_str(self.on_delete.as_sql());
        }
        if self.deferred {
            sql.push_str(" DEFERRABLE INITIALLY DEFERRED");
        }
        sql
    }
}

fn quote_list(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(",")
}

/// Assemble the full `CREATE TABLE` statement.
///
/// `primary_key_fragment` is the already-quoted name list; it is omitted
/// when the primary key was rendered inline (single autoincrement key).
pub(crate) fn create_table_sql(
    table_name: &str,
    column_fragments: &[String],
    primary_key_fragment: Option<&str>,
    foreign_keys: &[ForeignKeyClause],
    strict: bool,
) -> String {
    let mut body: Vec<String> = column_fragments.to_vec();
    if let Some(primary) = primary_key_fragment {
        if !primary.is_empty() {
            body.push(format!("PRIMARY KEY({primary})"));
        }
    }
    body.extend(foreign_keys.iter().map(ForeignKeyClause::render));

    let mut sql = format!(
        "CREATE TABLE IF NOT EXISTS \"{}\"({})",
        table_name,
        body.join(", ")
    );
    if strict {
        sql.push_str(" STRICT");
    }
    sql.push(';');
    sql
}
