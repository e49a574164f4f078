//! Table metadata snapshots.
//!
//! Each table emits a `__LOAM_TABLE_META` JSON constant describing its
//! physical schema, for external tooling that diffs schema snapshots.

use serde_json::json;

use super::field::SQLiteType;

/// One physical column as it appears in the snapshot.
pub(crate) struct MetaColumn {
    pub(crate) name: String,
    pub(crate) sqlite_type: SQLiteType,
    pub(crate) not_null: bool,
    pub(crate) primary: bool,
}

/// Render the snapshot JSON for one table.
pub(crate) fn table_meta_json(table_name: &str, columns: &[MetaColumn]) -> String {
    let column_values: Vec<_> = columns
        .iter()
        .map(|column| {
            json!({
                "name": column.name,
                "type": column.sqlite_type.to_sql_type(),
                "notNull": column.not_null,
                "primaryKey": column.primary,
            })
        })
        .collect();

    let primary_key: Vec<_> = columns
        .iter()
        .filter(|c| c.primary)
        .map(|c| c.name.clone())
        .collect();

    json!({
        "name": table_name,
        "columns": column_values,
        "primaryKey": primary_key,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_round_trips_through_serde_json() {
        let columns = vec![
            MetaColumn {
                name: "id".to_string(),
                sqlite_type: SQLiteType::Integer,
                not_null: true,
                primary: true,
            },
            MetaColumn {
                name: "title".to_string(),
                sqlite_type: SQLiteType::Text,
                not_null: true,
                primary: false,
            },
        ];
        let rendered = table_meta_json("books", &columns);
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["name"], "books");
        assert_eq!(value["columns"].as_array().unwrap().len(), 2);
        assert_eq!(value["primaryKey"][0], "id");
    }
}
