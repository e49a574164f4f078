//! The in-round definition registry.
//!
//! Classification never performs cross-entity lookups; once every
//! definition in the module has been discovered, a registry snapshot is
//! built and injected into reference resolution. The lookup surface is a
//! narrow trait so unit tests can supply fakes with a fixed catalog.

use syn::{Expr, ExprPath, Ident, Type};

use super::field::{ColumnDefinition, SQLiteType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DefinitionKind {
    Table,
    QueryModel,
}

/// One column of a referenced definition, as seen by resolution.
#[derive(Clone)]
pub(crate) struct CandidateColumn {
    pub(crate) name: String,
    pub(crate) field_ident: Ident,
    pub(crate) base_type: Type,
    pub(crate) sqlite_type: SQLiteType,
    pub(crate) is_primary: bool,
    pub(crate) converter: Option<ExprPath>,
    pub(crate) default_value: Option<Expr>,
}

impl CandidateColumn {
    pub(crate) fn from_column(def: &ColumnDefinition) -> Self {
        Self {
            name: def.column_name.clone(),
            field_ident: def.field_ident.clone(),
            base_type: def.base_type.clone(),
            sqlite_type: def.sqlite_type,
            is_primary: def.is_primary,
            converter: def.converter.clone(),
            default_value: def.default_value.clone(),
        }
    }
}

/// Registry snapshot of one table or query-model definition.
#[derive(Clone)]
pub(crate) struct RegistryEntry {
    pub(crate) database: String,
    pub(crate) type_name: String,
    pub(crate) kind: DefinitionKind,
    pub(crate) struct_ident: Ident,
    pub(crate) adapter_ident: Ident,
    pub(crate) table_name: String,
    /// Scalar columns, declaration order.
    pub(crate) columns: Vec<CandidateColumn>,
}

impl RegistryEntry {
    /// Primary-key columns, declaration order.
    pub(crate) fn primary_columns(&self) -> Vec<&CandidateColumn> {
        self.columns.iter().filter(|c| c.is_primary).collect()
    }
}

/// Narrow lookup interface injected into reference resolution.
pub(crate) trait ReferenceLookup {
    fn lookup(&self, database: &str, type_name: &str) -> Option<&RegistryEntry>;
}

/// Registry of every definition discovered in the current round.
#[derive(Default)]
pub(crate) struct DefinitionRegistry {
    entries: Vec<RegistryEntry>,
}

impl DefinitionRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register `entry`, keeping the first registration for a
    /// `(database, type)` pair.
    pub(crate) fn insert(&mut self, entry: RegistryEntry) {
        if self.lookup(&entry.database, &entry.type_name).is_none() {
            self.entries.push(entry);
        }
    }
}

impl ReferenceLookup for DefinitionRegistry {
    fn lookup(&self, database: &str, type_name: &str) -> Option<&RegistryEntry> {
        self.entries
            .iter()
            .find(|e| e.database == database && e.type_name == type_name)
    }
}

/// What kind of declaration an identifier in the module refers to.
///
/// Built syntactically before any definition is constructed, so
/// classification can decide relationship kinds without touching the
/// registry.
#[derive(Default)]
pub(crate) struct TypeCatalog {
    tables: Vec<(String, bool)>,
    query_models: Vec<String>,
    embeddables: Vec<String>,
}

impl TypeCatalog {
    pub(crate) fn add_table(&mut self, name: String, is_model: bool) {
        self.tables.push((name, is_model));
    }

    pub(crate) fn add_query_model(&mut self, name: String) {
        self.query_models.push(name);
    }

    pub(crate) fn add_embeddable(&mut self, name: String) {
        self.embeddables.push(name);
    }

    pub(crate) fn is_table(&self, name: &str) -> bool {
        self.tables.iter().any(|(table, _)| table == name)
    }

    pub(crate) fn is_model_table(&self, name: &str) -> bool {
        self.tables
            .iter()
            .any(|(table, is_model)| table == name && *is_model)
    }

    pub(crate) fn is_query_model(&self, name: &str) -> bool {
        self.query_models.iter().any(|q| q == name)
    }

    pub(crate) fn is_embeddable(&self, name: &str) -> bool {
        self.embeddables.iter().any(|e| e == name)
    }
}
