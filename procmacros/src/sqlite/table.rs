//! Table definitions and binding emission.
//!
//! One `TableDefinition` per `#[table]` struct. Emission walks every
//! generation concern over the column list; scalar columns contribute
//! their own fragments, reference columns expand through their resolved
//! reference definitions and the combiners.

use heck::ToSnakeCase;
use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote};
use syn::{Expr, Ident, ItemStruct, Lit, Meta, Token};

use super::combiners::{
    CascadeDeleteCombiner, CascadeSaveCombiner, LoadOutcome, ReferenceAccessCombiner,
    ReferenceLoadCombiner,
};
use super::ddl::{self, ForeignKeyClause};
use super::field::ColumnDefinition;
use super::meta::{MetaColumn, table_meta_json};
use super::reference::{
    OwnerKind, ReferenceAttrKind, ReferenceColumnDefinition, ReferenceMapping,
};
use super::registry::{
    CandidateColumn, DefinitionKind, ReferenceLookup, RegistryEntry, TypeCatalog,
};
use crate::common::Diagnostics;
use crate::paths;

#[derive(Default)]
pub(crate) struct TableAttributes {
    pub(crate) name: Option<String>,
    pub(crate) model: bool,
    pub(crate) strict: bool,
}

impl TableAttributes {
    pub(crate) fn from_attribute(attr: &syn::Attribute, diag: &mut Diagnostics) -> Self {
        let mut attrs = TableAttributes::default();
        if matches!(attr.meta, Meta::Path(_)) {
            return attrs;
        }

        let metas = match attr
            .parse_args_with(syn::punctuated::Punctuated::<Meta, Token![,]>::parse_terminated)
        {
            Ok(metas) => metas,
            Err(err) => {
                diag.push(err);
                return attrs;
            }
        };

        for meta in metas {
            match &meta {
                Meta::NameValue(nv) if nv.path.is_ident("name") => {
                    if let Expr::Lit(lit) = &nv.value {
                        if let Lit::Str(s) = &lit.lit {
                            attrs.name = Some(s.value());
                            continue;
                        }
                    }
                    diag.error(Span::call_site(), "`name` expects a string literal");
                }
                Meta::Path(path) if path.is_ident("model") => attrs.model = true,
                Meta::Path(path) if path.is_ident("strict") => attrs.strict = true,
                other => {
                    diag.error(
                        other
                            .path()
                            .get_ident()
                            .map_or_else(Span::call_site, |ident| ident.span()),
                        "unrecognized table attribute.\n\
                         Supported: name = \"…\", model, strict",
                    );
                }
            }
        }
        attrs
    }
}

/// One column slot of a table, scalar or reference.
pub(crate) enum TableColumn {
    Scalar(ColumnDefinition),
    Reference(ReferenceColumnDefinition),
}

pub(crate) struct TableDefinition {
    pub(crate) struct_ident: Ident,
    pub(crate) vis: syn::Visibility,
    pub(crate) adapter_ident: Ident,
    pub(crate) table_name: String,
    pub(crate) database: String,
    pub(crate) is_model: bool,
    pub(crate) strict: bool,
    pub(crate) columns: Vec<TableColumn>,
}

/// Find the loam column annotation on a field, if any.
pub(crate) fn column_attribute(
    field: &syn::Field,
) -> Option<(&syn::Attribute, Option<ReferenceAttrKind>)> {
    field.attrs.iter().find_map(|attr| {
        if attr.path().is_ident("column") {
            Some((attr, None))
        } else if attr.path().is_ident("foreign_key") {
            Some((attr, Some(ReferenceAttrKind::ForeignKey)))
        } else if attr.path().is_ident("column_map") {
            Some((attr, Some(ReferenceAttrKind::ColumnMap)))
        } else {
            None
        }
    })
}

/// Build the column list shared by tables and query models.
pub(crate) fn columns_from_struct(
    item: &ItemStruct,
    owner: OwnerKind,
    catalog: &TypeCatalog,
    diag: &mut Diagnostics,
) -> Vec<TableColumn> {
    let syn::Fields::Named(fields) = &item.fields else {
        diag.error(
            item.ident.span(),
            "table and query model structs must have named fields",
        );
        return Vec::new();
    };

    let mut columns = Vec::new();
    for field in &fields.named {
        let Some((attr, reference_kind)) = column_attribute(field) else {
            diag.error(
                field.ident.as_ref().map_or_else(Span::call_site, |i| i.span()),
                "every field must be annotated with #[column], #[foreign_key] or #[column_map]",
            );
            continue;
        };

        match reference_kind {
            None => {
                if let Some(def) = ColumnDefinition::from_field(field, attr, diag) {
                    columns.push(TableColumn::Scalar(def));
                }
            }
            Some(kind) => {
                if let Some(def) = ReferenceColumnDefinition::from_field(
                    field, attr, kind, owner, catalog, diag,
                ) {
                    columns.push(TableColumn::Reference(def));
                }
            }
        }
    }
    columns
}

impl TableDefinition {
    pub(crate) fn from_item(
        item: &ItemStruct,
        attrs: TableAttributes,
        database: &str,
        catalog: &TypeCatalog,
        diag: &mut Diagnostics,
    ) -> Self {
        let struct_ident = item.ident.clone();
        let table_name = attrs
            .name
            .unwrap_or_else(|| struct_ident.to_string().to_snake_case());
        let columns = columns_from_struct(item, OwnerKind::Table, catalog, diag);

        Self {
            adapter_ident: format_ident!("{}Table", struct_ident),
            struct_ident,
            vis: item.vis.clone(),
            table_name,
            database: database.to_string(),
            is_model: attrs.model,
            strict: attrs.strict,
            columns,
        }
    }

    /// Snapshot for the definition registry: scalar columns only, since
    /// only they can serve as reference targets.
    pub(crate) fn registry_entry(&self) -> RegistryEntry {
        RegistryEntry {
            database: self.database.clone(),
            type_name: self.struct_ident.to_string(),
            kind: DefinitionKind::Table,
            struct_ident: self.struct_ident.clone(),
            adapter_ident: self.adapter_ident.clone(),
            table_name: self.table_name.clone(),
            columns: self
                .columns
                .iter()
                .filter_map(|column| match column {
                    TableColumn::Scalar(def) => Some(CandidateColumn::from_column(def)),
                    TableColumn::Reference(_) => None,
                })
                .collect(),
        }
    }

    /// The single primary-key column eligible for inline rendering:
    /// exactly one primary column, declared autoincrement, with no
    /// reference column participating in the key.
    fn inline_primary_key(&self) -> Option<&ColumnDefinition> {
        let reference_primary = self.columns.iter().any(|column| match column {
            TableColumn::Reference(reference) => reference.is_primary,
            TableColumn::Scalar(_) => false,
        });
        if reference_primary {
            return None;
        }
        let primaries: Vec<&ColumnDefinition> = self
            .columns
            .iter()
            .filter_map(|column| match column {
                TableColumn::Scalar(def) if def.is_primary => Some(def),
                _ => None,
            })
            .collect();
        match primaries.as_slice() {
            [single] if single.is_autoincrement => Some(single),
            _ => None,
        }
    }

    /// Emit the adapter type, its `TableAdapter` impl and, for `model`
    /// tables, the `Model` impl. Triggers reference resolution.
    pub(crate) fn emit(
        &mut self,
        registry: &dyn ReferenceLookup,
        diag: &mut Diagnostics,
    ) -> TokenStream {
        let database = self.database.clone();
        for column in &mut self.columns {
            if let TableColumn::Reference(reference) = column {
                reference.references(&database, registry, diag);
            }
        }

        let inline_pk_ident = self.inline_primary_key().map(|def| def.field_ident.clone());

        let mut property_fields = Vec::new();
        let mut property_cases = Vec::new();
        let mut column_names: Vec<String> = Vec::new();
        let mut creation_fragments: Vec<String> = Vec::new();
        let mut primary_fragments: Vec<String> = Vec::new();
        let mut foreign_keys: Vec<ForeignKeyClause> = Vec::new();
        let mut values_code = Vec::new();
        let mut bind_code = Vec::new();
        let mut load_inits = Vec::new();
        let mut compare_code = Vec::new();
        let mut save_code = Vec::new();
        let mut delete_code = Vec::new();
        let mut meta_columns = Vec::new();
        let mut bind_index = 0usize;

        for column in &self.columns {
            match column {
                TableColumn::Scalar(def) => {
                    let inline = inline_pk_ident
                        .as_ref()
                        .is_some_and(|ident| *ident == def.field_ident);

                    property_fields.push(def.property_field(&self.table_name));
                    property_cases.push(def.property_case(&self.table_name));
                    column_names.push(def.column_name.clone());
                    creation_fragments.push(def.creation_fragment(inline));
                    if def.is_primary && inline_pk_ident.is_none() {
                        primary_fragments.push(format!("\"{}\"", def.column_name));
                    }
                    values_code.push(def.bind_values_code());
                    bind_index += 1;
                    bind_code.push(def.bind_row_code(bind_index));
                    load_inits.push(def.load_code());
                    if def.is_primary {
                        compare_code.push(def.compare_code());
                    }
                    meta_columns.push(MetaColumn {
                        name: def.column_name.clone(),
                        sqlite_type: def.sqlite_type,
                        not_null: !def.is_nullable,
                        primary: def.is_primary,
                    });
                }
                TableColumn::Reference(reference) => {
                    self.emit_reference_column(
                        reference,
                        diag,
                        &mut property_fields,
                        &mut property_cases,
                        &mut column_names,
                        &mut creation_fragments,
                        &mut primary_fragments,
                        &mut foreign_keys,
                        &mut values_code,
                        &mut bind_code,
                        &mut load_inits,
                        &mut compare_code,
                        &mut save_code,
                        &mut delete_code,
                        &mut meta_columns,
                        &mut bind_index,
                    );
                }
            }
        }

        let primary_key = primary_fragments.join(",");
        let create_sql = ddl::create_table_sql(
            &self.table_name,
            &creation_fragments,
            if inline_pk_ident.is_some() {
                None
            } else {
                Some(primary_key.as_str())
            },
            &foreign_keys,
            self.strict,
        );

        let projection = column_names
            .iter()
            .map(|name| format!("\"{name}\""))
            .collect::<Vec<_>>()
            .join(",");
        let update_clause = column_names
            .iter()
            .map(|name| format!("\"{name}\"=?"))
            .collect::<Vec<_>>()
            .join(",");
        let insert_sql = format!(
            "INSERT INTO \"{}\"({}) VALUES ({})",
            self.table_name,
            projection,
            vec!["?"; column_names.len()].join(",")
        );
        let meta_json = table_meta_json(&self.table_name, &meta_columns);

        let struct_ident = &self.struct_ident;
        let adapter_ident = &self.adapter_ident;
        let vis = &self.vis;
        let table_name = &self.table_name;
        let names = &column_names;

        let property = paths::property_info();
        let table_adapter = paths::table_adapter();
        let content_values = paths::content_values();
        let operator_group = paths::operator_group();
        let connection = paths::connection();
        let rusqlite = paths::rusqlite();
        let result = paths::result();
        let option = paths::std_option();

        let group_init = if compare_code.is_empty() {
            quote! { let group = #operator_group::new(); }
        } else {
            quote! { let mut group = #operator_group::new(); }
        };

        let model_impl = if self.is_model {
            let model = paths::model();
            quote! {
                impl #model for #struct_ident {
                    fn save(&mut self, conn: &#connection) -> #result<()> {
                        <#adapter_ident as #table_adapter>::save_row(self, conn)
                    }

                    fn delete(&self, conn: &#connection) -> #result<()> {
                        <#adapter_ident as #table_adapter>::delete_row(self, conn)
                    }

                    fn exists(&self, conn: &#connection) -> #result<bool> {
                        <#adapter_ident as #table_adapter>::exists(self, conn)
                    }
                }
            }
        } else {
            quote! {}
        };

        quote! {
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            #vis struct #adapter_ident;

            #[allow(non_upper_case_globals, dead_code)]
            impl #adapter_ident {
                /// The table name as used in SQL statements.
                pub const TABLE_NAME: &'static str = #table_name;

                /// Schema snapshot in JSON form, for external tooling.
                pub const __LOAM_TABLE_META: &'static str = #meta_json;

                #(#property_fields)*

                /// Look up a column property by physical column name.
                pub fn property(name: &str) -> #option<&'static dyn #property> {
                    match name {
                        #(#property_cases)*
                        _ => #option::None,
                    }
                }
            }

            impl #table_adapter for #adapter_ident {
                type Row = #struct_ident;

                const NAME: &'static str = #table_name;
                const CREATE_TABLE_SQL: &'static str = #create_sql;
                const COLUMN_NAMES: &'static [&'static str] = &[#(#names),*];
                const PROJECTION: &'static str = #projection;
                const PRIMARY_KEY: &'static str = #primary_key;
                const INSERT_SQL: &'static str = #insert_sql;
                const UPDATE_CLAUSE: &'static str = #update_clause;

                fn bind_values(row: &Self::Row, values: &mut #content_values) {
                    #(#values_code)*
                }

                fn bind_row(
                    row: &Self::Row,
                    stmt: &mut #rusqlite::Statement<'_>,
                ) -> #result<()> {
                    #(#bind_code)*
                    Ok(())
                }

                fn load_from_row(
                    conn: &#connection,
                    row: &#rusqlite::Row<'_>,
                ) -> #result<Self::Row> {
                    Ok(#struct_ident {
                        #(#load_inits,)*
                    })
                }

                fn primary_conditions(row: &Self::Row) -> #operator_group {
                    #group_init
                    #(#compare_code)*
                    group
                }

                fn save_references(row: &mut Self::Row, conn: &#connection) -> #result<()> {
                    #(#save_code)*
                    Ok(())
                }

                fn delete_references(row: &Self::Row, conn: &#connection) -> #result<()> {
                    #(#delete_code)*
                    Ok(())
                }
            }

            #model_impl
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn emit_reference_column(
        &self,
        reference: &ReferenceColumnDefinition,
        diag: &mut Diagnostics,
        property_fields: &mut Vec<TokenStream>,
        property_cases: &mut Vec<TokenStream>,
        column_names: &mut Vec<String>,
        creation_fragments: &mut Vec<String>,
        primary_fragments: &mut Vec<String>,
        foreign_keys: &mut Vec<ForeignKeyClause>,
        values_code: &mut Vec<TokenStream>,
        bind_code: &mut Vec<TokenStream>,
        load_inits: &mut Vec<TokenStream>,
        compare_code: &mut Vec<TokenStream>,
        save_code: &mut Vec<TokenStream>,
        delete_code: &mut Vec<TokenStream>,
        meta_columns: &mut Vec<MetaColumn>,
        bind_index: &mut usize,
    ) {
        let refs = reference.resolved();
        let field_ident = &reference.field_ident;
        let property = paths::property();
        let property_info = paths::property_info();
        let table_name = &self.table_name;

        // Properties, names, DDL: always one entry per reference
        // definition.
        for definition in refs {
            if definition.column_name.is_empty() {
                diag.error(
                    field_ident.span(),
                    format!(
                        "found empty reference name at `{}` from table `{}`",
                        definition.foreign_column_name, self.struct_ident
                    ),
                );
            }
            if let Some(ident) = property_ident(&definition.column_name) {
                let base = &definition.base_type;
                let name = &definition.column_name;
                let doc = if reference.is_column_map() {
                    "Column mapped field"
                } else {
                    "Foreign key"
                };
                property_fields.push(quote! {
                    #[doc = #doc]
                    pub const #ident: #property<#base> = #property::new(#table_name, #name);
                });
                property_cases.push(quote! {
                    #name => {
                        static PROPERTY: #property<#base> = #property::new(#table_name, #name);
                        ::std::option::Option::Some(&PROPERTY as &dyn #property_info)
                    }
                });
            }

            let mut fragment = definition.creation_fragment();
            if definition.not_null {
                if let Some(policy) = definition.on_null_conflict.as_sql() {
                    fragment.push_str(" NOT NULL ON CONFLICT ");
                    fragment.push_str(policy);
                }
            }
            creation_fragments.push(fragment);
            if reference.is_primary {
                primary_fragments.push(definition.primary_key_fragment());
            }
            meta_columns.push(MetaColumn {
                name: definition.column_name.clone(),
                sqlite_type: definition.sqlite_type,
                not_null: definition.not_null,
                primary: reference.is_primary,
            });
        }

        // Table-level FOREIGN KEY constraint, for foreign keys whose
        // target is a table.
        if let ReferenceMapping::ForeignKeyMapping {
            on_delete,
            on_update,
            deferred,
            ..
        } = &reference.mapping
        {
            if let Some(target) = &reference.target {
                if target.kind == DefinitionKind::Table && !refs.is_empty() {
                    foreign_keys.push(ForeignKeyClause {
                        local_columns: refs.iter().map(|r| r.column_name.clone()).collect(),
                        foreign_table: target.table_name.clone(),
                        foreign_columns: refs
                            .iter()
                            .map(|r| r.foreign_column_name.clone())
                            .collect(),
                        on_delete: *on_delete,
                        on_update: *on_update,
                        deferred: *deferred,
                    });
                }
            }
        }

        if reference.is_scalar() {
            // Plain key column: one physical column typed as the key.
            let view = reference.scalar_view();
            column_names.push(view.column_name.clone());
            values_code.push(view.bind_values_code());
            *bind_index += 1;
            bind_code.push(view.bind_row_code(*bind_index));
            load_inits.push(view.load_code());
            if reference.is_primary {
                compare_code.push(view.compare_code());
            }
            return;
        }

        for definition in refs {
            column_names.push(definition.column_name.clone());
        }

        // Content-values population.
        let values_combiner = ReferenceAccessCombiner::new(
            quote!(row.#field_ident.as_ref()),
            refs.iter().map(|r| r.values_access()).collect(),
            refs.iter().map(|r| r.values_null()).collect(),
        );
        values_code.push(values_combiner.emit());

        // Positional statement binding.
        let mut accesses = Vec::new();
        let mut fallbacks = Vec::new();
        for definition in refs {
            *bind_index += 1;
            accesses.push(definition.bind_access(*bind_index));
            fallbacks.push(definition.bind_null(*bind_index));
        }
        let bind_combiner =
            ReferenceAccessCombiner::new(quote!(row.#field_ident.as_ref()), accesses, fallbacks);
        bind_code.push(bind_combiner.emit());

        // Row loading.
        match &reference.target {
            None => load_inits.push(quote! { #field_ident: ::std::option::Option::None }),
            Some(target) => {
                let bindings = ReferenceLoadCombiner::bindings(refs.len());
                let key_reads = refs.iter().map(|r| r.key_read()).collect();
                let outcome = if reference.stubbed || target.kind == DefinitionKind::QueryModel {
                    let struct_ident = &target.struct_ident;
                    LoadOutcome::Construct {
                        struct_path: quote!(#struct_ident),
                        assignments: refs
                            .iter()
                            .zip(&bindings)
                            .map(|(r, binding)| r.key_assign(binding))
                            .collect(),
                        fill_default: true,
                    }
                } else {
                    let adapter_ident = &target.adapter_ident;
                    LoadOutcome::Eager {
                        adapter_path: quote!(#adapter_ident),
                        conditions: refs
                            .iter()
                            .zip(&bindings)
                            .map(|(r, binding)| r.key_condition(binding))
                            .collect(),
                    }
                };
                let load = ReferenceLoadCombiner::new(key_reads, outcome).emit();
                load_inits.push(quote! { #field_ident: #load });
            }
        }

        // Comparison: converted columns take the scalar path, everything
        // else null-guards over the sub-column conditions.
        if reference.is_primary {
            if reference.uses_scalar_comparison() {
                compare_code.push(reference.scalar_view().compare_code());
            } else {
                let combiner = ReferenceAccessCombiner::new(
                    quote!(row.#field_ident.as_ref()),
                    refs.iter().map(|r| r.compare_access()).collect(),
                    refs.iter().map(|r| r.compare_null()).collect(),
                );
                compare_code.push(combiner.emit());
            }
        }

        // Cascade save / delete.
        if let ReferenceMapping::ForeignKeyMapping {
            save_cascade,
            delete_cascade,
            ..
        } = &reference.mapping
        {
            if !reference.uses_scalar_comparison() {
                if let Some(target) = &reference.target {
                    let adapter_ident = &target.adapter_ident;
                    if *save_cascade {
                        save_code.push(
                            CascadeSaveCombiner::new(
                                reference.kind,
                                field_ident.clone(),
                                quote!(#adapter_ident),
                            )
                            .emit(),
                        );
                    }
                    if *delete_cascade {
                        delete_code.push(
                            CascadeDeleteCombiner::new(
                                reference.kind,
                                field_ident.clone(),
                                quote!(#adapter_ident),
                            )
                            .emit(),
                        );
                    }
                }
            }
        }
    }
}

/// Clean struct items re-emitted into the module: loam column attributes
/// are stripped, everything else is preserved.
pub(crate) fn strip_column_attributes(item: &mut ItemStruct) {
    if let syn::Fields::Named(fields) = &mut item.fields {
        for field in &mut fields.named {
            field.attrs.retain(|attr| {
                !(attr.path().is_ident("column")
                    || attr.path().is_ident("foreign_key")
                    || attr.path().is_ident("column_map"))
            });
        }
    }
}

/// Ensure `item` derives `Default`, required by stub construction.
pub(crate) fn ensure_default_derive(item: &mut ItemStruct) {
    let already_derived = item.attrs.iter().any(|attr| {
        if !attr.path().is_ident("derive") {
            return false;
        }
        let mut found = false;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("Default") {
                found = true;
            }
            Ok(())
        });
        found
    });
    if !already_derived {
        item.attrs.push(syn::parse_quote!(#[derive(Default)]));
    }
}

/// Parse a physical column name into a property constant identifier;
/// names that are not valid identifiers contribute no constant.
fn property_ident(name: &str) -> Option<Ident> {
    syn::parse_str::<Ident>(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::registry::DefinitionRegistry;

    fn catalog() -> TypeCatalog {
        let mut catalog = TypeCatalog::default();
        catalog.add_table("Author".to_string(), true);
        catalog.add_embeddable("Address".to_string());
        catalog
    }

    fn author_table(database: &str, catalog: &TypeCatalog) -> TableDefinition {
        let item: ItemStruct = syn::parse_str(
            "pub struct Author {\
                 #[column(primary)] pub id: i64,\
                 #[column] pub name: String,\
             }",
        )
        .unwrap();
        let mut diag = Diagnostics::new();
        let attrs = TableAttributes {
            name: Some("authors".to_string()),
            model: true,
            strict: false,
        };
        let table = TableDefinition::from_item(&item, attrs, database, catalog, &mut diag);
        assert!(diag.is_empty(), "{:?}", diag.messages());
        table
    }

    fn book_table(database: &str, catalog: &TypeCatalog) -> TableDefinition {
        let item: ItemStruct = syn::parse_str(
            "pub struct Book {\
                 #[column(primary)] pub id: i64,\
                 #[column] pub title: String,\
                 #[foreign_key(on_delete = CASCADE, save_cascade, \
                     references(local = \"author_id\", foreign = \"id\", on_null_conflict = FAIL))]\
                 pub author: Option<Author>,\
             }",
        )
        .unwrap();
        let mut diag = Diagnostics::new();
        let table = TableDefinition::from_item(
            &item,
            TableAttributes::default(),
            database,
            catalog,
            &mut diag,
        );
        assert!(diag.is_empty(), "{:?}", diag.messages());
        table
    }

    fn registry_for(tables: &[&TableDefinition]) -> DefinitionRegistry {
        let mut registry = DefinitionRegistry::new();
        for table in tables {
            registry.insert(table.registry_entry());
        }
        registry
    }

    #[test]
    fn create_table_sql_carries_reference_columns_and_constraints() {
        let catalog = catalog();
        let author = author_table("library", &catalog);
        let mut book = book_table("library", &catalog);
        let registry = registry_for(&[&author, &book]);
        let mut diag = Diagnostics::new();

        let tokens = book.emit(&registry, &mut diag).to_string();
        assert!(diag.is_empty(), "{:?}", diag.messages());

        assert!(tokens.contains("\\\"author_id\\\" INTEGER NOT NULL ON CONFLICT FAIL"));
        assert!(tokens.contains(
            "FOREIGN KEY(\\\"author_id\\\") REFERENCES \\\"authors\\\"(\\\"id\\\") ON DELETE CASCADE"
        ));
        assert!(tokens.contains("PRIMARY KEY(\\\"id\\\")"));
    }

    #[test]
    fn insert_fragments_expand_reference_columns_in_order() {
        let catalog = catalog();
        let author = author_table("library", &catalog);
        let mut book = book_table("library", &catalog);
        let registry = registry_for(&[&author, &book]);
        let mut diag = Diagnostics::new();

        let tokens = book.emit(&registry, &mut diag).to_string();
        assert!(tokens.contains(
            "INSERT INTO \\\"book\\\"(\\\"id\\\",\\\"title\\\",\\\"author_id\\\") VALUES (?,?,?)"
        ));
        assert!(tokens.contains("\\\"id\\\"=?,\\\"title\\\"=?,\\\"author_id\\\"=?"));
    }

    #[test]
    fn cascade_save_goes_through_the_model_trait() {
        let catalog = catalog();
        let author = author_table("library", &catalog);
        let mut book = book_table("library", &catalog);
        let registry = registry_for(&[&author, &book]);
        let mut diag = Diagnostics::new();

        let tokens = book.emit(&registry, &mut diag).to_string().replace(' ', "");
        assert!(tokens.contains("::save(value,conn)?"));
        assert!(!tokens.contains("save_row(value,conn)?"));
    }

    #[test]
    fn scenario_single_key_foreign_key_defaults() {
        // Book with an implicit FK to Author(id): resolved list = [id],
        // insert columns end with "id", placeholders count matches.
        let catalog = catalog();
        let author = author_table("library", &catalog);
        let item: ItemStruct = syn::parse_str(
            "pub struct Book {\
                 #[column] pub title: String,\
                 #[foreign_key] pub author: Option<Author>,\
             }",
        )
        .unwrap();
        let mut diag = Diagnostics::new();
        let mut book = TableDefinition::from_item(
            &item,
            TableAttributes::default(),
            "library",
            &catalog,
            &mut diag,
        );
        let registry = registry_for(&[&author, &book]);

        let tokens = book.emit(&registry, &mut diag).to_string();
        assert!(diag.is_empty(), "{:?}", diag.messages());
        assert!(
            tokens.contains("INSERT INTO \\\"book\\\"(\\\"title\\\",\\\"id\\\") VALUES (?,?)")
        );
    }

    #[test]
    fn column_map_emits_one_property_per_sub_column() {
        let catalog = catalog();
        let item: ItemStruct = syn::parse_str(
            "pub struct Contact {\
                 #[column(primary)] pub id: i64,\
                 #[column_map] pub address: Option<Address>,\
             }",
        )
        .unwrap();
        let mut diag = Diagnostics::new();
        let mut contact = TableDefinition::from_item(
            &item,
            TableAttributes::default(),
            "library",
            &catalog,
            &mut diag,
        );

        let address: ItemStruct = syn::parse_str(
            "pub struct Address {\
                 #[column] pub street: String,\
                 #[column] pub city: String,\
             }",
        )
        .unwrap();
        let mut registry = DefinitionRegistry::new();
        registry.insert(contact.registry_entry());
        let address_columns =
            columns_from_struct(&address, OwnerKind::QueryModel, &catalog, &mut diag);
        registry.insert(RegistryEntry {
            database: "library".to_string(),
            type_name: "Address".to_string(),
            kind: DefinitionKind::QueryModel,
            struct_ident: format_ident!("Address"),
            adapter_ident: format_ident!("AddressQuery"),
            table_name: String::new(),
            columns: address_columns
                .iter()
                .filter_map(|c| match c {
                    TableColumn::Scalar(def) => Some(CandidateColumn::from_column(def)),
                    TableColumn::Reference(_) => None,
                })
                .collect(),
        });

        let tokens = contact.emit(&registry, &mut diag).to_string();
        assert!(diag.is_empty(), "{:?}", diag.messages());
        let street_consts = tokens.matches("pub const street").count();
        let city_consts = tokens.matches("pub const city").count();
        assert_eq!(street_consts, 1);
        assert_eq!(city_consts, 1);
    }
}
