//! The `#[SQLiteDatabase]` round.
//!
//! One macro invocation is one generation round over the annotated
//! module. Discovery and classification construct every definition with
//! no cross-entity lookups, the registry snapshot is built from the
//! complete set, and only then does emission run, triggering each
//! reference column's lazy resolution against the registry.

use heck::ToUpperCamelCase;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Expr, Item, ItemMod, ItemStruct, Lit, Meta, Token};

use super::query_model::QueryModelDefinition;
use super::registry::{DefinitionRegistry, TypeCatalog};
use super::table::{
    TableAttributes, TableColumn, TableDefinition, column_attribute, ensure_default_derive,
    strip_column_attributes,
};
use crate::common::{Diagnostics, base_type_of, type_ident};
use crate::paths;

pub(crate) struct DatabaseAttributes {
    pub(crate) name: Option<String>,
}

impl DatabaseAttributes {
    pub(crate) fn parse(attr: TokenStream) -> syn::Result<Self> {
        let mut name = None;
        if attr.is_empty() {
            return Ok(Self { name });
        }

        let metas = syn::parse::Parser::parse2(
            syn::punctuated::Punctuated::<Meta, Token![,]>::parse_terminated,
            attr,
        )?;
        for meta in metas {
            match &meta {
                Meta::NameValue(nv) if nv.path.is_ident("name") => {
                    if let Expr::Lit(lit) = &nv.value {
                        if let Lit::Str(s) = &lit.lit {
                            name = Some(s.value());
                            continue;
                        }
                    }
                    return Err(syn::Error::new_spanned(
                        &nv.value,
                        "`name` expects a string literal",
                    ));
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "unrecognized database attribute; only name = \"…\" is supported",
                    ));
                }
            }
        }
        Ok(Self { name })
    }
}

enum ModuleItem {
    Table(ItemStruct, TableAttributes),
    QueryModel(ItemStruct),
    Embeddable(ItemStruct),
    Other(Item),
}

fn marker_attribute(item: &ItemStruct) -> Option<&'static str> {
    for attr in &item.attrs {
        if attr.path().is_ident("table") {
            return Some("table");
        }
        if attr.path().is_ident("query_model") {
            return Some("query_model");
        }
    }
    None
}

fn strip_marker_attribute(item: &mut ItemStruct) {
    item.attrs
        .retain(|attr| !(attr.path().is_ident("table") || attr.path().is_ident("query_model")));
}

/// Targets of `#[column_map]` fields, by type identifier.
fn column_map_targets(item: &ItemStruct) -> Vec<String> {
    let syn::Fields::Named(fields) = &item.fields else {
        return Vec::new();
    };
    fields
        .named
        .iter()
        .filter_map(|field| {
            let (attr, _) = column_attribute(field)?;
            if !attr.path().is_ident("column_map") {
                return None;
            }
            type_ident(base_type_of(&field.ty)).map(|ident| ident.to_string())
        })
        .collect()
}

/// Type identifiers that must derive `Default` because they are
/// constructed by stub or embedded loading.
fn default_requiring_targets(tables: &[TableDefinition], queries: &[QueryModelDefinition]) -> Vec<String> {
    let mut targets = Vec::new();
    let mut push = |columns: &[TableColumn]| {
        for column in columns {
            if let TableColumn::Reference(reference) = column {
                if reference.stubbed || reference.is_column_map() {
                    if let Some(ident) = &reference.referenced_type {
                        targets.push(ident.to_string());
                    }
                }
            }
        }
    };
    for table in tables {
        push(&table.columns);
    }
    for query in queries {
        push(&query.columns);
    }
    targets
}

pub(crate) fn database_macro(attr: TokenStream, mut module: ItemMod) -> syn::Result<TokenStream> {
    let attrs = DatabaseAttributes::parse(attr)?;
    let database_name = attrs
        .name
        .unwrap_or_else(|| module.ident.to_string());

    let Some((_, items)) = module.content.take() else {
        return Err(syn::Error::new(
            module.ident.span(),
            "SQLiteDatabase expects an inline module with a body",
        ));
    };

    let mut diag = Diagnostics::new();

    // -------------------
    // 1. Discovery
    // -------------------
    let mut module_items = Vec::new();
    let mut catalog = TypeCatalog::default();
    for item in items {
        match item {
            Item::Struct(item_struct) => match marker_attribute(&item_struct) {
                Some("table") => {
                    let attr = item_struct
                        .attrs
                        .iter()
                        .find(|a| a.path().is_ident("table"))
                        .cloned()
                        .expect("marker attribute just matched");
                    let table_attrs = TableAttributes::from_attribute(&attr, &mut diag);
                    catalog.add_table(item_struct.ident.to_string(), table_attrs.model);
                    module_items.push(ModuleItem::Table(item_struct, table_attrs));
                }
                Some(_) => {
                    catalog.add_query_model(item_struct.ident.to_string());
                    module_items.push(ModuleItem::QueryModel(item_struct));
                }
                None => {
                    catalog.add_embeddable(item_struct.ident.to_string());
                    module_items.push(ModuleItem::Embeddable(item_struct));
                }
            },
            other => module_items.push(ModuleItem::Other(other)),
        }
    }

    // Embeddables referenced through #[column_map] get a derived
    // query-model definition registered for them.
    let mut derived_targets: Vec<String> = Vec::new();
    for module_item in &module_items {
        if let ModuleItem::Table(item, _) | ModuleItem::QueryModel(item) = module_item {
            for target in column_map_targets(item) {
                if catalog.is_embeddable(&target) && !derived_targets.contains(&target) {
                    derived_targets.push(target);
                }
            }
        }
    }

    // -------------------
    // 2. Classification
    // -------------------
    let mut tables: Vec<TableDefinition> = Vec::new();
    let mut queries: Vec<QueryModelDefinition> = Vec::new();
    for module_item in &module_items {
        match module_item {
            ModuleItem::Table(item, attrs) => {
                tables.push(TableDefinition::from_item(
                    item,
                    TableAttributes {
                        name: attrs.name.clone(),
                        model: attrs.model,
                        strict: attrs.strict,
                    },
                    &database_name,
                    &catalog,
                    &mut diag,
                ));
            }
            ModuleItem::QueryModel(item) => {
                queries.push(QueryModelDefinition::from_item(
                    item,
                    &database_name,
                    &catalog,
                    &mut diag,
                ));
            }
            ModuleItem::Embeddable(item) => {
                if derived_targets.contains(&item.ident.to_string()) {
                    queries.push(QueryModelDefinition::from_item(
                        item,
                        &database_name,
                        &catalog,
                        &mut diag,
                    ));
                }
            }
            ModuleItem::Other(_) => {}
        }
    }

    // -------------------
    // 3. Registry snapshot
    // -------------------
    let mut registry = DefinitionRegistry::new();
    for table in &tables {
        registry.insert(table.registry_entry());
    }
    for query in &queries {
        registry.insert(query.registry_entry());
    }

    // -------------------
    // 4. Emission
    // -------------------
    let mut generated = Vec::new();
    for table in &mut tables {
        generated.push(table.emit(&registry, &mut diag));
    }
    for query in &mut queries {
        generated.push(query.emit(&registry, &mut diag));
    }

    let database_ident = format_ident!("{}Database", database_name.to_upper_camel_case());
    let database_schema = paths::database_schema();
    let table_adapter = paths::table_adapter();
    let adapter_idents: Vec<_> = tables.iter().map(|t| t.adapter_ident.clone()).collect();
    generated.push(quote! {
        /// Generated database handle: creation statements in declaration
        /// order.
        #[derive(Debug, Clone, Copy, Default)]
        pub struct #database_ident;

        impl #database_schema for #database_ident {
            const NAME: &'static str = #database_name;
            const CREATE_STATEMENTS: &'static [&'static str] = &[
                #(<#adapter_idents as #table_adapter>::CREATE_TABLE_SQL),*
            ];
        }
    });

    // -------------------
    // 5. Cleaned re-emission of the user's items
    // -------------------
    let needs_default = default_requiring_targets(&tables, &queries);
    let mut output_items = Vec::new();
    for module_item in module_items {
        match module_item {
            ModuleItem::Table(mut item, _) => {
                strip_marker_attribute(&mut item);
                strip_column_attributes(&mut item);
                if needs_default.contains(&item.ident.to_string()) {
                    ensure_default_derive(&mut item);
                }
                output_items.push(Item::Struct(item));
            }
            ModuleItem::QueryModel(mut item) | ModuleItem::Embeddable(mut item) => {
                strip_marker_attribute(&mut item);
                strip_column_attributes(&mut item);
                if needs_default.contains(&item.ident.to_string()) {
                    ensure_default_derive(&mut item);
                }
                output_items.push(Item::Struct(item));
            }
            ModuleItem::Other(item) => output_items.push(item),
        }
    }

    let compile_errors = diag.to_compile_errors();
    let module_attrs = &module.attrs;
    let module_vis = &module.vis;
    let module_ident = &module.ident;

    Ok(quote! {
        #(#module_attrs)*
        #module_vis mod #module_ident {
            #(#output_items)*

            #(#generated)*

            #compile_errors
        }
    })
}
