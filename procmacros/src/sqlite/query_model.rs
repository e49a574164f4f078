//! Query-model definitions: load-only structs.
//!
//! Declared with `#[query_model]`, or derived automatically for the
//! target of a `#[column_map]` field. They emit a `QueryAdapter` binding
//! with column properties and row loading, but no persistence surface.

use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Ident, ItemStruct};

use super::combiners::{LoadOutcome, ReferenceLoadCombiner};
use super::reference::OwnerKind;
use super::registry::{
    CandidateColumn, DefinitionKind, ReferenceLookup, RegistryEntry, TypeCatalog,
};
use super::table::{TableColumn, columns_from_struct};
use crate::common::Diagnostics;
use crate::paths;

pub(crate) struct QueryModelDefinition {
    pub(crate) struct_ident: Ident,
    pub(crate) vis: syn::Visibility,
    pub(crate) adapter_ident: Ident,
    pub(crate) database: String,
    pub(crate) columns: Vec<TableColumn>,
}

impl QueryModelDefinition {
    pub(crate) fn from_item(
        item: &ItemStruct,
        database: &str,
        catalog: &TypeCatalog,
        diag: &mut Diagnostics,
    ) -> Self {
        let struct_ident = item.ident.clone();
        let columns = columns_from_struct(item, OwnerKind::QueryModel, catalog, diag);
        Self {
            adapter_ident: format_ident!("{}Query", struct_ident),
            struct_ident,
            vis: item.vis.clone(),
            database: database.to_string(),
            columns,
        }
    }

    pub(crate) fn registry_entry(&self) -> RegistryEntry {
        RegistryEntry {
            database: self.database.clone(),
            type_name: self.struct_ident.to_string(),
            kind: DefinitionKind::QueryModel,
            struct_ident: self.struct_ident.clone(),
            adapter_ident: self.adapter_ident.clone(),
            table_name: String::new(),
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

    /// Emit the query adapter: properties, column names and row loading.
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

        let source_name = self.struct_ident.to_string().to_snake_case();
        let mut property_fields = Vec::new();
        let mut column_names: Vec<String> = Vec::new();
        let mut load_inits = Vec::new();

        for column in &self.columns {
            match column {
                TableColumn::Scalar(def) => {
                    property_fields.push(def.property_field(&source_name));
                    column_names.push(def.column_name.clone());
                    load_inits.push(def.load_code());
                }
                TableColumn::Reference(reference) => {
                    let refs = reference.resolved();
                    self.emit_reference(
                        reference,
                        refs,
                        &source_name,
                        &mut property_fields,
                        &mut column_names,
                        &mut load_inits,
                    );
                }
            }
        }

        let struct_ident = &self.struct_ident;
        let adapter_ident = &self.adapter_ident;
        let vis = &self.vis;
        let names = &column_names;

        let query_adapter = paths::query_adapter();
        let connection = paths::connection();
        let rusqlite = paths::rusqlite();
        let result = paths::result();

        quote! {
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            #vis struct #adapter_ident;

            #[allow(non_upper_case_globals, dead_code)]
            impl #adapter_ident {
                #(#property_fields)*
            }

            impl #query_adapter for #adapter_ident {
                type Row = #struct_ident;

                const COLUMN_NAMES: &'static [&'static str] = &[#(#names),*];

                fn load_from_row(
                    conn: &#connection,
                    row: &#rusqlite::Row<'_>,
                ) -> #result<Self::Row> {
                    Ok(#struct_ident {
                        #(#load_inits,)*
                    })
                }
            }
        }
    }

    fn emit_reference(
        &self,
        reference: &super::reference::ReferenceColumnDefinition,
        refs: &[super::reference_def::ReferenceDefinition],
        source_name: &str,
        property_fields: &mut Vec<TokenStream>,
        column_names: &mut Vec<String>,
        load_inits: &mut Vec<TokenStream>,
    ) {
        let property = paths::property();
        let field_ident = &reference.field_ident;

        for definition in refs {
            column_names.push(definition.column_name.clone());
            if let Ok(ident) = syn::parse_str::<Ident>(&definition.column_name) {
                let base = &definition.base_type;
                let name = &definition.column_name;
                property_fields.push(quote! {
                    /// Column mapped field
                    pub const #ident: #property<#base> = #property::new(#source_name, #name);
                });
            }
        }

        match &reference.target {
            None => load_inits.push(quote! { #field_ident: ::std::option::Option::None }),
            Some(target) => {
                let bindings = ReferenceLoadCombiner::bindings(refs.len());
                let struct_ident = &target.struct_ident;
                let outcome = LoadOutcome::Construct {
                    struct_path: quote!(#struct_ident),
                    assignments: refs
                        .iter()
                        .zip(&bindings)
                        .map(|(r, binding)| r.key_assign(binding))
                        .collect(),
                    fill_default: true,
                };
                let load = ReferenceLoadCombiner::new(
                    refs.iter().map(|r| r.key_read()).collect(),
                    outcome,
                )
                .emit();
                load_inits.push(quote! { #field_ident: #load });
            }
        }
    }
}
