//! Resolved reference definitions.
//!
//! A `ReferenceDefinition` pairs one logical reference with the candidate
//! column it targets on the referenced definition. It is created exactly
//! once during resolution and immutable afterwards; the accessor
//! expressions for the four generation contexts are derived on demand.

use loam_core::ConflictAction;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Expr, ExprPath, Ident, Type};

use super::field::SQLiteType;
use super::reference::ReferenceSpecification;
use super::registry::CandidateColumn;
use crate::paths;

#[derive(Clone)]
pub(crate) struct ReferenceDefinition {
    /// Column name on the referenced definition.
    pub(crate) foreign_column_name: String,
    /// Physical column name on the owning table.
    pub(crate) column_name: String,
    /// Field on the referenced struct backing the foreign column.
    pub(crate) foreign_field_ident: Ident,
    pub(crate) base_type: Type,
    pub(crate) sqlite_type: SQLiteType,
    pub(crate) converter: Option<ExprPath>,
    /// True when an explicit null-conflict policy was declared.
    pub(crate) not_null: bool,
    pub(crate) on_null_conflict: ConflictAction,
    pub(crate) default_value: Option<Expr>,
}

impl ReferenceDefinition {
    /// Synthesize the implicit definition for `candidate`: the candidate's
    /// own name serves as both source and target.
    pub(crate) fn implicit(candidate: &CandidateColumn) -> Self {
        Self {
            foreign_column_name: candidate.name.clone(),
            column_name: candidate.name.clone(),
            foreign_field_ident: candidate.field_ident.clone(),
            base_type: candidate.base_type.clone(),
            sqlite_type: candidate.sqlite_type,
            converter: candidate.converter.clone(),
            not_null: false,
            on_null_conflict: ConflictAction::None,
            default_value: candidate.default_value.clone(),
        }
    }

    /// Build the definition for an explicit specification matched against
    /// `candidate`.
    pub(crate) fn from_spec(spec: &ReferenceSpecification, candidate: &CandidateColumn) -> Self {
        Self {
            foreign_column_name: candidate.name.clone(),
            column_name: spec.column_name.clone(),
            foreign_field_ident: candidate.field_ident.clone(),
            base_type: candidate.base_type.clone(),
            sqlite_type: candidate.sqlite_type,
            converter: candidate.converter.clone(),
            not_null: spec.on_null_conflict != ConflictAction::None,
            on_null_conflict: spec.on_null_conflict,
            default_value: spec
                .default_value
                .clone()
                .or_else(|| candidate.default_value.clone()),
        }
    }

    /// `"name" TYPE [DEFAULT …]` DDL fragment; the owner appends the
    /// null-conflict clause when declared.
    pub(crate) fn creation_fragment(&self) -> String {
        let mut sql = format!("\"{}\" {}", self.column_name, self.sqlite_type.to_sql_type());
        if let Some(default) = self.default_value.as_ref().and_then(super::field::sql_literal) {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default);
        }
        sql
    }

    /// Quoted name for the `PRIMARY KEY(…)` clause.
    pub(crate) fn primary_key_fragment(&self) -> String {
        format!("\"{}\"", self.column_name)
    }

    // ------------------------------------------------------------------
    // Accessor expressions. `value` binds the referenced sub-object in
    // the surrounding combiner output.
    // ------------------------------------------------------------------

    /// Content-values population for the present case.
    pub(crate) fn values_access(&self) -> TokenStream {
        let name = &self.column_name;
        let field = &self.foreign_field_ident;
        match &self.converter {
            None => quote! { values.put(#name, &value.#field); },
            Some(converter) => {
                let type_converter = paths::type_converter();
                quote! {
                    values.put(#name, <#converter as #type_converter>::to_db(&value.#field));
                }
            }
        }
    }

    /// Content-values population for the absent case.
    pub(crate) fn values_null(&self) -> TokenStream {
        let name = &self.column_name;
        quote! { values.put_null(#name); }
    }

    /// Positional statement binding for the present case.
    pub(crate) fn bind_access(&self, index: usize) -> TokenStream {
        let field = &self.foreign_field_ident;
        match &self.converter {
            None => quote! { stmt.raw_bind_parameter(#index, &value.#field)?; },
            Some(converter) => {
                let type_converter = paths::type_converter();
                quote! {
                    stmt.raw_bind_parameter(
                        #index,
                        <#converter as #type_converter>::to_db(&value.#field),
                    )?;
                }
            }
        }
    }

    /// Positional statement binding for the absent case.
    pub(crate) fn bind_null(&self, index: usize) -> TokenStream {
        quote! { stmt.raw_bind_parameter(#index, ::std::option::Option::<i64>::None)?; }
    }

    /// Cursor read of this key column as `Option<Db>`.
    pub(crate) fn key_read(&self) -> TokenStream {
        let name = &self.column_name;
        match &self.converter {
            None => {
                let base = &self.base_type;
                quote! { row.get::<_, ::std::option::Option<#base>>(#name)? }
            }
            Some(converter) => {
                let type_converter = paths::type_converter();
                quote! {
                    row.get::<_, ::std::option::Option<<#converter as #type_converter>::Db>>(#name)?
                }
            }
        }
    }

    /// Assign the read key back onto the referenced struct field; used by
    /// stub and embedded construction, where `#binding` holds the value
    /// produced by [`key_read`](Self::key_read).
    pub(crate) fn key_assign(&self, binding: &Ident) -> TokenStream {
        let field = &self.foreign_field_ident;
        match &self.converter {
            None => quote! { #field: #binding },
            Some(converter) => {
                let type_converter = paths::type_converter();
                quote! { #field: <#converter as #type_converter>::from_db(#binding) }
            }
        }
    }

    /// Key condition for eager loading; `#binding` holds the read value.
    pub(crate) fn key_condition(&self, binding: &Ident) -> TokenStream {
        let condition = paths::condition();
        let name = &self.foreign_column_name;
        quote! { group = group.and(#condition::new(#name, #binding)); }
    }

    /// Primary-condition comparison for the present case.
    pub(crate) fn compare_access(&self) -> TokenStream {
        let condition = paths::condition();
        let name = &self.column_name;
        let field = &self.foreign_field_ident;
        match &self.converter {
            None => quote! { group = group.and(#condition::new(#name, &value.#field)); },
            Some(converter) => {
                let type_converter = paths::type_converter();
                quote! {
                    group = group.and(#condition::new(
                        #name,
                        <#converter as #type_converter>::to_db(&value.#field),
                    ));
                }
            }
        }
    }

    /// Primary-condition comparison for the absent case.
    pub(crate) fn compare_null(&self) -> TokenStream {
        let condition = paths::condition();
        let name = &self.column_name;
        quote! {
            group = group.and(#condition::new(#name, ::std::option::Option::<i64>::None));
        }
    }
}
