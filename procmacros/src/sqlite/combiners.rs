//! Access combiners: strategy objects emitting the relationship-aware
//! code blocks for one generation concern.
//!
//! Combiners are pure values: they receive the owning column's access
//! path, the full per-sub-column accessor list, and the relationship kind
//! at construction and are immutable afterwards. Sub-column ordering in
//! the output always matches reference-definition list order, and the
//! null guard on the owning reference is placed before any sub-field
//! dereference.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::Ident;

use super::reference::RelationKind;
use crate::paths;

/// Emits one null-guarded block over the owning reference: the accessor
/// list runs with `value` bound when the reference is present, the
/// fallback list otherwise. Backs content-values population, statement
/// binding and comparison.
pub(crate) struct ReferenceAccessCombiner {
    owner_access: TokenStream,
    field_accesses: Vec<TokenStream>,
    null_fallbacks: Vec<TokenStream>,
}

impl ReferenceAccessCombiner {
    pub(crate) fn new(
        owner_access: TokenStream,
        field_accesses: Vec<TokenStream>,
        null_fallbacks: Vec<TokenStream>,
    ) -> Self {
        Self {
            owner_access,
            field_accesses,
            null_fallbacks,
        }
    }

    pub(crate) fn emit(&self) -> TokenStream {
        let owner = &self.owner_access;
        let accesses = &self.field_accesses;
        let fallbacks = &self.null_fallbacks;
        quote! {
            if let ::std::option::Option::Some(value) = #owner {
                #(#accesses)*
            } else {
                #(#fallbacks)*
            }
        }
    }
}

/// What the load combiner produces once every key column is present.
pub(crate) enum LoadOutcome {
    /// Construct the referenced struct directly from the read columns;
    /// stubs fill the remaining fields from `Default`.
    Construct {
        struct_path: TokenStream,
        assignments: Vec<TokenStream>,
        fill_default: bool,
    },
    /// Query the referenced table by key through its adapter.
    Eager {
        adapter_path: TokenStream,
        conditions: Vec<TokenStream>,
    },
}

/// Emits the row-loading expression for one reference column: every key
/// column is read first, and the referenced value is produced only when
/// all of them are non-null.
pub(crate) struct ReferenceLoadCombiner {
    key_reads: Vec<TokenStream>,
    outcome: LoadOutcome,
}

impl ReferenceLoadCombiner {
    pub(crate) fn new(key_reads: Vec<TokenStream>, outcome: LoadOutcome) -> Self {
        Self { key_reads, outcome }
    }

    /// Binding identifiers for the key columns, index order.
    pub(crate) fn bindings(count: usize) -> Vec<Ident> {
        (0..count).map(|i| format_ident!("__key_{}", i)).collect()
    }

    /// Emit an expression evaluating to `Option<Referenced>`.
    pub(crate) fn emit(&self) -> TokenStream {
        let bindings = Self::bindings(self.key_reads.len());
        let reads = self
            .key_reads
            .iter()
            .zip(&bindings)
            .map(|(read, binding)| quote! { let #binding = #read; });

        let present = match &self.outcome {
            LoadOutcome::Construct {
                struct_path,
                assignments,
                fill_default,
            } => {
                let fill = if *fill_default {
                    quote! { ..::std::default::Default::default() }
                } else {
                    quote! {}
                };
                quote! {
                    ::std::option::Option::Some(#struct_path {
                        #(#assignments,)*
                        #fill
                    })
                }
            }
            LoadOutcome::Eager {
                adapter_path,
                conditions,
            } => {
                let operator_group = paths::operator_group();
                let table_adapter = paths::table_adapter();
                quote! {
                    {
                        let mut group = #operator_group::new();
                        #(#conditions)*
                        <#adapter_path as #table_adapter>::select_one(conn, &group)?
                    }
                }
            }
        };

        quote! {
            {
                #(#reads)*
                match (#(#bindings,)*) {
                    (#(::std::option::Option::Some(#bindings),)*) => #present,
                    _ => ::std::option::Option::None,
                }
            }
        }
    }
}

/// Emits the cascade-save hop for one reference column. `Scalar` and
/// `Converted` columns have nothing to cascade.
pub(crate) struct CascadeSaveCombiner {
    kind: RelationKind,
    field_ident: Ident,
    adapter_path: TokenStream,
}

impl CascadeSaveCombiner {
    pub(crate) fn new(kind: RelationKind, field_ident: Ident, adapter_path: TokenStream) -> Self {
        Self {
            kind,
            field_ident,
            adapter_path,
        }
    }

    pub(crate) fn emit(&self) -> TokenStream {
        let field = &self.field_ident;
        match self.kind {
            RelationKind::ModelRow => {
                let model = paths::model();
                quote! {
                    if let ::std::option::Option::Some(value) = row.#field.as_mut() {
                        #model::save(value, conn)?;
                    }
                }
            }
            RelationKind::AdapterRow => {
                let adapter = &self.adapter_path;
                let table_adapter = paths::table_adapter();
                quote! {
                    if let ::std::option::Option::Some(value) = row.#field.as_mut() {
                        <#adapter as #table_adapter>::save_row(value, conn)?;
                    }
                }
            }
            RelationKind::Scalar | RelationKind::Converted => quote! {},
        }
    }
}

/// Emits the cascade-delete hop for one reference column.
pub(crate) struct CascadeDeleteCombiner {
    kind: RelationKind,
    field_ident: Ident,
    adapter_path: TokenStream,
}

impl CascadeDeleteCombiner {
    pub(crate) fn new(kind: RelationKind, field_ident: Ident, adapter_path: TokenStream) -> Self {
        Self {
            kind,
            field_ident,
            adapter_path,
        }
    }

    pub(crate) fn emit(&self) -> TokenStream {
        let field = &self.field_ident;
        match self.kind {
            RelationKind::ModelRow => {
                let model = paths::model();
                quote! {
                    if let ::std::option::Option::Some(value) = row.#field.as_ref() {
                        #model::delete(value, conn)?;
                    }
                }
            }
            RelationKind::AdapterRow => {
                let adapter = &self.adapter_path;
                let table_adapter = paths::table_adapter();
                quote! {
                    if let ::std::option::Option::Some(value) = row.#field.as_ref() {
                        <#adapter as #table_adapter>::delete_row(value, conn)?;
                    }
                }
            }
            RelationKind::Scalar | RelationKind::Converted => quote! {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact(tokens: &TokenStream) -> String {
        tokens.to_string().replace(' ', "")
    }

    #[test]
    fn access_combiner_guards_before_dereferencing() {
        let combiner = ReferenceAccessCombiner::new(
            quote!(row.author.as_ref()),
            vec![quote! { values.put("id", &value.id); }],
            vec![quote! { values.put_null("id"); }],
        );
        let text = compact(&combiner.emit());
        assert!(text.contains("iflet::std::option::Option::Some(value)=row.author.as_ref()"));
        assert!(text.contains("values.put(\"id\",&value.id);"));
        assert!(text.contains("else{values.put_null(\"id\");}"));
    }

    #[test]
    fn access_combiner_preserves_accessor_order() {
        let combiner = ReferenceAccessCombiner::new(
            quote!(row.shipping.as_ref()),
            vec![quote! { first(); }, quote! { second(); }],
            vec![],
        );
        let text = compact(&combiner.emit());
        let first = text.find("first").unwrap();
        let second = text.find("second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn load_combiner_requires_every_key() {
        let combiner = ReferenceLoadCombiner::new(
            vec![quote!(row.get("country")?), quote!(row.get("number")?)],
            LoadOutcome::Construct {
                struct_path: quote!(Passport),
                assignments: vec![quote!(country: __key_0), quote!(number: __key_1)],
                fill_default: true,
            },
        );
        let text = compact(&combiner.emit());
        assert!(text.contains("match(__key_0,__key_1,)"));
        assert!(text.contains(
            "(::std::option::Option::Some(__key_0),::std::option::Option::Some(__key_1),)"
        ));
        assert!(text.contains("..::std::default::Default::default()"));
        assert!(text.contains("_=>::std::option::Option::None"));
    }

    #[test]
    fn eager_load_goes_through_the_adapter() {
        let combiner = ReferenceLoadCombiner::new(
            vec![quote!(row.get("id")?)],
            LoadOutcome::Eager {
                adapter_path: quote!(AuthorTable),
                conditions: vec![quote! { group = group.and(cond); }],
            },
        );
        let text = compact(&combiner.emit());
        assert!(text.contains("select_one(conn,&group)?"));
    }

    #[test]
    fn cascade_selection_follows_relationship_kind() {
        let field = format_ident!("author");

        let model = CascadeSaveCombiner::new(
            RelationKind::ModelRow,
            field.clone(),
            quote!(AuthorTable),
        );
        assert!(compact(&model.emit()).contains("::save(value,conn)?"));

        let adapter = CascadeSaveCombiner::new(
            RelationKind::AdapterRow,
            field.clone(),
            quote!(AuthorTable),
        );
        assert!(compact(&adapter.emit()).contains("save_row(value,conn)?"));

        let scalar =
            CascadeSaveCombiner::new(RelationKind::Scalar, field.clone(), quote!(AuthorTable));
        assert!(scalar.emit().is_empty());

        let converted =
            CascadeDeleteCombiner::new(RelationKind::Converted, field, quote!(AuthorTable));
        assert!(converted.emit().is_empty());
    }
}
