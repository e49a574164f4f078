//! Scalar column definitions and the `#[column(…)]` attribute grammar.

use loam_core::ConflictAction;
use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::{Expr, ExprPath, Field, Ident, Lit, Meta, Token, Type};

use crate::common::{Diagnostics, base_type_of, is_option_type};
use crate::paths;

/// Enum representing supported SQLite column affinities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SQLiteType {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

impl SQLiteType {
    /// Get the SQL type string for this affinity
    pub(crate) fn to_sql_type(self) -> &'static str {
        match self {
            SQLiteType::Integer => "INTEGER",
            SQLiteType::Text => "TEXT",
            SQLiteType::Blob => "BLOB",
            SQLiteType::Real => "REAL",
            SQLiteType::Numeric => "NUMERIC",
        }
    }

    /// Infer the affinity from a base (non-`Option`) Rust type.
    pub(crate) fn from_rust_type(ty: &Type) -> Option<Self> {
        let rendered = ty.to_token_stream().to_string().replace(' ', "");
        match rendered.as_str() {
            "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "bool" => {
                Some(SQLiteType::Integer)
            }
            "f32" | "f64" => Some(SQLiteType::Real),
            "String" => Some(SQLiteType::Text),
            "Vec<u8>" => Some(SQLiteType::Blob),
            _ => None,
        }
    }
}

/// Render a literal default expression as a SQL literal, or `None` for
/// non-literal expressions.
pub(crate) fn sql_literal(expr: &Expr) -> Option<String> {
    let Expr::Lit(expr_lit) = expr else {
        return None;
    };
    match &expr_lit.lit {
        Lit::Int(i) => Some(i.to_string()),
        Lit::Float(f) => Some(f.to_string()),
        Lit::Bool(b) => Some(if b.value() { "1" } else { "0" }.to_string()),
        Lit::Str(s) => Some(format!("'{}'", s.value().replace('\'', "''"))),
        _ => None,
    }
}

/// Parse a conflict-policy identifier (`FAIL`, `ROLLBACK`, …).
pub(crate) fn parse_conflict_action(ident: &Ident, diag: &mut Diagnostics) -> ConflictAction {
    match ident.to_string().to_ascii_uppercase().as_str() {
        "NONE" => ConflictAction::None,
        "ROLLBACK" => ConflictAction::Rollback,
        "ABORT" => ConflictAction::Abort,
        "FAIL" => ConflictAction::Fail,
        "IGNORE" => ConflictAction::Ignore,
        "REPLACE" => ConflictAction::Replace,
        other => {
            diag.error(
                ident.span(),
                format!(
                    "unknown conflict action `{other}`; expected one of \
                     NONE, ROLLBACK, ABORT, FAIL, IGNORE, REPLACE"
                ),
            );
            ConflictAction::None
        }
    }
}

/// A scalar column backed directly by one struct field.
#[derive(Clone)]
pub(crate) struct ColumnDefinition {
    pub(crate) field_ident: Ident,
    pub(crate) column_name: String,
    pub(crate) base_type: Type,
    pub(crate) is_nullable: bool,
    pub(crate) sqlite_type: SQLiteType,
    pub(crate) is_primary: bool,
    pub(crate) is_autoincrement: bool,
    pub(crate) is_unique: bool,
    pub(crate) on_null_conflict: ConflictAction,
    pub(crate) default_value: Option<Expr>,
    pub(crate) converter: Option<ExprPath>,
}

impl ColumnDefinition {
    /// Parse one `#[column(…)]` field.
    pub(crate) fn from_field(
        field: &Field,
        attr: &syn::Attribute,
        diag: &mut Diagnostics,
    ) -> Option<Self> {
        let field_ident = field.ident.clone()?;
        let is_nullable = is_option_type(&field.ty);
        let base_type = base_type_of(&field.ty).clone();

        let mut column_name = None;
        let mut is_primary = false;
        let mut is_autoincrement = false;
        let mut is_unique = false;
        let mut on_null_conflict = ConflictAction::None;
        let mut default_value = None;
        let mut converter = None;

        if !matches!(attr.meta, Meta::Path(_)) {
            let metas = match attr
                .parse_args_with(syn::punctuated::Punctuated::<Meta, Token![,]>::parse_terminated)
            {
                Ok(metas) => metas,
                Err(err) => {
                    diag.push(err);
                    return None;
                }
            };

            for meta in metas {
                match &meta {
                    Meta::Path(path) if path.is_ident("primary") || path.is_ident("primary_key") => {
                        is_primary = true;
                    }
                    Meta::Path(path) if path.is_ident("autoincrement") => {
                        is_autoincrement = true;
                    }
                    Meta::Path(path) if path.is_ident("unique") => {
                        is_unique = true;
                    }
                    Meta::NameValue(nv) if nv.path.is_ident("name") => {
                        if let Expr::Lit(lit) = &nv.value {
                            if let Lit::Str(s) = &lit.lit {
                                column_name = Some(s.value());
                                continue;
                            }
                        }
                        diag.error(field_ident.span(), "`name` expects a string literal");
                    }
                    Meta::NameValue(nv) if nv.path.is_ident("default") => {
                        default_value = Some(nv.value.clone());
                    }
                    Meta::NameValue(nv) if nv.path.is_ident("not_null") => {
                        if let Expr::Path(path) = &nv.value {
                            if let Some(ident) = path.path.get_ident() {
                                on_null_conflict = parse_conflict_action(ident, diag);
                                continue;
                            }
                        }
                        diag.error(
                            field_ident.span(),
                            "`not_null` expects a conflict action identifier, e.g. not_null = FAIL",
                        );
                    }
                    Meta::NameValue(nv) if nv.path.is_ident("converter") => {
                        if let Expr::Path(path) = &nv.value {
                            converter = Some(path.clone());
                            continue;
                        }
                        diag.error(field_ident.span(), "`converter` expects a type path");
                    }
                    other => {
                        diag.error(
                            other.path().get_ident().map_or_else(
                                proc_macro2::Span::call_site,
                                |ident| ident.span(),
                            ),
                            "unrecognized column attribute.\n\
                             Supported: name = \"…\", primary, autoincrement, unique, \
                             default = <literal>, not_null = <CONFLICT>, converter = <Path>",
                        );
                    }
                }
            }
        }

        if is_autoincrement && !is_primary {
            diag.error(
                field_ident.span(),
                "`autoincrement` can only be used together with `primary`",
            );
        }

        let sqlite_type = if converter.is_some() {
            // Converted columns are stored as their converter's database
            // type; TEXT affinity accepts any of them under SQLite's
            // flexible typing.
            SQLiteType::Text
        } else {
            match SQLiteType::from_rust_type(&base_type) {
                Some(affinity) => affinity,
                None => {
                    diag.error(
                        field_ident.span(),
                        format!(
                            "unsupported column type `{}`; use a natively bindable type \
                             or a `converter = …`",
                            base_type.to_token_stream()
                        ),
                    );
                    SQLiteType::Numeric
                }
            }
        };

        Some(ColumnDefinition {
            column_name: column_name.unwrap_or_else(|| field_ident.to_string()),
            field_ident,
            base_type,
            is_nullable,
            sqlite_type,
            is_primary,
            is_autoincrement,
            is_unique,
            on_null_conflict,
            default_value,
            converter,
        })
    }

    // ------------------------------------------------------------------
    // Per-concern scalar fragments
    // ------------------------------------------------------------------

    /// `"name" TYPE [PRIMARY KEY AUTOINCREMENT] [NOT NULL …] [UNIQUE] [DEFAULT …]`
    pub(crate) fn creation_fragment(&self, inline_primary_key: bool) -> String {
        let mut sql = format!("\"{}\" {}", self.column_name, self.sqlite_type.to_sql_type());

        if inline_primary_key {
            sql.push_str(" PRIMARY KEY");
            if self.is_autoincrement {
                sql.push_str(" AUTOINCREMENT");
            }
        }

        if !self.is_nullable {
            sql.push_str(" NOT NULL");
            if let Some(policy) = self.on_null_conflict.as_sql() {
                sql.push_str(" ON CONFLICT ");
                sql.push_str(policy);
            }
        }

        if self.is_unique {
            sql.push_str(" UNIQUE");
        }

        if let Some(default) = self.default_value.as_ref().and_then(sql_literal) {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default);
        }

        sql
    }

    /// `pub const <field>: Property<T> = Property::new(table, column);`
    pub(crate) fn property_field(&self, table_name: &str) -> TokenStream {
        let property = paths::property();
        let ident = &self.field_ident;
        let base = &self.base_type;
        let name = &self.column_name;
        quote! {
            pub const #ident: #property<#base> = #property::new(#table_name, #name);
        }
    }

    /// One `match` arm for the name → property lookup.
    pub(crate) fn property_case(&self, table_name: &str) -> TokenStream {
        let property = paths::property();
        let property_info = paths::property_info();
        let base = &self.base_type;
        let name = &self.column_name;
        quote! {
            #name => {
                static PROPERTY: #property<#base> = #property::new(#table_name, #name);
                ::std::option::Option::Some(&PROPERTY as &dyn #property_info)
            }
        }
    }

    /// Populate the named-value buffer for this column.
    pub(crate) fn bind_values_code(&self) -> TokenStream {
        let ident = &self.field_ident;
        let name = &self.column_name;
        match (&self.converter, self.is_nullable) {
            (None, _) => quote! { values.put(#name, &row.#ident); },
            (Some(converter), false) => {
                let type_converter = paths::type_converter();
                quote! {
                    values.put(#name, <#converter as #type_converter>::to_db(&row.#ident));
                }
            }
            (Some(converter), true) => {
                let type_converter = paths::type_converter();
                quote! {
                    match row.#ident.as_ref() {
                        ::std::option::Option::Some(value) => {
                            values.put(#name, <#converter as #type_converter>::to_db(value));
                        }
                        ::std::option::Option::None => values.put_null(#name),
                    }
                }
            }
        }
    }

    /// Bind this column positionally at 1-based `index`.
    pub(crate) fn bind_row_code(&self, index: usize) -> TokenStream {
        let ident = &self.field_ident;
        match (&self.converter, self.is_nullable) {
            (None, _) => quote! { stmt.raw_bind_parameter(#index, &row.#ident)?; },
            (Some(converter), false) => {
                let type_converter = paths::type_converter();
                quote! {
                    stmt.raw_bind_parameter(#index, <#converter as #type_converter>::to_db(&row.#ident))?;
                }
            }
            (Some(converter), true) => {
                let type_converter = paths::type_converter();
                quote! {
                    stmt.raw_bind_parameter(
                        #index,
                        row.#ident.as_ref().map(<#converter as #type_converter>::to_db),
                    )?;
                }
            }
        }
    }

    /// Field initializer inside `load_from_row`.
    pub(crate) fn load_code(&self) -> TokenStream {
        let ident = &self.field_ident;
        let name = &self.column_name;
        match (&self.converter, self.is_nullable) {
            (None, _) => quote! { #ident: row.get(#name)? },
            (Some(converter), false) => {
                let type_converter = paths::type_converter();
                quote! {
                    #ident: <#converter as #type_converter>::from_db(row.get(#name)?)
                }
            }
            (Some(converter), true) => {
                let type_converter = paths::type_converter();
                quote! {
                    #ident: row
                        .get::<_, ::std::option::Option<<#converter as #type_converter>::Db>>(#name)?
                        .map(<#converter as #type_converter>::from_db)
                }
            }
        }
    }

    /// Append this column's primary-key match to the condition group.
    pub(crate) fn compare_code(&self) -> TokenStream {
        let condition = paths::condition();
        let ident = &self.field_ident;
        let name = &self.column_name;
        match (&self.converter, self.is_nullable) {
            (None, _) => quote! { group = group.and(#condition::new(#name, &row.#ident)); },
            (Some(converter), false) => {
                let type_converter = paths::type_converter();
                quote! {
                    group = group.and(#condition::new(
                        #name,
                        <#converter as #type_converter>::to_db(&row.#ident),
                    ));
                }
            }
            (Some(converter), true) => {
                let type_converter = paths::type_converter();
                quote! {
                    group = group.and(#condition::new(
                        #name,
                        row.#ident.as_ref().map(<#converter as #type_converter>::to_db),
                    ));
                }
            }
        }
    }
}
