//! Centralized path definitions for generated code.
//!
//! Generated code uses `loam::`-prefixed paths (without a leading `::`) so
//! doc tests in subcrates can create a `mod loam { … }` shim re-exporting
//! from the current crate, avoiding circular dependencies.

#![allow(dead_code)]

use proc_macro2::TokenStream;
use quote::quote;

pub(crate) fn property() -> TokenStream {
    quote!(loam::core::Property)
}

pub(crate) fn property_info() -> TokenStream {
    quote!(loam::core::PropertyInfo)
}

pub(crate) fn condition() -> TokenStream {
    quote!(loam::core::Condition)
}

pub(crate) fn operator_group() -> TokenStream {
    quote!(loam::core::OperatorGroup)
}

pub(crate) fn content_values() -> TokenStream {
    quote!(loam::core::ContentValues)
}

pub(crate) fn table_adapter() -> TokenStream {
    quote!(loam::core::TableAdapter)
}

pub(crate) fn query_adapter() -> TokenStream {
    quote!(loam::core::QueryAdapter)
}

pub(crate) fn model() -> TokenStream {
    quote!(loam::core::Model)
}

pub(crate) fn database_schema() -> TokenStream {
    quote!(loam::core::DatabaseSchema)
}

pub(crate) fn type_converter() -> TokenStream {
    quote!(loam::core::TypeConverter)
}

pub(crate) fn result() -> TokenStream {
    quote!(loam::core::Result)
}

pub(crate) fn connection() -> TokenStream {
    quote!(loam::rusqlite::Connection)
}

pub(crate) fn rusqlite() -> TokenStream {
    quote!(loam::rusqlite)
}

pub(crate) fn std_option() -> TokenStream {
    quote!(::std::option::Option)
}
