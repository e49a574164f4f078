#![recursion_limit = "128"]

extern crate proc_macro;

mod common;
mod paths;
mod sqlite;

use proc_macro::TokenStream;

/// Attribute macro for declaring a SQLite database module.
///
/// Applied to a module, it runs one generation round over every struct
/// inside: `#[table]` structs get a table adapter (column properties, SQL
/// fragments, DDL, row loading, cascade save/delete), `#[query_model]`
/// structs get a load-only adapter, and plain structs referenced through
/// `#[column_map]` fields are registered as derived query models. A
/// `<Name>Database` handle with the ordered creation statements is
/// emitted alongside.
///
/// # Example
///
/// ```ignore
/// #[SQLiteDatabase(name = "library")]
/// mod schema {
///     #[table(name = "authors", model)]
///     pub struct Author {
///         #[column(primary)]
///         pub id: i64,
///         #[column]
///         pub name: String,
///     }
///
///     #[table(name = "books", model)]
///     pub struct Book {
///         #[column(primary)]
///         pub id: i64,
///         #[foreign_key(on_delete = CASCADE, save_cascade,
///             references(local = "author_id", foreign = "id"))]
///         pub author: Option<Author>,
///     }
/// }
/// ```
///
/// Configuration and resolution errors are collected for the whole round
/// and reported together, so one compilation surfaces every problem in
/// the module.
#[allow(non_snake_case)]
#[proc_macro_attribute]
pub fn SQLiteDatabase(attr: TokenStream, item: TokenStream) -> TokenStream {
    let attr = proc_macro2::TokenStream::from(attr);
    let module = syn::parse_macro_input!(item as syn::ItemMod);

    match sqlite::database::database_macro(attr, module) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
