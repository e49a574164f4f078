//! # Loam
//!
//! A compile-time SQLite table-binding generator. Annotated data-model
//! structs inside a `#[SQLiteDatabase]` module are expanded into table
//! adapters: column properties, SQL statement fragments, `CREATE TABLE`
//! DDL, row loading and foreign-key cascade save/delete logic, all
//! running against `rusqlite`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use loam::prelude::*;
//!
//! #[SQLiteDatabase(name = "library")]
//! mod schema {
//!     #[table(name = "authors", model)]
//!     pub struct Author {
//!         #[column(primary)]
//!         pub id: i64,
//!         #[column]
//!         pub name: String,
//!     }
//!
//!     #[table(name = "books", model)]
//!     pub struct Book {
//!         #[column(primary)]
//!         pub id: i64,
//!         #[column]
//!         pub title: String,
//!         #[foreign_key(on_delete = CASCADE, save_cascade,
//!             references(local = "author_id", foreign = "id"))]
//!         pub author: Option<Author>,
//!     }
//! }
//!
//! use schema::{Author, Book};
//!
//! fn main() -> loam::Result<()> {
//!     let conn = loam::rusqlite::Connection::open_in_memory()?;
//!     schema::LibraryDatabase::create_all(&conn)?;
//!
//!     let mut book = Book {
//!         id: 1,
//!         title: "The Left Hand of Darkness".to_string(),
//!         author: Some(Author { id: 7, name: "Ursula K. Le Guin".to_string() }),
//!     };
//!     // cascade-saves the author first, then the book
//!     book.save(&conn)?;
//!     Ok(())
//! }
//! ```

pub use loam_core as core;
pub use loam_macros::SQLiteDatabase;
pub use rusqlite;

pub use loam_core::{LoamError, Result};

pub mod prelude {
    pub use crate::core::{
        Condition, ConflictAction, ContentValues, DatabaseSchema, ForeignKeyAction, LoamError,
        Model, OperatorGroup, Property, PropertyInfo, QueryAdapter, Result, TableAdapter,
        TypeConverter, Value,
    };
    pub use loam_macros::SQLiteDatabase;
}
