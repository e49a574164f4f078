//! Type converters bridging model-side types to SQLite storage types.

/// Converts between a model-side type and the database type a column is
/// actually stored as.
///
/// Implementations are referenced from `#[column(converter = …)]`; the
/// generated binding code calls [`to_db`](Self::to_db) before writing and
/// [`from_db`](Self::from_db) after reading.
pub trait TypeConverter {
    /// The type as declared on the model struct.
    type Model;
    /// The storage type, one of the natively bindable SQLite types.
    type Db;

    fn to_db(model: &Self::Model) -> Self::Db;
    fn from_db(db: Self::Db) -> Self::Model;
}
