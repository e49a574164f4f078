use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoamError {
    /// Error executing a statement
    #[error("Execution error: {0}")]
    Execution(String),

    /// Error preparing a statement
    #[error("Prepare error: {0}")]
    Prepare(String),

    /// No rows returned when at least one was expected
    #[error("No rows found")]
    NotFound,

    /// Error mapping a row into a model value
    #[error("Mapping error: {0}")]
    Mapping(String),

    /// Error converting a value through a type converter
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Rusqlite specific errors
    #[error("Rusqlite error: {0}")]
    Rusqlite(#[from] rusqlite::Error),
}

/// Result type for database operations
pub type Result<T> = std::result::Result<T, LoamError>;
