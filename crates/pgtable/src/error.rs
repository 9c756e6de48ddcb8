//! Error types for pgtable

use std::error::Error as StdError;
use thiserror::Error;

/// Result type alias for pgtable operations
pub type TableResult<T> = Result<T, TableError>;

/// Error types for table access and ingestion
#[derive(Debug, Error)]
pub enum TableError {
    /// Could not establish a database connection
    #[error("Unable to connect to database: {0}")]
    Connection(String),

    /// A statement failed and its transaction was rolled back
    #[error("Query execution error: {}", describe_execution(.0))]
    QueryExecution(tokio_postgres::Error),

    /// Invalid input (identifier, email, statement kind, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Nothing to write (empty insert/update payload or empty staging set)
    #[error("No data: {0}")]
    NoData(String),

    /// A required column is absent from a source file header
    #[error("Missing column '{0}' in source header")]
    MissingColumn(String),

    /// Result row decode error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// File open/read/write error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV framing error
    #[error("CSV error: {0}")]
    Csv(csv::Error),
}

impl From<tokio_postgres::Error> for TableError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::QueryExecution(err)
    }
}

impl From<csv::Error> for TableError {
    fn from(err: csv::Error) -> Self {
        // Read failures under the CSV reader (open, decode) are I/O faults.
        if let csv::ErrorKind::Io(io) = err.kind() {
            return Self::Io(std::io::Error::new(io.kind(), io.to_string()));
        }
        Self::Csv(err)
    }
}

/// The server's own message for database errors, the full cause chain otherwise.
fn describe_execution(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => {
            let mut text = format!("{}: {}", db.severity(), db.message());
            if let Some(detail) = db.detail() {
                text.push_str(&format!(" ({detail})"));
            }
            text
        }
        None => error_chain(err),
    }
}

/// Join an error and all of its sources with `": "`.
pub(crate) fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.ends_with(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

impl TableError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a no-data error
    pub fn no_data(message: impl Into<String>) -> Self {
        Self::NoData(message.into())
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a no-data error
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData(_))
    }

    /// Errors the interactive shell recovers from by skipping the operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NoData(_))
    }

    /// Unique-constraint violations surface as execution errors; this exposes the SQLSTATE check.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::QueryExecution(err) => err
                .as_db_error()
                .is_some_and(|db| db.code().code() == "23505"),
            _ => false,
        }
    }
}
