use serde::Serialize;
use thiserror::Error;

/// Fatal pipeline failures. No partial report is produced for any of these.
#[derive(Debug, Error)]
pub enum ReportError {
    /// An expected column is absent from a fetched table.
    #[error("table '{table}' is missing expected column '{column}'")]
    Schema { table: String, column: String },

    /// The row source could not deliver a table; surfaced unmodified.
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("json export failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures inside the row source boundary (fetching a named table).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("table '{0}' not found")]
    TableNotFound(String),

    #[error("failed to read table '{table}': {source}")]
    Io {
        table: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed row in table '{table}': {source}")]
    Malformed {
        table: String,
        #[source]
        source: csv::Error,
    },
}

/// One malformed cell in one source row. Non-fatal: the row is excluded and
/// the error is carried as a warning alongside the report.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{table} row {row}, column '{column}': {message}")]
pub struct ValidationError {
    pub table: &'static str,
    /// Spreadsheet row number: the header is row 1, the first data row is 2.
    pub row: usize,
    pub column: &'static str,
    pub message: String,
}
