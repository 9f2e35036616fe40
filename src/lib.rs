pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod source;

pub use config::AppConfig;
pub use error::{ReportError, SourceError, ValidationError};
pub use service::{ReportRun, ReportService};
pub use source::{CsvDirSource, RawTable, RowSource};
