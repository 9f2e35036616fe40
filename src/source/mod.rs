pub mod csv_dir;

pub use csv_dir::CsvDirSource;

use crate::error::SourceError;

/// Table holding customer purchase transactions.
pub const CUSTOMER_ORDERS: &str = "Customer Orders";
/// Table holding the product line items belonging to orders.
pub const PRODUCTS_ORDERED: &str = "Bakery Products Ordered";

/// One fetched table: a header row plus data rows, all as strings.
/// Consumers bind columns by name, never by sheet position.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Header names are trimmed; the original sheet carries trailing spaces
    /// in some of them ("Order Type ").
    pub fn new(name: impl Into<String>, columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let columns = columns.into_iter().map(|c| c.trim().to_string()).collect();
        Self {
            name: name.into(),
            columns,
            rows,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell contents, blank when a short row does not reach the column.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Boundary to the external spreadsheet service. Implementations fetch a
/// named table in one blocking call; the pipeline performs no retries.
pub trait RowSource: Send + Sync {
    fn fetch_table(&self, name: &str) -> Result<RawTable, SourceError>;
}
