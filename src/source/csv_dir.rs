use std::path::{Path, PathBuf};

use crate::error::SourceError;
use crate::source::{RawTable, RowSource};

/// Row source backed by a directory of CSV files, one file per named table.
/// "Customer Orders" maps to `customer_orders.csv` and so on.
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn file_for(&self, table: &str) -> PathBuf {
        let slug: String = table
            .trim()
            .chars()
            .map(|c| {
                if c.is_whitespace() {
                    '_'
                } else {
                    c.to_ascii_lowercase()
                }
            })
            .collect();
        self.dir.join(format!("{slug}.csv"))
    }
}

impl RowSource for CsvDirSource {
    fn fetch_table(&self, name: &str) -> Result<RawTable, SourceError> {
        let path = self.file_for(name);
        if !path.exists() {
            return Err(SourceError::TableNotFound(name.to_string()));
        }

        let file = std::fs::File::open(&path).map_err(|source| SourceError::Io {
            table: name.to_string(),
            source,
        })?;

        // The header is read as an ordinary record so RawTable sees the
        // sheet exactly as fetched; rows may be ragged.
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut records = reader.records();
        let columns = match records.next() {
            Some(rec) => rec
                .map_err(|source| SourceError::Malformed {
                    table: name.to_string(),
                    source,
                })?
                .iter()
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        };

        let mut rows = Vec::new();
        for rec in records {
            let rec = rec.map_err(|source| SourceError::Malformed {
                table: name.to_string(),
                source,
            })?;
            rows.push(rec.iter().map(str::to_string).collect());
        }

        Ok(RawTable::new(name, columns, rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "bakery-sales-{}-{}",
            tag,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn reads_table_and_trims_headers() {
        let dir = temp_dir("read");
        std::fs::write(
            dir.join("customer_orders.csv"),
            "OrderID,Order Type \nA1,Pickup\nA2,Delivery\n",
        )
        .unwrap();

        let source = CsvDirSource::new(&dir);
        let table = source.fetch_table("Customer Orders").unwrap();
        assert_eq!(table.columns, vec!["OrderID", "Order Type"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.cell(0, 0), "A1");
        // Ragged access is blank, never a panic.
        assert_eq!(table.cell(0, 9), "");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_table_is_a_source_error() {
        let dir = temp_dir("missing");
        let source = CsvDirSource::new(&dir);
        let err = source.fetch_table("Customer Orders").unwrap_err();
        assert!(matches!(err, SourceError::TableNotFound(_)));
        std::fs::remove_dir_all(&dir).ok();
    }
}
