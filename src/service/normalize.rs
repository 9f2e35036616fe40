use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;

use crate::error::{ReportError, ValidationError};
use crate::models::{DataWarning, Order, OrderLine, OrderType};
use crate::source::{RawTable, CUSTOMER_ORDERS, PRODUCTS_ORDERED};

/// Date formats accepted by the sheets, most common first.
const DATE_FORMATS: [&str; 3] = ["%m-%d-%Y", "%m/%d/%Y", "%Y-%m-%d"];

/// Required columns of one table. Binding fails with a fatal schema error
/// when any is absent; extra columns in the sheet are ignored.
struct TableSchema {
    table: &'static str,
    required: &'static [&'static str],
}

const ORDERS_SCHEMA: TableSchema = TableSchema {
    table: CUSTOMER_ORDERS,
    required: &[
        "OrderID",
        "Order Date",
        "Due Pickup Date",
        "Customer First Name",
        "Customer Last Name",
        "Order Type",
        "Total",
    ],
};

const LINES_SCHEMA: TableSchema = TableSchema {
    table: PRODUCTS_ORDERED,
    required: &["OrderID", "Product Description", "Category", "CakeQty", "Unit Price"],
};

/// A table whose required columns have been resolved to positions.
struct Bound<'t> {
    table: &'t RawTable,
    schema: &'static TableSchema,
    indices: Vec<usize>,
}

impl TableSchema {
    fn bind<'t>(&'static self, table: &'t RawTable) -> Result<Bound<'t>, ReportError> {
        let mut indices = Vec::with_capacity(self.required.len());
        for col in self.required {
            match table.column_index(col) {
                Some(i) => indices.push(i),
                None => {
                    return Err(ReportError::Schema {
                        table: self.table.to_string(),
                        column: col.to_string(),
                    })
                }
            }
        }
        Ok(Bound {
            table,
            schema: self,
            indices,
        })
    }
}

impl Bound<'_> {
    fn len(&self) -> usize {
        self.table.rows.len()
    }

    /// Spreadsheet row number of data row `i` (header is row 1).
    fn row_number(&self, i: usize) -> usize {
        i + 2
    }

    fn cell(&self, i: usize, column: &'static str) -> &str {
        // Columns outside the schema are unreachable by construction.
        let pos = self
            .schema
            .required
            .iter()
            .position(|c| *c == column)
            .map(|p| self.indices[p]);
        match pos {
            Some(col) => self.table.cell(i, col),
            None => "",
        }
    }

    fn error(&self, i: usize, column: &'static str, message: impl Into<String>) -> ValidationError {
        ValidationError {
            table: self.schema.table,
            row: self.row_number(i),
            column,
            message: message.into(),
        }
    }

    /// Identifier: trimmed and upper-cased, blank is a hard per-row error.
    fn ident(&self, i: usize, column: &'static str) -> Result<String, ValidationError> {
        let raw = self.cell(i, column).trim();
        if raw.is_empty() {
            return Err(self.error(i, column, "missing identifier"));
        }
        Ok(raw.to_ascii_uppercase())
    }

    fn text(&self, i: usize, column: &'static str) -> String {
        self.cell(i, column).trim().to_string()
    }

    /// Blank dates are missing; non-blank cells must match a known format.
    fn date(&self, i: usize, column: &'static str) -> Result<Option<NaiveDate>, ValidationError> {
        let raw = self.cell(i, column).trim();
        if raw.is_empty() {
            return Ok(None);
        }
        DATE_FORMATS
            .iter()
            .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
            .map(Some)
            .ok_or_else(|| self.error(i, column, format!("unparseable date '{raw}'")))
    }

    /// Currency amount; tolerates a leading `$` and `,` thousands
    /// separators. Blank is missing, negative is rejected.
    fn amount(&self, i: usize, column: &'static str) -> Result<Option<BigDecimal>, ValidationError> {
        let raw = self.cell(i, column).trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let cleaned: String = raw
            .strip_prefix('$')
            .unwrap_or(raw)
            .chars()
            .filter(|c| *c != ',')
            .collect();
        let value = BigDecimal::from_str(cleaned.trim())
            .map_err(|_| self.error(i, column, format!("unparseable amount '{raw}'")))?;
        if value < BigDecimal::from(0) {
            return Err(self.error(i, column, format!("negative amount '{raw}'")));
        }
        Ok(Some(value))
    }

    /// Positive integer quantity. Blank is missing.
    fn quantity(&self, i: usize, column: &'static str) -> Result<Option<i64>, ValidationError> {
        let raw = self.cell(i, column).trim();
        if raw.is_empty() {
            return Ok(None);
        }
        let qty: i64 = raw
            .parse()
            .map_err(|_| self.error(i, column, format!("unparseable quantity '{raw}'")))?;
        if qty <= 0 {
            return Err(self.error(i, column, format!("quantity must be positive, got {qty}")));
        }
        Ok(Some(qty))
    }
}

/// Normalize the "Customer Orders" table. Rows that fail validation are
/// excluded and returned as warnings; a missing column is fatal.
pub fn normalize_orders(table: &RawTable) -> Result<(Vec<Order>, Vec<DataWarning>), ReportError> {
    let bound = ORDERS_SCHEMA.bind(table)?;
    let mut orders = Vec::with_capacity(bound.len());
    let mut warnings = Vec::new();

    for i in 0..bound.len() {
        match order_from_row(&bound, i) {
            Ok(order) => orders.push(order),
            Err(err) => warnings.push(DataWarning::Validation(err)),
        }
    }

    Ok((orders, warnings))
}

fn order_from_row(bound: &Bound<'_>, i: usize) -> Result<Order, ValidationError> {
    let first = bound.text(i, "Customer First Name");
    let last = bound.text(i, "Customer Last Name");
    let customer = format!("{first} {last}").trim().to_string();

    Ok(Order {
        row: bound.row_number(i),
        id: bound.ident(i, "OrderID")?,
        order_date: bound.date(i, "Order Date")?,
        pickup_date: bound.date(i, "Due Pickup Date")?,
        customer,
        order_type: OrderType::from_cell(bound.cell(i, "Order Type")),
        total: bound.amount(i, "Total")?,
    })
}

/// Normalize the "Bakery Products Ordered" table.
pub fn normalize_lines(table: &RawTable) -> Result<(Vec<OrderLine>, Vec<DataWarning>), ReportError> {
    let bound = LINES_SCHEMA.bind(table)?;
    let mut lines = Vec::with_capacity(bound.len());
    let mut warnings = Vec::new();

    for i in 0..bound.len() {
        match line_from_row(&bound, i) {
            Ok(line) => lines.push(line),
            Err(err) => warnings.push(DataWarning::Validation(err)),
        }
    }

    Ok((lines, warnings))
}

fn line_from_row(bound: &Bound<'_>, i: usize) -> Result<OrderLine, ValidationError> {
    Ok(OrderLine {
        row: bound.row_number(i),
        order_id: bound.ident(i, "OrderID")?,
        product: bound.text(i, "Product Description"),
        category: bound.text(i, "Category"),
        quantity: bound.quantity(i, "CakeQty")?,
        unit_price: bound.amount(i, "Unit Price")?,
    })
}
