use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::Local;
use indexmap::IndexMap;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use crate::error::ReportError;
use crate::models::{AggregateReport, Order};
use crate::service::pipeline::ReportRun;

/// Notice rendered when the filtered working set has no lines. Assembly
/// still succeeds; the artifact is explicit instead of empty.
pub const NO_DATA_NOTICE: &str = "No data for selected filters.";

/// Fixed column order of the tabular (CSV) export.
pub const CSV_COLUMNS: [&str; 10] = [
    "OrderID",
    "Order Date",
    "Due Pickup Date",
    "Customer",
    "Order Type",
    "Product Description",
    "Category",
    "Quantity",
    "Unit Price",
    "Line Revenue",
];

/// Top products shown in the document export.
const TOP_PRODUCTS: usize = 10;
/// Content lines per document page, excluding the page header.
const PAGE_LINES: usize = 52;

/// Structured artifact: the aggregate tables plus a small envelope.
#[derive(Debug, Serialize)]
pub struct StructuredReport<'a> {
    pub generated_at: String,
    pub no_data: bool,
    #[serde(flatten)]
    pub report: &'a AggregateReport,
}

/// Assemble the structured (JSON/console) artifact.
pub fn structured(run: &ReportRun) -> StructuredReport<'_> {
    StructuredReport {
        generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        no_data: run.report.is_empty(),
        report: &run.report,
    }
}

/// Assemble the tabular CSV export: one row per filtered line joined with
/// its order. This is a re-expansion of the working set, not the aggregate,
/// and is byte-for-byte reproducible for the same inputs.
pub fn to_csv(run: &ReportRun) -> Result<Vec<u8>, ReportError> {
    let index: HashMap<&str, &Order> = run.orders.iter().map(|o| (o.id.as_str(), o)).collect();

    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);
        writer.write_record(CSV_COLUMNS)?;

        for line in &run.lines {
            let order = index.get(line.order_id.as_str()).copied();
            let record = [
                line.order_id.clone(),
                order.and_then(|o| o.order_date).map(iso).unwrap_or_default(),
                order.and_then(|o| o.pickup_date).map(iso).unwrap_or_default(),
                order.map(|o| o.customer.clone()).unwrap_or_default(),
                order.map(|o| o.order_type.label().to_string()).unwrap_or_default(),
                line.product.clone(),
                line.category.clone(),
                line.quantity.map(|q| q.to_string()).unwrap_or_default(),
                line.unit_price.as_ref().map(plain).unwrap_or_default(),
                line.revenue().map(|v| plain(&v)).unwrap_or_default(),
            ];
            writer.write_record(&record)?;
        }
        writer.flush()?;
    }
    Ok(buf)
}

#[derive(Tabled)]
struct MetricRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Revenue")]
    revenue: String,
    #[tabled(rename = "Count")]
    count: u64,
}

#[derive(Tabled)]
struct DayRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Revenue")]
    revenue: String,
    #[tabled(rename = "Orders")]
    orders: u64,
}

/// Assemble the paginated document export. Fixed section order: grand
/// totals, per-category breakdown, per-order-type breakdown, daily trend,
/// top products. Every section renders from the same AggregateReport.
pub fn to_document(run: &ReportRun) -> Vec<u8> {
    let report = &run.report;
    let mut lines: Vec<String> = Vec::new();

    lines.push("SALES REPORT".to_string());
    lines.push("=".repeat(60));
    if !run.criteria.is_unconstrained() {
        lines.extend(criteria_echo(&run.criteria));
    }
    lines.push(String::new());

    if report.is_empty() {
        lines.push(NO_DATA_NOTICE.to_string());
        lines.push(String::new());
    }

    section(&mut lines, "Summary");
    let totals = &report.totals;
    push_table(
        &mut lines,
        vec![
            MetricRow {
                metric: "Orders",
                value: totals.orders.to_string(),
            },
            MetricRow {
                metric: "Line Items",
                value: totals.line_items.to_string(),
            },
            MetricRow {
                metric: "Quantity",
                value: totals.quantity.to_string(),
            },
            MetricRow {
                metric: "Revenue",
                value: money(&totals.revenue),
            },
            MetricRow {
                metric: "Order Amount Total",
                value: money(&totals.order_amount_total),
            },
            MetricRow {
                metric: "Items per Order",
                value: totals.items_per_order.to_string(),
            },
        ],
    );

    section(&mut lines, "Sales by Category");
    push_table(
        &mut lines,
        report
            .by_category
            .iter()
            .map(|(name, t)| GroupRow {
                name: name.clone(),
                revenue: money(&t.revenue),
                count: t.count,
            })
            .collect(),
    );

    section(&mut lines, "Sales by Order Type");
    push_table(
        &mut lines,
        report
            .by_order_type
            .iter()
            .map(|(name, t)| GroupRow {
                name: name.clone(),
                revenue: money(&t.revenue),
                count: t.count,
            })
            .collect(),
    );

    section(&mut lines, "Daily Trend");
    push_table(
        &mut lines,
        report
            .by_day
            .iter()
            .map(|(day, t)| DayRow {
                date: iso(*day),
                revenue: money(&t.revenue),
                orders: t.orders,
            })
            .collect(),
    );

    section(&mut lines, "Top Products by Revenue");
    push_table(
        &mut lines,
        report
            .by_product
            .iter()
            .take(TOP_PRODUCTS)
            .map(|(name, t)| GroupRow {
                name: name.clone(),
                revenue: money(&t.revenue),
                count: t.count,
            })
            .collect(),
    );

    if !report.warnings.is_empty() {
        section(&mut lines, "Data Quality Warnings");
        for warning in &report.warnings {
            lines.push(format!("- {}", warning_text(warning)));
        }
        lines.push(String::new());
    }

    paginate(&lines)
}

#[derive(Tabled)]
struct ProductCountRow {
    #[tabled(rename = "Product Description")]
    product: String,
    #[tabled(rename = "Quantity")]
    count: u64,
}

/// Assemble the product-by-day document: lines grouped by the order's
/// pickup date (chronological, dateless orders last), one product count
/// table per day plus a grand total. Re-expands the working set like the
/// CSV export does.
pub fn to_product_day_document(run: &ReportRun) -> Vec<u8> {
    let pickup_dates: HashMap<&str, Option<chrono::NaiveDate>> = run
        .orders
        .iter()
        .map(|o| (o.id.as_str(), o.pickup_date))
        .collect();

    let mut by_day: IndexMap<Option<chrono::NaiveDate>, IndexMap<String, u64>> = IndexMap::new();
    for line in &run.lines {
        let Some(day) = pickup_dates.get(line.order_id.as_str()) else {
            continue;
        };
        let product = if line.product.is_empty() {
            "unknown".to_string()
        } else {
            line.product.clone()
        };
        *by_day.entry(*day).or_default().entry(product).or_insert(0) += 1;
    }
    // Chronological, dateless group last.
    by_day.sort_by(|ka, _, kb, _| match (ka, kb) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    let mut lines: Vec<String> = Vec::new();
    lines.push("PRODUCT BY DAY REPORT".to_string());
    lines.push("=".repeat(60));
    if !run.criteria.is_unconstrained() {
        lines.extend(criteria_echo(&run.criteria));
    }
    lines.push(String::new());

    if by_day.is_empty() {
        lines.push(NO_DATA_NOTICE.to_string());
        lines.push(String::new());
        return paginate(&lines);
    }

    let mut grand_total: u64 = 0;
    for (day, products) in &by_day {
        let heading = match day {
            Some(d) => d.format("%A, %b %d, %Y").to_string(),
            None => "No Date".to_string(),
        };
        section(&mut lines, &heading);

        let mut products: Vec<(&String, &u64)> = products.iter().collect();
        products.sort_by(|(a, _), (b, _)| a.cmp(b));
        let day_total: u64 = products.iter().map(|(_, c)| **c).sum();
        grand_total += day_total;

        let mut rows: Vec<ProductCountRow> = products
            .into_iter()
            .map(|(name, count)| ProductCountRow {
                product: name.clone(),
                count: *count,
            })
            .collect();
        rows.push(ProductCountRow {
            product: "Total".to_string(),
            count: day_total,
        });
        push_table(&mut lines, rows);
    }

    lines.push(format!("Grand total: {grand_total} items"));
    lines.push(String::new());

    paginate(&lines)
}

fn criteria_echo(criteria: &crate::models::FilterCriteria) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(range) = range_text(criteria.order_date_start, criteria.order_date_end) {
        lines.push(format!("Order date: {range}"));
    }
    if let Some(range) = range_text(criteria.pickup_date_start, criteria.pickup_date_end) {
        lines.push(format!("Pickup date: {range}"));
    }
    if let Some(dates) = &criteria.pickup_dates {
        let days: Vec<String> = dates.iter().copied().map(iso).collect();
        lines.push(format!("Pickup days: {}", days.join(", ")));
    }
    if let Some(types) = &criteria.order_types {
        let labels: Vec<&str> = types.iter().map(String::as_str).collect();
        lines.push(format!("Order types: {}", labels.join(", ")));
    }
    if let Some(products) = &criteria.products {
        let names: Vec<&str> = products.iter().map(String::as_str).collect();
        lines.push(format!("Products: {}", names.join(", ")));
    }
    lines
}

fn range_text(
    start: Option<chrono::NaiveDate>,
    end: Option<chrono::NaiveDate>,
) -> Option<String> {
    match (start, end) {
        (None, None) => None,
        (Some(s), Some(e)) => Some(format!("{} to {}", iso(s), iso(e))),
        (Some(s), None) => Some(format!("from {}", iso(s))),
        (None, Some(e)) => Some(format!("through {}", iso(e))),
    }
}

fn warning_text(warning: &crate::models::DataWarning) -> String {
    use crate::models::DataWarning;
    match warning {
        DataWarning::Validation(err) => err.to_string(),
        DataWarning::UnmatchedOrder {
            table,
            row,
            order_id,
        } => format!("{table} row {row}: no order matches '{order_id}'"),
    }
}

fn section(lines: &mut Vec<String>, title: &str) {
    lines.push(title.to_string());
    lines.push("-".repeat(title.len()));
}

fn push_table<T: Tabled>(lines: &mut Vec<String>, rows: Vec<T>) {
    if rows.is_empty() {
        lines.push("(no rows)".to_string());
    } else {
        let rendered = Table::new(rows).with(Style::markdown()).to_string();
        lines.extend(rendered.lines().map(str::to_string));
    }
    lines.push(String::new());
}

/// Split into fixed-height pages separated by form feeds, each carrying a
/// page header line.
fn paginate(lines: &[String]) -> Vec<u8> {
    let mut pages: Vec<String> = Vec::new();
    let chunks: Vec<&[String]> = lines.chunks(PAGE_LINES).collect();
    let total = chunks.len().max(1);

    for (i, chunk) in chunks.into_iter().enumerate() {
        let mut page = format!("Sales Report - page {} of {}\n\n", i + 1, total);
        for line in chunk {
            page.push_str(line);
            page.push('\n');
        }
        pages.push(page);
    }

    pages.join("\x0c").into_bytes()
}

fn iso(date: chrono::NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn money(value: &BigDecimal) -> String {
    format!("${}", value.with_scale(2))
}

fn plain(value: &BigDecimal) -> String {
    value.with_scale(2).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilterCriteria, GrandTotals, OrderLine, OrderType};
    use crate::service::aggregate::aggregate;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn sample_run() -> ReportRun {
        let orders = vec![Order {
            row: 2,
            id: "A1".to_string(),
            order_date: NaiveDate::from_str("2024-01-05").ok(),
            pickup_date: NaiveDate::from_str("2024-01-07").ok(),
            customer: "Ada L".to_string(),
            order_type: OrderType::Pickup,
            total: Some(dec("7.50")),
        }];
        let lines = vec![OrderLine {
            row: 2,
            order_id: "A1".to_string(),
            product: "Sourdough".to_string(),
            category: "bread".to_string(),
            quantity: Some(2),
            unit_price: Some(dec("3.50")),
        }];
        let report = aggregate(&orders, &lines);
        ReportRun {
            criteria: FilterCriteria::default(),
            orders,
            lines,
            report,
        }
    }

    fn empty_run() -> ReportRun {
        let report = aggregate(&[], &[]);
        ReportRun {
            criteria: FilterCriteria::default(),
            orders: vec![],
            lines: vec![],
            report,
        }
    }

    #[test]
    fn csv_has_fixed_header_and_joined_rows() {
        let run = sample_run();
        let bytes = to_csv(&run).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut rows = text.lines();
        assert_eq!(
            rows.next().unwrap(),
            "OrderID,Order Date,Due Pickup Date,Customer,Order Type,Product Description,Category,Quantity,Unit Price,Line Revenue"
        );
        assert_eq!(
            rows.next().unwrap(),
            "A1,2024-01-05,2024-01-07,Ada L,pickup,Sourdough,bread,2,3.50,7.00"
        );
        assert_eq!(rows.next(), None);
    }

    #[test]
    fn csv_is_byte_identical_across_runs() {
        let run = sample_run();
        assert_eq!(to_csv(&run).unwrap(), to_csv(&run).unwrap());
    }

    #[test]
    fn document_sections_appear_in_fixed_order() {
        let run = sample_run();
        let text = String::from_utf8(to_document(&run)).unwrap();
        let order = [
            "Summary",
            "Sales by Category",
            "Sales by Order Type",
            "Daily Trend",
            "Top Products by Revenue",
        ];
        let positions: Vec<usize> = order.iter().map(|s| text.find(s).unwrap()).collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
        assert!(text.contains("$7.00"));
    }

    #[test]
    fn document_and_csv_agree_on_grand_totals() {
        let run = sample_run();
        let text = String::from_utf8(to_document(&run)).unwrap();
        assert!(text.contains(&format!("${}", run.report.totals.revenue)));

        let csv_text = String::from_utf8(to_csv(&run).unwrap()).unwrap();
        let csv_revenue = csv_text
            .lines()
            .skip(1)
            .fold(BigDecimal::from(0), |acc, row| {
                let cell = row.rsplit(',').next().unwrap_or("");
                if cell.is_empty() {
                    acc
                } else {
                    acc + BigDecimal::from_str(cell).unwrap()
                }
            });
        assert_eq!(csv_revenue.with_scale(2), run.report.totals.revenue);
    }

    #[test]
    fn empty_report_assembles_an_explicit_no_data_artifact() {
        let run = empty_run();
        let doc = String::from_utf8(to_document(&run)).unwrap();
        assert!(doc.contains(NO_DATA_NOTICE));

        let csv_text = String::from_utf8(to_csv(&run).unwrap()).unwrap();
        assert_eq!(csv_text.lines().count(), 1);

        let artifact = structured(&run);
        assert!(artifact.no_data);
        assert_eq!(artifact.report.totals, GrandTotals {
            items_per_order: dec("0.00"),
            revenue: dec("0.00"),
            order_amount_total: dec("0.00"),
            ..GrandTotals::default()
        });
    }

    #[test]
    fn product_by_day_groups_by_pickup_date_chronologically() {
        let mut run = sample_run();
        run.orders.push(Order {
            row: 3,
            id: "A2".to_string(),
            order_date: NaiveDate::from_str("2024-01-03").ok(),
            pickup_date: NaiveDate::from_str("2024-01-04").ok(),
            customer: "Bob M".to_string(),
            order_type: OrderType::Delivery,
            total: Some(dec("4.00")),
        });
        run.lines.push(OrderLine {
            row: 3,
            order_id: "A2".to_string(),
            product: "Baguette".to_string(),
            category: "bread".to_string(),
            quantity: Some(1),
            unit_price: Some(dec("4.00")),
        });

        let text = String::from_utf8(to_product_day_document(&run)).unwrap();
        // Earlier pickup day first; the sample order picks up on Jan 7.
        let first = text.find("Wednesday, Jan 03, 2024");
        let second = text.find("Sunday, Jan 07, 2024");
        assert!(first.is_none());
        assert!(second.is_some());
        let jan4 = text.find("Thursday, Jan 04, 2024").unwrap();
        assert!(jan4 < second.unwrap());
        assert!(text.contains("Baguette"));
        assert!(text.contains("Sourdough"));
        assert!(text.contains("Grand total: 2 items"));
    }

    #[test]
    fn product_by_day_with_no_lines_is_an_explicit_no_data_artifact() {
        let run = empty_run();
        let text = String::from_utf8(to_product_day_document(&run)).unwrap();
        assert!(text.contains(NO_DATA_NOTICE));
    }

    #[test]
    fn structured_artifact_serializes_group_tables() {
        let run = sample_run();
        let value = serde_json::to_value(structured(&run)).unwrap();
        assert_eq!(value["no_data"], serde_json::Value::Bool(false));
        assert!(value["by_category"]["bread"]["revenue"].is_string());
        assert_eq!(value["by_category"]["bread"]["count"], 1);
        assert!(value["by_day"]["2024-01-05"].is_object());
    }
}
