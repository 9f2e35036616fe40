use chrono::NaiveDate;
use std::collections::BTreeSet;
use tracing::info;

use crate::error::ReportError;
use crate::models::{AggregateReport, FilterCriteria, Order, OrderLine};
use crate::service::{aggregate, filter, normalize};
use crate::source::{RowSource, CUSTOMER_ORDERS, PRODUCTS_ORDERED};

/// One finished pipeline invocation: the filtered working set plus the
/// aggregate derived from it. The working set is retained because the CSV
/// export re-expands it; the aggregate alone is not enough.
#[derive(Debug, Clone)]
pub struct ReportRun {
    pub criteria: FilterCriteria,
    pub orders: Vec<Order>,
    pub lines: Vec<OrderLine>,
    pub report: AggregateReport,
}

/// Entry point shared by the HTTP API and the batch binary. Owns only the
/// row source; every run rebuilds its working set from a fresh fetch, so
/// concurrent callers share nothing mutable.
pub struct ReportService {
    source: Box<dyn RowSource>,
}

impl ReportService {
    pub fn new(source: impl RowSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// fetch -> normalize -> filter -> aggregate. Fatal errors (source,
    /// schema) abort the whole run; per-row issues come back as warnings on
    /// the report, validation warnings first, referential ones after.
    pub fn run(&self, criteria: &FilterCriteria) -> Result<ReportRun, ReportError> {
        let orders_raw = self.source.fetch_table(CUSTOMER_ORDERS)?;
        let lines_raw = self.source.fetch_table(PRODUCTS_ORDERED)?;

        let (orders, mut warnings) = normalize::normalize_orders(&orders_raw)?;
        let (lines, line_warnings) = normalize::normalize_lines(&lines_raw)?;
        warnings.extend(line_warnings);

        let (orders, lines) = filter::apply(&orders, &lines, criteria);
        let mut report = aggregate::aggregate(&orders, &lines);
        warnings.append(&mut report.warnings);
        report.warnings = warnings;

        info!(
            orders = orders.len(),
            lines = lines.len(),
            warnings = report.warnings.len(),
            "report pipeline finished"
        );

        Ok(ReportRun {
            criteria: criteria.clone(),
            orders,
            lines,
            report,
        })
    }

    /// Distinct product names across the whole table, sorted. Backs the
    /// dashboard's product filter dropdown.
    pub fn product_names(&self) -> Result<Vec<String>, ReportError> {
        let table = self.source.fetch_table(PRODUCTS_ORDERED)?;
        let (lines, _) = normalize::normalize_lines(&table)?;
        let names: BTreeSet<String> = lines
            .into_iter()
            .map(|l| l.product)
            .filter(|p| !p.is_empty())
            .collect();
        Ok(names.into_iter().collect())
    }

    /// Distinct pickup dates across the whole table, newest first. Backs
    /// the dashboard's pickup-day picker.
    pub fn pickup_dates(&self) -> Result<Vec<NaiveDate>, ReportError> {
        let table = self.source.fetch_table(CUSTOMER_ORDERS)?;
        let (orders, _) = normalize::normalize_orders(&table)?;
        let dates: BTreeSet<NaiveDate> =
            orders.into_iter().filter_map(|o| o.pickup_date).collect();
        Ok(dates.into_iter().rev().collect())
    }

    /// Min and max order date present in the data, if any rows carry one.
    pub fn order_date_range(&self) -> Result<Option<(NaiveDate, NaiveDate)>, ReportError> {
        let table = self.source.fetch_table(CUSTOMER_ORDERS)?;
        let (orders, _) = normalize::normalize_orders(&table)?;
        let mut range: Option<(NaiveDate, NaiveDate)> = None;
        for date in orders.into_iter().filter_map(|o| o.order_date) {
            range = Some(match range {
                None => (date, date),
                Some((min, max)) => (min.min(date), max.max(date)),
            });
        }
        Ok(range)
    }
}
