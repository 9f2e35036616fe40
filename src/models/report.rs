use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;

use crate::error::ValidationError;

/// Derived summary of one report request. Recomputed on every filter change,
/// never persisted; every export format renders from the same instance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateReport {
    /// Category -> {line count, revenue}, sorted by category.
    pub by_category: IndexMap<String, GroupTotals>,
    /// Order type label -> {distinct orders, revenue}, sorted by label.
    pub by_order_type: IndexMap<String, GroupTotals>,
    /// Product -> {line count, revenue}, sorted by revenue descending then
    /// product name.
    pub by_product: IndexMap<String, GroupTotals>,
    /// Calendar day of order date -> daily totals, chronological. Lines of
    /// orders without an order date are absent here but still counted in
    /// every other table.
    pub by_day: IndexMap<NaiveDate, DayTotals>,
    pub totals: GrandTotals,
    /// Non-fatal data-quality issues collected during the run, in source
    /// order: validation warnings first, then referential ones.
    pub warnings: Vec<DataWarning>,
}

impl AggregateReport {
    pub fn is_empty(&self) -> bool {
        self.totals.line_items == 0
    }
}

/// Count/revenue pair for one group key. `count` is line items for the
/// category and product tables and distinct orders for the order-type table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupTotals {
    pub count: u64,
    pub revenue: BigDecimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DayTotals {
    pub revenue: BigDecimal,
    pub orders: u64,
}

/// Accumulated across exactly the lines that were aggregated, in the same
/// pass as the group tables; never recomputed per section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GrandTotals {
    /// Distinct orders with at least one aggregated line.
    pub orders: u64,
    pub line_items: u64,
    pub quantity: u64,
    /// Sum of line quantity x unit price.
    pub revenue: BigDecimal,
    /// Sum of the orders' own stored totals, reported next to `revenue`
    /// because the two may legitimately diverge.
    pub order_amount_total: BigDecimal,
    pub items_per_order: BigDecimal,
}

/// Non-fatal issue attached to the report so every surface can show
/// data-quality caveats instead of silently dropping rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataWarning {
    Validation(ValidationError),
    /// A line whose order identifier resolves to no fetched order. Excluded
    /// from all group tables, recorded exactly once.
    UnmatchedOrder {
        table: &'static str,
        row: usize,
        order_id: String,
    },
}
