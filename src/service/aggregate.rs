use std::collections::{HashMap, HashSet};

use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use indexmap::IndexMap;

use crate::models::{
    AggregateReport, DataWarning, DayTotals, GrandTotals, GroupTotals, Order, OrderLine,
};
use crate::source::PRODUCTS_ORDERED;

/// Group label for lines without a category.
const UNCATEGORIZED: &str = "uncategorized";
/// Group label for lines without a product description.
const UNKNOWN_PRODUCT: &str = "unknown";

#[derive(Default)]
struct GroupAcc<'a> {
    revenue: BigDecimal,
    lines: u64,
    orders: HashSet<&'a str>,
}

/// Aggregate the (already filtered) working set into one report.
///
/// Pure function of its inputs: no shared state, deterministic output, safe
/// for concurrent callers. Keys are discovered in input order and sorted at
/// finalize so every export renders identically for the same data.
pub fn aggregate(orders: &[Order], lines: &[OrderLine]) -> AggregateReport {
    // Identifier -> order for O(1) line resolution; first row wins on
    // duplicate identifiers.
    let mut index: HashMap<&str, &Order> = HashMap::with_capacity(orders.len());
    for order in orders {
        index.entry(order.id.as_str()).or_insert(order);
    }

    let mut by_category: IndexMap<String, GroupAcc> = IndexMap::new();
    let mut by_product: IndexMap<String, GroupAcc> = IndexMap::new();
    let mut by_type: IndexMap<String, GroupAcc> = IndexMap::new();
    let mut by_day: IndexMap<NaiveDate, GroupAcc> = IndexMap::new();

    let mut totals = GrandTotals::default();
    let mut seen_orders: HashSet<&str> = HashSet::new();
    let mut warnings = Vec::new();

    for line in lines {
        let Some(order) = index.get(line.order_id.as_str()).copied() else {
            warnings.push(DataWarning::UnmatchedOrder {
                table: PRODUCTS_ORDERED,
                row: line.row,
                order_id: line.order_id.clone(),
            });
            continue;
        };

        let revenue = line.revenue().unwrap_or_else(BigDecimal::zero);

        let cat = by_category
            .entry(non_blank(&line.category, UNCATEGORIZED))
            .or_default();
        cat.lines += 1;
        cat.revenue = &cat.revenue + &revenue;

        let prod = by_product
            .entry(non_blank(&line.product, UNKNOWN_PRODUCT))
            .or_default();
        prod.lines += 1;
        prod.revenue = &prod.revenue + &revenue;

        let typ = by_type
            .entry(order.order_type.label().to_string())
            .or_default();
        typ.revenue = &typ.revenue + &revenue;
        typ.orders.insert(order.id.as_str());

        if let Some(day) = order.order_date {
            let acc = by_day.entry(day).or_default();
            acc.revenue = &acc.revenue + &revenue;
            acc.orders.insert(order.id.as_str());
        }

        // Grand totals accumulate in this same pass, never recomputed.
        totals.line_items += 1;
        totals.quantity += line.quantity.unwrap_or(0) as u64;
        totals.revenue = &totals.revenue + &revenue;
        if seen_orders.insert(order.id.as_str()) {
            totals.orders += 1;
            if let Some(total) = &order.total {
                totals.order_amount_total = &totals.order_amount_total + total;
            }
        }
    }

    finalize(by_category, by_product, by_type, by_day, totals, warnings)
}

fn non_blank(value: &str, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

fn line_totals(acc: GroupAcc<'_>) -> GroupTotals {
    GroupTotals {
        count: acc.lines,
        revenue: acc.revenue.with_scale(2),
    }
}

fn order_totals(acc: GroupAcc<'_>) -> GroupTotals {
    GroupTotals {
        count: acc.orders.len() as u64,
        revenue: acc.revenue.with_scale(2),
    }
}

fn finalize(
    by_category: IndexMap<String, GroupAcc>,
    by_product: IndexMap<String, GroupAcc>,
    by_type: IndexMap<String, GroupAcc>,
    by_day: IndexMap<NaiveDate, GroupAcc>,
    mut totals: GrandTotals,
    warnings: Vec<DataWarning>,
) -> AggregateReport {
    let mut by_category: IndexMap<String, GroupTotals> = by_category
        .into_iter()
        .map(|(k, acc)| (k, line_totals(acc)))
        .collect();
    by_category.sort_keys();

    // Product table: highest revenue first, name breaks ties.
    let mut by_product: IndexMap<String, GroupTotals> = by_product
        .into_iter()
        .map(|(k, acc)| (k, line_totals(acc)))
        .collect();
    by_product.sort_by(|ka, va, kb, vb| vb.revenue.cmp(&va.revenue).then_with(|| ka.cmp(kb)));

    let mut by_order_type: IndexMap<String, GroupTotals> = by_type
        .into_iter()
        .map(|(k, acc)| (k, order_totals(acc)))
        .collect();
    by_order_type.sort_keys();

    let mut by_day: IndexMap<NaiveDate, DayTotals> = by_day
        .into_iter()
        .map(|(day, acc)| {
            (
                day,
                DayTotals {
                    revenue: acc.revenue.with_scale(2),
                    orders: acc.orders.len() as u64,
                },
            )
        })
        .collect();
    by_day.sort_keys();

    totals.revenue = totals.revenue.with_scale(2);
    totals.order_amount_total = totals.order_amount_total.with_scale(2);
    totals.items_per_order = if totals.orders > 0 {
        (BigDecimal::from(totals.line_items) / BigDecimal::from(totals.orders)).with_scale(2)
    } else {
        BigDecimal::zero().with_scale(2)
    };

    AggregateReport {
        by_category,
        by_order_type,
        by_product,
        by_day,
        totals,
        warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderType;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::from_str(s).unwrap()
    }

    fn order(id: &str, day: &str, order_type: OrderType, total: &str) -> Order {
        Order {
            row: 2,
            id: id.to_string(),
            order_date: Some(date(day)),
            pickup_date: None,
            customer: "Ada L".to_string(),
            order_type,
            total: Some(dec(total)),
        }
    }

    fn line(row: usize, order_id: &str, product: &str, category: &str, qty: i64, price: &str) -> OrderLine {
        OrderLine {
            row,
            order_id: order_id.to_string(),
            product: product.to_string(),
            category: category.to_string(),
            quantity: Some(qty),
            unit_price: Some(dec(price)),
        }
    }

    #[test]
    fn single_line_category_totals() {
        let orders = vec![order("1", "2024-01-05", OrderType::Pickup, "7.00")];
        let lines = vec![line(2, "1", "Sourdough", "bread", 2, "3.50")];
        let report = aggregate(&orders, &lines);

        let bread = &report.by_category["bread"];
        assert_eq!(bread.count, 1);
        assert_eq!(bread.revenue, dec("7.00"));
        assert_eq!(report.totals.revenue, dec("7.00"));
        assert_eq!(report.totals.orders, 1);
        assert_eq!(report.totals.quantity, 2);
        assert_eq!(report.by_day[&date("2024-01-05")].orders, 1);
    }

    #[test]
    fn grand_total_equals_sum_of_line_revenues() {
        let orders = vec![
            order("1", "2024-01-05", OrderType::Pickup, "20.00"),
            order("2", "2024-01-06", OrderType::Delivery, "9.00"),
        ];
        let lines = vec![
            line(2, "1", "Sourdough", "bread", 2, "3.50"),
            line(3, "1", "Carrot Cake", "cake", 1, "12.00"),
            line(4, "2", "Baguette", "bread", 3, "3.00"),
        ];
        let report = aggregate(&orders, &lines);

        assert_eq!(report.totals.revenue, dec("28.00"));
        assert_eq!(report.totals.line_items, 3);
        assert_eq!(report.totals.orders, 2);
        // The stored order totals diverge (tips/discounts) and are summed
        // separately, never reconciled into revenue.
        assert_eq!(report.totals.order_amount_total, dec("29.00"));
        assert_eq!(report.totals.items_per_order, dec("1.50"));
    }

    #[test]
    fn order_type_table_counts_distinct_orders() {
        let orders = vec![
            order("1", "2024-01-05", OrderType::Pickup, "10.00"),
            order("2", "2024-01-05", OrderType::Pickup, "10.00"),
        ];
        let lines = vec![
            line(2, "1", "Rye", "bread", 1, "4.00"),
            line(3, "1", "Baguette", "bread", 1, "3.00"),
            line(4, "2", "Rye", "bread", 1, "4.00"),
        ];
        let report = aggregate(&orders, &lines);
        let pickup = &report.by_order_type["pickup"];
        assert_eq!(pickup.count, 2);
        assert_eq!(pickup.revenue, dec("11.00"));
    }

    #[test]
    fn unmatched_line_is_excluded_and_warned_exactly_once() {
        let orders = vec![order("1", "2024-01-05", OrderType::Pickup, "7.00")];
        let lines = vec![
            line(2, "1", "Rye", "bread", 1, "4.00"),
            line(3, "GHOST", "Rye", "bread", 1, "4.00"),
        ];
        let report = aggregate(&orders, &lines);

        assert_eq!(report.totals.line_items, 1);
        assert_eq!(report.totals.revenue, dec("4.00"));
        let unmatched: Vec<_> = report
            .warnings
            .iter()
            .filter(|w| matches!(w, DataWarning::UnmatchedOrder { order_id, .. } if order_id.as_str() == "GHOST"))
            .collect();
        assert_eq!(unmatched.len(), 1);
        match unmatched[0] {
            DataWarning::UnmatchedOrder { row, .. } => assert_eq!(*row, 3),
            _ => unreachable!(),
        }
    }

    #[test]
    fn aggregation_is_deterministic() {
        let orders = vec![
            order("1", "2024-01-06", OrderType::Delivery, "10.00"),
            order("2", "2024-01-05", OrderType::Pickup, "10.00"),
        ];
        let lines = vec![
            line(2, "2", "Rye", "bread", 1, "4.00"),
            line(3, "1", "Carrot Cake", "cake", 1, "12.00"),
        ];
        let a = aggregate(&orders, &lines);
        let b = aggregate(&orders, &lines);
        assert_eq!(a, b);
        // Day series is chronological regardless of input order.
        let days: Vec<&NaiveDate> = a.by_day.keys().collect();
        assert_eq!(days, vec![&date("2024-01-05"), &date("2024-01-06")]);
    }

    #[test]
    fn line_with_missing_price_counts_but_adds_no_revenue() {
        let orders = vec![order("1", "2024-01-05", OrderType::Pickup, "7.00")];
        let lines = vec![OrderLine {
            row: 2,
            order_id: "1".to_string(),
            product: "Rye".to_string(),
            category: "bread".to_string(),
            quantity: Some(2),
            unit_price: None,
        }];
        let report = aggregate(&orders, &lines);
        assert_eq!(report.totals.line_items, 1);
        assert_eq!(report.totals.revenue, dec("0.00"));
        assert_eq!(report.by_category["bread"].count, 1);
    }

    #[test]
    fn blank_category_and_product_get_stable_labels() {
        let orders = vec![order("1", "2024-01-05", OrderType::Pickup, "7.00")];
        let lines = vec![line(2, "1", "", "", 1, "4.00")];
        let report = aggregate(&orders, &lines);
        assert!(report.by_category.contains_key("uncategorized"));
        assert!(report.by_product.contains_key("unknown"));
    }

    #[test]
    fn product_table_sorted_by_revenue_descending() {
        let orders = vec![order("1", "2024-01-05", OrderType::Pickup, "7.00")];
        let lines = vec![
            line(2, "1", "Rye", "bread", 1, "4.00"),
            line(3, "1", "Wedding Cake", "cake", 1, "250.00"),
        ];
        let report = aggregate(&orders, &lines);
        let products: Vec<&String> = report.by_product.keys().collect();
        assert_eq!(products, vec!["Wedding Cake", "Rye"]);
    }
}
