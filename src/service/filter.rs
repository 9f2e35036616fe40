use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;

use crate::models::{FilterCriteria, Order, OrderLine};

/// Apply the criteria, returning new filtered vectors. The inputs are never
/// mutated and an empty result is a valid output.
///
/// Filtering is transitive: an order is kept iff its dates and order type
/// satisfy the criteria; a kept order's lines are then kept unless the product filter
/// excludes them (product filtering is line-level, so per-order and
/// per-category totals can diverge after filtering). Lines whose order id
/// does not exist in the source set at all are passed through so the
/// aggregator can record the referential warning.
pub fn apply(
    orders: &[Order],
    lines: &[OrderLine],
    criteria: &FilterCriteria,
) -> (Vec<Order>, Vec<OrderLine>) {
    let order_types = criteria.order_types.as_ref().map(lowered);

    let kept_orders: Vec<Order> = orders
        .iter()
        .filter(|o| {
            in_range(o.order_date, criteria.order_date_start, criteria.order_date_end)
                && in_range(o.pickup_date, criteria.pickup_date_start, criteria.pickup_date_end)
                && on_pickup_date(o.pickup_date, criteria.pickup_dates.as_ref())
                && type_matches(&order_types, o)
        })
        .cloned()
        .collect();

    let all_ids: HashSet<&str> = orders.iter().map(|o| o.id.as_str()).collect();
    let kept_ids: HashSet<&str> = kept_orders.iter().map(|o| o.id.as_str()).collect();
    let products = criteria.products.as_ref().map(lowered);

    let kept_lines: Vec<OrderLine> = lines
        .iter()
        .filter(|line| {
            let order_ok = kept_ids.contains(line.order_id.as_str())
                || !all_ids.contains(line.order_id.as_str());
            order_ok && product_matches(&products, &line.product)
        })
        .cloned()
        .collect();

    (kept_orders, kept_lines)
}

/// Inclusive range check. A missing date fails any constrained range.
fn in_range(date: Option<NaiveDate>, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    if start.is_none() && end.is_none() {
        return true;
    }
    let Some(date) = date else {
        return false;
    };
    start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e)
}

/// Discrete pickup-date membership. A missing pickup date fails a
/// constrained filter, like the range check.
fn on_pickup_date(date: Option<NaiveDate>, wanted: Option<&BTreeSet<NaiveDate>>) -> bool {
    match wanted {
        None => true,
        Some(set) => date.map_or(false, |d| set.contains(&d)),
    }
}

fn type_matches(types: &Option<BTreeSet<String>>, order: &Order) -> bool {
    match types {
        None => true,
        // Labels are lower-cased at normalization, so membership on the
        // lowered filter set is case-insensitive.
        Some(set) => set.contains(order.order_type.label()),
    }
}

fn lowered(products: &BTreeSet<String>) -> BTreeSet<String> {
    products.iter().map(|p| p.trim().to_lowercase()).collect()
}

fn product_matches(products: &Option<BTreeSet<String>>, product: &str) -> bool {
    match products {
        None => true,
        Some(set) => set.contains(&product.trim().to_lowercase()),
    }
}
