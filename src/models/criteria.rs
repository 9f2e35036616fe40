use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// User-supplied constraints narrowing which orders and lines are
/// aggregated. All bounds are inclusive; an absent bound leaves that side
/// unconstrained. Shared verbatim by the HTTP API, the batch binary and the
/// tests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub order_date_start: Option<NaiveDate>,
    pub order_date_end: Option<NaiveDate>,
    pub pickup_date_start: Option<NaiveDate>,
    pub pickup_date_end: Option<NaiveDate>,
    /// Discrete pickup dates; an order matches when its pickup date equals
    /// any of them. Combines with the pickup-date range by intersection.
    pub pickup_dates: Option<BTreeSet<NaiveDate>>,
    /// Order-type labels, matched case-insensitively against
    /// pickup/delivery/unknown or the sheet's own free-text labels.
    pub order_types: Option<BTreeSet<String>>,
    /// Product names, matched case-insensitively at the line level.
    pub products: Option<BTreeSet<String>>,
}

impl FilterCriteria {
    pub fn is_unconstrained(&self) -> bool {
        self.order_date_start.is_none()
            && self.order_date_end.is_none()
            && self.pickup_date_start.is_none()
            && self.pickup_date_end.is_none()
            && self.pickup_dates.is_none()
            && self.order_types.is_none()
            && self.products.is_none()
    }
}
