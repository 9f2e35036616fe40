use bigdecimal::BigDecimal;
use chrono::NaiveDate;

/// One customer purchase transaction from the "Customer Orders" table.
/// Immutable once normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Spreadsheet row number (header is row 1).
    pub row: usize,
    /// Trimmed, upper-cased identifier; lines reference orders through it.
    pub id: String,
    pub order_date: Option<NaiveDate>,
    pub pickup_date: Option<NaiveDate>,
    pub customer: String,
    pub order_type: OrderType,
    /// The sheet's own total for the order. May legitimately diverge from
    /// the sum of line revenues (tips, discounts); reported separately and
    /// never mixed into revenue aggregates.
    pub total: Option<BigDecimal>,
}

/// One product line item from the "Bakery Products Ordered" table.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderLine {
    /// Spreadsheet row number (header is row 1).
    pub row: usize,
    pub order_id: String,
    pub product: String,
    pub category: String,
    pub quantity: Option<i64>,
    pub unit_price: Option<BigDecimal>,
}

impl OrderLine {
    /// Line revenue = quantity x unit price. Missing on either side means
    /// the line contributes to counts but not to revenue sums.
    pub fn revenue(&self) -> Option<BigDecimal> {
        match (self.quantity, &self.unit_price) {
            (Some(qty), Some(price)) => Some(BigDecimal::from(qty) * price),
            _ => None,
        }
    }
}

/// How an order is fulfilled. The sheet stores free text; anything that is
/// not recognizably pickup or delivery is kept verbatim (lower-cased) so it
/// still forms a stable group key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderType {
    Pickup,
    Delivery,
    Other(String),
    Unknown,
}

impl OrderType {
    pub fn from_cell(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            OrderType::Unknown
        } else if raw.eq_ignore_ascii_case("pickup") {
            OrderType::Pickup
        } else if raw.eq_ignore_ascii_case("delivery") {
            OrderType::Delivery
        } else {
            OrderType::Other(raw.to_ascii_lowercase())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            OrderType::Pickup => "pickup",
            OrderType::Delivery => "delivery",
            OrderType::Other(s) => s,
            OrderType::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn order_type_from_cell_recognizes_known_values() {
        assert_eq!(OrderType::from_cell(" Pickup "), OrderType::Pickup);
        assert_eq!(OrderType::from_cell("DELIVERY"), OrderType::Delivery);
        assert_eq!(OrderType::from_cell(""), OrderType::Unknown);
        assert_eq!(
            OrderType::from_cell("Shipping"),
            OrderType::Other("shipping".to_string())
        );
    }

    #[test]
    fn line_revenue_needs_both_quantity_and_price() {
        let mut line = OrderLine {
            row: 2,
            order_id: "A1".to_string(),
            product: "Sourdough".to_string(),
            category: "bread".to_string(),
            quantity: Some(2),
            unit_price: Some(BigDecimal::from_str("3.50").unwrap()),
        };
        assert_eq!(line.revenue(), Some(BigDecimal::from_str("7.00").unwrap()));

        line.unit_price = None;
        assert_eq!(line.revenue(), None);
    }
}
