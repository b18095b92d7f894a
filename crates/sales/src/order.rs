use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use siphon_core::{CustomerId, DomainError, OrderDetailId, OrderId, ProductId, round_money};

/// Order failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("illegal status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("order has no line items")]
    EmptyCart,

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Order status lifecycle. Wire values are the Russian strings stored in the
/// database.
///
/// Legal transitions: Paid -> Delivered -> Completed, Paid -> Cancelled,
/// Delivered -> Cancelled. Completed and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Оплачен")]
    Paid,
    #[serde(rename = "Доставлен")]
    Delivered,
    #[serde(rename = "Завершен")]
    Completed,
    #[serde(rename = "Отменен")]
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Paid => "Оплачен",
            OrderStatus::Delivered => "Доставлен",
            OrderStatus::Completed => "Завершен",
            OrderStatus::Cancelled => "Отменен",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Оплачен" | "paid" => Some(OrderStatus::Paid),
            "Доставлен" | "delivered" => Some(OrderStatus::Delivered),
            "Завершен" | "completed" => Some(OrderStatus::Completed),
            "Отменен" | "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        matches!(
            (self, to),
            (OrderStatus::Paid, OrderStatus::Delivered)
                | (OrderStatus::Paid, OrderStatus::Cancelled)
                | (OrderStatus::Delivered, OrderStatus::Completed)
                | (OrderStatus::Delivered, OrderStatus::Cancelled)
        )
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount: Decimal,
}

impl Order {
    /// Move the order to a new status, enforcing lifecycle legality.
    pub fn transition_to(&mut self, to: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(to) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

/// Order line. `price_per_unit` is the product price frozen at order time
/// and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: OrderDetailId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub price_per_unit: Decimal,
}

/// A (product, quantity) pair submitted at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// A line with its price snapshot, ready to become an `OrderDetail` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub price_per_unit: Decimal,
}

/// Order header ready for insertion, paired with its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount: Decimal,
    pub lines: Vec<NewOrderLine>,
}

/// Price line items against current product prices.
///
/// Rejects the whole batch on the first empty cart, non-positive quantity,
/// or unknown product; callers create either all rows or none.
pub fn price_lines(
    items: &[LineItem],
    price_of: impl Fn(ProductId) -> Option<Decimal>,
) -> Result<(Vec<NewOrderLine>, Decimal), OrderError> {
    if items.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let mut lines = Vec::with_capacity(items.len());
    let mut total = Decimal::ZERO;
    for item in items {
        if item.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "quantity must be positive for product {}",
                item.product_id
            ))
            .into());
        }
        let price = price_of(item.product_id).ok_or_else(|| {
            DomainError::bad_reference(format!("product {} does not exist", item.product_id))
        })?;
        let line_total = price * Decimal::from(item.quantity);
        total += line_total;
        lines.push(NewOrderLine {
            product_id: item.product_id,
            quantity: item.quantity,
            price_per_unit: price,
        });
    }

    Ok((lines, round_money(total)))
}

impl NewOrder {
    /// Assemble a checkout order: status starts at Paid, total computed from
    /// the priced lines.
    pub fn checkout(
        customer_id: CustomerId,
        items: &[LineItem],
        price_of: impl Fn(ProductId) -> Option<Decimal>,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        let (lines, total_amount) = price_lines(items, price_of)?;
        Ok(Self {
            customer_id,
            order_date: now,
            status: OrderStatus::Paid,
            total_amount,
            lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use super::*;

    fn catalog(id: ProductId) -> Option<Decimal> {
        match id.as_i64() {
            1 => Some(dec!(10.00)),
            2 => Some(dec!(5.00)),
            _ => None,
        }
    }

    #[test]
    fn checkout_totals_and_snapshots_prices() {
        let items = [
            LineItem { product_id: ProductId::new(1), quantity: 2 },
            LineItem { product_id: ProductId::new(2), quantity: 1 },
        ];
        let order =
            NewOrder::checkout(CustomerId::new(9), &items, catalog, Utc::now()).unwrap();

        assert_eq!(order.total_amount, dec!(25.00));
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].price_per_unit, dec!(10.00));
        assert_eq!(order.lines[1].price_per_unit, dec!(5.00));
    }

    #[test]
    fn empty_cart_is_rejected() {
        let err = NewOrder::checkout(CustomerId::new(9), &[], catalog, Utc::now()).unwrap_err();
        assert_eq!(err, OrderError::EmptyCart);
    }

    #[test]
    fn zero_quantity_rejects_the_whole_batch() {
        let items = [
            LineItem { product_id: ProductId::new(1), quantity: 2 },
            LineItem { product_id: ProductId::new(2), quantity: 0 },
        ];
        let err = price_lines(&items, catalog).unwrap_err();
        assert!(matches!(err, OrderError::Domain(DomainError::Validation(_))));
    }

    #[test]
    fn unknown_product_rejects_the_whole_batch() {
        let items = [
            LineItem { product_id: ProductId::new(1), quantity: 1 },
            LineItem { product_id: ProductId::new(77), quantity: 1 },
        ];
        let err = price_lines(&items, catalog).unwrap_err();
        assert!(matches!(err, OrderError::Domain(DomainError::BadReference(_))));
    }

    #[test]
    fn legal_lifecycle_runs_through() {
        let mut order = Order {
            id: OrderId::new(1),
            customer_id: CustomerId::new(9),
            order_date: Utc::now(),
            status: OrderStatus::Paid,
            total_amount: dec!(25.00),
        };
        order.transition_to(OrderStatus::Delivered).unwrap();
        order.transition_to(OrderStatus::Completed).unwrap();
        assert!(order.status.is_terminal());
    }

    #[test]
    fn terminal_statuses_refuse_all_transitions() {
        for terminal in [OrderStatus::Completed, OrderStatus::Cancelled] {
            for to in [
                OrderStatus::Paid,
                OrderStatus::Delivered,
                OrderStatus::Completed,
                OrderStatus::Cancelled,
            ] {
                let mut order = Order {
                    id: OrderId::new(1),
                    customer_id: CustomerId::new(9),
                    order_date: Utc::now(),
                    status: terminal,
                    total_amount: dec!(1.00),
                };
                let err = order.transition_to(to).unwrap_err();
                assert!(matches!(err, OrderError::InvalidTransition { .. }));
            }
        }
    }

    #[test]
    fn delivered_may_still_cancel() {
        let mut order = Order {
            id: OrderId::new(1),
            customer_id: CustomerId::new(9),
            order_date: Utc::now(),
            status: OrderStatus::Delivered,
            total_amount: dec!(25.00),
        };
        order.transition_to(OrderStatus::Cancelled).unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[test]
    fn statuses_parse_from_both_spellings() {
        assert_eq!(OrderStatus::parse("Оплачен"), Some(OrderStatus::Paid));
        assert_eq!(OrderStatus::parse("cancelled"), Some(OrderStatus::Cancelled));
        assert_eq!(OrderStatus::parse("shipped"), None);
    }

    proptest! {
        // Total always equals the sum over lines of quantity x unit price.
        #[test]
        fn total_is_sum_of_line_totals(
            quantities in proptest::collection::vec(1i64..50, 1..8),
            prices in proptest::collection::vec(1u32..100_000u32, 8),
        ) {
            let items: Vec<LineItem> = quantities
                .iter()
                .enumerate()
                .map(|(i, &q)| LineItem { product_id: ProductId::new(i as i64), quantity: q })
                .collect();

            let price_of = |id: ProductId| {
                prices
                    .get(id.as_i64() as usize)
                    .map(|&cents| Decimal::new(cents as i64, 2))
            };

            let (lines, total) = price_lines(&items, price_of).unwrap();
            let expected: Decimal = lines
                .iter()
                .map(|l| l.price_per_unit * Decimal::from(l.quantity))
                .sum();
            prop_assert_eq!(total, round_money(expected));
        }
    }
}
