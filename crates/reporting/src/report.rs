use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use siphon_core::{ProductId, ReportId, round_money};
use siphon_inventory::{StockOperation, StockOperationType};
use siphon_sales::{Order, OrderStatus};

/// Stored financial report snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialReport {
    pub id: ReportId,
    pub report_date: NaiveDate,
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub profit: Decimal,
}

/// Snapshot ready for insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFinancialReport {
    pub report_date: NaiveDate,
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub profit: Decimal,
}

impl NewFinancialReport {
    pub fn into_record(self, id: ReportId) -> FinancialReport {
        FinancialReport {
            id,
            report_date: self.report_date,
            total_revenue: self.total_revenue,
            total_expenses: self.total_expenses,
            profit: self.profit,
        }
    }
}

/// Compute a snapshot up to and including `report_date`.
///
/// Revenue: totals of all non-cancelled orders. Expenses: inbound stock
/// operations valued at the product's current price (the audit trail does not
/// record purchase cost). Products that have since been deleted contribute
/// nothing to expenses.
pub fn snapshot(
    report_date: NaiveDate,
    orders: &[Order],
    operations: &[StockOperation],
    price_of: impl Fn(ProductId) -> Option<Decimal>,
) -> NewFinancialReport {
    let total_revenue: Decimal = orders
        .iter()
        .filter(|o| o.status != OrderStatus::Cancelled)
        .filter(|o| o.order_date.date_naive() <= report_date)
        .map(|o| o.total_amount)
        .sum();

    let total_expenses: Decimal = operations
        .iter()
        .filter(|op| op.operation_type == StockOperationType::Inbound)
        .filter(|op| op.operation_date.date_naive() <= report_date)
        .filter_map(|op| price_of(op.product_id).map(|p| p * Decimal::from(op.quantity)))
        .sum();

    let total_revenue = round_money(total_revenue);
    let total_expenses = round_money(total_expenses);
    NewFinancialReport {
        report_date,
        total_revenue,
        total_expenses,
        profit: total_revenue - total_expenses,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use siphon_core::{CustomerId, EmployeeId, OrderId, StockOperationId};

    use super::*;

    fn order(id: i64, day: u32, status: OrderStatus, total: Decimal) -> Order {
        Order {
            id: OrderId::new(id),
            customer_id: CustomerId::new(1),
            order_date: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
            status,
            total_amount: total,
        }
    }

    fn inbound(id: i64, product: i64, qty: i64, day: u32) -> StockOperation {
        StockOperation {
            id: StockOperationId::new(id),
            product_id: ProductId::new(product),
            operation_type: StockOperationType::Inbound,
            quantity: qty,
            operation_date: Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap(),
            employee_id: EmployeeId::new(1),
        }
    }

    #[test]
    fn cancelled_and_future_orders_are_excluded() {
        let orders = [
            order(1, 1, OrderStatus::Completed, dec!(100.00)),
            order(2, 2, OrderStatus::Cancelled, dec!(40.00)),
            order(3, 20, OrderStatus::Paid, dec!(60.00)),
        ];
        let report = snapshot(
            NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            &orders,
            &[],
            |_| None,
        );
        assert_eq!(report.total_revenue, dec!(100.00));
        assert_eq!(report.profit, dec!(100.00));
    }

    #[test]
    fn expenses_value_inbound_operations_at_product_price() {
        let ops = [inbound(1, 7, 10, 2), inbound(2, 8, 3, 3)];
        let report = snapshot(
            NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
            &[],
            &ops,
            |id| (id.as_i64() == 7).then(|| dec!(2.50)),
        );
        // Product 8 was deleted since; only product 7 counts.
        assert_eq!(report.total_expenses, dec!(25.00));
        assert_eq!(report.profit, dec!(-25.00));
    }
}
