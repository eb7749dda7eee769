//! The composite status report shared by cancel and query: the open
//! remainder (if any), every execution so far, and the canceled
//! remainder (if the order was canceled).

use chrono::{DateTime, Utc};
use orderbook::OrderId;
use rust_decimal::Decimal;
use store::OrderRow;

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionPart {
    pub shares: Decimal,
    pub price: Decimal,
    pub executed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderStatus {
    pub order_id: OrderId,
    pub open_shares: Option<Decimal>,
    pub executions: Vec<ExecutionPart>,
    pub canceled: Option<(Decimal, DateTime<Utc>)>,
}

impl OrderStatus {
    pub fn from_row(row: &OrderRow) -> Self {
        let open_shares = row.is_resting().then(|| row.open_qty_abs());
        let executions = row
            .executions
            .iter()
            .map(|e| ExecutionPart {
                shares: e.shares,
                price: e.price,
                executed_at: e.executed_at,
            })
            .collect();
        // Open Question 4: canceled shares are derived from the current
        // snapshot, never from relationship traversal, so there is no
        // risk of double-counting fills recorded before the cancel.
        let canceled = row
            .canceled_at
            .map(|at| (row.original_amount.abs() - row.executed_shares(), at));
        Self {
            order_id: row.id,
            open_shares,
            executions,
            canceled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orderbook::Side;
    use rust_decimal_macros::dec;
    use store::Execution;

    fn base_row() -> OrderRow {
        OrderRow {
            id: OrderId(1),
            account_id: "1".to_string(),
            symbol: "AMZN".to_string(),
            side: Side::Buy,
            original_amount: dec!(100),
            limit_price: dec!(10),
            created_at: Utc::now(),
            open_amount: dec!(40),
            canceled_at: None,
            executions: vec![Execution {
                id: 1,
                order_id: OrderId(1),
                shares: dec!(60),
                price: dec!(10),
                executed_at: Utc::now(),
            }],
        }
    }

    #[test]
    fn partially_filled_order_reports_open_and_executed() {
        let row = base_row();
        let status = OrderStatus::from_row(&row);
        assert_eq!(status.open_shares, Some(dec!(40)));
        assert_eq!(status.executions.len(), 1);
        assert!(status.canceled.is_none());
    }

    #[test]
    fn canceled_order_reports_residual_from_snapshot_not_open_amount() {
        let mut row = base_row();
        row.open_amount = Decimal::ZERO;
        row.canceled_at = Some(Utc::now());
        let status = OrderStatus::from_row(&row);
        assert!(status.open_shares.is_none());
        let (shares, _) = status.canceled.unwrap();
        assert_eq!(shares, dec!(40));
    }
}
