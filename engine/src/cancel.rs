//! Order cancellation: refund reserved funds or shares, mark the order
//! terminal, and take it off the book.

use crate::books::Books;
use crate::error::EngineError;
use crate::status::OrderStatus;
use chrono::Utc;
use orderbook::{OrderId, Side};
use store::Store;

pub async fn cancel(
    store: &Store,
    books: &Books,
    order_id: OrderId,
    requesting_account_id: &str,
) -> Result<OrderStatus, EngineError> {
    // A read-only peek to learn which symbol's book guards this order,
    // before taking any lock. The authoritative ownership/state checks
    // happen again below under the row lock.
    let symbol = store
        .order_snapshot(order_id)
        .await
        .ok_or(EngineError::OrderNotFound)?
        .symbol;

    let mut book = books.lock(&symbol).await;
    let mut scope = store.begin();

    let (side, qty, account_id) = {
        let row = scope
            .get_order(order_id)
            .await
            .map_err(|_| EngineError::OrderNotFound)?;
        if row.account_id != requesting_account_id {
            return Err(EngineError::PermissionDenied);
        }
        if row.canceled_at.is_some() || row.open_amount.is_zero() {
            return Err(EngineError::OrderNotFound);
        }
        (row.side, row.open_qty_abs(), row.account_id.clone())
    };

    match side {
        Side::Buy => {
            let row = scope
                .get_order(order_id)
                .await
                .map_err(|_| EngineError::OrderNotFound)?;
            let limit_price = row.limit_price;
            let refund = qty * limit_price;
            let account = scope
                .get_account(&account_id)
                .await
                .map_err(|_| EngineError::AccountNotFound)?;
            account.balance += refund;
        }
        Side::Sell => {
            let position = scope.get_or_create_position(&account_id, &symbol).await;
            position.amount += qty;
        }
    }

    let now = Utc::now();
    scope
        .set_canceled(order_id, now)
        .map_err(|_| EngineError::OrderNotFound)?;
    book.remove(side, order_id);

    let final_row = scope
        .get_order(order_id)
        .await
        .map_err(|_| EngineError::OrderNotFound)?
        .clone();
    scope.commit();

    Ok(OrderStatus::from_row(&final_row))
}
