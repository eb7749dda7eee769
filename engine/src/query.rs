//! Order status lookup: read-only, no per-symbol lock needed since it
//! never touches the book.

use crate::error::EngineError;
use crate::status::OrderStatus;
use orderbook::OrderId;
use store::Store;

pub async fn status(
    store: &Store,
    order_id: OrderId,
    requesting_account_id: &str,
) -> Result<OrderStatus, EngineError> {
    let row = store
        .order_snapshot(order_id)
        .await
        .ok_or(EngineError::OrderNotFound)?;
    if row.account_id != requesting_account_id {
        return Err(EngineError::PermissionDenied);
    }
    Ok(OrderStatus::from_row(&row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::books::Books;
    use crate::matching::place_order;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn query_by_non_owner_is_rejected() {
        let store = Store::new();
        let books = Books::new();
        store.create_account("1", dec!(200_000)).unwrap();
        store.create_account("2", dec!(0)).unwrap();

        let order_id = place_order(&store, &books, "1", "GOOG", dec!(100), dec!(123))
            .await
            .unwrap();

        let err = status(&store, order_id, "2").await.unwrap_err();
        assert_eq!(err, EngineError::PermissionDenied);
    }

    #[tokio::test]
    async fn query_unknown_order_not_found() {
        let store = Store::new();
        let err = status(&store, OrderId(9999), "1").await.unwrap_err();
        assert_eq!(err, EngineError::OrderNotFound);
    }
}
