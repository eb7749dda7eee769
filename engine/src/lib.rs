//! Matching, cancellation, and query business logic: the only crate
//! that mutates both money and shares, always under the owning
//! symbol's exclusive lock.

pub mod books;
pub mod cancel;
pub mod error;
pub mod matching;
pub mod query;
pub mod rebuild;
pub mod status;

pub use books::Books;
pub use error::EngineError;
pub use status::{ExecutionPart, OrderStatus};

use orderbook::OrderId;
use std::sync::Arc;
use store::Store;

/// Ties a `Store` to the per-symbol order books that cache it, and
/// exposes the three operations the protocol layer drives.
pub struct Engine {
    store: Arc<Store>,
    books: Books,
}

impl Engine {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            books: Books::new(),
        }
    }

    /// Repopulates the order books from the store's resting orders.
    /// Call once at startup before serving any connections.
    pub async fn rebuild(&self) {
        rebuild::rebuild(&self.store, &self.books).await;
    }

    pub async fn place_order(
        &self,
        account_id: &str,
        symbol: &str,
        amount: rust_decimal::Decimal,
        limit_price: rust_decimal::Decimal,
    ) -> Result<OrderId, EngineError> {
        matching::place_order(&self.store, &self.books, account_id, symbol, amount, limit_price).await
    }

    pub async fn cancel(
        &self,
        order_id: OrderId,
        requesting_account_id: &str,
    ) -> Result<OrderStatus, EngineError> {
        cancel::cancel(&self.store, &self.books, order_id, requesting_account_id).await
    }

    pub async fn status(
        &self,
        order_id: OrderId,
        requesting_account_id: &str,
    ) -> Result<OrderStatus, EngineError> {
        query::status(&self.store, order_id, requesting_account_id).await
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}
