//! Per-symbol order book lookup, doubling as the per-symbol exclusive
//! lock that serializes matching for that symbol.

use dashmap::DashMap;
use orderbook::OrderBook;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Default)]
pub struct Books {
    by_symbol: DashMap<String, Arc<Mutex<OrderBook>>>,
}

impl Books {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the per-symbol lock, creating an empty book the first
    /// time this symbol is seen. Holding the returned guard *is* holding
    /// the per-symbol lock; the matching algorithm runs entirely while
    /// one is held.
    pub async fn lock(&self, symbol: &str) -> OwnedMutexGuard<OrderBook> {
        let arc = self
            .by_symbol
            .entry(symbol.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(OrderBook::new())))
            .clone();
        arc.lock_owned().await
    }
}
