//! Startup recovery: the order books are a cache, not a source of
//! truth, so they are repopulated from the store's resting orders
//! every time the process starts.

use crate::books::Books;
use orderbook::BookOrder;
use store::Store;
use tracing::info;

pub async fn rebuild(store: &Store, books: &Books) {
    let mut open_orders = store.list_open_orders().await;
    // `list_open_orders` walks a `DashMap` in no particular order; sort by
    // id (monotonic = arrival order) so same-price orders re-enter each
    // book in their original time-priority order.
    open_orders.sort_by_key(|row| row.id);
    info!(count = open_orders.len(), "rebuilding order books from store");

    for row in open_orders {
        let mut book = books.lock(&row.symbol).await;
        book.insert(
            row.side,
            BookOrder {
                id: row.id,
                account_id: row.account_id.clone(),
                limit_price: row.limit_price,
                open_qty: row.open_qty_abs(),
            },
        );
    }
}
