//! Per-symbol in-memory index over open orders, split by side.
//!
//! This is a cache, not the source of truth: `store` holds the
//! authoritative order rows, and this crate only exists to answer
//! "what's the best price, and who's first in line there" quickly.
//! It is rebuilt from `store` on startup (see `engine::rebuild`).

pub mod types;
pub use types::{BookOrder, OrderId, Side};
pub mod price_levels;
pub use price_levels::PriceLevels;

use rust_decimal::Decimal;

/// One symbol's open-order index: a buy side and a sell side.
pub struct OrderBook {
    bids: PriceLevels,
    asks: PriceLevels,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBook {
    /// Creates an empty book.
    pub fn new() -> Self {
        Self {
            bids: PriceLevels::new(Side::Buy),
            asks: PriceLevels::new(Side::Sell),
        }
    }

    fn levels(&self, side: Side) -> &PriceLevels {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    fn levels_mut(&mut self, side: Side) -> &mut PriceLevels {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    /// Rests an order on the given side.
    pub fn insert(&mut self, side: Side, order: BookOrder) {
        self.levels_mut(side).insert(order);
    }

    /// The earliest order at the best price on `side`, if any.
    pub fn peek_best(&self, side: Side) -> Option<&BookOrder> {
        self.levels(side).peek_best()
    }

    /// Removes a specific order from `side` by id (cancellation).
    pub fn remove(&mut self, side: Side, id: OrderId) -> Option<BookOrder> {
        self.levels_mut(side).remove(id)
    }

    /// Applies a fill of `qty` to the earliest order at the best price
    /// on `side`, removing it from the book if the fill exhausts it.
    /// Returns the matched order as it stood just before the fill.
    pub fn fill_best(&mut self, side: Side, qty: Decimal) -> Option<(BookOrder, bool)> {
        self.levels_mut(side).fill_best(qty)
    }

    /// Best bid price, or `None` if the buy side is empty.
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.best_price()
    }

    /// Best ask price, or `None` if the sell side is empty.
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.best_price()
    }

    /// Number of resting orders on each side, `(bids, asks)`.
    pub fn depth(&self) -> (usize, usize) {
        (self.bids.total_len(), self.asks.total_len())
    }
}

#[cfg(test)]
mod ob_tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order(id: u64, price: Decimal, qty: Decimal) -> BookOrder {
        BookOrder {
            id: OrderId(id),
            account_id: "1".to_string(),
            limit_price: price,
            open_qty: qty,
        }
    }

    /// Verifies price-time priority across two resting asks at the same price.
    #[test]
    fn crossing_and_partials() {
        let mut ob = OrderBook::new();

        ob.insert(Side::Sell, order(1, dec!(100), dec!(50)));
        ob.insert(Side::Sell, order(2, dec!(100), dec!(40)));

        // A 70-share bid at 100 fills all of order 1, then 20 of order 2.
        let (filled1, exhausted1) = ob.fill_best(Side::Sell, dec!(50)).unwrap();
        assert_eq!(filled1.id, OrderId(1));
        assert!(exhausted1);

        let (filled2, exhausted2) = ob.fill_best(Side::Sell, dec!(20)).unwrap();
        assert_eq!(filled2.id, OrderId(2));
        assert!(!exhausted2);

        assert_eq!(ob.best_ask(), Some(dec!(100)));
        assert_eq!(ob.depth(), (0, 1));
    }

    /// Non-crossing orders simply rest on their own side.
    #[test]
    fn non_crossing_rests() {
        let mut ob = OrderBook::new();

        ob.insert(Side::Sell, order(1, dec!(105), dec!(10)));
        ob.insert(Side::Buy, order(2, dec!(104), dec!(10)));

        assert_eq!(ob.best_bid(), Some(dec!(104)));
        assert_eq!(ob.best_ask(), Some(dec!(105)));
    }

    #[test]
    fn remove_takes_an_order_off_the_book() {
        let mut ob = OrderBook::new();
        ob.insert(Side::Buy, order(1, dec!(100), dec!(10)));
        assert!(ob.remove(Side::Buy, OrderId(1)).is_some());
        assert_eq!(ob.best_bid(), None);
    }
}
