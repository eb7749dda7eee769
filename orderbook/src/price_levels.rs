use crate::types::{BookOrder, OrderId, Side};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::collections::VecDeque;

/// One side of a symbol's book: price levels keyed by limit price, each
/// holding a FIFO queue of resting orders. `side` decides which end of
/// the map is best:
/// - Sell (asks): lowest price is best, the front of the map.
/// - Buy (bids): highest price is best, the back of the map.
pub struct PriceLevels {
    side: Side,
    levels: BTreeMap<Decimal, VecDeque<BookOrder>>,
}

impl PriceLevels {
    /// Creates an empty set of price levels for the given side.
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// Adds a resting order at its price level, keeping FIFO order.
    pub fn insert(&mut self, order: BookOrder) {
        self.levels.entry(order.limit_price).or_default().push_back(order);
    }

    /// Returns the best price for this side, or `None` if empty.
    pub fn best_price(&self) -> Option<Decimal> {
        match self.side {
            Side::Sell => self.levels.keys().next().copied(),
            Side::Buy => self.levels.keys().next_back().copied(),
        }
    }

    /// Returns the earliest (time-priority) order at the best price,
    /// without removing it.
    pub fn peek_best(&self) -> Option<&BookOrder> {
        let px = self.best_price()?;
        self.levels.get(&px)?.front()
    }

    /// Applies a fill of `qty` against the earliest order at the best
    /// price level. Returns the matched order as it was *before* the
    /// fill, and whether the fill exhausted it (in which case it was
    /// removed from the book). `qty` must not exceed the matched
    /// order's open quantity.
    pub fn fill_best(&mut self, qty: Decimal) -> Option<(BookOrder, bool)> {
        let px = self.best_price()?;
        let queue = self.levels.get_mut(&px)?;
        let front = queue.front_mut()?;
        let before = front.clone();
        front.open_qty -= qty;
        let exhausted = front.open_qty.is_zero();
        if exhausted {
            queue.pop_front();
            if queue.is_empty() {
                self.levels.remove(&px);
            }
        }
        Some((before, exhausted))
    }

    /// Removes a specific order by id, wherever it rests. Used for
    /// explicit cancellation. Returns the removed order, if found.
    pub fn remove(&mut self, id: OrderId) -> Option<BookOrder> {
        let mut empty_price = None;
        let mut removed = None;
        for (&price, queue) in self.levels.iter_mut() {
            if let Some(pos) = queue.iter().position(|o| o.id == id) {
                removed = queue.remove(pos);
                if queue.is_empty() {
                    empty_price = Some(price);
                }
                break;
            }
        }
        if let Some(price) = empty_price {
            self.levels.remove(&price);
        }
        removed
    }

    /// Total number of open orders resting on this side.
    pub fn total_len(&self) -> usize {
        self.levels.values().map(VecDeque::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order(id: u64, account: &str, price: Decimal, qty: Decimal) -> BookOrder {
        BookOrder {
            id: OrderId(id),
            account_id: account.to_string(),
            limit_price: price,
            open_qty: qty,
        }
    }

    #[test]
    fn new_is_empty() {
        let bids = PriceLevels::new(Side::Buy);
        assert_eq!(bids.best_price(), None);
        assert_eq!(bids.total_len(), 0);
    }

    #[test]
    fn push_keeps_fifo_within_a_level() {
        let mut bids = PriceLevels::new(Side::Buy);
        bids.insert(order(1, "1", dec!(101.00), dec!(10)));
        bids.insert(order(2, "1", dec!(101.00), dec!(20)));
        bids.insert(order(3, "1", dec!(101.00), dec!(30)));

        let first = bids.peek_best().unwrap();
        assert_eq!(first.id, OrderId(1));
    }

    #[test]
    fn best_price_picks_highest_for_buy_lowest_for_sell() {
        let mut bids = PriceLevels::new(Side::Buy);
        bids.insert(order(1, "1", dec!(100), dec!(10)));
        bids.insert(order(2, "1", dec!(102), dec!(10)));
        assert_eq!(bids.best_price(), Some(dec!(102)));

        let mut asks = PriceLevels::new(Side::Sell);
        asks.insert(order(1, "1", dec!(105), dec!(10)));
        asks.insert(order(2, "1", dec!(103), dec!(10)));
        assert_eq!(asks.best_price(), Some(dec!(103)));
    }

    #[test]
    fn fill_best_partial_leaves_remainder_at_front() {
        let mut asks = PriceLevels::new(Side::Sell);
        asks.insert(order(1, "1", dec!(100), dec!(50)));
        asks.insert(order(2, "1", dec!(100), dec!(40)));

        let (filled, exhausted) = asks.fill_best(dec!(30)).unwrap();
        assert_eq!(filled.id, OrderId(1));
        assert!(!exhausted);
        assert_eq!(asks.peek_best().unwrap().id, OrderId(1));
        assert_eq!(asks.peek_best().unwrap().open_qty, dec!(20));
    }

    #[test]
    fn fill_best_full_advances_to_next_order() {
        let mut asks = PriceLevels::new(Side::Sell);
        asks.insert(order(1, "1", dec!(100), dec!(50)));
        asks.insert(order(2, "1", dec!(100), dec!(40)));

        let (filled, exhausted) = asks.fill_best(dec!(50)).unwrap();
        assert_eq!(filled.id, OrderId(1));
        assert!(exhausted);
        assert_eq!(asks.peek_best().unwrap().id, OrderId(2));
    }

    #[test]
    fn remove_cleans_up_empty_level() {
        let mut bids = PriceLevels::new(Side::Buy);
        bids.insert(order(1, "1", dec!(100), dec!(10)));
        bids.insert(order(2, "1", dec!(100), dec!(20)));
        bids.insert(order(3, "1", dec!(95), dec!(30)));

        assert!(bids.remove(OrderId(2)).is_some());
        assert_eq!(bids.peek_best().unwrap().id, OrderId(1));

        assert!(bids.remove(OrderId(1)).is_some());
        assert_eq!(bids.best_price(), Some(dec!(95)));

        assert!(bids.remove(OrderId(99)).is_none());
    }
}
