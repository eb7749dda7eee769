use rust_decimal::Decimal;

/// Which side of a symbol's book an order rests on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side a new order of this side matches against.
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Store-assigned, monotonically increasing order id. Doubles as the
/// time-priority tiebreak: a smaller id was always created earlier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrderId(pub u64);

/// A resting order as the book sees it: enough to rank it and to hand
/// back to the matching engine for settlement. The full accounting
/// record (original amount, account, canceled_at, ...) lives in `store`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BookOrder {
    pub id: OrderId,
    pub account_id: String,
    pub limit_price: Decimal,
    pub open_qty: Decimal,
}
