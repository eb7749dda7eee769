//! Row types for the entities of the data model: accounts, positions,
//! orders, and executions.

use chrono::{DateTime, Utc};
use orderbook::{OrderId, Side};
use rust_decimal::Decimal;

pub type AccountId = String;
pub type SymbolName = String;

/// A funded participant. Created once; `id` is immutable thereafter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub balance: Decimal,
}

/// Per-account inventory of one symbol. Never negative.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub account_id: AccountId,
    pub symbol: SymbolName,
    pub amount: Decimal,
}

/// The authoritative order record. `original_amount` and `open_amount`
/// are signed with the sign of `side` (positive for buys, negative for
/// sells) — Open Question 2 in the spec resolved in favor of a single
/// signed convention throughout, rather than switching sign by call
/// site.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderRow {
    pub id: OrderId,
    pub account_id: AccountId,
    pub symbol: SymbolName,
    pub side: Side,
    pub original_amount: Decimal,
    pub limit_price: Decimal,
    pub created_at: DateTime<Utc>,
    pub open_amount: Decimal,
    pub canceled_at: Option<DateTime<Utc>>,
    /// Fills against this order, in the order they occurred. Kept on the
    /// row itself rather than in a separate table: every mutation that
    /// appends one also adjusts `open_amount` under the same row lock,
    /// so there is never a reason to lock the two separately.
    pub executions: Vec<Execution>,
}

impl OrderRow {
    /// Unsigned remaining quantity, the form the wire protocol and the
    /// order book index both want.
    pub fn open_qty_abs(&self) -> Decimal {
        self.open_amount.abs()
    }

    /// True iff this order currently belongs in the book: open and not canceled.
    pub fn is_resting(&self) -> bool {
        !self.open_amount.is_zero() && self.canceled_at.is_none()
    }

    /// Shares actually executed, regardless of side sign.
    pub fn executed_shares(&self) -> Decimal {
        self.executions.iter().map(|e| e.shares).sum()
    }
}

/// An immutable fill record. Append-only: never mutated after insertion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Execution {
    pub id: u64,
    pub order_id: OrderId,
    pub shares: Decimal,
    pub price: Decimal,
    pub executed_at: DateTime<Utc>,
}
