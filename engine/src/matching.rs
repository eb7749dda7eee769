//! Order placement: validate and reserve, match against the opposite
//! book under price-time priority, rest any remainder.

use crate::books::Books;
use crate::error::EngineError;
use chrono::Utc;
use orderbook::{BookOrder, OrderId, Side};
use rust_decimal::Decimal;
use store::Store;

/// Places a new order. `amount` is signed: positive is a buy, negative
/// a sell; its magnitude is the share count.
pub async fn place_order(
    store: &Store,
    books: &Books,
    account_id: &str,
    symbol: &str,
    amount: Decimal,
    limit_price: Decimal,
) -> Result<OrderId, EngineError> {
    if amount.is_zero() {
        return Err(EngineError::InvalidAmount);
    }
    let side = if amount > Decimal::ZERO { Side::Buy } else { Side::Sell };
    let qty = amount.abs();

    // Per-symbol lock first, then Store row locks, per the canonical
    // lock order: this book guard is held for the whole algorithm.
    let mut book = books.lock(symbol).await;
    let mut scope = store.begin();

    {
        let account = scope
            .get_account(account_id)
            .await
            .map_err(|_| EngineError::AccountNotFound)?;
        match side {
            Side::Buy => {
                let cost = qty * limit_price;
                if account.balance < cost {
                    return Err(EngineError::InsufficientFunds);
                }
                account.balance -= cost;
            }
            Side::Sell => {
                // handled below: position check needs its own borrow
            }
        }
    }
    if side == Side::Sell {
        match scope.get_position(account_id, symbol).await {
            Some(position) if position.amount >= qty => {
                position.amount -= qty;
            }
            _ => return Err(EngineError::InsufficientShares),
        }
    }

    let now = Utc::now();
    let order_id = scope.insert_order(account_id, symbol, side, amount, limit_price, now);

    let opposite = side.opposite();
    let mut remaining = qty;

    while !remaining.is_zero() {
        let Some(best) = book.peek_best(opposite).cloned() else {
            break;
        };
        let crosses = match side {
            Side::Buy => limit_price >= best.limit_price,
            Side::Sell => limit_price <= best.limit_price,
        };
        if !crosses {
            break;
        }

        let fill_qty = remaining.min(best.open_qty);
        let exec_price = best.limit_price;

        // Settle in the Store first: if `apply_fill` fails, the scope
        // rolls back on drop and the book is left untouched, so the two
        // never diverge. Only once settlement succeeds do we commit the
        // matching quantity to the in-memory book.
        apply_fill(&mut scope, side, order_id, best.clone(), fill_qty, exec_price, now).await?;

        let (matched, _exhausted) = book
            .fill_best(opposite, fill_qty)
            .expect("order just peeked must still be present");
        debug_assert_eq!(matched.id, best.id);

        remaining -= fill_qty;
    }

    if !remaining.is_zero() {
        book.insert(
            side,
            BookOrder {
                id: order_id,
                account_id: account_id.to_string(),
                limit_price,
                open_qty: remaining,
            },
        );
    }

    scope.commit();
    Ok(order_id)
}

/// Settles one fill between the aggressor (`order_id`, on `side`) and
/// the resting order (`matched`, on the opposite side): adjusts both
/// orders' open amounts, appends both executions, and moves the money
/// and shares.
#[allow(clippy::too_many_arguments)]
async fn apply_fill(
    scope: &mut store::Scope<'_>,
    side: Side,
    order_id: OrderId,
    matched: BookOrder,
    fill_qty: Decimal,
    exec_price: Decimal,
    now: chrono::DateTime<Utc>,
) -> Result<(), EngineError> {
    let opposite = side.opposite();

    let aggressor_delta = match side {
        Side::Buy => -fill_qty,
        Side::Sell => fill_qty,
    };
    let resting_delta = match opposite {
        Side::Buy => -fill_qty,
        Side::Sell => fill_qty,
    };

    // The resting order has never been touched by this scope before;
    // lock it before mutating it. The aggressor's row is already locked
    // from `insert_order` above.
    scope
        .get_order(matched.id)
        .await
        .map_err(|_| EngineError::OrderNotFound)?;

    scope
        .update_open_amount(order_id, aggressor_delta)
        .map_err(|_| EngineError::OrderNotFound)?;
    scope
        .update_open_amount(matched.id, resting_delta)
        .map_err(|_| EngineError::OrderNotFound)?;
    scope
        .append_execution(order_id, fill_qty, exec_price, now)
        .map_err(|_| EngineError::OrderNotFound)?;
    scope
        .append_execution(matched.id, fill_qty, exec_price, now)
        .map_err(|_| EngineError::OrderNotFound)?;

    let aggressor_account = order_account(scope, order_id).await?;
    let symbol = scope
        .get_order(order_id)
        .await
        .map_err(|_| EngineError::OrderNotFound)?
        .symbol
        .clone();

    // The aggressor's own account row is already locked when it is the
    // buyer (it paid for the reservation above) — fetching it again by
    // key just returns the cached locked row. When it's the seller, this
    // is the first time its account row is touched this scope.
    let (buyer_account, seller_account) = match side {
        Side::Buy => (aggressor_account, matched.account_id.clone()),
        Side::Sell => (matched.account_id.clone(), aggressor_account),
    };

    let proceeds = fill_qty * exec_price;
    let seller = scope
        .get_account(&seller_account)
        .await
        .map_err(|_| EngineError::AccountNotFound)?;
    seller.balance += proceeds;

    let buyer_position = scope.get_or_create_position(&buyer_account, &symbol).await;
    buyer_position.amount += fill_qty;

    Ok(())
}

async fn order_account(scope: &mut store::Scope<'_>, order_id: OrderId) -> Result<String, EngineError> {
    Ok(scope
        .get_order(order_id)
        .await
        .map_err(|_| EngineError::OrderNotFound)?
        .account_id
        .clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use store::Store;

    async fn setup() -> (Store, Books) {
        (Store::new(), Books::new())
    }

    #[tokio::test]
    async fn crosses_at_resting_price_with_partial_fills() {
        let (store, books) = setup().await;
        store.create_account("1", dec!(1_000_000)).unwrap();
        store.create_account("2", dec!(1_000_000)).unwrap();
        store.create_symbol("AMZN", "2", dec!(100_000)).await.unwrap();

        let k = place_order(&store, &books, "1", "AMZN", dec!(300), dec!(125))
            .await
            .unwrap();
        let k1 = place_order(&store, &books, "1", "AMZN", dec!(200), dec!(127))
            .await
            .unwrap();
        place_order(&store, &books, "1", "AMZN", dec!(400), dec!(125))
            .await
            .unwrap();

        place_order(&store, &books, "2", "AMZN", dec!(-100), dec!(130))
            .await
            .unwrap();
        place_order(&store, &books, "2", "AMZN", dec!(-500), dec!(128))
            .await
            .unwrap();
        place_order(&store, &books, "2", "AMZN", dec!(-200), dec!(140))
            .await
            .unwrap();

        // None of the above cross (127 < 128 is the closest approach).
        let k1_row = store.order_snapshot(k1).await.unwrap();
        assert_eq!(k1_row.open_amount, dec!(200));

        let new_sell = place_order(&store, &books, "2", "AMZN", dec!(-400), dec!(124))
            .await
            .unwrap();

        let k1_row = store.order_snapshot(k1).await.unwrap();
        assert!(k1_row.open_amount.is_zero());
        let k_row = store.order_snapshot(k).await.unwrap();
        assert_eq!(k_row.open_amount, dec!(100));
        let sell_row = store.order_snapshot(new_sell).await.unwrap();
        assert!(sell_row.open_amount.is_zero());

        let seller = store.account_snapshot("2").await.unwrap();
        assert_eq!(seller.balance, dec!(1_000_000) + dec!(200) * dec!(127) + dec!(200) * dec!(125));
    }

    #[tokio::test]
    async fn insufficient_funds_leaves_balance_untouched() {
        let (store, books) = setup().await;
        store.create_account("1", dec!(50)).unwrap();

        let err = place_order(&store, &books, "1", "SPY", dec!(10), dec!(100))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::InsufficientFunds);
        assert_eq!(store.account_snapshot("1").await.unwrap().balance, dec!(50));
    }

    #[tokio::test]
    async fn sell_without_position_fails_insufficient_shares() {
        let (store, books) = setup().await;
        store.create_account("1", dec!(0)).unwrap();

        let err = place_order(&store, &books, "1", "GOOG", dec!(-10), dec!(100))
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::InsufficientShares);
    }
}
