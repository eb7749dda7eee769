//! The transactional store: concurrent row-locked tables for accounts,
//! positions, and orders, plus the scopes that mutate them atomically.

use crate::error::StoreError;
use crate::model::{Account, AccountId, OrderRow, Position, SymbolName};
use crate::scope::Scope;
use dashmap::DashMap;
use orderbook::OrderId;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// In-memory stand-in for the durable, transactional store described by
/// the protocol: every account, position, and order lives behind its
/// own `tokio::sync::Mutex`, and `DashMap` provides the concurrent
/// top-level table so unrelated rows never contend with each other.
#[derive(Default)]
pub struct Store {
    pub(crate) accounts: DashMap<AccountId, Arc<Mutex<Account>>>,
    pub(crate) positions: DashMap<(AccountId, SymbolName), Arc<Mutex<Position>>>,
    pub(crate) orders: DashMap<OrderId, Arc<Mutex<OrderRow>>>,
    next_order_id: AtomicU64,
    next_execution_id: AtomicU64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn next_order_id(&self) -> OrderId {
        OrderId(self.next_order_id.fetch_add(1, Ordering::SeqCst))
    }

    pub(crate) fn next_execution_id(&self) -> u64 {
        self.next_execution_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Opens a new transactional scope. Row locks taken through it are
    /// held until `commit` or the scope is dropped.
    pub fn begin(&self) -> Scope<'_> {
        Scope::new(self)
    }

    /// Creates an account with the given starting balance. Atomic and
    /// self-contained: there is no partial-failure window that would
    /// need a scope.
    pub fn create_account(&self, id: &str, balance: Decimal) -> Result<(), StoreError> {
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(StoreError::InvalidAccountId);
        }
        if balance < Decimal::ZERO {
            return Err(StoreError::InvalidBalance);
        }
        match self.accounts.entry(id.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(StoreError::AccountAlreadyExists),
            dashmap::mapref::entry::Entry::Vacant(v) => {
                v.insert(Arc::new(Mutex::new(Account {
                    id: id.to_string(),
                    balance,
                })));
                Ok(())
            }
        }
    }

    /// Credits `amount` shares of `symbol` to `account_id`, creating the
    /// position if this is the first time the account has held it. The
    /// symbol itself needs no separate registration: it becomes known
    /// the moment any position or order references it.
    pub async fn create_symbol(
        &self,
        symbol: &str,
        account_id: &str,
        amount: Decimal,
    ) -> Result<(), StoreError> {
        if amount <= Decimal::ZERO {
            return Err(StoreError::InvalidAmount);
        }
        if !self.accounts.contains_key(account_id) {
            return Err(StoreError::AccountNotFound);
        }
        let key = (account_id.to_string(), symbol.to_string());
        let arc = self
            .positions
            .entry(key)
            .or_insert_with(|| {
                Arc::new(Mutex::new(Position {
                    account_id: account_id.to_string(),
                    symbol: symbol.to_string(),
                    amount: Decimal::ZERO,
                }))
            })
            .clone();
        let mut pos = arc.lock().await;
        pos.amount += amount;
        Ok(())
    }

    /// Read-only snapshot of an account, outside of any scope.
    pub async fn account_snapshot(&self, id: &str) -> Option<Account> {
        let arc = self.accounts.get(id)?.value().clone();
        Some(arc.lock().await.clone())
    }

    /// Read-only snapshot of an order, outside of any scope.
    pub async fn order_snapshot(&self, id: OrderId) -> Option<OrderRow> {
        let arc = self.orders.get(&id)?.value().clone();
        Some(arc.lock().await.clone())
    }

    /// Every order still resting (open and not canceled), for rebuilding
    /// the in-memory order books on startup.
    pub async fn list_open_orders(&self) -> Vec<OrderRow> {
        let arcs: Vec<_> = self.orders.iter().map(|r| r.value().clone()).collect();
        let mut open = Vec::with_capacity(arcs.len());
        for arc in arcs {
            let row = arc.lock().await;
            if row.is_resting() {
                open.push(row.clone());
            }
        }
        open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orderbook::Side;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn create_account_rejects_duplicates_and_bad_ids() {
        let store = Store::new();
        store.create_account("1", dec!(100)).unwrap();
        assert_eq!(
            store.create_account("1", dec!(50)).unwrap_err(),
            StoreError::AccountAlreadyExists
        );
        assert_eq!(
            store.create_account("abc", dec!(50)).unwrap_err(),
            StoreError::InvalidAccountId
        );
        assert_eq!(
            store.create_account("2", dec!(-5)).unwrap_err(),
            StoreError::InvalidBalance
        );
    }

    #[tokio::test]
    async fn create_symbol_credits_and_accumulates_position() {
        let store = Store::new();
        store.create_account("1", dec!(0)).unwrap();
        store.create_symbol("ABC", "1", dec!(10)).await.unwrap();
        store.create_symbol("ABC", "1", dec!(5)).await.unwrap();

        let arc = store
            .positions
            .get(&("1".to_string(), "ABC".to_string()))
            .unwrap()
            .value()
            .clone();
        assert_eq!(arc.lock().await.amount, dec!(15));
    }

    #[tokio::test]
    async fn scope_rollback_undoes_balance_change_and_new_order() {
        let store = Store::new();
        store.create_account("1", dec!(100)).unwrap();

        {
            let mut scope = store.begin();
            let account = scope.get_account("1").await.unwrap();
            account.balance -= dec!(100);
            scope.insert_order("1", "ABC", Side::Buy, dec!(10), dec!(5), chrono::Utc::now());
            // scope dropped here without commit: both mutations roll back
        }

        let account = store.account_snapshot("1").await.unwrap();
        assert_eq!(account.balance, dec!(100));
        assert_eq!(store.orders.len(), 0);
    }

    #[tokio::test]
    async fn scope_commit_persists_mutations() {
        let store = Store::new();
        store.create_account("1", dec!(100)).unwrap();

        let order_id;
        {
            let mut scope = store.begin();
            let account = scope.get_account("1").await.unwrap();
            account.balance -= dec!(40);
            order_id = scope.insert_order("1", "ABC", Side::Buy, dec!(10), dec!(4), chrono::Utc::now());
            scope.commit();
        }

        let account = store.account_snapshot("1").await.unwrap();
        assert_eq!(account.balance, dec!(60));
        let order = store.order_snapshot(order_id).await.unwrap();
        assert_eq!(order.open_amount, dec!(10));
    }
}
