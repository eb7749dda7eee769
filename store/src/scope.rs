//! Row-locked transactional scopes.
//!
//! Mirrors the begin/commit/rollback shape of an `sqlx::Transaction`:
//! a `Scope` holds `tokio::sync::OwnedMutexGuard`s for every row it
//! touches, mutations apply in place through the guard, and dropping
//! the scope without calling `commit` restores every touched row to
//! its pre-scope snapshot. Rows created fresh within the scope (a new
//! order, a new position) are removed outright on rollback instead of
//! restored.

use crate::error::StoreError;
use crate::model::{Account, AccountId, OrderRow, Position, SymbolName};
use crate::Store;
use chrono::{DateTime, Utc};
use orderbook::{OrderId, Side};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::OwnedMutexGuard;

struct LockedRow<T> {
    guard: OwnedMutexGuard<T>,
    before: T,
    existed_before: bool,
}

/// A single atomic unit of work against the store. Acquire row locks
/// in canonical order — account, then position, then order — to avoid
/// deadlocking against a concurrent scope on the same rows.
pub struct Scope<'s> {
    store: &'s Store,
    accounts: HashMap<AccountId, LockedRow<Account>>,
    positions: HashMap<(AccountId, SymbolName), LockedRow<Position>>,
    orders: HashMap<OrderId, LockedRow<OrderRow>>,
    committed: bool,
}

impl<'s> Scope<'s> {
    pub(crate) fn new(store: &'s Store) -> Self {
        Self {
            store,
            accounts: HashMap::new(),
            positions: HashMap::new(),
            orders: HashMap::new(),
            committed: false,
        }
    }

    /// Locks and returns the account row, failing if it does not exist.
    pub async fn get_account(&mut self, id: &str) -> Result<&mut Account, StoreError> {
        if !self.accounts.contains_key(id) {
            let arc = self
                .store
                .accounts
                .get(id)
                .map(|r| r.value().clone())
                .ok_or(StoreError::AccountNotFound)?;
            let guard = arc.lock_owned().await;
            let before = guard.clone();
            self.accounts.insert(
                id.to_string(),
                LockedRow {
                    guard,
                    before,
                    existed_before: true,
                },
            );
        }
        Ok(&mut self.accounts.get_mut(id).unwrap().guard)
    }

    /// Locks and returns the position row if one exists, without creating it.
    pub async fn get_position(&mut self, account_id: &str, symbol: &str) -> Option<&mut Position> {
        let key = (account_id.to_string(), symbol.to_string());
        if !self.positions.contains_key(&key) {
            let arc = self.store.positions.get(&key)?.value().clone();
            let guard = arc.lock_owned().await;
            let before = guard.clone();
            self.positions.insert(
                key.clone(),
                LockedRow {
                    guard,
                    before,
                    existed_before: true,
                },
            );
        }
        self.positions.get_mut(&key).map(|r| &mut *r.guard)
    }

    /// Locks the position row, creating an empty one (amount zero) if absent.
    pub async fn get_or_create_position(&mut self, account_id: &str, symbol: &str) -> &mut Position {
        let key = (account_id.to_string(), symbol.to_string());
        if !self.positions.contains_key(&key) {
            let existed_before;
            let arc = if let Some(r) = self.store.positions.get(&key) {
                existed_before = true;
                r.value().clone()
            } else {
                existed_before = false;
                let fresh = std::sync::Arc::new(tokio::sync::Mutex::new(Position {
                    account_id: account_id.to_string(),
                    symbol: symbol.to_string(),
                    amount: Decimal::ZERO,
                }));
                self.store.positions.insert(key.clone(), fresh.clone());
                fresh
            };
            let guard = arc.lock_owned().await;
            let before = guard.clone();
            self.positions.insert(
                key.clone(),
                LockedRow {
                    guard,
                    before,
                    existed_before,
                },
            );
        }
        &mut self.positions.get_mut(&key).unwrap().guard
    }

    /// Locks and returns the order row, failing if it does not exist.
    pub async fn get_order(&mut self, id: OrderId) -> Result<&mut OrderRow, StoreError> {
        if !self.orders.contains_key(&id) {
            let arc = self
                .store
                .orders
                .get(&id)
                .map(|r| r.value().clone())
                .ok_or(StoreError::OrderNotFound)?;
            let guard = arc.lock_owned().await;
            let before = guard.clone();
            self.orders.insert(
                id,
                LockedRow {
                    guard,
                    before,
                    existed_before: true,
                },
            );
        }
        Ok(&mut self.orders.get_mut(&id).unwrap().guard)
    }

    /// Inserts a brand-new order row, already locked by this scope, and
    /// returns its store-assigned id.
    pub fn insert_order(
        &mut self,
        account_id: &str,
        symbol: &str,
        side: Side,
        original_amount: Decimal,
        limit_price: Decimal,
        created_at: DateTime<Utc>,
    ) -> OrderId {
        let id = self.store.next_order_id();
        let row = OrderRow {
            id,
            account_id: account_id.to_string(),
            symbol: symbol.to_string(),
            side,
            original_amount,
            limit_price,
            created_at,
            open_amount: original_amount,
            canceled_at: None,
            executions: Vec::new(),
        };
        let arc = std::sync::Arc::new(tokio::sync::Mutex::new(row.clone()));
        self.store.orders.insert(id, arc.clone());
        let guard = arc
            .try_lock_owned()
            .expect("freshly inserted order row cannot be contended");
        self.orders.insert(
            id,
            LockedRow {
                guard,
                before: row,
                existed_before: false,
            },
        );
        id
    }

    /// Adjusts an already-locked order's open amount by `delta` (signed).
    pub fn update_open_amount(&mut self, order_id: OrderId, delta: Decimal) -> Result<(), StoreError> {
        let row = self.orders.get_mut(&order_id).ok_or(StoreError::OrderNotFound)?;
        row.guard.open_amount += delta;
        Ok(())
    }

    /// Appends an execution to an already-locked order.
    pub fn append_execution(
        &mut self,
        order_id: OrderId,
        shares: Decimal,
        price: Decimal,
        executed_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let exec_id = self.store.next_execution_id();
        let row = self.orders.get_mut(&order_id).ok_or(StoreError::OrderNotFound)?;
        row.guard.executions.push(crate::model::Execution {
            id: exec_id,
            order_id,
            shares,
            price,
            executed_at,
        });
        Ok(())
    }

    /// Marks an already-locked order canceled: open amount forced to
    /// zero, `canceled_at` set.
    pub fn set_canceled(&mut self, order_id: OrderId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let row = self.orders.get_mut(&order_id).ok_or(StoreError::OrderNotFound)?;
        row.guard.canceled_at = Some(at);
        row.guard.open_amount = Decimal::ZERO;
        Ok(())
    }

    /// Commits: every mutation made through this scope becomes final.
    pub fn commit(mut self) {
        self.committed = true;
    }

    /// Explicit rollback; equivalent to simply dropping the scope.
    pub fn rollback(self) {}
}

impl<'s> Drop for Scope<'s> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for (id, mut row) in self.accounts.drain() {
            if row.existed_before {
                *row.guard = row.before;
            } else {
                self.store.accounts.remove(&id);
            }
        }
        for (key, mut row) in self.positions.drain() {
            if row.existed_before {
                *row.guard = row.before;
            } else {
                self.store.positions.remove(&key);
            }
        }
        for (id, mut row) in self.orders.drain() {
            if row.existed_before {
                *row.guard = row.before;
            } else {
                self.store.orders.remove(&id);
            }
        }
    }
}
