//! Transactional persistence for accounts, positions, and orders.
//!
//! This crate is the sole owner of mutable state for the exchange: the
//! matching engine reads and writes through it exclusively, and the
//! in-memory order book (`orderbook`) is rebuilt from it on startup
//! rather than treated as a second source of truth.

pub mod error;
pub mod model;
pub mod scope;
mod store;

pub use error::StoreError;
pub use model::{Account, AccountId, Execution, OrderRow, Position, SymbolName};
pub use scope::Scope;
pub use store::Store;
