use thiserror::Error;

/// Errors surfaced by the matching, cancellation, and query operations.
/// Variants carry the exact wire-facing message text the protocol layer
/// echoes back verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Account not found")]
    AccountNotFound,
    #[error("Insufficient funds")]
    InsufficientFunds,
    #[error("Insufficient shares")]
    InsufficientShares,
    #[error("Permission denied")]
    PermissionDenied,
    #[error("Order not found")]
    OrderNotFound,
    #[error("Invalid amount")]
    InvalidAmount,
}
