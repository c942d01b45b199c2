//! Error types for the TickBook matching engine.
//!
//! All errors use the `TB_ERR_` prefix convention for easy grepping in
//! logs. Expected business outcomes — reject, cancel-reject,
//! replace-reject — are **not** errors here: they are reported through
//! the listener interface. `BookError` covers contract failures and
//! internal lookups only.
//!
//! Error codes are grouped by subsystem:
//! - 1xx: Order / lookup errors
//! - 2xx: Book structure errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::ids::OrderId;

/// Central error enum for all TickBook operations.
#[derive(Debug, Error)]
pub enum BookError {
    // =================================================================
    // Order / Lookup Errors (1xx)
    // =================================================================
    /// The requested order was not found in the book or stop registry.
    #[error("TB_ERR_100: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// An order with this ID was already submitted to this book.
    #[error("TB_ERR_101: Order already exists: {0}")]
    DuplicateOrder(OrderId),

    /// The order failed a structural contract (not a business reject).
    #[error("TB_ERR_102: Invalid order: {reason}")]
    InvalidOrder { reason: String },

    /// The operation requires a live (ACCEPTED / PARTIALLY_FILLED) order.
    #[error("TB_ERR_103: Order is not live: {0}")]
    OrderNotLive(OrderId),

    // =================================================================
    // Book Structure Errors (2xx)
    // =================================================================
    /// A price level expected to exist was missing.
    #[error("TB_ERR_200: Price level not found at {price}")]
    LevelNotFound { price: i32 },

    /// A quantity operation would underflow the level aggregate.
    #[error("TB_ERR_201: Aggregate quantity underflow at price {price}")]
    QuantityUnderflow { price: i32 },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("TB_ERR_900: Internal error: {0}")]
    Internal(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, BookError>;
