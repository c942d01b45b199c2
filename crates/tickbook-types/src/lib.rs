//! # tickbook-types
//!
//! Shared types for the **TickBook** matching engine.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`Symbol`]
//! - **Order model**: [`Order`], [`Side`], [`OrderStatus`]
//! - **Trade model**: [`Trade`]
//! - **Events**: [`BookEvent`], [`OrderListener`], the reject-reason enums
//! - **Errors**: [`BookError`] with `TB_ERR_` prefix codes
//! - **Constants**: tick-price aliases and sentinels
//!
//! Prices are scaled integers in minor currency units; the engine never
//! compares floating-point prices.

pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod order;
pub mod trade;

// Re-export all primary types at crate root for ergonomic imports:
//   use tickbook_types::{Order, Side, Trade, OrderListener, ...};

pub use constants::{MARKET_PRICE, NO_STOP, Price, Quantity, QuantityDelta};
pub use error::*;
pub use event::*;
pub use ids::*;
pub use order::*;
pub use trade::*;
