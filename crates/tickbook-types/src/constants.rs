//! System-wide constants and scalar aliases for the TickBook engine.
//!
//! Prices are scaled integers in minor currency units (ticks). Floating
//! point never enters the crossing logic.

/// Price in ticks. `0` denotes a market order (no price constraint).
pub type Price = i32;

/// Order quantity in shares/contracts.
pub type Quantity = u32;

/// Signed quantity change used by replace requests.
pub type QuantityDelta = i64;

/// Sentinel limit price of a market order.
pub const MARKET_PRICE: Price = 0;

/// Sentinel stop price of a non-stop order.
pub const NO_STOP: Price = 0;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "TickBook";
