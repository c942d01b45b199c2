//! # tickbook-matchcore
//!
//! **Price-time priority matching engine for TickBook.**
//!
//! One [`OrderBook`] per instrument. An incoming order is validated,
//! crossed against the opposite side (best price first, FIFO within a
//! price), and any residual rests, cancels (IOC / market), or goes
//! dormant (stops). Every lifecycle transition is queued as a
//! [`tickbook_types::BookEvent`] and delivered to the caller's listener
//! by an explicit flush, never synchronously from inside a match.
//!
//! - **Price improvement**: trades execute at the resting (maker) price
//! - **Conditional orders**: stop, all-or-none, immediate-or-cancel,
//!   fill-or-kill
//! - **Single-threaded per instrument**: callers serialize mutating
//!   calls; independent books share nothing

pub mod book_side;
pub mod callbacks;
pub mod conditional;
pub mod matcher;
pub mod orderbook;
pub mod price_level;

pub use book_side::BookSide;
pub use callbacks::CallbackQueue;
pub use conditional::{StopRegistry, fully_fillable};
pub use matcher::{FillReport, match_order};
pub use orderbook::OrderBook;
pub use price_level::PriceLevel;
