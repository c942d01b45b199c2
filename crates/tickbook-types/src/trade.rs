//! Trade records produced by the matcher.
//!
//! A [`Trade`] is one fill between a resting (maker) and incoming (taker)
//! order. Trades are transient: they drive fill events and stop-order
//! triggering but are never stored by the book.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{Price, Quantity};
use crate::ids::OrderId;

/// One fill between a buy and a sell order.
///
/// The execution price is always the resting (maker) order's price, so
/// any price improvement favors the incoming taker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    /// Per-book monotonic trade sequence number.
    pub sequence: u64,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    /// Execution price in ticks (the maker's price).
    pub price: Price,
    pub quantity: Quantity,
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    /// Record a fill, stamped with the current time.
    #[must_use]
    pub fn new(
        sequence: u64,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            sequence,
            buy_order_id,
            sell_order_id,
            price,
            quantity,
            executed_at: Utc::now(),
        }
    }

    /// Traded value in ticks: price x quantity.
    #[must_use]
    pub fn notional(&self) -> i64 {
        i64::from(self.price) * i64::from(self.quantity)
    }
}

impl std::fmt::Display for Trade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Trade[{}] {} @ {} (buy {}, sell {})",
            self.sequence, self.quantity, self.price, self.buy_order_id, self.sell_order_id,
        )
    }
}
