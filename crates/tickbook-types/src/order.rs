//! Order model for the TickBook matching engine.
//!
//! An [`Order`] is constructed by the caller and submitted to the book by
//! value. `price == 0` makes it a market order; `stop_price > 0` makes it
//! dormant until a qualifying trade print. The `all_or_none` and
//! `immediate_or_cancel` flags are independent; both together give
//! fill-or-kill semantics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MARKET_PRICE, NO_STOP, Price, Quantity};
use crate::ids::OrderId;

/// Which side of the book this order is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The side an incoming order matches against.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// Lifecycle status of an order.
///
/// ```text
/// Pending -> Accepted -> {PartiallyFilled <-> PartiallyFilled, Filled}
///                      | Canceled
/// Pending -> Rejected
/// ```
///
/// `Rejected` is reachable only from `Pending`; `Canceled` from
/// `Accepted` or `PartiallyFilled`; `Filled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Accepted,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
}

impl OrderStatus {
    /// Terminal states admit no further transitions.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Filled | Self::Canceled | Self::Rejected)
    }

    /// Live orders can still trade, be canceled, or be replaced.
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Accepted | Self::PartiallyFilled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Accepted => write!(f, "ACCEPTED"),
            Self::PartiallyFilled => write!(f, "PARTIALLY_FILLED"),
            Self::Filled => write!(f, "FILLED"),
            Self::Canceled => write!(f, "CANCELED"),
            Self::Rejected => write!(f, "REJECTED"),
        }
    }
}

/// Core order struct. Submitted by value; the book owns it while resting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    /// Limit price in ticks. `0` = market order.
    pub price: Price,
    /// Stop trigger price in ticks. `0` = not a stop order.
    pub stop_price: Price,
    /// Original quantity, immutable except via replace.
    pub quantity: Quantity,
    /// Unfilled quantity; decreases only via fills.
    pub remaining_qty: Quantity,
    pub all_or_none: bool,
    pub immediate_or_cancel: bool,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a limit order.
    #[must_use]
    pub fn limit(id: impl Into<OrderId>, side: Side, price: Price, qty: Quantity) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            side,
            price,
            stop_price: NO_STOP,
            quantity: qty,
            remaining_qty: qty,
            all_or_none: false,
            immediate_or_cancel: false,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a market order (no price constraint).
    #[must_use]
    pub fn market(id: impl Into<OrderId>, side: Side, qty: Quantity) -> Self {
        Self::limit(id, side, MARKET_PRICE, qty)
    }

    /// Make this a stop order, dormant until a qualifying trade print.
    #[must_use]
    pub fn with_stop_price(mut self, stop_price: Price) -> Self {
        self.stop_price = stop_price;
        self
    }

    /// Require the full quantity to fill, or none of it.
    #[must_use]
    pub fn with_all_or_none(mut self) -> Self {
        self.all_or_none = true;
        self
    }

    /// Fill what is possible immediately, cancel the remainder.
    #[must_use]
    pub fn with_immediate_or_cancel(mut self) -> Self {
        self.immediate_or_cancel = true;
        self
    }

    #[must_use]
    pub fn is_market(&self) -> bool {
        self.price == MARKET_PRICE
    }

    #[must_use]
    pub fn is_stop(&self) -> bool {
        self.stop_price > NO_STOP
    }

    /// Fill-or-kill: all-or-none and immediate-or-cancel combined.
    #[must_use]
    pub fn is_fill_or_kill(&self) -> bool {
        self.all_or_none && self.immediate_or_cancel
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.remaining_qty == 0
    }

    #[must_use]
    pub fn filled_qty(&self) -> Quantity {
        self.quantity - self.remaining_qty
    }

    /// Can this order trade against resting liquidity at `price`?
    ///
    /// A market order crosses any price; a limit buy crosses at or below
    /// its limit, a limit sell at or above.
    #[must_use]
    pub fn crosses_at(&self, price: Price) -> bool {
        if self.is_market() {
            return true;
        }
        match self.side {
            Side::Buy => self.price >= price,
            Side::Sell => self.price <= price,
        }
    }

    /// Does a trade print at `price` activate this stop order?
    ///
    /// A buy stop triggers when the print rises to or through the stop
    /// price; a sell stop when it falls to or through it.
    #[must_use]
    pub fn stop_triggered_by(&self, price: Price) -> bool {
        if !self.is_stop() {
            return false;
        }
        match self.side {
            Side::Buy => price >= self.stop_price,
            Side::Sell => price <= self.stop_price,
        }
    }

    /// Record a fill of `qty`, transitioning status as remaining quantity
    /// allows. Callers guarantee `qty <= remaining_qty`.
    pub fn apply_fill(&mut self, qty: Quantity) {
        debug_assert!(qty > 0 && qty <= self.remaining_qty);
        self.remaining_qty -= qty;
        self.status = if self.remaining_qty == 0 {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.updated_at = Utc::now();
    }

    /// Transition to `Accepted` on admission.
    pub fn accept(&mut self) {
        self.status = OrderStatus::Accepted;
        self.updated_at = Utc::now();
    }

    /// Transition to `Rejected` (terminal, reachable only from `Pending`).
    pub fn reject(&mut self) {
        self.status = OrderStatus::Rejected;
        self.updated_at = Utc::now();
    }

    /// Transition to `Canceled` (terminal; remaining quantity may be nonzero).
    pub fn cancel(&mut self) {
        self.status = OrderStatus::Canceled;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_order_defaults() {
        let order = Order::limit("O1", Side::Buy, 5000, 100);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.remaining_qty, 100);
        assert!(!order.is_market());
        assert!(!order.is_stop());
        assert!(!order.is_fill_or_kill());
    }

    #[test]
    fn market_order_has_no_price() {
        let order = Order::market("M1", Side::Buy, 125);
        assert!(order.is_market());
        assert!(order.crosses_at(5100));
        assert!(order.crosses_at(1));
    }

    #[test]
    fn builder_flags() {
        let fok = Order::limit("F1", Side::Sell, 5000, 10)
            .with_all_or_none()
            .with_immediate_or_cancel();
        assert!(fok.is_fill_or_kill());

        let stop = Order::limit("S1", Side::Sell, 4900, 10).with_stop_price(5000);
        assert!(stop.is_stop());
    }

    #[test]
    fn limit_crossing() {
        let buy = Order::limit("B1", Side::Buy, 5000, 100);
        assert!(buy.crosses_at(5000));
        assert!(buy.crosses_at(4900));
        assert!(!buy.crosses_at(5001));

        let sell = Order::limit("S1", Side::Sell, 5000, 100);
        assert!(sell.crosses_at(5000));
        assert!(sell.crosses_at(5100));
        assert!(!sell.crosses_at(4999));
    }

    #[test]
    fn stop_trigger_direction() {
        let buy_stop = Order::market("BS", Side::Buy, 10).with_stop_price(5000);
        assert!(buy_stop.stop_triggered_by(5000));
        assert!(buy_stop.stop_triggered_by(5100));
        assert!(!buy_stop.stop_triggered_by(4999));

        let sell_stop = Order::market("SS", Side::Sell, 10).with_stop_price(5000);
        assert!(sell_stop.stop_triggered_by(5000));
        assert!(sell_stop.stop_triggered_by(4900));
        assert!(!sell_stop.stop_triggered_by(5001));
    }

    #[test]
    fn fill_transitions() {
        let mut order = Order::limit("O1", Side::Buy, 5000, 100);
        order.accept();
        assert_eq!(order.status, OrderStatus::Accepted);

        order.apply_fill(40);
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert_eq!(order.filled_qty(), 40);
        assert!(!order.status.is_terminal());

        order.apply_fill(60);
        assert_eq!(order.status, OrderStatus::Filled);
        assert!(order.is_filled());
        assert!(order.status.is_terminal());
    }

    #[test]
    fn canceled_keeps_remaining() {
        let mut order = Order::limit("O1", Side::Sell, 5100, 200);
        order.accept();
        order.apply_fill(75);
        order.cancel();
        assert_eq!(order.status, OrderStatus::Canceled);
        assert_eq!(order.remaining_qty, 125);
    }

    #[test]
    fn status_display() {
        assert_eq!(OrderStatus::PartiallyFilled.to_string(), "PARTIALLY_FILLED");
        assert_eq!(Side::Sell.to_string(), "SELL");
        assert_eq!(Side::Buy.opposite(), Side::Sell);
    }
}
