//! Lifecycle events and the listener contract.
//!
//! Every mutation of the book is reported as a [`BookEvent`] appended to
//! an internal queue and later flushed to an [`OrderListener`]. Events
//! carry owned order snapshots taken at emission time, so listener code
//! can never observe (or mutate) book state mid-match.

use serde::{Deserialize, Serialize};

use crate::constants::{Price, Quantity, QuantityDelta};
use crate::ids::OrderId;
use crate::order::Order;

/// Why an order was never admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// `quantity` was zero.
    ZeroQuantity,
    /// `price` or `stop_price` was negative.
    NegativePrice,
    /// A fill-or-kill order that cannot fill its full quantity right now.
    KillUnfillable,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroQuantity => write!(f, "quantity must be positive"),
            Self::NegativePrice => write!(f, "price must not be negative"),
            Self::KillUnfillable => write!(f, "fill-or-kill cannot be fully filled"),
        }
    }
}

/// Why a cancel request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelRejectReason {
    NotFound,
    AlreadyFilled,
    AlreadyCanceled,
}

impl std::fmt::Display for CancelRejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::AlreadyFilled => write!(f, "already filled"),
            Self::AlreadyCanceled => write!(f, "already canceled"),
        }
    }
}

/// Why a replace request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplaceRejectReason {
    NotFound,
    AlreadyFilled,
    AlreadyCanceled,
    /// The resulting quantity would not exceed the already-filled amount.
    QuantityBelowFilled,
    /// The new price was negative.
    InvalidPrice,
}

impl std::fmt::Display for ReplaceRejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::AlreadyFilled => write!(f, "already filled"),
            Self::AlreadyCanceled => write!(f, "already canceled"),
            Self::QuantityBelowFilled => write!(f, "size below filled quantity"),
            Self::InvalidPrice => write!(f, "price must not be negative"),
        }
    }
}

/// A queued lifecycle event. One variant per listener callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BookEvent {
    /// Order admitted to the book or the dormant stop registry.
    Accept { order: Order },
    /// One trade leg. Emitted twice per trade: once for the taker (with
    /// the maker as `matched_order`) and mirrored for the maker.
    Fill {
        order: Order,
        matched_order: Order,
        fill_qty: Quantity,
        fill_price: Price,
    },
    /// Order never admitted.
    Reject { order: Order, reason: RejectReason },
    /// Order removed before full fill.
    Cancel { order: Order },
    /// Cancel request refused; book state unchanged. Carries the id
    /// because a "not found" target has no order to snapshot.
    CancelReject {
        order_id: OrderId,
        reason: CancelRejectReason,
    },
    /// Modification applied (and the order re-admitted at the back of
    /// its level's queue).
    Replace {
        order: Order,
        qty_delta: QuantityDelta,
        new_price: Price,
    },
    /// Replace request refused; book state unchanged.
    ReplaceReject {
        order_id: OrderId,
        reason: ReplaceRejectReason,
    },
}

/// Receiver of order lifecycle notifications.
///
/// The book holds one listener and delivers queued events to it in
/// emission order when `perform_callbacks` is called. All methods have
/// no-op defaults; implement the ones you care about.
pub trait OrderListener {
    /// The order is valid and resting in the book (or stop registry).
    fn on_accept(&mut self, order: &Order) {
        let _ = order;
    }

    /// One trade leg executed. `order` is this side of the trade,
    /// `matched_order` the counterparty. An order matched against
    /// several counterparties receives one call per fill.
    fn on_fill(&mut self, order: &Order, matched_order: &Order, fill_qty: Quantity, fill_price: Price) {
        let _ = (order, matched_order, fill_qty, fill_price);
    }

    /// The order was invalid or infeasible and was never admitted.
    fn on_reject(&mut self, order: &Order, reason: RejectReason) {
        let _ = (order, reason);
    }

    /// The order was removed from the book before being fully filled.
    fn on_cancel(&mut self, order: &Order) {
        let _ = order;
    }

    /// A cancel request targeted a missing or already-terminal order.
    fn on_cancel_reject(&mut self, order_id: &OrderId, reason: CancelRejectReason) {
        let _ = (order_id, reason);
    }

    /// The order's quantity and/or price were modified.
    fn on_replace(&mut self, order: &Order, qty_delta: QuantityDelta, new_price: Price) {
        let _ = (order, qty_delta, new_price);
    }

    /// A replace request was invalid; the order is unchanged.
    fn on_replace_reject(&mut self, order_id: &OrderId, reason: ReplaceRejectReason) {
        let _ = (order_id, reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Side;

    #[test]
    fn reason_strings_are_stable() {
        assert_eq!(CancelRejectReason::NotFound.to_string(), "not found");
        assert_eq!(CancelRejectReason::AlreadyFilled.to_string(), "already filled");
        assert_eq!(CancelRejectReason::AlreadyCanceled.to_string(), "already canceled");
        assert_eq!(
            ReplaceRejectReason::QuantityBelowFilled.to_string(),
            "size below filled quantity"
        );
    }

    #[test]
    fn default_listener_methods_are_noops() {
        struct Silent;
        impl OrderListener for Silent {}

        let order = Order::limit("O1", Side::Buy, 5000, 100);
        let mut listener = Silent;
        listener.on_accept(&order);
        listener.on_fill(&order, &order, 10, 5000);
        listener.on_cancel(&order);
    }

    #[test]
    fn event_serde_roundtrip() {
        let event = BookEvent::Reject {
            order: Order::limit("O1", Side::Buy, -1, 100),
            reason: RejectReason::NegativePrice,
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: BookEvent = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            back,
            BookEvent::Reject {
                reason: RejectReason::NegativePrice,
                ..
            }
        ));
    }
}
