//! The order book for a single instrument.
//!
//! Orchestrates validation, matching, resting, cancel/replace, stop
//! activation, and deferred event delivery. One book per symbol; all
//! mutating calls are synchronous and must be serialized by the caller
//! (one matching thread per instrument, no internal locking).
//!
//! An auxiliary `HashMap<OrderId, (Side, Price)>` locates live resting
//! orders for O(log N) cancellation; a second map remembers terminal
//! statuses so cancel/replace on a dead order can report *why* it failed.

use std::collections::{HashMap, VecDeque};

use tickbook_types::{
    BookError, BookEvent, CancelRejectReason, Order, OrderId, OrderListener, OrderStatus, Price,
    Quantity, QuantityDelta, RejectReason, ReplaceRejectReason, Result, Side, Symbol,
};

use crate::book_side::BookSide;
use crate::callbacks::CallbackQueue;
use crate::conditional::{StopRegistry, fully_fillable};
use crate::matcher::match_order;

/// The order book and matching engine for one instrument.
pub struct OrderBook {
    /// The instrument this book serves.
    pub symbol: Symbol,
    bids: BookSide,
    asks: BookSide,
    stops: StopRegistry,
    queue: CallbackQueue,
    listener: Option<Box<dyn OrderListener>>,
    /// Live resting orders: `OrderId -> (side, price)`.
    index: HashMap<OrderId, (Side, Price)>,
    /// Terminal statuses of orders that once rested here.
    retired: HashMap<OrderId, OrderStatus>,
    trade_seq: u64,
    last_trade_price: Option<Price>,
}

impl OrderBook {
    /// Create a new empty order book for the given instrument.
    #[must_use]
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
            stops: StopRegistry::new(),
            queue: CallbackQueue::new(),
            listener: None,
            index: HashMap::new(),
            retired: HashMap::new(),
            trade_seq: 0,
            last_trade_price: None,
        }
    }

    /// Attach the listener that receives flushed events. Events emitted
    /// before a listener is attached stay queued.
    pub fn set_order_listener(&mut self, listener: impl OrderListener + 'static) {
        self.listener = Some(Box::new(listener));
    }

    // =================================================================
    // Submission
    // =================================================================

    /// Submit an order.
    ///
    /// Validation failures and infeasible fill-or-kill orders emit
    /// `Reject`; valid orders emit `Accept` and then either go dormant
    /// (stops), trade, and/or rest. A duplicate id is a caller contract
    /// violation and returns an error instead of an event.
    pub fn add(&mut self, mut order: Order) -> Result<()> {
        if self.index.contains_key(&order.id)
            || self.stops.contains(&order.id)
            || self.retired.contains_key(&order.id)
        {
            return Err(BookError::DuplicateOrder(order.id));
        }

        if order.quantity == 0 {
            order.reject();
            self.queue.push(BookEvent::Reject {
                order,
                reason: RejectReason::ZeroQuantity,
            });
            return Ok(());
        }
        if order.price < 0 || order.stop_price < 0 {
            order.reject();
            self.queue.push(BookEvent::Reject {
                order,
                reason: RejectReason::NegativePrice,
            });
            return Ok(());
        }

        // A stop order whose trigger condition already holds against the
        // last print activates immediately; otherwise it goes dormant and
        // skips the fill-or-kill feasibility check until activation.
        let dormant = order.is_stop()
            && !self
                .last_trade_price
                .is_some_and(|print| order.stop_triggered_by(print));

        if !dormant && order.is_fill_or_kill() {
            let opposite = match order.side {
                Side::Buy => &self.asks,
                Side::Sell => &self.bids,
            };
            if !fully_fillable(&order, opposite) {
                order.reject();
                self.queue.push(BookEvent::Reject {
                    order,
                    reason: RejectReason::KillUnfillable,
                });
                return Ok(());
            }
        }

        order.accept();
        self.queue.push(BookEvent::Accept {
            order: order.clone(),
        });

        if dormant {
            tracing::debug!(order_id = %order.id, stop = order.stop_price, "stop order dormant");
            self.stops.insert(order);
        } else {
            self.run(order);
        }
        Ok(())
    }

    // =================================================================
    // Cancellation
    // =================================================================

    /// Cancel a live order (resting or dormant stop). Emits `Cancel` on
    /// success, `CancelReject` with the failure reason otherwise. Never
    /// mutates book state on a reject.
    pub fn cancel(&mut self, order_id: &OrderId) {
        if let Some((side, price)) = self.index.remove(order_id) {
            let book_side = match side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            // The index and the side are updated together, so a live
            // entry always resolves.
            if let Some(mut order) = book_side.remove(order_id, price) {
                order.cancel();
                self.retired.insert(order.id.clone(), OrderStatus::Canceled);
                self.queue.push(BookEvent::Cancel { order });
                return;
            }
            tracing::warn!(%order_id, price, "index entry without a resting order");
        }

        if let Some(mut order) = self.stops.remove(order_id) {
            order.cancel();
            self.retired.insert(order.id.clone(), OrderStatus::Canceled);
            self.queue.push(BookEvent::Cancel { order });
            return;
        }

        let reason = match self.retired.get(order_id) {
            Some(OrderStatus::Filled) => CancelRejectReason::AlreadyFilled,
            Some(OrderStatus::Canceled) => CancelRejectReason::AlreadyCanceled,
            _ => CancelRejectReason::NotFound,
        };
        self.queue.push(BookEvent::CancelReject {
            order_id: order_id.clone(),
            reason,
        });
    }

    // =================================================================
    // Replacement
    // =================================================================

    /// Modify a live order's quantity (by signed delta) and/or price
    /// (`None` keeps the current price).
    ///
    /// A successful replace removes the order from its level, applies
    /// the change, emits `Replace`, and re-admits the order — losing its
    /// queue priority and possibly matching immediately if the new price
    /// crosses. Failures emit `ReplaceReject` and change nothing.
    pub fn replace(&mut self, order_id: &OrderId, qty_delta: QuantityDelta, new_price: Option<Price>) {
        // Locate the target: resting book first, then the stop registry.
        let resting = self.index.get(order_id).copied();
        let in_stops = resting.is_none() && self.stops.contains(order_id);

        if resting.is_none() && !in_stops {
            let reason = match self.retired.get(order_id) {
                Some(OrderStatus::Filled) => ReplaceRejectReason::AlreadyFilled,
                Some(OrderStatus::Canceled) => ReplaceRejectReason::AlreadyCanceled,
                _ => ReplaceRejectReason::NotFound,
            };
            self.queue.push(BookEvent::ReplaceReject {
                order_id: order_id.clone(),
                reason,
            });
            return;
        }

        let current = if let Some((side, price)) = resting {
            let book_side = match side {
                Side::Buy => &self.bids,
                Side::Sell => &self.asks,
            };
            book_side.get(order_id, price)
        } else {
            self.stops.get(order_id)
        };
        let Some(current) = current else {
            self.queue.push(BookEvent::ReplaceReject {
                order_id: order_id.clone(),
                reason: ReplaceRejectReason::NotFound,
            });
            return;
        };

        let filled = i64::from(current.filled_qty());
        let new_total = i64::from(current.quantity) + qty_delta;
        let price = new_price.unwrap_or(current.price);

        if price < 0 {
            self.queue.push(BookEvent::ReplaceReject {
                order_id: order_id.clone(),
                reason: ReplaceRejectReason::InvalidPrice,
            });
            return;
        }
        if new_total <= filled || Quantity::try_from(new_total).is_err() {
            self.queue.push(BookEvent::ReplaceReject {
                order_id: order_id.clone(),
                reason: ReplaceRejectReason::QuantityBelowFilled,
            });
            return;
        }

        // Validation passed; take the order out and apply the change.
        let mut order = if let Some((side, level_price)) = resting {
            self.index.remove(order_id);
            let book_side = match side {
                Side::Buy => &mut self.bids,
                Side::Sell => &mut self.asks,
            };
            book_side
                .remove(order_id, level_price)
                .expect("indexed order is resting")
        } else {
            self.stops.remove(order_id).expect("stop registry order")
        };

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            order.quantity = new_total as Quantity;
            order.remaining_qty = (new_total - filled) as Quantity;
        }
        order.price = price;
        order.accept();

        self.queue.push(BookEvent::Replace {
            order: order.clone(),
            qty_delta,
            new_price: price,
        });
        tracing::debug!(%order_id, qty_delta, price, "order replaced");

        if in_stops {
            // A dormant stop keeps its dormancy; only its terms change.
            self.stops.insert(order);
        } else {
            self.run(order);
        }
    }

    // =================================================================
    // Event delivery
    // =================================================================

    /// Deliver all queued events to the listener in emission order, then
    /// clear the queue. No-op if no listener is attached.
    pub fn perform_callbacks(&mut self) {
        let Some(listener) = &mut self.listener else {
            return;
        };
        self.queue.drain_into(listener.as_mut());
    }

    /// Number of queued, undelivered events.
    #[must_use]
    pub fn pending_callbacks(&self) -> usize {
        self.queue.len()
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Best (highest) bid price, or `None` if no bids.
    #[must_use]
    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    /// Best (lowest) ask price, or `None` if no asks.
    #[must_use]
    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// Spread = best ask - best bid. `None` if either side is empty.
    #[must_use]
    pub fn spread(&self) -> Option<Price> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Midpoint of the best bid and ask. `None` if either side is empty.
    #[must_use]
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(f64::from(bid + ask) / 2.0),
            _ => None,
        }
    }

    /// Price of the most recent trade, if any.
    #[must_use]
    pub fn last_trade_price(&self) -> Option<Price> {
        self.last_trade_price
    }

    /// Number of live resting orders (dormant stops excluded).
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    /// Number of dormant stop orders.
    #[must_use]
    pub fn stop_order_count(&self) -> usize {
        self.stops.len()
    }

    /// Number of distinct bid price levels.
    #[must_use]
    pub fn bid_depth(&self) -> usize {
        self.bids.depth()
    }

    /// Number of distinct ask price levels.
    #[must_use]
    pub fn ask_depth(&self) -> usize {
        self.asks.depth()
    }

    /// Returns `true` if nothing rests on either side or in the stop
    /// registry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() && self.stops.is_empty()
    }

    /// Is this order currently live (resting or dormant)?
    #[must_use]
    pub fn contains_order(&self, order_id: &OrderId) -> bool {
        self.index.contains_key(order_id) || self.stops.contains(order_id)
    }

    // =================================================================
    // Internals
    // =================================================================

    /// Run a live order through matching and residual disposition, then
    /// activate any stops its prints trigger, to completion. Activated
    /// stops re-enter the same path, so cascading triggers are handled
    /// without recursion.
    fn run(&mut self, order: Order) {
        let mut pending = VecDeque::from([order]);
        while let Some(next) = pending.pop_front() {
            let prints = self.execute(next);
            for print in prints {
                self.last_trade_price = Some(print);
                for stop in self.stops.take_triggered(print) {
                    tracing::debug!(order_id = %stop.id, print, "stop order activated");
                    pending.push_back(stop);
                }
            }
        }
    }

    /// Match one live order and dispose of its residual. Returns the
    /// trade prints, in execution order.
    fn execute(&mut self, mut order: Order) -> Vec<Price> {
        let opposite = match order.side {
            Side::Buy => &mut self.asks,
            Side::Sell => &mut self.bids,
        };
        let fills = match_order(&mut order, opposite, &mut self.trade_seq);

        let mut prints = Vec::with_capacity(fills.len());
        for fill in fills {
            prints.push(fill.trade.price);

            if fill.maker_done() {
                self.index.remove(&fill.maker.id);
                self.retired.insert(fill.maker.id.clone(), OrderStatus::Filled);
            }

            // One fill event per trade leg: taker first, then the maker
            // mirror.
            self.queue.push(BookEvent::Fill {
                order: fill.taker.clone(),
                matched_order: fill.maker.clone(),
                fill_qty: fill.trade.quantity,
                fill_price: fill.trade.price,
            });
            self.queue.push(BookEvent::Fill {
                order: fill.maker,
                matched_order: fill.taker,
                fill_qty: fill.trade.quantity,
                fill_price: fill.trade.price,
            });
        }

        if order.is_filled() {
            self.retired.insert(order.id.clone(), OrderStatus::Filled);
        } else if order.immediate_or_cancel || order.is_market() {
            // IOC remainders and unmatched market remainders are
            // canceled, never rested: a market order has no valid
            // resting price.
            order.cancel();
            self.retired.insert(order.id.clone(), OrderStatus::Canceled);
            self.queue.push(BookEvent::Cancel { order });
        } else {
            self.index.insert(order.id.clone(), (order.side, order.price));
            match order.side {
                Side::Buy => self.bids.insert(order),
                Side::Sell => self.asks.insert(order),
            }
        }

        prints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book() -> OrderBook {
        OrderBook::new(Symbol::new("AAPL"))
    }

    #[test]
    fn resting_orders_and_spread() {
        let mut book = book();
        book.add(Order::limit("B1", Side::Buy, 4800, 100)).unwrap();
        book.add(Order::limit("S1", Side::Sell, 5300, 100)).unwrap();

        assert_eq!(book.best_bid(), Some(4800));
        assert_eq!(book.best_ask(), Some(5300));
        assert_eq!(book.spread(), Some(500));
        assert_eq!(book.mid_price(), Some(5050.0));
        assert_eq!(book.order_count(), 2);
        assert_eq!(book.last_trade_price(), None);
    }

    #[test]
    fn exact_cross_empties_book() {
        let mut book = book();
        book.add(Order::limit("S1", Side::Sell, 5000, 100)).unwrap();
        book.add(Order::limit("B1", Side::Buy, 5000, 100)).unwrap();

        assert!(book.is_empty());
        assert_eq!(book.last_trade_price(), Some(5000));
        // accept, accept, fill x2 legs
        assert_eq!(book.pending_callbacks(), 4);
    }

    #[test]
    fn duplicate_id_is_contract_error() {
        let mut book = book();
        book.add(Order::limit("O1", Side::Buy, 5000, 100)).unwrap();
        let dup = book.add(Order::limit("O1", Side::Buy, 4900, 50));
        assert!(matches!(dup, Err(BookError::DuplicateOrder(_))));
    }

    #[test]
    fn zero_quantity_rejected() {
        let mut book = book();
        book.add(Order::limit("O1", Side::Buy, 5000, 0)).unwrap();
        assert!(book.is_empty());
        assert_eq!(book.pending_callbacks(), 1);
    }

    #[test]
    fn negative_price_rejected() {
        let mut book = book();
        book.add(Order::limit("O1", Side::Buy, -100, 10)).unwrap();
        book.add(Order::limit("O2", Side::Buy, 5000, 10).with_stop_price(-1))
            .unwrap();
        assert!(book.is_empty());
    }

    #[test]
    fn market_order_remainder_is_canceled() {
        let mut book = book();
        book.add(Order::limit("S1", Side::Sell, 5100, 50)).unwrap();
        book.add(Order::market("M1", Side::Buy, 125)).unwrap();

        // 50 filled at 5100, remaining 75 canceled, nothing rests.
        assert!(book.is_empty());
        assert_eq!(book.last_trade_price(), Some(5100));
    }

    #[test]
    fn cancel_then_cancel_again() {
        let mut book = book();
        book.add(Order::limit("B1", Side::Buy, 4800, 100)).unwrap();

        book.cancel(&OrderId::new("B1"));
        assert!(book.is_empty());

        // Second cancel must not mutate anything and must say why.
        book.cancel(&OrderId::new("B1"));
        book.cancel(&OrderId::new("GHOST"));
        assert_eq!(book.pending_callbacks(), 4);
    }

    #[test]
    fn replace_loses_time_priority() {
        let mut book = book();
        book.add(Order::limit("B1", Side::Buy, 5000, 100)).unwrap();
        book.add(Order::limit("B2", Side::Buy, 5000, 100)).unwrap();

        // B1 was first in the queue; replacing it sends it to the back.
        book.replace(&OrderId::new("B1"), 50, None);

        book.add(Order::limit("S1", Side::Sell, 5000, 100)).unwrap();
        // B2 now has priority and is fully filled; B1 untouched.
        assert!(book.contains_order(&OrderId::new("B1")));
        assert!(!book.contains_order(&OrderId::new("B2")));
    }

    #[test]
    fn replace_price_change_can_match() {
        let mut book = book();
        book.add(Order::limit("S1", Side::Sell, 5300, 100)).unwrap();
        book.add(Order::limit("B1", Side::Buy, 4800, 100)).unwrap();
        assert_eq!(book.order_count(), 2);

        book.replace(&OrderId::new("B1"), 0, Some(5300));
        assert!(book.is_empty(), "repriced bid crosses the resting ask");
        assert_eq!(book.last_trade_price(), Some(5300));
    }

    #[test]
    fn replace_below_filled_rejected() {
        let mut book = book();
        book.add(Order::limit("S1", Side::Sell, 5000, 200)).unwrap();
        book.add(Order::limit("B1", Side::Buy, 5000, 80)).unwrap();
        // S1 has 80 filled, 120 remaining.

        book.replace(&OrderId::new("S1"), -150, None);
        // 200 - 150 = 50 < 80 filled: rejected, order unchanged.
        assert!(book.contains_order(&OrderId::new("S1")));
        assert_eq!(book.order_count(), 1);
    }

    #[test]
    fn fok_infeasible_rejects_without_side_effects() {
        let mut book = book();
        book.add(Order::limit("S1", Side::Sell, 5000, 50)).unwrap();

        book.add(
            Order::limit("F1", Side::Buy, 5000, 100)
                .with_all_or_none()
                .with_immediate_or_cancel(),
        )
        .unwrap();

        assert_eq!(book.order_count(), 1, "book unchanged");
        assert_eq!(book.last_trade_price(), None, "zero fills");
    }

    #[test]
    fn fok_feasible_fills_completely() {
        let mut book = book();
        book.add(Order::limit("S1", Side::Sell, 5000, 60)).unwrap();
        book.add(Order::limit("S2", Side::Sell, 5000, 60)).unwrap();

        book.add(
            Order::limit("F1", Side::Buy, 5000, 100)
                .with_all_or_none()
                .with_immediate_or_cancel(),
        )
        .unwrap();

        assert_eq!(book.order_count(), 1);
        assert!(book.contains_order(&OrderId::new("S2")));
        assert!(!book.contains_order(&OrderId::new("F1")));
    }

    #[test]
    fn dormant_stop_activates_on_print() {
        let mut book = book();
        book.add(Order::market("SS1", Side::Sell, 50).with_stop_price(5000))
            .unwrap();
        assert_eq!(book.stop_order_count(), 1);
        assert_eq!(book.order_count(), 0, "dormant stops are off the book");

        // A print at 5000 triggers the sell stop; it becomes a market
        // order and takes the resting bid.
        book.add(Order::limit("B1", Side::Buy, 5000, 100)).unwrap();
        book.add(Order::limit("S1", Side::Sell, 5000, 30)).unwrap();

        assert_eq!(book.stop_order_count(), 0, "single fire");
        assert!(!book.contains_order(&OrderId::new("SS1")));
        // B1: 30 to S1, 50 to the activated stop.
        assert_eq!(book.order_count(), 1);
    }

    #[test]
    fn stop_already_triggered_activates_immediately() {
        let mut book = book();
        book.add(Order::limit("S1", Side::Sell, 5000, 100)).unwrap();
        book.add(Order::limit("B1", Side::Buy, 5000, 100)).unwrap();
        assert_eq!(book.last_trade_price(), Some(5000));

        // Buy stop at 4900: the last print (5000) is already at or
        // through it, so it goes live instead of dormant.
        book.add(Order::limit("BS1", Side::Buy, 4800, 100).with_stop_price(4900))
            .unwrap();
        assert_eq!(book.stop_order_count(), 0);
        assert!(book.contains_order(&OrderId::new("BS1")));
        assert_eq!(book.best_bid(), Some(4800));
    }

    #[test]
    fn cancel_dormant_stop() {
        let mut book = book();
        book.add(Order::market("SS1", Side::Sell, 50).with_stop_price(4000))
            .unwrap();
        book.cancel(&OrderId::new("SS1"));
        assert!(book.is_empty());
        // Cancel again: already canceled.
        book.cancel(&OrderId::new("SS1"));
        assert_eq!(book.pending_callbacks(), 3);
    }

    #[test]
    fn replace_dormant_stop_stays_dormant() {
        let mut book = book();
        book.add(Order::limit("SS1", Side::Sell, 4900, 50).with_stop_price(4000))
            .unwrap();

        book.replace(&OrderId::new("SS1"), 25, Some(4850));
        assert_eq!(book.stop_order_count(), 1);
        assert_eq!(book.order_count(), 0);
    }
}
