//! A single price level in the order book.
//!
//! Orders at the same price are stored in FIFO order (time priority)
//! using a [`VecDeque`]. The level keeps a running aggregate of its
//! orders' remaining quantity, maintained incrementally rather than
//! recomputed on demand.

use std::collections::VecDeque;

use tickbook_types::{Order, OrderId, Price, Quantity};

/// A single price level containing all orders resting at that price.
///
/// The front of the deque has the highest time priority and fills first.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    /// The price at this level.
    pub price: Price,
    orders: VecDeque<Order>,
    /// Sum of all resting orders' `remaining_qty`.
    total_qty: u64,
}

impl PriceLevel {
    /// Create a new empty price level.
    #[must_use]
    pub fn new(price: Price) -> Self {
        Self {
            price,
            orders: VecDeque::new(),
            total_qty: 0,
        }
    }

    /// Add an order to the back of this level (lowest time priority).
    pub fn push_back(&mut self, order: Order) {
        self.total_qty += u64::from(order.remaining_qty);
        self.orders.push_back(order);
    }

    /// Peek at the front order without removing it.
    #[must_use]
    pub fn front(&self) -> Option<&Order> {
        self.orders.front()
    }

    /// Mutable access to the front order. Callers that reduce its
    /// remaining quantity must report the reduction via [`Self::reduce`].
    pub fn front_mut(&mut self) -> Option<&mut Order> {
        self.orders.front_mut()
    }

    /// Remove and return the front (oldest) order.
    pub fn pop_front(&mut self) -> Option<Order> {
        let order = self.orders.pop_front()?;
        self.total_qty = self.total_qty.saturating_sub(u64::from(order.remaining_qty));
        Some(order)
    }

    /// Position of the first maker the taker can legally fill: FIFO
    /// order, skipping all-or-none makers whose remaining quantity
    /// exceeds what the taker has left.
    #[must_use]
    pub fn position_fillable(&self, taker_remaining: Quantity) -> Option<usize> {
        self.orders
            .iter()
            .position(|o| !o.all_or_none || o.remaining_qty <= taker_remaining)
    }

    /// Mutable access to the order at `pos`. Callers that reduce its
    /// remaining quantity must report the reduction via [`Self::reduce`].
    pub fn get_mut(&mut self, pos: usize) -> Option<&mut Order> {
        self.orders.get_mut(pos)
    }

    /// Remove the order at `pos`.
    pub fn remove_at(&mut self, pos: usize) -> Option<Order> {
        let order = self.orders.remove(pos)?;
        self.total_qty = self.total_qty.saturating_sub(u64::from(order.remaining_qty));
        Some(order)
    }

    /// Remove a specific order by ID. Returns the removed order, or `None`.
    pub fn remove_order(&mut self, order_id: &OrderId) -> Option<Order> {
        let pos = self.orders.iter().position(|o| o.id == *order_id)?;
        let order = self.orders.remove(pos)?;
        self.total_qty = self.total_qty.saturating_sub(u64::from(order.remaining_qty));
        Some(order)
    }

    /// Record that `qty` was filled out of this level's aggregate.
    pub fn reduce(&mut self, qty: Quantity) {
        debug_assert!(u64::from(qty) <= self.total_qty);
        self.total_qty = self.total_qty.saturating_sub(u64::from(qty));
    }

    /// Total remaining quantity across all orders at this level.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.total_qty
    }

    /// Iterate the resting orders in time-priority order.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    /// Find a resting order by ID.
    #[must_use]
    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == *order_id)
    }

    /// Returns `true` if there are no orders at this level.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Number of orders at this level.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Verify the incremental aggregate against a fresh sum. Used by
    /// debug assertions in the matching loop.
    #[must_use]
    pub fn aggregate_consistent(&self) -> bool {
        self.total_qty == self.orders.iter().map(|o| u64::from(o.remaining_qty)).sum::<u64>()
    }
}
