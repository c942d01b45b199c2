//! One side of the order book.
//!
//! A `BookSide` is a `BTreeMap<Price, PriceLevel>`: key order gives price
//! priority for free. The bid side's best price is the highest key, the
//! ask side's the lowest. A level with zero orders is removed.

use std::collections::BTreeMap;

use tickbook_types::{Order, OrderId, Price, Side};

use crate::price_level::PriceLevel;

/// Ordered collection of price levels for one side of the book.
#[derive(Debug)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<Price, PriceLevel>,
}

impl BookSide {
    /// Create an empty side.
    #[must_use]
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Rest an order at its limit price. Market orders never rest, so the
    /// caller guarantees `order.price > 0`.
    pub fn insert(&mut self, order: Order) {
        debug_assert_eq!(order.side, self.side);
        debug_assert!(!order.is_market(), "market orders have no resting price");
        self.levels
            .entry(order.price)
            .or_insert_with(|| PriceLevel::new(order.price))
            .push_back(order);
    }

    /// Remove a resting order from its level, dropping the level if it
    /// becomes empty. Returns the removed order.
    pub fn remove(&mut self, order_id: &OrderId, price: Price) -> Option<Order> {
        let level = self.levels.get_mut(&price)?;
        let order = level.remove_order(order_id)?;
        if level.is_empty() {
            self.levels.remove(&price);
        }
        Some(order)
    }

    /// Look up a resting order without removing it.
    #[must_use]
    pub fn get(&self, order_id: &OrderId, price: Price) -> Option<&Order> {
        self.levels.get(&price)?.get(order_id)
    }

    /// Best price on this side: highest bid, lowest ask.
    #[must_use]
    pub fn best_price(&self) -> Option<Price> {
        match self.side {
            Side::Buy => self.levels.keys().next_back().copied(),
            Side::Sell => self.levels.keys().next().copied(),
        }
    }

    /// Mutable access to the best level.
    pub fn best_level_mut(&mut self) -> Option<&mut PriceLevel> {
        match self.side {
            Side::Buy => self.levels.values_mut().next_back(),
            Side::Sell => self.levels.values_mut().next(),
        }
    }

    /// Mutable access to the level at `price`.
    pub fn level_mut(&mut self, price: Price) -> Option<&mut PriceLevel> {
        self.levels.get_mut(&price)
    }

    /// Drop the level at `price` if it holds no orders.
    pub fn prune(&mut self, price: Price) {
        if self.levels.get(&price).is_some_and(PriceLevel::is_empty) {
            self.levels.remove(&price);
        }
    }

    /// Iterate levels from best to worst.
    pub fn levels(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match self.side {
            Side::Buy => Box::new(self.levels.values().rev()),
            Side::Sell => Box::new(self.levels.values()),
        }
    }

    /// Gross resting quantity the taker could cross, walking levels in
    /// priority order and stopping at the first non-crossable price.
    /// All-or-none makers count in full here; feasibility questions go
    /// through [`crate::conditional::fully_fillable`] instead.
    #[must_use]
    pub fn crossable_quantity(&self, taker: &Order) -> u64 {
        debug_assert_eq!(taker.side, self.side.opposite());
        let mut available = 0u64;
        for level in self.levels() {
            if !taker.crosses_at(level.price) {
                break;
            }
            available += level.total_quantity();
        }
        available
    }

    /// Number of distinct price levels.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Number of resting orders across all levels.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.levels.values().map(PriceLevel::len).sum()
    }

    /// Returns `true` if no orders rest on this side.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
