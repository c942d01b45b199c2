//! Conditional-order management: dormant stops and AON/FOK feasibility.
//!
//! Stop orders live in a [`StopRegistry`] keyed by trigger price, off the
//! live book, until a trade print satisfies their trigger condition. A
//! buy stop triggers when a print rises to or through its stop price, a
//! sell stop when a print falls to or through it. A stop activates at
//! most once: triggered orders leave the registry before re-submission.

use std::collections::BTreeMap;

use tickbook_types::{Order, OrderId, Price, Side};

use crate::book_side::BookSide;

/// Can `order` fill its entire remaining quantity against `opposite`
/// right now? Drives fill-or-kill rejection and the all-or-none
/// pre-check.
///
/// This simulates the matching walk rather than summing gross crossable
/// quantity: an all-or-none maker only counts if the order could absorb
/// all of it at the point the walk reaches it, exactly as the matcher
/// will decide.
#[must_use]
pub fn fully_fillable(order: &Order, opposite: &BookSide) -> bool {
    let mut remaining = order.remaining_qty;
    for level in opposite.levels() {
        if remaining == 0 {
            break;
        }
        if !order.crosses_at(level.price) {
            break;
        }
        for maker in level.orders() {
            if remaining == 0 {
                break;
            }
            if maker.all_or_none && maker.remaining_qty > remaining {
                continue;
            }
            remaining -= remaining.min(maker.remaining_qty);
        }
    }
    remaining == 0
}

/// Registry of dormant stop orders, keyed by stop price per side.
///
/// Within one stop price, insertion order is preserved so simultaneous
/// triggers activate in submission order.
#[derive(Debug, Default)]
pub struct StopRegistry {
    /// Buy stops: trigger when a print is at or above the key.
    buy_stops: BTreeMap<Price, Vec<Order>>,
    /// Sell stops: trigger when a print is at or below the key.
    sell_stops: BTreeMap<Price, Vec<Order>>,
}

impl StopRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dormant stop order.
    pub fn insert(&mut self, order: Order) {
        debug_assert!(order.is_stop());
        let stops = match order.side {
            Side::Buy => &mut self.buy_stops,
            Side::Sell => &mut self.sell_stops,
        };
        stops.entry(order.stop_price).or_default().push(order);
    }

    /// Remove a dormant stop by ID (cancel / replace path).
    pub fn remove(&mut self, order_id: &OrderId) -> Option<Order> {
        for stops in [&mut self.buy_stops, &mut self.sell_stops] {
            let found = stops.iter().find_map(|(price, orders)| {
                orders.iter().position(|o| o.id == *order_id).map(|pos| (*price, pos))
            });
            if let Some((price, pos)) = found {
                let orders = stops.get_mut(&price)?;
                let order = orders.remove(pos);
                if orders.is_empty() {
                    stops.remove(&price);
                }
                return Some(order);
            }
        }
        None
    }

    /// Look up a dormant stop without removing it.
    #[must_use]
    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        self.buy_stops
            .values()
            .chain(self.sell_stops.values())
            .flatten()
            .find(|o| o.id == *order_id)
    }

    #[must_use]
    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.get(order_id).is_some()
    }

    /// Remove and return every stop triggered by a trade print at
    /// `price`. Buy stops with `stop_price <= price` and sell stops with
    /// `stop_price >= price` fire.
    pub fn take_triggered(&mut self, price: Price) -> Vec<Order> {
        let mut triggered = Vec::new();

        let buy_prices: Vec<Price> = self
            .buy_stops
            .range(..=price)
            .map(|(p, _)| *p)
            .collect();
        for p in buy_prices {
            if let Some(orders) = self.buy_stops.remove(&p) {
                triggered.extend(orders);
            }
        }

        let sell_prices: Vec<Price> = self
            .sell_stops
            .range(price..)
            .map(|(p, _)| *p)
            .collect();
        for p in sell_prices {
            if let Some(orders) = self.sell_stops.remove(&p) {
                triggered.extend(orders);
            }
        }

        if !triggered.is_empty() {
            tracing::debug!(print = price, count = triggered.len(), "stop orders triggered");
        }
        triggered
    }

    /// Number of dormant stops.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buy_stops.values().map(Vec::len).sum::<usize>()
            + self.sell_stops.values().map(Vec::len).sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buy_stops.is_empty() && self.sell_stops.is_empty()
    }
}
