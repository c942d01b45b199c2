//! Price-time priority crossing of an incoming order.
//!
//! [`match_order`] walks the opposite side best price first, FIFO within
//! a level, and fills `min(taker, maker)` at the maker's price until the
//! taker is done or no crossable liquidity remains. All-or-none applies
//! on both sides: an AON taker is pre-checked for full feasibility and
//! fills atomically or not at all, and an AON maker is skipped (keeping
//! its queue position) whenever the taker cannot absorb all of it.
//!
//! The function mutates the taker and the opposite side but decides
//! nothing about the residual — resting, IOC cancellation, and
//! fill-or-kill rejection stay with the caller.

use tickbook_types::{Order, Price, Side, Trade};

use crate::book_side::BookSide;
use crate::conditional::fully_fillable;

/// One executed fill: post-fill snapshots of both orders plus the trade.
#[derive(Debug, Clone)]
pub struct FillReport {
    /// The incoming order's state after this fill.
    pub taker: Order,
    /// The resting order's state after this fill.
    pub maker: Order,
    pub trade: Trade,
}

impl FillReport {
    /// Whether the maker finished this fill completely filled (and has
    /// left its price level).
    #[must_use]
    pub fn maker_done(&self) -> bool {
        self.maker.is_filled()
    }
}

/// Cross `taker` against `opposite`, producing zero or more fills.
///
/// Fills execute at the resting order's price, so price improvement goes
/// to the taker. Fully filled makers are removed from their level and
/// emptied levels from the side. `trade_seq` numbers trades across the
/// life of the book.
pub fn match_order(taker: &mut Order, opposite: &mut BookSide, trade_seq: &mut u64) -> Vec<FillReport> {
    debug_assert_eq!(taker.side, opposite.side().opposite());

    // All-or-none pre-check: commit to nothing unless the full quantity
    // would fill in the walk below.
    if taker.all_or_none && !fully_fillable(taker, opposite) {
        tracing::debug!(
            order_id = %taker.id,
            remaining = taker.remaining_qty,
            "all-or-none order cannot fill completely, no trade"
        );
        return Vec::new();
    }

    let mut fills = Vec::new();

    while taker.remaining_qty > 0 {
        let Some((price, pos)) = next_fillable(taker, opposite) else {
            break;
        };

        let level = opposite
            .level_mut(price)
            .expect("crossable level exists");
        let maker = level.get_mut(pos).expect("fillable maker exists");
        let fill_qty = taker.remaining_qty.min(maker.remaining_qty);

        taker.apply_fill(fill_qty);
        maker.apply_fill(fill_qty);
        let maker_snapshot = maker.clone();
        level.reduce(fill_qty);

        let trade = match taker.side {
            Side::Buy => Trade::new(*trade_seq, taker.id.clone(), maker_snapshot.id.clone(), price, fill_qty),
            Side::Sell => Trade::new(*trade_seq, maker_snapshot.id.clone(), taker.id.clone(), price, fill_qty),
        };
        *trade_seq += 1;

        tracing::debug!(
            taker = %taker.id,
            maker = %maker_snapshot.id,
            qty = fill_qty,
            price,
            "fill"
        );
        if maker_snapshot.is_filled() {
            level.remove_at(pos);
        }
        debug_assert!(level.aggregate_consistent());

        fills.push(FillReport {
            taker: taker.clone(),
            maker: maker_snapshot,
            trade,
        });

        opposite.prune(price);
    }

    fills
}

/// Locate the next maker to fill: the first crossable level (best price
/// first) that holds a maker the taker can legally fill, FIFO within the
/// level.
fn next_fillable(taker: &Order, opposite: &BookSide) -> Option<(Price, usize)> {
    for level in opposite.levels() {
        if !taker.crosses_at(level.price) {
            break;
        }
        if let Some(pos) = level.position_fillable(taker.remaining_qty) {
            return Some((level.price, pos));
        }
    }
    None
}
