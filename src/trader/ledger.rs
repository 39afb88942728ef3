//! Order ledger: every outstanding order, its lifecycle state, and the
//! signed ETF position.
//!
//! The ledger owns the single id space (resting orders and hedge orders
//! alike) and is the only mutator of `position`. Entries leave the map only
//! when the venue reports remaining volume of zero, via status or via an
//! order error treated as terminal.

use std::collections::HashMap;

use tracing::warn;

use super::events::{Lifespan, Side};

/// Lifecycle state of a tracked order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    /// Insert sent, no venue report seen yet.
    Pending,
    /// Resting in the book.
    Live,
    /// Partially traded, remainder still resting.
    PartiallyFilled,
    /// Cancel sent, awaiting the zero-remaining confirmation.
    Cancelling,
}

/// A tracked outstanding order.
#[derive(Debug, Clone)]
pub struct RestingOrder {
    pub id: u64,
    pub side: Side,
    pub price: u64,
    /// Original volume.
    pub volume: u64,
    /// Lots traded so far.
    pub filled: u64,
    pub lifespan: Lifespan,
    pub state: OrderState,
}

impl RestingOrder {
    pub fn new(id: u64, side: Side, price: u64, volume: u64, lifespan: Lifespan) -> Self {
        Self {
            id,
            side,
            price,
            volume,
            filled: 0,
            lifespan,
            state: OrderState::Pending,
        }
    }

    /// Lots still working.
    pub fn remaining(&self) -> u64 {
        self.volume.saturating_sub(self.filled)
    }

    /// Whether a sweep may still cancel this order. Orders already in
    /// `Cancelling` must not be cancelled twice.
    pub fn cancellable(&self) -> bool {
        self.state != OrderState::Cancelling
    }
}

/// Tracks outstanding orders and the signed position they have produced.
#[derive(Debug, Default)]
pub struct OrderLedger {
    orders: HashMap<u64, RestingOrder>,
    /// Signed ETF position in lots.
    position: i64,
    /// Next id in the shared monotonic id space.
    next_id: u64,
}

impl OrderLedger {
    pub fn new() -> Self {
        Self {
            orders: HashMap::new(),
            position: 0,
            next_id: 1,
        }
    }

    /// Allocate the next order id. Shared by resting and hedge orders.
    pub fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Current signed position.
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Record a sent insert. The order starts `Pending` and counts against
    /// per-side discipline immediately.
    pub fn record_insert(&mut self, order: RestingOrder) {
        self.orders.insert(order.id, order);
    }

    /// Look up an order.
    pub fn get(&self, id: u64) -> Option<&RestingOrder> {
        self.orders.get(&id)
    }

    /// Whether the ledger is tracking this id.
    pub fn contains(&self, id: u64) -> bool {
        self.orders.contains_key(&id)
    }

    /// Mark an order as awaiting cancel confirmation.
    pub fn mark_cancelling(&mut self, id: u64) {
        if let Some(order) = self.orders.get_mut(&id) {
            order.state = OrderState::Cancelling;
        }
    }

    /// Apply a venue status report. Remaining volume of zero removes the
    /// entry; otherwise the lifecycle state is refreshed.
    pub fn apply_status(&mut self, id: u64, fill_volume: u64, remaining_volume: u64) {
        if remaining_volume == 0 {
            self.orders.remove(&id);
            return;
        }
        if let Some(order) = self.orders.get_mut(&id) {
            if fill_volume > order.filled {
                order.filled = fill_volume;
            }
            // A cancel in flight stays Cancelling until confirmed gone.
            if order.state != OrderState::Cancelling {
                order.state = if order.filled > 0 {
                    OrderState::PartiallyFilled
                } else {
                    OrderState::Live
                };
            }
        }
    }

    /// Apply a fill to position and the order's filled counter. Returns the
    /// side of the filled order so the caller can hedge; `None` for ids the
    /// ledger does not know (already removed, or a hedge id).
    pub fn apply_fill(&mut self, id: u64, volume: u64) -> Option<Side> {
        let order = self.orders.get_mut(&id)?;
        order.filled += volume;
        let side = order.side;
        match side {
            Side::Buy => self.position += volume as i64,
            Side::Sell => self.position -= volume as i64,
        }
        Some(side)
    }

    /// Any outstanding order on this side, in any state. Single-quote
    /// discipline refuses to place while this is true.
    pub fn side_occupied(&self, side: Side) -> bool {
        self.orders.values().any(|o| o.side == side)
    }

    /// Number of outstanding orders on a side.
    pub fn count_on_side(&self, side: Side) -> usize {
        self.orders.values().filter(|o| o.side == side).count()
    }

    /// The order on this side, under single-quote discipline. With several
    /// outstanding (ladder mode) an arbitrary one is returned; single-quote
    /// callers never let that happen.
    pub fn single_on_side(&self, side: Side) -> Option<&RestingOrder> {
        self.orders.values().find(|o| o.side == side)
    }

    /// Whether any outstanding order on `side` rests at `price`.
    pub fn price_quoted(&self, side: Side, price: u64) -> bool {
        self.orders
            .values()
            .any(|o| o.side == side && o.price == price)
    }

    /// Outstanding orders on a side that a sweep may still cancel.
    pub fn cancellable_on_side(&self, side: Side) -> Vec<(u64, u64)> {
        self.orders
            .values()
            .filter(|o| o.side == side && o.cancellable())
            .map(|o| (o.id, o.price))
            .collect()
    }

    /// Total outstanding orders.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Whether the ledger holds no orders.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Drop all order state. Used on disconnect, where the venue owns the
    /// true fate of anything still live.
    pub fn clear(&mut self) {
        if !self.orders.is_empty() {
            warn!(
                outstanding = self.orders.len(),
                "clearing ledger with orders outstanding"
            );
        }
        self.orders.clear();
    }
}
