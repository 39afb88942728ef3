//! Quote placement decisions and resting-order sweeps.
//!
//! Makers are pure decision functions over the ledger and the latest books:
//! they return the cancels and placements one evaluation wants, and the
//! dispatcher pushes each through the rate gate. A cancel refused by the
//! gate is simply re-proposed on the next evaluation, so nothing here keeps
//! retry state.

use super::book::{BookSnapshot, FutureTouch};
use super::estimator::TargetQuotes;
use super::events::{Lifespan, Side};
use super::ledger::OrderLedger;
use super::sizer::QuoteSizer;

/// A placement the maker wants sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteIntent {
    pub side: Side,
    pub price: u64,
    pub volume: u64,
    pub lifespan: Lifespan,
}

/// One evaluation's worth of order actions, cancels first.
#[derive(Debug, Clone, Default)]
pub struct MakerActions {
    /// Order ids to cancel.
    pub cancels: Vec<u64>,
    /// New orders to place.
    pub places: Vec<QuoteIntent>,
}

impl MakerActions {
    pub fn is_empty(&self) -> bool {
        self.cancels.is_empty() && self.places.is_empty()
    }
}

/// Single-quote discipline: at most one resting order per side, re-quoted
/// when the theo target moves outside the tolerance band.
#[derive(Debug, Clone, Copy)]
pub struct SingleQuoteMaker {
    tick_size: u64,
    position_limit: i64,
    /// Re-quote when |target - live| exceeds this many ticks.
    tolerance_ticks: u64,
}

impl SingleQuoteMaker {
    pub fn new(tick_size: u64, position_limit: i64, tolerance_ticks: u64) -> Self {
        Self {
            tick_size,
            position_limit,
            tolerance_ticks,
        }
    }

    /// Decide this cycle's actions from fresh targets.
    ///
    /// A side frees up only once its cancel is confirmed and the entry has
    /// left the ledger, so a cancel decided here never overlaps with a
    /// placement on the same side in the same cycle.
    pub fn evaluate(
        &self,
        targets: TargetQuotes,
        ledger: &OrderLedger,
        sizer: &QuoteSizer,
    ) -> MakerActions {
        let mut actions = MakerActions::default();
        let position = ledger.position();
        let (bid_volume, ask_volume) = sizer.volumes(position);

        self.evaluate_side(
            Side::Sell,
            targets.ask,
            ask_volume,
            position > -self.position_limit,
            ledger,
            &mut actions,
        );
        self.evaluate_side(
            Side::Buy,
            targets.bid,
            bid_volume,
            position < self.position_limit,
            ledger,
            &mut actions,
        );
        actions
    }

    fn evaluate_side(
        &self,
        side: Side,
        target: Option<u64>,
        volume: u64,
        within_limit: bool,
        ledger: &OrderLedger,
        actions: &mut MakerActions,
    ) {
        match ledger.single_on_side(side) {
            Some(live) => {
                if let Some(price) = target {
                    if live.cancellable() && self.outside_band(price, live.price) {
                        actions.cancels.push(live.id);
                    }
                }
            }
            None => {
                if let Some(price) = target {
                    if price != 0 && volume != 0 && within_limit {
                        actions.places.push(QuoteIntent {
                            side,
                            price,
                            volume,
                            lifespan: Lifespan::Day,
                        });
                    }
                }
            }
        }
    }

    fn outside_band(&self, target: u64, live: u64) -> bool {
        target.abs_diff(live) > self.tolerance_ticks * self.tick_size
    }
}

/// Ladder quoting: lot-sized day orders at every tick between the
/// future-implied boundary and the ETF touch, replenished up to a
/// remaining-capacity budget per side.
#[derive(Debug, Clone, Copy)]
pub struct LadderMaker {
    tick_size: u64,
    lot_size: u64,
    position_limit: i64,
    /// Ladder starts this many ticks inside the future touch.
    offset_ticks: u64,
    /// Book-shape sweep cutoff, in standard lots of cumulative depth.
    sweep_depth_lots: u64,
}

impl LadderMaker {
    pub fn new(
        tick_size: u64,
        lot_size: u64,
        position_limit: i64,
        offset_ticks: u64,
        sweep_depth_lots: u64,
    ) -> Self {
        Self {
            tick_size,
            lot_size,
            position_limit,
            offset_ticks,
            sweep_depth_lots,
        }
    }

    /// Cancel resting orders the future's move has made a guaranteed loss:
    /// bids above the future ask, asks below the future bid. Runs on future
    /// updates, not ETF updates.
    pub fn future_sweep(&self, future: FutureTouch, ledger: &OrderLedger) -> Vec<u64> {
        let mut cancels = Vec::new();
        for (id, price) in ledger.cancellable_on_side(Side::Buy) {
            if price > future.ask {
                cancels.push(id);
            }
        }
        for (id, price) in ledger.cancellable_on_side(Side::Sell) {
            if price < future.bid {
                cancels.push(id);
            }
        }
        cancels
    }

    /// Cancel resting orders sitting at depths unlikely to fill: asks at or
    /// beyond the level where cumulative ask depth first reaches the sweep
    /// multiple, and the bid-side mirror.
    pub fn book_shape_sweep(&self, etf: &BookSnapshot, ledger: &OrderLedger) -> Vec<u64> {
        let target = self.sweep_depth_lots * self.lot_size;
        let cutoff_ask = BookSnapshot::depth_cutoff(&etf.asks, target);
        let cutoff_bid = BookSnapshot::depth_cutoff(&etf.bids, target);

        let mut cancels = Vec::new();
        for (id, price) in ledger.cancellable_on_side(Side::Buy) {
            if cutoff_bid != 0 && price <= cutoff_bid {
                cancels.push(id);
            }
        }
        for (id, price) in ledger.cancellable_on_side(Side::Sell) {
            if cutoff_ask != 0 && price >= cutoff_ask {
                cancels.push(id);
            }
        }
        cancels
    }

    /// Fill in missing ladder levels, bounded by per-side capacity.
    pub fn build(
        &self,
        etf: &BookSnapshot,
        future: FutureTouch,
        ledger: &OrderLedger,
    ) -> Vec<QuoteIntent> {
        let position = ledger.position();
        let lot = self.lot_size as i64;
        let mut sell_budget =
            ((self.position_limit + position) / lot - ledger.count_on_side(Side::Sell) as i64)
                .max(0);
        let mut buy_budget =
            ((self.position_limit - position) / lot - ledger.count_on_side(Side::Buy) as i64)
                .max(0);

        let offset = self.offset_ticks * self.tick_size;
        let min_ask = future.ask + offset;
        let max_bid = future.bid.saturating_sub(offset);
        let etf_ask = etf.ask_touch();
        let etf_bid = etf.bid_touch();

        let mut places = Vec::new();
        let mut price = min_ask;
        while price < etf_ask {
            if sell_budget == 0 {
                break;
            }
            if !ledger.price_quoted(Side::Sell, price) {
                places.push(QuoteIntent {
                    side: Side::Sell,
                    price,
                    volume: self.lot_size,
                    lifespan: Lifespan::Day,
                });
                sell_budget -= 1;
            }
            price += self.tick_size;
        }

        let mut price = etf_bid;
        while price < max_bid {
            if buy_budget == 0 {
                break;
            }
            if !ledger.price_quoted(Side::Buy, price) {
                places.push(QuoteIntent {
                    side: Side::Buy,
                    price,
                    volume: self.lot_size,
                    lifespan: Lifespan::Day,
                });
                buy_budget -= 1;
            }
            price += self.tick_size;
        }

        places
    }
}
