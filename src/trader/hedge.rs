//! Mandatory delta-hedging of resting-order fills.
//!
//! Every fill on an ETF order is immediately offset on the future, priced at
//! the venue extreme so the hedge is marketable. Hedge issuance is
//! unconditional; the dispatcher owns the blocking retry against the rate
//! window. The running delta is telemetry: it moves out on an ETF fill and
//! back when the hedge confirmation lands, so a quiet book reads zero.

use std::collections::HashMap;

use tracing::{info, warn};

use super::events::Side;

/// A hedge order awaiting its fill confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HedgeTicket {
    pub id: u64,
    pub side: Side,
    /// Volume the hedge was sized to.
    pub volume: u64,
}

/// The hedge a fill demands: opposite side, priced to cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HedgeRequest {
    pub side: Side,
    pub price: u64,
    pub volume: u64,
}

/// Tracks pending hedge tickets and the running delta counter.
#[derive(Debug)]
pub struct HedgeManager {
    pending: HashMap<u64, HedgeTicket>,
    /// Net directional exposure accumulated from fills, reconciled by hedge
    /// confirmations. Diagnostic only, never a gate.
    delta: i64,
    /// Marketable sell price: venue minimum rounded up to tick.
    min_bid_tick: u64,
    /// Marketable buy price: venue maximum rounded down to tick.
    max_ask_tick: u64,
}

impl HedgeManager {
    pub fn new(min_bid_tick: u64, max_ask_tick: u64) -> Self {
        Self {
            pending: HashMap::new(),
            delta: 0,
            min_bid_tick,
            max_ask_tick,
        }
    }

    /// The hedge demanded by a fill on `filled_side`, and the delta move the
    /// fill itself produced.
    pub fn request_for_fill(&mut self, filled_side: Side, volume: u64) -> HedgeRequest {
        match filled_side {
            Side::Buy => {
                self.delta += volume as i64;
                // Bought the ETF: sell the future at its minimum marketable
                // price so the order crosses whatever is bid.
                HedgeRequest {
                    side: Side::Sell,
                    price: self.min_bid_tick,
                    volume,
                }
            }
            Side::Sell => {
                self.delta -= volume as i64;
                HedgeRequest {
                    side: Side::Buy,
                    price: self.max_ask_tick,
                    volume,
                }
            }
        }
    }

    /// Track a sent hedge by its id.
    pub fn register(&mut self, id: u64, side: Side, volume: u64) {
        self.pending.insert(id, HedgeTicket { id, side, volume });
    }

    /// Apply a hedge-fill confirmation. Returns `false` for ids that are not
    /// pending hedges (the caller may then treat the event as stray).
    pub fn apply_confirmation(&mut self, id: u64, price: u64, volume: u64) -> bool {
        let Some(ticket) = self.pending.remove(&id) else {
            return false;
        };
        if volume == 0 {
            // The venue reports zero price and volume for an unsuccessful
            // hedge; the exposure from the triggering fill stands uncovered.
            warn!(
                id,
                expected = ticket.volume,
                delta = self.delta,
                "hedge order came back unfilled"
            );
            return true;
        }
        match ticket.side {
            Side::Buy => self.delta += volume as i64,
            Side::Sell => self.delta -= volume as i64,
        }
        info!(id, volume, price, delta = self.delta, "hedge filled");
        true
    }

    /// Running delta counter.
    pub fn delta(&self) -> i64 {
        self.delta
    }

    /// Hedges awaiting confirmation.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop all tickets. Used on disconnect.
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> HedgeManager {
        HedgeManager::new(100, 214_700)
    }

    #[test]
    fn test_buy_fill_demands_marketable_sell() {
        let mut hedger = manager();
        let request = hedger.request_for_fill(Side::Buy, 10);
        assert_eq!(request.side, Side::Sell);
        assert_eq!(request.price, 100);
        assert_eq!(request.volume, 10);
        assert_eq!(hedger.delta(), 10);
    }

    #[test]
    fn test_sell_fill_demands_marketable_buy() {
        let mut hedger = manager();
        let request = hedger.request_for_fill(Side::Sell, 7);
        assert_eq!(request.side, Side::Buy);
        assert_eq!(request.price, 214_700);
        assert_eq!(hedger.delta(), -7);
    }

    #[test]
    fn test_confirmation_reconciles_delta() {
        let mut hedger = manager();
        let request = hedger.request_for_fill(Side::Buy, 10);
        hedger.register(42, request.side, request.volume);
        assert_eq!(hedger.pending_count(), 1);

        assert!(hedger.apply_confirmation(42, 9900, 10));
        assert_eq!(hedger.pending_count(), 0);
        // ETF buy (+10) offset by the hedge sell fill (-10).
        assert_eq!(hedger.delta(), 0);
    }

    #[test]
    fn test_unknown_confirmation_rejected() {
        let mut hedger = manager();
        assert!(!hedger.apply_confirmation(99, 9900, 10));
        assert_eq!(hedger.delta(), 0);
    }

    #[test]
    fn test_unfilled_hedge_retires_ticket_but_leaves_delta() {
        let mut hedger = manager();
        let request = hedger.request_for_fill(Side::Buy, 10);
        hedger.register(42, request.side, request.volume);

        assert!(hedger.apply_confirmation(42, 0, 0));
        assert_eq!(hedger.pending_count(), 0);
        assert_eq!(hedger.delta(), 10);
    }
}
