//! Session event types consumed by the dispatcher.
//!
//! These mirror the callbacks the session layer delivers: book updates,
//! trade ticks, fills, order status, hedge confirmations, errors and
//! disconnect. The session layer owns the wire format; the trader core only
//! sees these values.

use super::book::Level;

/// The two correlated instruments the strategy trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instrument {
    /// The future, used as the fair-value anchor and the hedge leg.
    Future,
    /// The ETF, the instrument actively quoted.
    Etf,
}

impl Instrument {
    /// Index into per-instrument state arrays.
    pub fn index(self) -> usize {
        match self {
            Instrument::Future => 0,
            Instrument::Etf => 1,
        }
    }
}

/// Side of an order (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// The opposite side, used when hedging a fill.
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order duration policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifespan {
    /// Rests in the book until cancelled or end of day.
    Day,
    /// Executes immediately to the extent possible, remainder cancelled.
    FillAndKill,
}

/// A single event delivered by the session layer.
///
/// Events arrive one at a time; the dispatcher mutates all strategy state
/// inside that serial path.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Periodic order book snapshot for one instrument.
    OrderBook {
        instrument: Instrument,
        sequence: u64,
        asks: Vec<Level>,
        bids: Vec<Level>,
    },
    /// Aggregated traded volume at recently active price levels.
    TradeTicks {
        instrument: Instrument,
        sequence: u64,
        asks: Vec<Level>,
        bids: Vec<Level>,
    },
    /// One of our resting or fill-and-kill orders traded.
    OrderFilled { id: u64, price: u64, volume: u64 },
    /// Status change for one of our orders. Remaining volume of zero means
    /// the order is gone (fully filled or cancelled).
    OrderStatus {
        id: u64,
        fill_volume: u64,
        remaining_volume: u64,
        fees: i64,
    },
    /// One of our hedge orders traded. Zero price and volume reports an
    /// unsuccessful hedge.
    HedgeFilled { id: u64, price: u64, volume: u64 },
    /// The matching engine reported an error. `order_id` is set when the
    /// error pertains to a particular order.
    Error {
        order_id: Option<u64>,
        message: String,
    },
    /// The execution connection was lost. Terminal for the session.
    Disconnect,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Buy.opposite(), Side::Sell);
        assert_eq!(Side::Sell.opposite(), Side::Buy);
    }

    #[test]
    fn test_instrument_index_distinct() {
        assert_ne!(Instrument::Future.index(), Instrument::Etf.index());
    }
}
