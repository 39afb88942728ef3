//! Order book snapshots as delivered by the feed.

/// One price level: price in minor currency units, volume in lots.
///
/// A zero price marks an empty slot (the feed zero-pads short sides).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Level {
    pub price: u64,
    pub volume: u64,
}

impl Level {
    pub fn new(price: u64, volume: u64) -> Self {
        Self { price, volume }
    }
}

/// Top-N order book snapshot for one instrument, best levels first.
///
/// Snapshots are tagged with the feed sequence number; the dispatcher
/// discards any snapshot that is not strictly newer than the last accepted
/// one for the same instrument.
#[derive(Debug, Clone, Default)]
pub struct BookSnapshot {
    /// Feed sequence number.
    pub sequence: u64,
    /// Ask levels, lowest price first.
    pub asks: Vec<Level>,
    /// Bid levels, highest price first.
    pub bids: Vec<Level>,
}

impl BookSnapshot {
    /// Create a snapshot from raw level vectors.
    pub fn new(sequence: u64, asks: Vec<Level>, bids: Vec<Level>) -> Self {
        Self {
            sequence,
            asks,
            bids,
        }
    }

    /// Best ask price, zero when the side is empty.
    pub fn ask_touch(&self) -> u64 {
        self.asks.first().map(|l| l.price).unwrap_or(0)
    }

    /// Best bid price, zero when the side is empty.
    pub fn bid_touch(&self) -> u64 {
        self.bids.first().map(|l| l.price).unwrap_or(0)
    }

    /// Volume at the best ask.
    pub fn ask_touch_volume(&self) -> u64 {
        self.asks.first().map(|l| l.volume).unwrap_or(0)
    }

    /// Volume at the best bid.
    pub fn bid_touch_volume(&self) -> u64 {
        self.bids.first().map(|l| l.volume).unwrap_or(0)
    }

    /// Whether both touch prices are present.
    pub fn has_two_sides(&self) -> bool {
        self.ask_touch() != 0 && self.bid_touch() != 0
    }

    /// Price of the shallowest level at which cumulative volume on `levels`
    /// reaches `target` lots. Falls back to the deepest reported price when
    /// the target is never reached, and zero for an empty side.
    pub fn depth_cutoff(levels: &[Level], target: u64) -> u64 {
        let mut cumulative = 0u64;
        for level in levels {
            if level.price == 0 {
                break;
            }
            cumulative += level.volume;
            if cumulative >= target {
                return level.price;
            }
        }
        levels
            .iter()
            .filter(|l| l.price != 0)
            .last()
            .map(|l| l.price)
            .unwrap_or(0)
    }
}

/// Last known touch prices of the future, cached across ETF updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct FutureTouch {
    pub bid: u64,
    pub ask: u64,
}

impl FutureTouch {
    /// Whether both sides have been observed at least once.
    pub fn is_known(&self) -> bool {
        self.bid != 0 && self.ask != 0
    }
}
