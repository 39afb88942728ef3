//! Cross-instrument arbitrage detection.
//!
//! When the ETF touch crosses the cached future touch, the spread can be
//! captured immediately: buy the ETF below the future bid or sell it above
//! the future ask, hedging the fill like any other. Trades are sized to the
//! touch volume and the remaining capacity toward the arbitrage-side limit,
//! and executed fill-and-kill so nothing rests.

use super::book::{BookSnapshot, FutureTouch};
use super::events::Side;

/// An immediately executable mispricing trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArbTrade {
    pub side: Side,
    pub price: u64,
    pub volume: u64,
}

/// Detects and sizes arbitrage trades against the future touch cache.
#[derive(Debug, Clone, Copy)]
pub struct ArbitrageDetector {
    /// Extra inventory permitted purely to capture mispricing, in lots.
    arbitrage_limit: i64,
}

impl ArbitrageDetector {
    pub fn new(arbitrage_limit: i64) -> Self {
        Self { arbitrage_limit }
    }

    /// Whether the ETF book is crossed against the future touch.
    pub fn crossed(&self, etf: &BookSnapshot, future: FutureTouch) -> bool {
        if !future.is_known() || !etf.has_two_sides() {
            return false;
        }
        etf.ask_touch() < future.bid || etf.bid_touch() > future.ask
    }

    /// Size the opportunity, if any. Capacity already used by `position` in
    /// the trade's direction reduces the permitted volume; zero or negative
    /// remaining capacity yields no trade.
    pub fn detect(
        &self,
        etf: &BookSnapshot,
        future: FutureTouch,
        position: i64,
    ) -> Option<ArbTrade> {
        if !future.is_known() || !etf.has_two_sides() {
            return None;
        }

        if etf.ask_touch() < future.bid {
            // Buy the ETF cheap, sell the future via the hedge.
            let capacity = self.arbitrage_limit - position;
            let volume = (etf.ask_touch_volume() as i64).min(capacity);
            if volume > 0 {
                return Some(ArbTrade {
                    side: Side::Buy,
                    price: etf.ask_touch(),
                    volume: volume as u64,
                });
            }
        } else if etf.bid_touch() > future.ask {
            let capacity = self.arbitrage_limit + position;
            let volume = (etf.bid_touch_volume() as i64).min(capacity);
            if volume > 0 {
                return Some(ArbTrade {
                    side: Side::Sell,
                    price: etf.bid_touch(),
                    volume: volume as u64,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trader::book::Level;

    fn etf(ask: (u64, u64), bid: (u64, u64)) -> BookSnapshot {
        BookSnapshot::new(
            7,
            vec![Level::new(ask.0, ask.1)],
            vec![Level::new(bid.0, bid.1)],
        )
    }

    fn future(bid: u64, ask: u64) -> FutureTouch {
        FutureTouch { bid, ask }
    }

    #[test]
    fn test_buy_when_etf_ask_below_future_bid() {
        let detector = ArbitrageDetector::new(20);
        let trade = detector
            .detect(&etf((9900, 15), (9800, 10)), future(10000, 10100), 0)
            .unwrap();
        assert_eq!(trade.side, Side::Buy);
        assert_eq!(trade.price, 9900);
        assert_eq!(trade.volume, 15);
    }

    #[test]
    fn test_buy_capped_by_remaining_capacity() {
        let detector = ArbitrageDetector::new(20);
        let trade = detector
            .detect(&etf((9900, 50), (9800, 10)), future(10000, 10100), 5)
            .unwrap();
        // 20 - 5 lots of capacity left.
        assert_eq!(trade.volume, 15);
    }

    #[test]
    fn test_no_trade_at_capacity() {
        let detector = ArbitrageDetector::new(20);
        assert!(detector
            .detect(&etf((9900, 50), (9800, 10)), future(10000, 10100), 20)
            .is_none());
    }

    #[test]
    fn test_sell_when_etf_bid_above_future_ask() {
        let detector = ArbitrageDetector::new(20);
        let trade = detector
            .detect(&etf((10300, 5), (10200, 8)), future(10000, 10100), 0)
            .unwrap();
        assert_eq!(trade.side, Side::Sell);
        assert_eq!(trade.price, 10200);
        assert_eq!(trade.volume, 8);
    }

    #[test]
    fn test_sell_capacity_grows_with_long_position() {
        let detector = ArbitrageDetector::new(20);
        let trade = detector
            .detect(&etf((10300, 100), (10200, 100)), future(10000, 10100), 15)
            .unwrap();
        // Selling unwinds the long: 20 + 15 lots permitted.
        assert_eq!(trade.volume, 35);
    }

    #[test]
    fn test_uncrossed_book_is_quiet() {
        let detector = ArbitrageDetector::new(20);
        let book = etf((10100, 5), (9900, 5));
        assert!(!detector.crossed(&book, future(10000, 10050)));
        assert!(detector.detect(&book, future(10000, 10050), 0).is_none());
    }

    #[test]
    fn test_unknown_future_is_quiet() {
        let detector = ArbitrageDetector::new(20);
        let book = etf((9900, 5), (9800, 5));
        assert!(detector.detect(&book, future(0, 0), 0).is_none());
    }
}
