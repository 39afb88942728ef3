//! Theoretical price estimation from weighted order-book depth.
//!
//! Both estimation policies share one contract: pick the book levels that
//! matter, then take the volume-weighted average price across the included
//! bid and ask levels. The liquidity-threshold rule widens level inclusion
//! until enough volume backs the estimate; the fixed-weight rule always uses
//! every level, scaled per depth.

use super::book::{BookSnapshot, Level};
use super::config::LevelSelection;

/// Theo price estimator, parameterized by the level-selection policy.
#[derive(Debug, Clone)]
pub struct TheoEstimator {
    policy: LevelSelection,
    tick_size: u64,
}

/// Target quote prices derived from a theo estimate. A side is `None` when
/// the corresponding touch is empty and must not be quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetQuotes {
    pub bid: Option<u64>,
    pub ask: Option<u64>,
}

impl TheoEstimator {
    pub fn new(policy: LevelSelection, tick_size: u64) -> Self {
        Self { policy, tick_size }
    }

    /// Estimate the theo price from a book snapshot. `None` when the book
    /// carries no usable volume.
    pub fn theo(&self, book: &BookSnapshot) -> Option<u64> {
        let mut acc = WeightedAcc::default();
        match &self.policy {
            LevelSelection::LiquidityThreshold { min_volume } => {
                let depth = self.threshold_depth(book, *min_volume);
                for k in 0..depth {
                    if let Some(level) = book.bids.get(k) {
                        acc.add(level, 1.0);
                    }
                    if let Some(level) = book.asks.get(k) {
                        acc.add(level, 1.0);
                    }
                }
            }
            LevelSelection::FixedWeights { weights } => {
                for (i, w) in weights.iter().enumerate() {
                    if let Some(level) = book.bids.get(i) {
                        acc.add(level, *w);
                    }
                    if let Some(level) = book.asks.get(i) {
                        acc.add(level, *w);
                    }
                }
            }
        }
        acc.price()
    }

    /// Bid/ask targets one tick either side of theo, rounded to the nearest
    /// tick, suppressed where the touch is empty.
    pub fn target_quotes(&self, book: &BookSnapshot) -> TargetQuotes {
        let Some(theo) = self.theo(book) else {
            return TargetQuotes {
                bid: None,
                ask: None,
            };
        };
        let bid = (book.bid_touch() != 0)
            .then(|| self.round_to_tick(theo.saturating_sub(self.tick_size)));
        let ask = (book.ask_touch() != 0).then(|| self.round_to_tick(theo + self.tick_size));
        TargetQuotes { bid, ask }
    }

    /// Smallest number of levels whose cumulative bid+ask volume reaches the
    /// threshold; all levels when it is never reached.
    fn threshold_depth(&self, book: &BookSnapshot, min_volume: u64) -> usize {
        let max_depth = book.bids.len().max(book.asks.len());
        let mut cumulative = 0u64;
        for k in 0..max_depth {
            cumulative += book.bids.get(k).map(|l| l.volume).unwrap_or(0);
            cumulative += book.asks.get(k).map(|l| l.volume).unwrap_or(0);
            if cumulative >= min_volume {
                return k + 1;
            }
        }
        max_depth
    }

    fn round_to_tick(&self, price: u64) -> u64 {
        (price + self.tick_size / 2) / self.tick_size * self.tick_size
    }
}

/// Volume-weighted price accumulator shared by both policies.
#[derive(Debug, Default)]
struct WeightedAcc {
    price_volume: f64,
    volume: f64,
}

impl WeightedAcc {
    fn add(&mut self, level: &Level, weight: f64) {
        if level.price == 0 || level.volume == 0 {
            return;
        }
        let v = level.volume as f64 * weight;
        self.price_volume += level.price as f64 * v;
        self.volume += v;
    }

    fn price(&self) -> Option<u64> {
        (self.volume > 0.0).then(|| (self.price_volume / self.volume).round() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(asks: &[(u64, u64)], bids: &[(u64, u64)]) -> BookSnapshot {
        BookSnapshot::new(
            1,
            asks.iter().map(|&(p, v)| Level::new(p, v)).collect(),
            bids.iter().map(|&(p, v)| Level::new(p, v)).collect(),
        )
    }

    fn threshold_estimator(min_volume: u64) -> TheoEstimator {
        TheoEstimator::new(LevelSelection::LiquidityThreshold { min_volume }, 100)
    }

    #[test]
    fn test_touch_only_when_threshold_met_at_top() {
        // 300 + 300 lots at the touch clears a 500-lot threshold, so deeper
        // levels never enter the estimate.
        let book = book(
            &[(10100, 300), (10300, 900)],
            &[(9900, 300), (9700, 900)],
        );
        let theo = threshold_estimator(500).theo(&book).unwrap();
        assert_eq!(theo, 10000);
    }

    #[test]
    fn test_threshold_pulls_in_second_level() {
        let estimator = threshold_estimator(500);
        let book = book(&[(10100, 100), (10200, 200)], &[(9900, 100), (9800, 200)]);
        // Level 0 holds 200 lots; level 1 brings the total to 600.
        let theo = estimator.theo(&book).unwrap();
        let expected = (10100 * 100 + 10200 * 200 + 9900 * 100 + 9800 * 200) as f64 / 600.0;
        assert_eq!(theo, expected.round() as u64);
    }

    #[test]
    fn test_threshold_never_met_uses_all_levels() {
        let estimator = threshold_estimator(100_000);
        let book = book(&[(10100, 10), (10200, 10)], &[(9900, 10), (9800, 10)]);
        let theo = estimator.theo(&book).unwrap();
        let expected = (10100 * 10 + 10200 * 10 + 9900 * 10 + 9800 * 10) as f64 / 40.0;
        assert_eq!(theo, expected.round() as u64);
    }

    #[test]
    fn test_empty_book_has_no_theo() {
        let estimator = threshold_estimator(500);
        assert!(estimator.theo(&book(&[], &[])).is_none());
    }

    #[test]
    fn test_fixed_weights_prefer_touch() {
        let estimator = TheoEstimator::new(
            LevelSelection::FixedWeights {
                weights: vec![1.0, 0.5],
            },
            100,
        );
        let book = book(&[(10100, 100), (10500, 100)], &[(9900, 100), (9500, 100)]);
        let theo = estimator.theo(&book).unwrap();
        let expected: f64 = (10100.0 * 100.0 + 10500.0 * 50.0 + 9900.0 * 100.0 + 9500.0 * 50.0)
            / (100.0 + 50.0 + 100.0 + 50.0);
        assert_eq!(theo, expected.round() as u64);
    }

    #[test]
    fn test_targets_straddle_theo_by_one_tick() {
        let estimator = threshold_estimator(100);
        let book = book(&[(10100, 300)], &[(9900, 300)]);
        let targets = estimator.target_quotes(&book);
        assert_eq!(targets.bid, Some(9900));
        assert_eq!(targets.ask, Some(10100));
    }

    #[test]
    fn test_target_suppressed_on_empty_touch() {
        let estimator = threshold_estimator(100);
        // No bids at all: theo forms from the ask side alone, and only the
        // ask is quoted.
        let book = book(&[(10100, 300)], &[]);
        let targets = estimator.target_quotes(&book);
        assert_eq!(targets.bid, None);
        assert_eq!(targets.ask, Some(10200));
    }
}
