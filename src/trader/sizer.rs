//! Position-dependent quote sizing.
//!
//! Volumes are precomputed for every integer position in
//! `[-position_limit, position_limit]` at construction, so the quoting hot
//! path is a table lookup. The side that would push inventory toward the
//! limit shrinks as position approaches it; the replenishing side stays
//! larger. `risk_factor` uniformly tightens both maps.

/// Precomputed bid/ask quote volumes per position.
#[derive(Debug, Clone)]
pub struct QuoteSizer {
    /// Bid volume indexed by `position + position_limit`.
    bid_map: Vec<u64>,
    /// Ask volume indexed by `position + position_limit`.
    ask_map: Vec<u64>,
    position_limit: i64,
}

impl QuoteSizer {
    /// Build the maps for the full position domain.
    pub fn new(position_limit: i64, risk_factor: f64) -> Self {
        let span = (2 * position_limit + 1) as usize;
        let mut bid_map = Vec::with_capacity(span);
        let mut ask_map = Vec::with_capacity(span);
        let limit = position_limit as f64;
        let risk_cut = (risk_factor / 2.0).floor();

        for position in -position_limit..=position_limit {
            let p = position as f64;
            let bid = ((limit - p - risk_factor) / 2.0).floor() - risk_cut;
            // Short inventory tightens the ask the same way long inventory
            // tightens the bid; long inventory widens the ask to help the
            // book unwind.
            let ask = if position < 0 {
                ((limit - p.abs() - risk_factor) / 2.0).floor() - risk_cut
            } else {
                ((limit + p.abs() - risk_factor) / 2.0).floor() - risk_cut
            };
            bid_map.push(bid.max(0.0) as u64);
            ask_map.push(ask.max(0.0) as u64);
        }

        Self {
            bid_map,
            ask_map,
            position_limit,
        }
    }

    /// Permitted (bid, ask) quote volumes at a position.
    ///
    /// Position is produced by admission-checked fills, so it is always in
    /// domain; out-of-domain lookups are a bug upstream.
    pub fn volumes(&self, position: i64) -> (u64, u64) {
        debug_assert!(
            position.abs() <= self.position_limit,
            "position {position} outside sizing domain"
        );
        let clamped = position.clamp(-self.position_limit, self.position_limit);
        let idx = (clamped + self.position_limit) as usize;
        (self.bid_map[idx], self.ask_map[idx])
    }

    /// Bid volume only.
    pub fn bid_volume(&self, position: i64) -> u64 {
        self.volumes(position).0
    }

    /// Ask volume only.
    pub fn ask_volume(&self, position: i64) -> u64 {
        self.volumes(position).1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_position_reference_values() {
        let sizer = QuoteSizer::new(100, 0.0);
        assert_eq!(sizer.volumes(0), (50, 50));
    }

    #[test]
    fn test_full_long_cannot_buy() {
        let sizer = QuoteSizer::new(100, 0.0);
        assert_eq!(sizer.bid_volume(100), 0);
    }

    #[test]
    fn test_full_short_cannot_sell() {
        let sizer = QuoteSizer::new(100, 0.0);
        assert_eq!(sizer.ask_volume(-100), 0);
    }

    #[test]
    fn test_non_negative_everywhere() {
        let sizer = QuoteSizer::new(100, 7.0);
        for p in -100..=100 {
            let (bid, ask) = sizer.volumes(p);
            // u64 already enforces the sign; the lookup itself must be total.
            let _ = bid + ask;
        }
    }

    #[test]
    fn test_bid_monotone_toward_long_limit() {
        let sizer = QuoteSizer::new(100, 0.0);
        for p in -100..100 {
            assert!(
                sizer.bid_volume(p + 1) <= sizer.bid_volume(p),
                "bid volume must not grow as position rises (p = {p})"
            );
        }
    }

    #[test]
    fn test_ask_monotone_toward_short_limit() {
        let sizer = QuoteSizer::new(100, 0.0);
        for p in (-99)..=100 {
            assert!(
                sizer.ask_volume(p - 1) <= sizer.ask_volume(p),
                "ask volume must not grow as position falls (p = {p})"
            );
        }
    }

    #[test]
    fn test_risk_factor_tightens_both_sides() {
        let loose = QuoteSizer::new(100, 0.0);
        let tight = QuoteSizer::new(100, 10.0);
        for p in [-50, 0, 50] {
            assert!(tight.bid_volume(p) <= loose.bid_volume(p));
            assert!(tight.ask_volume(p) <= loose.ask_volume(p));
        }
    }

    #[test]
    fn test_bid_never_breaches_limit() {
        let sizer = QuoteSizer::new(100, 0.0);
        for p in -100..=100 {
            assert!(p + sizer.bid_volume(p) as i64 <= 100);
        }
    }
}
