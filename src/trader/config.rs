//! Configuration for the trader core.
//!
//! All venue and strategy constants are supplied externally; nothing in the
//! core computes them. Defaults mirror the session the strategy was tuned
//! for (100-cent tick, 100-lot position limit).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Which quoting engine drives the ETF.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotingMode {
    /// Single resting order per side around a theo price, re-quoted when the
    /// theo moves. Evaluated on future book updates.
    #[default]
    Theo,
    /// A band of lot-sized resting orders at every tick between the
    /// future-implied boundary and the ETF touch, combined with arbitrage
    /// capture. Evaluated on ETF book updates.
    Ladder,
}

/// Rule for choosing which book levels enter the theo price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum LevelSelection {
    /// Include levels until cumulative bid+ask volume reaches `min_volume`
    /// lots; all levels if the threshold is never reached.
    LiquidityThreshold { min_volume: u64 },
    /// Weight every level by a fixed per-level factor.
    FixedWeights { weights: Vec<f64> },
}

impl Default for LevelSelection {
    fn default() -> Self {
        LevelSelection::LiquidityThreshold { min_volume: 500 }
    }
}

/// Action budget against the venue message limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum actions admitted inside one rolling window.
    pub max_actions: usize,
    /// Window width in milliseconds. Slightly over one second so an entry
    /// on the boundary never lands in two venue windows.
    pub window_ms: u64,
    /// Floor for the mandatory-action retry sleep in milliseconds.
    pub hedge_retry_floor_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_actions: 50,
            window_ms: 1010,
            hedge_retry_floor_ms: 100,
        }
    }
}

impl RateLimitConfig {
    /// Window width as a `Duration`.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Retry floor as a `Duration`.
    pub fn hedge_retry_floor(&self) -> Duration {
        Duration::from_millis(self.hedge_retry_floor_ms)
    }
}

/// Full configuration for one trading session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TraderConfig {
    /// Minimum price increment in minor currency units.
    pub tick_size: u64,
    /// Hard bound on signed ETF position, in lots.
    pub position_limit: i64,
    /// Standard order size for ladder quoting, in lots.
    pub lot_size: u64,
    /// Extra inventory the strategy will take on purely to capture a
    /// cross-instrument mispricing, in lots.
    pub arbitrage_limit: i64,
    /// Uniform tightening applied to both quote volume maps.
    pub risk_factor: f64,
    /// Venue minimum tradable price.
    pub min_price: u64,
    /// Venue maximum tradable price.
    pub max_price: u64,
    /// Book levels reported per side by the feed.
    pub top_levels: usize,
    /// Quoting engine selection.
    pub quoting: QuotingMode,
    /// Theo price level-selection policy.
    pub level_selection: LevelSelection,
    /// Re-quote when the live price differs from the target by more than
    /// this many ticks (zero = exact match required).
    pub requote_tolerance_ticks: u64,
    /// Ladder starts this many ticks inside the future touch.
    pub ladder_offset_ticks: u64,
    /// Book-shape sweep cancels orders resting at or beyond the level where
    /// cumulative depth reaches this many standard lots.
    pub sweep_depth_lots: u64,
    /// Action budget.
    pub rate_limit: RateLimitConfig,
}

impl Default for TraderConfig {
    fn default() -> Self {
        Self {
            tick_size: 100,
            position_limit: 100,
            lot_size: 20,
            arbitrage_limit: 20,
            risk_factor: 0.0,
            min_price: 1,
            max_price: 1 << 31,
            top_levels: 5,
            quoting: QuotingMode::default(),
            level_selection: LevelSelection::default(),
            requote_tolerance_ticks: 0,
            ladder_offset_ticks: 2,
            sweep_depth_lots: 3,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl TraderConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::ConfigFile(format!("{}: {e}", path.as_ref().display())))?;
        let config: TraderConfig =
            serde_json::from_str(&raw).map_err(|e| Error::ConfigFile(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check internal consistency. Called at load; cheap enough to call
    /// again before constructing the trader.
    pub fn validate(&self) -> Result<()> {
        if self.tick_size == 0 {
            return Err(Error::invalid_config("tick_size must be positive"));
        }
        if self.position_limit <= 0 {
            return Err(Error::invalid_config("position_limit must be positive"));
        }
        if self.lot_size == 0 {
            return Err(Error::invalid_config("lot_size must be positive"));
        }
        if self.arbitrage_limit < 0 || self.arbitrage_limit > self.position_limit {
            return Err(Error::invalid_config(
                "arbitrage_limit must lie in [0, position_limit]",
            ));
        }
        if self.risk_factor < 0.0 {
            return Err(Error::invalid_config("risk_factor must be non-negative"));
        }
        if self.min_price >= self.max_price {
            return Err(Error::invalid_config("min_price must be below max_price"));
        }
        if self.top_levels == 0 {
            return Err(Error::invalid_config("top_levels must be positive"));
        }
        if self.rate_limit.max_actions == 0 || self.rate_limit.window_ms == 0 {
            return Err(Error::invalid_config(
                "rate limit needs a positive budget and window",
            ));
        }
        if let LevelSelection::FixedWeights { weights } = &self.level_selection {
            if weights.is_empty() || weights.iter().any(|w| *w < 0.0) {
                return Err(Error::invalid_config(
                    "fixed level weights must be non-empty and non-negative",
                ));
            }
        }
        Ok(())
    }

    /// Lowest marketable price, rounded up to tick granularity. Hedge sells
    /// are priced here so they cross immediately.
    pub fn min_bid_nearest_tick(&self) -> u64 {
        (self.min_price + self.tick_size) / self.tick_size * self.tick_size
    }

    /// Highest marketable price, rounded down to tick granularity. Hedge
    /// buys are priced here so they cross immediately.
    pub fn max_ask_nearest_tick(&self) -> u64 {
        self.max_price / self.tick_size * self.tick_size
    }
}
