//! Decision core of the ETF/future market-making and arbitrage agent.
//!
//! The engine reacts to a streamed order-book feed for two correlated
//! instruments, with pluggable components:
//! - **TheoEstimator / QuoteSizer**: fair-price estimation and
//!   position-dependent quote sizing
//! - **SingleQuoteMaker / LadderMaker**: the two quoting disciplines, plus
//!   the stale-order sweeps
//! - **ArbitrageDetector**: opportunistic cross-instrument mispricing capture
//! - **OrderLedger / HedgeManager**: order lifecycle, position, mandatory
//!   delta-hedging
//! - **ActionRateLimiter**: the 50-actions-per-rolling-second gate
//! - **AutoTrader**: the dispatcher that sequences events through all of it

mod arbitrage;
mod book;
mod config;
mod dispatcher;
mod estimator;
mod events;
mod executor;
mod hedge;
mod ledger;
mod logging;
mod maker;
mod metrics;
mod rate_limit;
mod sim;
mod sizer;

#[cfg(test)]
mod tests;

pub use arbitrage::{ArbTrade, ArbitrageDetector};
pub use book::{BookSnapshot, FutureTouch, Level};
pub use config::{LevelSelection, QuotingMode, RateLimitConfig, TraderConfig};
pub use dispatcher::{levels, AutoTrader, EventHandler};
pub use estimator::{TargetQuotes, TheoEstimator};
pub use events::{Instrument, Lifespan, SessionEvent, Side};
pub use executor::{CommandSink, OutboundCommand, RecordingSink};
pub use hedge::{HedgeManager, HedgeRequest, HedgeTicket};
pub use ledger::{OrderLedger, OrderState, RestingOrder};
pub use logging::{init_logging, LogConfig, LogFormat};
pub use maker::{LadderMaker, MakerActions, QuoteIntent, SingleQuoteMaker};
pub use metrics::TraderMetrics;
pub use rate_limit::ActionRateLimiter;
pub use sim::SimSession;
pub use sizer::QuoteSizer;
