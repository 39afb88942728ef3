#![deny(unreachable_pub)]

//! Market-making and arbitrage decision core for an ETF/future pair.
//!
//! The crate consumes session events (order books, fills, statuses, hedge
//! confirmations) through [`trader::AutoTrader::on_event`] and emits order
//! commands through the [`trader::CommandSink`] seam, subject to a hard cap
//! on actions per rolling second. The session wire layer and the matching
//! engine live outside this crate.

mod errors;
pub mod trader;

pub use errors::{Error, Result};
pub use trader::{AutoTrader, CommandSink, EventHandler, SessionEvent, TraderConfig};
