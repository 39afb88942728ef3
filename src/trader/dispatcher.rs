//! Event dispatch and outbound send gating.
//!
//! `AutoTrader` is the single entry point for session events. All strategy
//! state is mutated inside the serial `on_event` path; the only suspension
//! point is the bounded wait when a mandatory hedge is throttled by the
//! rate window. Outbound commands are fire-and-forget: outcomes come back
//! as later events.

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::errors::Result;

use super::arbitrage::ArbitrageDetector;
use super::book::{BookSnapshot, FutureTouch, Level};
use super::config::{QuotingMode, TraderConfig};
use super::estimator::TheoEstimator;
use super::events::{Instrument, Lifespan, SessionEvent, Side};
use super::executor::CommandSink;
use super::hedge::{HedgeManager, HedgeRequest};
use super::ledger::{OrderLedger, RestingOrder};
use super::maker::{LadderMaker, MakerActions, SingleQuoteMaker};
use super::metrics::TraderMetrics;
use super::rate_limit::ActionRateLimiter;
use super::sizer::QuoteSizer;

/// The strategy core: sequences events and routes them to the quoting,
/// arbitrage, sweep and hedging components.
pub struct AutoTrader<E: CommandSink> {
    config: TraderConfig,
    sink: E,
    limiter: ActionRateLimiter,
    ledger: OrderLedger,
    hedger: HedgeManager,
    estimator: TheoEstimator,
    sizer: QuoteSizer,
    single_quote: SingleQuoteMaker,
    ladder: LadderMaker,
    arbitrage: ArbitrageDetector,
    /// Last known future touch, cached across ETF updates.
    future_touch: FutureTouch,
    /// Last accepted book sequence number, per instrument.
    last_sequence: [Option<u64>; 2],
    /// Set on disconnect; all further events are ignored.
    ended: bool,
    metrics: TraderMetrics,
}

impl<E: CommandSink> AutoTrader<E> {
    /// Build a trader from a validated configuration and a command sink.
    pub fn new(config: TraderConfig, sink: E) -> Result<Self> {
        config.validate()?;
        let limiter = ActionRateLimiter::new(&config.rate_limit);
        let estimator = TheoEstimator::new(config.level_selection.clone(), config.tick_size);
        let sizer = QuoteSizer::new(config.position_limit, config.risk_factor);
        let single_quote = SingleQuoteMaker::new(
            config.tick_size,
            config.position_limit,
            config.requote_tolerance_ticks,
        );
        let ladder = LadderMaker::new(
            config.tick_size,
            config.lot_size,
            config.position_limit,
            config.ladder_offset_ticks,
            config.sweep_depth_lots,
        );
        let arbitrage = ArbitrageDetector::new(config.arbitrage_limit);
        let hedger = HedgeManager::new(
            config.min_bid_nearest_tick(),
            config.max_ask_nearest_tick(),
        );
        Ok(Self {
            config,
            sink,
            limiter,
            ledger: OrderLedger::new(),
            hedger,
            estimator,
            sizer,
            single_quote,
            ladder,
            arbitrage,
            future_touch: FutureTouch::default(),
            last_sequence: [None; 2],
            ended: false,
            metrics: TraderMetrics::default(),
        })
    }

    /// Handle one session event. Events must be delivered one at a time;
    /// the trader owns no locks.
    pub async fn on_event(&mut self, event: SessionEvent) {
        if self.ended {
            warn!(?event, "event after disconnect ignored");
            return;
        }
        match event {
            SessionEvent::OrderBook {
                instrument,
                sequence,
                asks,
                bids,
            } => {
                self.on_order_book(instrument, BookSnapshot::new(sequence, asks, bids))
                    .await;
            }
            SessionEvent::TradeTicks {
                instrument,
                sequence,
                asks,
                bids,
            } => {
                debug!(
                    ?instrument,
                    sequence,
                    ask_touch = asks.first().map(|l| l.price).unwrap_or(0),
                    bid_touch = bids.first().map(|l| l.price).unwrap_or(0),
                    "trade ticks"
                );
            }
            SessionEvent::OrderFilled { id, price, volume } => {
                self.on_order_filled(id, price, volume).await;
            }
            SessionEvent::OrderStatus {
                id,
                fill_volume,
                remaining_volume,
                fees,
            } => {
                debug!(id, fill_volume, remaining_volume, fees, "order status");
                self.ledger.apply_status(id, fill_volume, remaining_volume);
            }
            SessionEvent::HedgeFilled { id, price, volume } => {
                if !self.hedger.apply_confirmation(id, price, volume) {
                    warn!(id, "hedge confirmation for unknown ticket");
                }
            }
            SessionEvent::Error { order_id, message } => {
                self.on_error(order_id, &message);
            }
            SessionEvent::Disconnect => {
                self.on_disconnect();
            }
        }
    }

    async fn on_order_book(&mut self, instrument: Instrument, book: BookSnapshot) {
        if !self.accept_sequence(instrument, book.sequence) {
            return;
        }

        match instrument {
            Instrument::Future => {
                if book.has_two_sides() {
                    self.future_touch = FutureTouch {
                        bid: book.bid_touch(),
                        ask: book.ask_touch(),
                    };
                    if self.config.quoting == QuotingMode::Ladder {
                        // The future moved: retire resting ETF orders the
                        // move turned into guaranteed losses.
                        let cancels = self.ladder.future_sweep(self.future_touch, &self.ledger);
                        for id in cancels {
                            self.try_cancel(id).await;
                        }
                    }
                }
                if self.config.quoting == QuotingMode::Theo {
                    let targets = self.estimator.target_quotes(&book);
                    let actions = self.single_quote.evaluate(targets, &self.ledger, &self.sizer);
                    self.execute(actions).await;
                }
            }
            Instrument::Etf => {
                if self.config.quoting != QuotingMode::Ladder || !book.has_two_sides() {
                    return;
                }
                if self.arbitrage.crossed(&book, self.future_touch) {
                    // Arbitrage and ordinary quoting are mutually exclusive
                    // per update.
                    if let Some(trade) =
                        self.arbitrage
                            .detect(&book, self.future_touch, self.ledger.position())
                    {
                        info!(
                            side = ?trade.side,
                            price = trade.price,
                            volume = trade.volume,
                            "arbitrage opportunity"
                        );
                        if self
                            .try_insert(trade.side, trade.price, trade.volume, Lifespan::FillAndKill)
                            .await
                        {
                            self.metrics.arb_trades += 1;
                        }
                    }
                } else if self.future_touch.is_known()
                    && book.ask_touch() > self.future_touch.ask
                    && book.bid_touch() < self.future_touch.bid
                {
                    let cancels = self.ladder.book_shape_sweep(&book, &self.ledger);
                    for id in cancels {
                        self.try_cancel(id).await;
                    }
                    let places = self.ladder.build(&book, self.future_touch, &self.ledger);
                    for intent in places {
                        self.try_insert(intent.side, intent.price, intent.volume, intent.lifespan)
                            .await;
                    }
                }
            }
        }
    }

    async fn on_order_filled(&mut self, id: u64, price: u64, volume: u64) {
        info!(id, price, volume, "order filled");
        let Some(side) = self.ledger.apply_fill(id, volume) else {
            // Hedge fills arrive through HedgeFilled; anything else here is
            // a fill for an order already off the ledger.
            debug!(id, "fill for untracked order");
            return;
        };
        debug_assert!(
            self.ledger.position().abs() <= self.config.position_limit,
            "position {} breached limit",
            self.ledger.position()
        );
        let request = self.hedger.request_for_fill(side, volume);
        self.send_hedge(request).await;
    }

    fn on_error(&mut self, order_id: Option<u64>, message: &str) {
        self.metrics.errors_seen += 1;
        match order_id {
            Some(id) if id != 0 && self.ledger.contains(id) => {
                warn!(id, error = message, "order error; treating as terminal");
                self.ledger.apply_status(id, 0, 0);
            }
            _ => {
                warn!(?order_id, error = message, "venue error");
            }
        }
    }

    fn on_disconnect(&mut self) {
        info!(
            position = self.ledger.position(),
            delta = self.hedger.delta(),
            "execution connection lost"
        );
        self.ledger.clear();
        self.hedger.clear();
        self.ended = true;
    }

    /// Sequence gate: accept only strictly newer snapshots per instrument.
    fn accept_sequence(&mut self, instrument: Instrument, sequence: u64) -> bool {
        let slot = &mut self.last_sequence[instrument.index()];
        if slot.is_some_and(|last| sequence <= last) {
            self.metrics.stale_drops += 1;
            debug!(?instrument, sequence, "stale book sequence dropped");
            return false;
        }
        *slot = Some(sequence);
        true
    }

    async fn execute(&mut self, actions: MakerActions) {
        for id in actions.cancels {
            self.try_cancel(id).await;
        }
        for intent in actions.places {
            self.try_insert(intent.side, intent.price, intent.volume, intent.lifespan)
                .await;
        }
    }

    /// Optional insert: skipped when the rate window is full.
    async fn try_insert(
        &mut self,
        side: Side,
        price: u64,
        volume: u64,
        lifespan: Lifespan,
    ) -> bool {
        if !self.limiter.try_acquire() {
            self.metrics.throttled_skips += 1;
            debug!(?side, price, volume, "insert throttled");
            return false;
        }
        let id = self.ledger.allocate_id();
        if let Err(e) = self
            .sink
            .insert_order(id, side, price, volume, lifespan)
            .await
        {
            error!(id, %e, "insert send failed");
            return false;
        }
        self.ledger
            .record_insert(RestingOrder::new(id, side, price, volume, lifespan));
        self.metrics.inserts += 1;
        debug!(id, ?side, price, volume, ?lifespan, "insert sent");
        true
    }

    /// Optional cancel: skipped when the rate window is full; the order is
    /// re-proposed on the next evaluation.
    async fn try_cancel(&mut self, id: u64) -> bool {
        if !self.limiter.try_acquire() {
            self.metrics.throttled_skips += 1;
            debug!(id, "cancel throttled");
            return false;
        }
        if let Err(e) = self.sink.cancel_order(id).await {
            error!(id, %e, "cancel send failed");
            return false;
        }
        self.ledger.mark_cancelling(id);
        self.metrics.cancels += 1;
        debug!(id, "cancel sent");
        true
    }

    /// Mandatory hedge: blocks the dispatch path until the window admits it.
    /// A lost hedge is uncontrolled inventory risk, so this never gives up.
    async fn send_hedge(&mut self, request: HedgeRequest) {
        let floor = self.config.rate_limit.hedge_retry_floor();
        loop {
            if self.limiter.try_acquire() {
                break;
            }
            let wait = self
                .limiter
                .retry_after(std::time::Instant::now())
                .unwrap_or(floor)
                .max(floor);
            debug!(?wait, "hedge throttled; waiting for rate window");
            tokio::time::sleep(wait).await;
        }
        let id = self.ledger.allocate_id();
        self.hedger.register(id, request.side, request.volume);
        if let Err(e) = self
            .sink
            .hedge_order(id, request.side, request.price, request.volume)
            .await
        {
            // Transport failure on a hedge leaves naked inventory; nothing
            // more can be done from here but shout.
            error!(id, %e, "hedge send failed");
            return;
        }
        self.metrics.hedges += 1;
        info!(
            id,
            side = ?request.side,
            price = request.price,
            volume = request.volume,
            "hedge sent"
        );
    }

    /// Current signed ETF position.
    pub fn position(&self) -> i64 {
        self.ledger.position()
    }

    /// Running delta counter.
    pub fn delta(&self) -> i64 {
        self.hedger.delta()
    }

    /// Outstanding order count.
    pub fn open_orders(&self) -> usize {
        self.ledger.len()
    }

    /// Whether the session has ended.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Session counters.
    pub fn metrics(&self) -> TraderMetrics {
        self.metrics.snapshot()
    }
}

/// Interface between a session runner and a strategy core.
///
/// The runner owns delivery: events arrive one at a time, in feed order.
/// Implementations own all strategy state and mutate it only inside
/// `on_event`.
#[async_trait]
pub trait EventHandler: Send {
    /// Handle one session event.
    async fn on_event(&mut self, event: SessionEvent);
}

#[async_trait]
impl<E: CommandSink> EventHandler for AutoTrader<E> {
    async fn on_event(&mut self, event: SessionEvent) {
        AutoTrader::on_event(self, event).await;
    }
}

/// Convenience constructor for feed levels in tests and the paper binary.
pub fn levels(pairs: &[(u64, u64)]) -> Vec<Level> {
    pairs.iter().map(|&(p, v)| Level::new(p, v)).collect()
}
