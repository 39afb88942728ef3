//! Simulated session for paper trading and end-to-end tests.
//!
//! `SimSession` plays both roles the real session layer hides: it generates
//! a random-walk future book with a spread-following ETF book, and it acts
//! as a toy matching engine for the commands the trader sends back. It is
//! deliberately simple: resting orders fill when the generated book
//! crosses them, fill-and-kill orders fill only if marketable on arrival,
//! and hedges always fill. That is enough to exercise every dispatcher
//! path without a venue.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::book::Level;
use super::events::{Instrument, Lifespan, SessionEvent, Side};
use super::executor::OutboundCommand;

/// Book levels the simulator publishes per side.
const SIM_LEVELS: usize = 5;

/// Future touch distance from its mid, in ticks.
const FUTURE_TOUCH_TICKS: u64 = 1;

/// ETF touch distance from its mid, in ticks. Wider than the future so the
/// ladder has room between the future-implied boundary and the ETF touch.
const ETF_TOUCH_TICKS: u64 = 4;

#[derive(Debug, Clone, Copy)]
struct SimOrder {
    side: Side,
    price: u64,
    volume: u64,
    filled: u64,
}

/// Random-walk feed plus toy matcher.
#[derive(Debug)]
pub struct SimSession {
    rng: StdRng,
    tick_size: u64,
    /// Future mid price, random-walked each step.
    future_mid: u64,
    /// ETF mid offset from the future mid, mean-reverting around zero.
    etf_offset: i64,
    sequence: [u64; 2],
    resting: HashMap<u64, SimOrder>,
    /// Events queued for delivery to the trader.
    queued: Vec<SessionEvent>,
    /// ETF position granted through fills, tracked venue-side.
    position: i64,
    /// Venue position limit: inserts that could breach it are rejected
    /// with an error, as the real matching engine does.
    position_limit: i64,
}

impl SimSession {
    pub fn new(seed: u64, tick_size: u64, start_mid: u64, position_limit: i64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            tick_size,
            future_mid: start_mid,
            etf_offset: 0,
            sequence: [0; 2],
            resting: HashMap::new(),
            queued: Vec::new(),
            position: 0,
            position_limit,
        }
    }

    /// Advance the market one step and return the events to deliver: any
    /// fills produced by the move, then fresh books for both instruments.
    pub fn step(&mut self) -> Vec<SessionEvent> {
        let tick = self.tick_size as i64;
        let drift = self.rng.gen_range(-1..=1) * tick;
        self.future_mid = (self.future_mid as i64 + drift).max(10 * tick) as u64;

        // The ETF tracks the future loosely; the occasional wide offset
        // crosses the books and opens the arbitrage path.
        self.etf_offset = if self.rng.gen_bool(0.1) {
            self.rng.gen_range(-7..=7) * tick
        } else {
            self.etf_offset.signum() * (self.etf_offset.abs() - tick).max(0)
        };

        let future = self.generate_book(Instrument::Future, self.future_mid, FUTURE_TOUCH_TICKS);
        let etf_mid = (self.future_mid as i64 + self.etf_offset).max(10 * tick) as u64;
        let etf = self.generate_book(Instrument::Etf, etf_mid, ETF_TOUCH_TICKS);

        self.match_resting();

        let mut events = std::mem::take(&mut self.queued);
        events.push(future);
        events.push(etf);
        events
    }

    /// Venue-side handling of one trader command. Response events are
    /// delivered on the next `step`.
    pub fn apply(&mut self, command: OutboundCommand) {
        match command {
            OutboundCommand::Insert {
                id,
                side,
                price,
                volume,
                lifespan,
            } => self.apply_insert(id, side, price, volume, lifespan),
            OutboundCommand::Cancel { id } => {
                if let Some(order) = self.resting.remove(&id) {
                    self.queued.push(SessionEvent::OrderStatus {
                        id,
                        fill_volume: order.filled,
                        remaining_volume: 0,
                        fees: 0,
                    });
                }
            }
            OutboundCommand::Hedge { id, side, volume, .. } => {
                // Hedges are priced to cross; fill them at the current
                // future touch.
                let price = match side {
                    Side::Buy => self.future_mid + self.tick_size,
                    Side::Sell => self.future_mid - self.tick_size,
                };
                self.queued.push(SessionEvent::HedgeFilled { id, price, volume });
            }
        }
    }

    fn apply_insert(&mut self, id: u64, side: Side, price: u64, volume: u64, lifespan: Lifespan) {
        if self.would_breach_limit(side, volume) {
            self.queued.push(SessionEvent::Error {
                order_id: Some(id),
                message: "order would breach the position limit".to_string(),
            });
            return;
        }
        let (etf_bid, etf_ask) = self.etf_touch();
        let marketable = match side {
            Side::Buy => price >= etf_ask,
            Side::Sell => price <= etf_bid,
        };
        match lifespan {
            Lifespan::FillAndKill => {
                if marketable {
                    self.grant_fill(side, volume);
                    self.queued.push(SessionEvent::OrderFilled { id, price, volume });
                }
                self.queued.push(SessionEvent::OrderStatus {
                    id,
                    fill_volume: if marketable { volume } else { 0 },
                    remaining_volume: 0,
                    fees: 0,
                });
            }
            Lifespan::Day => {
                self.resting.insert(
                    id,
                    SimOrder {
                        side,
                        price,
                        volume,
                        filled: 0,
                    },
                );
                self.queued.push(SessionEvent::OrderStatus {
                    id,
                    fill_volume: 0,
                    remaining_volume: volume,
                    fees: 0,
                });
            }
        }
    }

    /// Fill resting orders the new ETF book has crossed.
    fn match_resting(&mut self) {
        let (etf_bid, etf_ask) = self.etf_touch();
        let crossed: Vec<u64> = self
            .resting
            .iter()
            .filter(|(_, o)| match o.side {
                Side::Buy => etf_ask <= o.price,
                Side::Sell => etf_bid >= o.price,
            })
            .map(|(id, _)| *id)
            .collect();
        for id in crossed {
            let order = self.resting.remove(&id).expect("order vanished mid-match");
            let remaining = order.volume - order.filled;
            self.grant_fill(order.side, remaining);
            self.queued.push(SessionEvent::OrderFilled {
                id,
                price: order.price,
                volume: remaining,
            });
            self.queued.push(SessionEvent::OrderStatus {
                id,
                fill_volume: order.volume,
                remaining_volume: 0,
                fees: 0,
            });
        }
    }

    /// Whether accepting this order could ever push the granted position
    /// past the venue limit, counting open same-side volume.
    fn would_breach_limit(&self, side: Side, volume: u64) -> bool {
        let open: i64 = self
            .resting
            .values()
            .filter(|o| o.side == side)
            .map(|o| (o.volume - o.filled) as i64)
            .sum();
        match side {
            Side::Buy => self.position + open + volume as i64 > self.position_limit,
            Side::Sell => self.position - open - (volume as i64) < -self.position_limit,
        }
    }

    fn grant_fill(&mut self, side: Side, volume: u64) {
        match side {
            Side::Buy => self.position += volume as i64,
            Side::Sell => self.position -= volume as i64,
        }
    }

    /// Current ETF touch prices.
    fn etf_touch(&self) -> (u64, u64) {
        let tick = self.tick_size as i64;
        let etf_mid = (self.future_mid as i64 + self.etf_offset).max(10 * tick) as u64;
        let touch = ETF_TOUCH_TICKS * self.tick_size;
        (etf_mid - touch, etf_mid + touch)
    }

    fn generate_book(
        &mut self,
        instrument: Instrument,
        mid: u64,
        touch_ticks: u64,
    ) -> SessionEvent {
        let sequence = {
            let slot = &mut self.sequence[instrument.index()];
            *slot += 1;
            *slot
        };
        let mut asks = Vec::with_capacity(SIM_LEVELS);
        let mut bids = Vec::with_capacity(SIM_LEVELS);
        for i in 0..SIM_LEVELS as u64 {
            let depth = (touch_ticks + i) * self.tick_size;
            asks.push(Level::new(mid + depth, self.rng.gen_range(50..400)));
            bids.push(Level::new(
                mid.saturating_sub(depth),
                self.rng.gen_range(50..400),
            ));
        }
        SessionEvent::OrderBook {
            instrument,
            sequence,
            asks,
            bids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_emits_both_books_with_rising_sequences() {
        let mut sim = SimSession::new(7, 100, 10000, 100);
        let first = sim.step();
        let second = sim.step();
        let seq_of = |events: &[SessionEvent], wanted: Instrument| -> u64 {
            events
                .iter()
                .find_map(|e| match e {
                    SessionEvent::OrderBook {
                        instrument,
                        sequence,
                        ..
                    } if *instrument == wanted => Some(*sequence),
                    _ => None,
                })
                .expect("book missing")
        };
        assert!(seq_of(&second, Instrument::Future) > seq_of(&first, Instrument::Future));
        assert!(seq_of(&second, Instrument::Etf) > seq_of(&first, Instrument::Etf));
    }

    #[test]
    fn test_hedge_always_fills() {
        let mut sim = SimSession::new(7, 100, 10000, 100);
        sim.apply(OutboundCommand::Hedge {
            id: 5,
            side: Side::Sell,
            price: 100,
            volume: 10,
        });
        let events = sim.step();
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::HedgeFilled { id: 5, volume: 10, .. })));
    }

    #[test]
    fn test_marketable_fak_fills_in_full() {
        let mut sim = SimSession::new(7, 100, 10000, 100);
        sim.apply(OutboundCommand::Insert {
            id: 9,
            side: Side::Buy,
            price: 50000,
            volume: 10,
            lifespan: Lifespan::FillAndKill,
        });
        let events = sim.step();
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::OrderFilled { id: 9, volume: 10, .. })));
    }

    #[test]
    fn test_unmarketable_fak_killed() {
        let mut sim = SimSession::new(7, 100, 10000, 100);
        sim.apply(OutboundCommand::Insert {
            id: 9,
            side: Side::Buy,
            price: 100,
            volume: 10,
            lifespan: Lifespan::FillAndKill,
        });
        let events = sim.step();
        assert!(!events
            .iter()
            .any(|e| matches!(e, SessionEvent::OrderFilled { id: 9, .. })));
        assert!(events.iter().any(|e| matches!(
            e,
            SessionEvent::OrderStatus {
                id: 9,
                remaining_volume: 0,
                ..
            }
        )));
    }

    #[test]
    fn test_deterministic_for_seed() {
        let mut a = SimSession::new(42, 100, 10000, 100);
        let mut b = SimSession::new(42, 100, 10000, 100);
        for _ in 0..10 {
            assert_eq!(format!("{:?}", a.step()), format!("{:?}", b.step()));
        }
    }
}
