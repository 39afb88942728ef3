//! Scenario tests driving the full dispatcher pipeline:
//! - single-quote replace cycle against a moving theo
//! - paper session against the simulator, checking the position bound and
//!   delta reconciliation end to end

use std::sync::Arc;

use crate::trader::{
    levels, AutoTrader, Instrument, OutboundCommand, QuotingMode, RecordingSink, SessionEvent,
    Side, SimSession, TraderConfig,
};

fn future_book(sequence: u64, asks: &[(u64, u64)], bids: &[(u64, u64)]) -> SessionEvent {
    SessionEvent::OrderBook {
        instrument: Instrument::Future,
        sequence,
        asks: levels(asks),
        bids: levels(bids),
    }
}

#[tokio::test]
async fn test_theo_mode_full_replace_cycle() {
    let sink = Arc::new(RecordingSink::new());
    let mut trader = AutoTrader::new(TraderConfig::default(), sink.clone()).unwrap();

    // Touch volume alone clears the 500-lot threshold: theo 10000, so the
    // trader quotes 9900 x 10100, 50 lots each side at position zero.
    trader
        .on_event(future_book(1, &[(10100, 300)], &[(9900, 300)]))
        .await;
    let placed = sink.drain();
    assert_eq!(placed.len(), 2);
    for command in &placed {
        match command {
            OutboundCommand::Insert {
                side: Side::Buy,
                price,
                volume,
                ..
            } => {
                assert_eq!((*price, *volume), (9900, 50));
            }
            OutboundCommand::Insert {
                side: Side::Sell,
                price,
                volume,
                ..
            } => {
                assert_eq!((*price, *volume), (10100, 50));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    // Venue confirms both live.
    trader
        .on_event(SessionEvent::OrderStatus {
            id: 1,
            fill_volume: 0,
            remaining_volume: 50,
            fees: 0,
        })
        .await;
    trader
        .on_event(SessionEvent::OrderStatus {
            id: 2,
            fill_volume: 0,
            remaining_volume: 50,
            fees: 0,
        })
        .await;

    // Theo moves two ticks up: both quotes are cancelled, nothing placed
    // until the cancels confirm.
    trader
        .on_event(future_book(2, &[(10300, 300)], &[(10100, 300)]))
        .await;
    let cancels = sink.drain();
    assert_eq!(cancels.len(), 2);
    assert!(cancels
        .iter()
        .all(|c| matches!(c, OutboundCommand::Cancel { .. })));

    // A repeat evaluation before confirmation must not double-cancel.
    trader
        .on_event(future_book(3, &[(10300, 300)], &[(10100, 300)]))
        .await;
    assert!(sink.drain().is_empty());

    // Cancel confirmations free both sides; the next update re-quotes at
    // the new targets.
    trader
        .on_event(SessionEvent::OrderStatus {
            id: 1,
            fill_volume: 0,
            remaining_volume: 0,
            fees: 0,
        })
        .await;
    trader
        .on_event(SessionEvent::OrderStatus {
            id: 2,
            fill_volume: 0,
            remaining_volume: 0,
            fees: 0,
        })
        .await;
    trader
        .on_event(future_book(4, &[(10300, 300)], &[(10100, 300)]))
        .await;
    let replaced = sink.drain();
    let prices: Vec<u64> = replaced
        .iter()
        .map(|c| match c {
            OutboundCommand::Insert { price, .. } => *price,
            other => panic!("unexpected command {other:?}"),
        })
        .collect();
    assert_eq!(replaced.len(), 2);
    assert!(prices.contains(&10100) && prices.contains(&10300));
}

#[tokio::test]
async fn test_theo_mode_fill_hedges_and_requotes_with_smaller_size() {
    let sink = Arc::new(RecordingSink::new());
    let mut trader = AutoTrader::new(TraderConfig::default(), sink.clone()).unwrap();

    trader
        .on_event(future_book(1, &[(10100, 300)], &[(9900, 300)]))
        .await;
    let ids: Vec<(u64, Side)> = sink
        .drain()
        .into_iter()
        .map(|c| match c {
            OutboundCommand::Insert { id, side, .. } => (id, side),
            other => panic!("unexpected command {other:?}"),
        })
        .collect();
    let (bid_id, _) = *ids.iter().find(|(_, s)| *s == Side::Buy).unwrap();

    // The bid fills in full.
    trader
        .on_event(SessionEvent::OrderFilled {
            id: bid_id,
            price: 9900,
            volume: 50,
        })
        .await;
    assert_eq!(trader.position(), 50);
    let hedges = sink.drain();
    assert_eq!(
        hedges
            .iter()
            .filter(|c| matches!(c, OutboundCommand::Hedge { side: Side::Sell, volume: 50, .. }))
            .count(),
        1
    );

    // Ledger entry clears, and the next evaluation re-bids with the
    // position-tightened size: bid volume at +50 is (100 - 50) / 2 = 25.
    trader
        .on_event(SessionEvent::OrderStatus {
            id: bid_id,
            fill_volume: 50,
            remaining_volume: 0,
            fees: 0,
        })
        .await;
    trader
        .on_event(future_book(2, &[(10100, 300)], &[(9900, 300)]))
        .await;
    let requotes = sink.drain();
    assert_eq!(
        requotes
            .iter()
            .filter(
                |c| matches!(c, OutboundCommand::Insert { side: Side::Buy, volume: 25, .. })
            )
            .count(),
        1
    );
}

#[tokio::test]
async fn test_ladder_paper_session_holds_invariants() {
    let config = TraderConfig {
        quoting: QuotingMode::Ladder,
        ..Default::default()
    };
    let position_limit = config.position_limit;
    let sink = Arc::new(RecordingSink::new());
    let mut trader = AutoTrader::new(config, sink.clone()).unwrap();
    let mut sim = SimSession::new(42, 100, 10_000, position_limit);

    for _ in 0..300 {
        for event in sim.step() {
            trader.on_event(event).await;
            assert!(
                trader.position().abs() <= position_limit,
                "position {} breached the limit",
                trader.position()
            );
        }
        for command in sink.drain() {
            sim.apply(command);
        }
    }

    let metrics = trader.metrics();
    assert!(metrics.inserts > 0, "session never quoted");
    assert!(metrics.hedges > 0, "session never had to hedge");

    // Quiesce: deliver only confirmations so no new fills enter the system,
    // then every hedge must have reconciled and delta must read flat.
    for _ in 0..3 {
        for event in sim.step() {
            if matches!(
                event,
                SessionEvent::HedgeFilled { .. } | SessionEvent::OrderStatus { .. }
            ) {
                trader.on_event(event).await;
            }
        }
        for command in sink.drain() {
            sim.apply(command);
        }
    }
    assert_eq!(trader.delta(), 0, "unreconciled delta after quiesce");
}
