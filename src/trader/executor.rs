//! Outbound command seam between the trader core and the session layer.
//!
//! The core never talks to a socket: it calls a `CommandSink`, and the
//! session layer owns delivery. Sends are fire-and-forget; outcomes arrive
//! later as session events. `RecordingSink` captures commands for tests and
//! paper runs.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::errors::Result;

use super::events::{Lifespan, Side};

/// A command issued to the session layer. Each consumes one unit of the
/// rate budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundCommand {
    Insert {
        id: u64,
        side: Side,
        price: u64,
        volume: u64,
        lifespan: Lifespan,
    },
    Cancel {
        id: u64,
    },
    Hedge {
        id: u64,
        side: Side,
        price: u64,
        volume: u64,
    },
}

/// Sink for outbound order commands.
///
/// Implementations must not block on venue round-trips; the dispatcher runs
/// on a single task and every await here stalls event handling.
#[async_trait]
pub trait CommandSink: Send + Sync {
    /// Insert a limit order on the ETF.
    async fn insert_order(
        &self,
        id: u64,
        side: Side,
        price: u64,
        volume: u64,
        lifespan: Lifespan,
    ) -> Result<()>;

    /// Cancel a resting order by id.
    async fn cancel_order(&self, id: u64) -> Result<()>;

    /// Send a hedge order on the future.
    async fn hedge_order(&self, id: u64, side: Side, price: u64, volume: u64) -> Result<()>;
}

/// Sinks are commonly shared between the trader and the harness observing
/// it, so delegate through `Arc`.
#[async_trait]
impl<S: CommandSink> CommandSink for std::sync::Arc<S> {
    async fn insert_order(
        &self,
        id: u64,
        side: Side,
        price: u64,
        volume: u64,
        lifespan: Lifespan,
    ) -> Result<()> {
        (**self).insert_order(id, side, price, volume, lifespan).await
    }

    async fn cancel_order(&self, id: u64) -> Result<()> {
        (**self).cancel_order(id).await
    }

    async fn hedge_order(&self, id: u64, side: Side, price: u64, volume: u64) -> Result<()> {
        (**self).hedge_order(id, side, price, volume).await
    }
}

/// Captures every command in order. Test and paper-trading double.
#[derive(Debug, Default)]
pub struct RecordingSink {
    commands: Mutex<Vec<OutboundCommand>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands seen so far.
    pub fn commands(&self) -> Vec<OutboundCommand> {
        self.commands.lock().expect("sink lock poisoned").clone()
    }

    /// Drop recorded history, keeping the sink usable.
    pub fn drain(&self) -> Vec<OutboundCommand> {
        std::mem::take(&mut *self.commands.lock().expect("sink lock poisoned"))
    }

    fn push(&self, command: OutboundCommand) {
        self.commands.lock().expect("sink lock poisoned").push(command);
    }
}

#[async_trait]
impl CommandSink for RecordingSink {
    async fn insert_order(
        &self,
        id: u64,
        side: Side,
        price: u64,
        volume: u64,
        lifespan: Lifespan,
    ) -> Result<()> {
        self.push(OutboundCommand::Insert {
            id,
            side,
            price,
            volume,
            lifespan,
        });
        Ok(())
    }

    async fn cancel_order(&self, id: u64) -> Result<()> {
        self.push(OutboundCommand::Cancel { id });
        Ok(())
    }

    async fn hedge_order(&self, id: u64, side: Side, price: u64, volume: u64) -> Result<()> {
        self.push(OutboundCommand::Hedge {
            id,
            side,
            price,
            volume,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.insert_order(1, Side::Buy, 9900, 10, Lifespan::Day)
            .await
            .unwrap();
        sink.cancel_order(1).await.unwrap();
        sink.hedge_order(2, Side::Sell, 100, 10).await.unwrap();

        let commands = sink.commands();
        assert_eq!(commands.len(), 3);
        assert!(matches!(commands[0], OutboundCommand::Insert { id: 1, .. }));
        assert!(matches!(commands[1], OutboundCommand::Cancel { id: 1 }));
        assert!(matches!(commands[2], OutboundCommand::Hedge { id: 2, .. }));
    }
}
