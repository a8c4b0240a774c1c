//! The consumption/acknowledgment loop.
//!
//! One entry at a time, processed to completion under the engine lock,
//! outcomes published before the entry is acknowledged. The ordering is the
//! system's correctness-critical point: acknowledging removes the entry from
//! the replay set, so an entry must never be acknowledged until everything it
//! produced is durably out. Undecodable entries are logged and left pending
//! for an operator; they never stall the entries behind them.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::engine::{EngineError, MarginEngine};
use crate::events::{InboundEvent, Outcome};
use crate::stream::{EventStream, StreamEntry};
use crate::types::{EntryId, Timestamp};

const RETRY_DELAY: Duration = Duration::from_millis(200);

/// Only invariant violations escape the loop; everything infrastructural is
/// retried in place.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("engine invariant violation: {0}")]
    Engine(#[from] EngineError),
}

pub struct StreamDriver<S: EventStream> {
    stream: S,
    engine: Arc<Mutex<MarginEngine>>,
    block: Duration,
}

impl<S: EventStream> StreamDriver<S> {
    pub fn new(stream: S, engine: Arc<Mutex<MarginEngine>>, block: Duration) -> Self {
        Self {
            stream,
            engine,
            block,
        }
    }

    /// Drain entries delivered before a crash but never acknowledged, then
    /// tail the stream until the task is torn down.
    pub async fn run(&mut self) -> Result<(), DriverError> {
        self.drain_pending().await?;
        loop {
            self.poll_once().await?;
        }
    }

    /// Redeliver and process the pending set through the same dispatch path
    /// as live entries.
    pub async fn drain_pending(&mut self) -> Result<(), DriverError> {
        let entries = loop {
            match self.stream.read_pending().await {
                Ok(entries) => break entries,
                Err(err) => {
                    warn!(error = %err, "pending read failed, retrying");
                    sleep(RETRY_DELAY).await;
                }
            }
        };

        if !entries.is_empty() {
            info!(count = entries.len(), "re-draining unacknowledged entries");
        }

        // a restored snapshot already reflects entries at or before its
        // offset; re-applying one would double its financial effect. its
        // outcome went out before the crash (or goes out again on the
        // at-least-once outcome stream), so it only needs its ack.
        let last_applied = self.engine.lock().await.last_applied().clone();
        for entry in entries {
            if entry.id.is_at_or_before(&last_applied) {
                info!(entry_id = %entry.id, "entry covered by restored snapshot, acknowledging");
                self.ack_entry(&entry.id).await;
                continue;
            }
            self.process_entry(entry).await?;
        }
        Ok(())
    }

    /// One bounded-blocking poll for new entries. Returns how many entries
    /// were processed; zero means the wait timed out.
    pub async fn poll_once(&mut self) -> Result<usize, DriverError> {
        let entries = match self.stream.read_new(self.block).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(error = %err, "stream read failed, retrying");
                sleep(RETRY_DELAY).await;
                return Ok(0);
            }
        };

        let count = entries.len();
        for entry in entries {
            self.process_entry(entry).await?;
        }
        Ok(count)
    }

    async fn process_entry(&mut self, entry: StreamEntry) -> Result<(), DriverError> {
        let event = match InboundEvent::decode(&entry.payload) {
            Ok(event) => event,
            Err(err) => {
                // poison entry: no ack, stays pending for manual resolution
                error!(entry_id = %entry.id, error = %err, "undecodable entry left unacknowledged");
                return Ok(());
            }
        };

        let outcomes = {
            let mut engine = self.engine.lock().await;
            engine.set_time(Timestamp::now());
            engine.apply(&entry.id, event)?
        };

        self.publish_all(&outcomes).await;
        self.ack_entry(&entry.id).await;
        Ok(())
    }

    /// Publish until every outcome is durably out. The loop never gives up:
    /// advancing past an unpublished outcome would lose a financial effect.
    async fn publish_all(&mut self, outcomes: &[Outcome]) {
        for outcome in outcomes {
            loop {
                match self.stream.publish(outcome).await {
                    Ok(()) => break,
                    Err(err) => {
                        warn!(error = %err, "outcome publish failed, retrying");
                        sleep(RETRY_DELAY).await;
                    }
                }
            }
        }
    }

    async fn ack_entry(&mut self, entry_id: &EntryId) {
        loop {
            match self.stream.ack(entry_id).await {
                Ok(()) => break,
                Err(err) => {
                    warn!(entry_id = %entry_id, error = %err, "ack failed, retrying");
                    sleep(RETRY_DELAY).await;
                }
            }
        }
    }

    /// The stream back, for inspection once the driver is done with it.
    pub fn into_stream(self) -> S {
        self.stream
    }
}
