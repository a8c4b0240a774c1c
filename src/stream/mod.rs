//! Transport seam for the ordered event log.
//!
//! The engine's contract with the transport: at-least-once delivery, durable
//! per-entry ids, independent acknowledgment, redelivery of unacknowledged
//! entries to a restarted consumer, and a "read pending" mode distinct from
//! "read only new". `RedisStream` speaks Redis Streams consumer groups;
//! `MemoryStream` provides the same semantics in-process for tests.

mod memory;
mod redis;

pub use memory::MemoryStream;
pub use redis::RedisStream;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::events::Outcome;
use crate::types::EntryId;

/// One delivered input entry: transport-assigned id plus the raw JSON
/// payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    pub id: EntryId,
    pub payload: String,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport connect: {0}")]
    Connect(String),

    #[error("transport: {0}")]
    Io(String),
}

#[async_trait]
pub trait EventStream: Send {
    /// Entries delivered to this consumer earlier but never acknowledged.
    /// Covers a crash between apply and acknowledge; drained before tailing
    /// new entries.
    async fn read_pending(&mut self) -> Result<Vec<StreamEntry>, TransportError>;

    /// Block up to `block` for entries never delivered before. An empty vec
    /// means the wait timed out; the caller just re-polls.
    async fn read_new(&mut self, block: Duration) -> Result<Vec<StreamEntry>, TransportError>;

    /// Durably publish one outcome to the results stream.
    async fn publish(&mut self, outcome: &Outcome) -> Result<(), TransportError>;

    /// Remove one entry from the pending set. Only called after every
    /// outcome the entry produced has been published.
    async fn ack(&mut self, entry_id: &EntryId) -> Result<(), TransportError>;
}
