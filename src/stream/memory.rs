//! In-memory transport with consumer-group semantics.
//!
//! Mirrors the behavior the engine relies on from the real log: entries get
//! durable ids, stay pending until acknowledged, and are redelivered through
//! `read_pending` after a simulated restart. Failure injection lets tests
//! exercise the driver's retry paths.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use super::{EventStream, StreamEntry, TransportError};
use crate::events::Outcome;
use crate::types::EntryId;

#[derive(Debug, Default)]
pub struct MemoryStream {
    incoming: VecDeque<StreamEntry>,
    pending: Vec<StreamEntry>,
    acked: Vec<EntryId>,
    published: Vec<Outcome>,
    next_seq: u64,
    fail_publishes: usize,
    fail_acks: usize,
}

impl MemoryStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a raw JSON payload to the log, returning its assigned id.
    pub fn push_raw(&mut self, payload: impl Into<String>) -> EntryId {
        self.next_seq += 1;
        let id = EntryId(format!("{}-0", self.next_seq));
        self.incoming.push_back(StreamEntry {
            id: id.clone(),
            payload: payload.into(),
        });
        id
    }

    pub fn published(&self) -> &[Outcome] {
        &self.published
    }

    pub fn acked(&self) -> &[EntryId] {
        &self.acked
    }

    pub fn pending(&self) -> &[StreamEntry] {
        &self.pending
    }

    /// Fail the next `n` publish calls before succeeding again.
    pub fn fail_next_publishes(&mut self, n: usize) {
        self.fail_publishes = n;
    }

    /// Fail the next `n` ack calls before succeeding again.
    pub fn fail_next_acks(&mut self, n: usize) {
        self.fail_acks = n;
    }
}

#[async_trait]
impl EventStream for MemoryStream {
    async fn read_pending(&mut self) -> Result<Vec<StreamEntry>, TransportError> {
        Ok(self.pending.clone())
    }

    async fn read_new(&mut self, _block: Duration) -> Result<Vec<StreamEntry>, TransportError> {
        let entries: Vec<StreamEntry> = self.incoming.drain(..).collect();
        self.pending.extend(entries.iter().cloned());
        Ok(entries)
    }

    async fn publish(&mut self, outcome: &Outcome) -> Result<(), TransportError> {
        if self.fail_publishes > 0 {
            self.fail_publishes -= 1;
            return Err(TransportError::Io("induced publish failure".to_string()));
        }
        self.published.push(outcome.clone());
        Ok(())
    }

    async fn ack(&mut self, entry_id: &EntryId) -> Result<(), TransportError> {
        if self.fail_acks > 0 {
            self.fail_acks -= 1;
            return Err(TransportError::Io("induced ack failure".to_string()));
        }
        self.pending.retain(|entry| &entry.id != entry_id);
        self.acked.push(entry_id.clone());
        Ok(())
    }
}
