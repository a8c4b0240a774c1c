//! Snapshot capture and restore.
//!
//! A snapshot is a full, self-consistent copy of the three mutable state
//! containers plus the offset of the last fully applied input entry. It is
//! written on a fixed interval, replacing the previous copy atomically, and
//! read once at process start. Losing it is never fatal: the full event
//! history remains in the transport, so a cold start just replays from the
//! beginning of pending.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::ledger::LedgerBook;
use crate::market::QuoteBoard;
use crate::position::PositionBook;
use crate::types::{EntryId, Timestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    #[serde(rename = "timestamp")]
    pub taken_at: Timestamp,
    #[serde(rename = "lastStreamId")]
    pub last_entry_id: EntryId,
    #[serde(rename = "price")]
    pub quotes: QuoteBoard,
    #[serde(rename = "balances")]
    pub ledgers: LedgerBook,
    #[serde(rename = "openOrders")]
    pub positions: PositionBook,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// File-backed snapshot storage. One document, replaced in full on every
/// capture.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the snapshot through a temp file and rename it into place, so a
    /// crash mid-write can never leave a torn document behind.
    pub fn save(&self, snapshot: &EngineSnapshot) -> Result<(), SnapshotError> {
        let encoded = serde_json::to_vec(snapshot)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &encoded)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Read the last snapshot. Absence is a cold start; a corrupt or
    /// unreadable file is logged and treated the same way, since the stream
    /// can always rebuild the state.
    pub fn restore(&self) -> Option<EngineSnapshot> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "no snapshot found, cold start");
            return None;
        }

        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "snapshot unreadable, cold start");
                return None;
            }
        };

        match serde_json::from_str::<EngineSnapshot>(&raw) {
            Ok(snapshot) => {
                info!(last_entry_id = %snapshot.last_entry_id, "snapshot restored");
                Some(snapshot)
            }
            Err(error) => {
                warn!(path = %self.path.display(), %error, "snapshot corrupt, cold start");
                None
            }
        }
    }
}

/// Periodic capture. The copy is taken under the engine lock, so it can
/// never observe a half-applied entry; the write itself happens after the
/// lock is released and does not block event processing.
pub async fn capture_loop(
    engine: std::sync::Arc<tokio::sync::Mutex<crate::engine::MarginEngine>>,
    store: SnapshotStore,
    every: std::time::Duration,
) {
    let mut ticker = tokio::time::interval(every);
    // interval fires its first tick immediately; the first capture belongs
    // one full period after boot
    ticker.tick().await;
    loop {
        ticker.tick().await;
        let snapshot = engine.lock().await.snapshot();
        if let Err(error) = store.save(&snapshot) {
            // next tick retries
            warn!(%error, "snapshot write failed");
        }
    }
}
