//! Margin engine daemon.
//!
//! Restores the last snapshot, attaches to the input stream's consumer
//! group, re-drains unacknowledged entries, then tails the stream until a
//! shutdown signal. Snapshot capture runs on its own timer alongside.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info};

use margin_core::config;
use margin_core::driver::StreamDriver;
use margin_core::engine::{EngineConfig, MarginEngine};
use margin_core::snapshot::{self, SnapshotStore};
use margin_core::stream::RedisStream;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cfg = config::load();
    info!(
        redis = %cfg.redis_url,
        input = %cfg.engine_stream,
        output = %cfg.results_stream,
        group = %cfg.group_name,
        consumer = %cfg.consumer_name,
        snapshot = %cfg.snapshot_path.display(),
        "startup config"
    );

    let store = SnapshotStore::new(&cfg.snapshot_path);
    let engine = match store.restore() {
        Some(snap) => MarginEngine::from_snapshot(EngineConfig::default(), snap),
        None => MarginEngine::new(EngineConfig::default()),
    };
    let engine = Arc::new(Mutex::new(engine));

    let stream = match RedisStream::connect(&cfg).await {
        Ok(stream) => stream,
        Err(err) => {
            error!(error = %err, "transport unavailable, exiting");
            std::process::exit(1);
        }
    };

    tokio::spawn(snapshot::capture_loop(
        engine.clone(),
        store,
        cfg.snapshot_interval,
    ));

    let mut driver = StreamDriver::new(stream, engine, cfg.block);

    tokio::select! {
        result = driver.run() => {
            // run() only returns on an invariant violation; the entry that
            // triggered it stays unacknowledged for inspection
            if let Err(err) = result {
                error!(error = %err, "engine halted");
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }
}
