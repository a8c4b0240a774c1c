// 9.0 config.rs: runtime settings in one place, read from the environment.
// a .env file is honored when present so local runs don't need exports.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    // transport
    pub redis_url: String,
    pub engine_stream: String,
    pub results_stream: String,
    pub group_name: String,
    pub consumer_name: String,

    // snapshotting
    pub snapshot_path: PathBuf,
    pub snapshot_interval: Duration,

    // bounded blocking wait for new entries; the loop re-polls after this so
    // shutdown and housekeeping stay responsive
    pub block: Duration,
}

pub fn load() -> Config {
    let _ = dotenv();

    let redis_url =
        env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let engine_stream =
        env::var("ENGINE_STREAM").unwrap_or_else(|_| "engine-stream".to_string());
    let results_stream =
        env::var("RESULTS_STREAM").unwrap_or_else(|_| "results-stream".to_string());
    let group_name = env::var("GROUP_NAME").unwrap_or_else(|_| "engine-group".to_string());
    let consumer_name =
        env::var("CONSUMER_NAME").unwrap_or_else(|_| "engine-consumer-1".to_string());

    let snapshot_path = env::var("SNAPSHOT_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./snapshot.json"));
    let snapshot_interval = env::var("SNAPSHOT_INTERVAL_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(5));

    let block = env::var("BLOCK_MILLIS")
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(5000));

    Config {
        redis_url,
        engine_stream,
        results_stream,
        group_name,
        consumer_name,
        snapshot_path,
        snapshot_interval,
        block,
    }
}
