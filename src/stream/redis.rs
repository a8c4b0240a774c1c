//! Redis Streams transport.
//!
//! The input log is a stream read through a consumer group: `XREADGROUP`
//! with `0` redelivers this consumer's pending entries, `>` tails new ones,
//! `XACK` retires an entry, and outcomes go out as `XADD <results> * data
//! <json>`. Group creation is idempotent; a BUSYGROUP reply just means a
//! previous run already created it.

use async_trait::async_trait;
use redis::streams::{StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{EventStream, StreamEntry, TransportError};
use crate::config::Config;
use crate::events::Outcome;
use crate::types::EntryId;

pub struct RedisStream {
    conn: redis::aio::ConnectionManager,
    input_stream: String,
    output_stream: String,
    group: String,
    consumer: String,
}

impl RedisStream {
    pub async fn connect(config: &Config) -> Result<Self, TransportError> {
        info!(url = %config.redis_url, stream = %config.engine_stream, "connecting to transport");

        let client = redis::Client::open(config.redis_url.as_str())
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let mut stream = Self {
            conn,
            input_stream: config.engine_stream.clone(),
            output_stream: config.results_stream.clone(),
            group: config.group_name.clone(),
            consumer: config.consumer_name.clone(),
        };
        stream.create_group().await?;
        Ok(stream)
    }

    async fn create_group(&mut self) -> Result<(), TransportError> {
        let result: redis::RedisResult<String> = self
            .conn
            .xgroup_create_mkstream(&self.input_stream, &self.group, "$")
            .await;

        match result {
            Ok(_) => {
                info!(group = %self.group, "consumer group created");
                Ok(())
            }
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!(group = %self.group, "consumer group already exists");
                Ok(())
            }
            Err(e) => Err(TransportError::Connect(e.to_string())),
        }
    }

    async fn read_from(
        &mut self,
        id: &str,
        block: Option<Duration>,
    ) -> Result<Vec<StreamEntry>, TransportError> {
        let mut options = StreamReadOptions::default().group(&self.group, &self.consumer);
        if let Some(block) = block {
            options = options.block(block.as_millis() as usize);
        }

        let reply: Option<StreamReadReply> = self
            .conn
            .xread_options(&[&self.input_stream], &[id], &options)
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;

        let Some(reply) = reply else {
            return Ok(Vec::new());
        };

        let mut entries = Vec::new();
        for key in reply.keys {
            for delivered in key.ids {
                match delivered.get::<String>("data") {
                    Some(payload) => entries.push(StreamEntry {
                        id: EntryId(delivered.id.clone()),
                        payload,
                    }),
                    None => {
                        // stays pending; an operator has to resolve it
                        warn!(entry_id = %delivered.id, "entry without data field, skipping");
                    }
                }
            }
        }
        Ok(entries)
    }
}

#[async_trait]
impl EventStream for RedisStream {
    async fn read_pending(&mut self) -> Result<Vec<StreamEntry>, TransportError> {
        self.read_from("0", None).await
    }

    async fn read_new(&mut self, block: Duration) -> Result<Vec<StreamEntry>, TransportError> {
        self.read_from(">", Some(block)).await
    }

    async fn publish(&mut self, outcome: &Outcome) -> Result<(), TransportError> {
        let _: String = self
            .conn
            .xadd(&self.output_stream, "*", &[("data", outcome.encode())])
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;
        Ok(())
    }

    async fn ack(&mut self, entry_id: &EntryId) -> Result<(), TransportError> {
        let _: i64 = self
            .conn
            .xack(&self.input_stream, &self.group, &[&entry_id.0])
            .await
            .map_err(|e| TransportError::Io(e.to_string()))?;
        Ok(())
    }
}
