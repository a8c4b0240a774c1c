// margin-core: leveraged trading margin engine.
// single-writer architecture: one ordered input stream in, one ordered
// outcome stream out, every admission/rejection/liquidation decision
// reproducible on replay.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: UserId, OrderId, EntryId, Side, Bps, Timestamp
//   2.x  scale.rs: fixed-point wire model, per-asset decimal scales
//   3.x  market.rs: quote board, latest bid/ask/scale per asset
//   4.x  position.rs: position struct, position book, pnl math
//   5.x  ledger.rs: free/used margin per user, lazy materialization
//   6.x  events.rs: wire codec: inbound intents, outcomes, reject taxonomy
//   7.x  engine/: order state machine, admission chain, liquidation sweep
//   8.x  snapshot.rs: point-in-time capture, atomic replace, tolerant restore
//   9.x  config.rs: env-driven runtime settings
//   10.x stream/: transport seam: Redis Streams consumer group + in-memory
//   11.x driver.rs: consume -> decode -> apply -> publish -> ack loop

pub mod config;
pub mod driver;
pub mod engine;
pub mod events;
pub mod ledger;
pub mod market;
pub mod position;
pub mod scale;
pub mod snapshot;
pub mod stream;
pub mod types;

pub use driver::{DriverError, StreamDriver};
pub use engine::{acceptable_band, EngineConfig, EngineError, MarginEngine};
pub use events::{
    CancelOrder, CloseReason, InboundEvent, Outcome, OrderClosed, OrderOpened, OrderRejected,
    PlaceOrder, RejectReason,
};
pub use ledger::{LedgerBook, LedgerError, MarginLedger};
pub use market::{AssetQuote, QuoteBoard};
pub use position::{mark_price, unrealized_pnl, Position, PositionBook};
pub use scale::{descale, rescale, Scale, USD_SCALE};
pub use snapshot::{EngineSnapshot, SnapshotError, SnapshotStore};
pub use stream::{EventStream, MemoryStream, RedisStream, StreamEntry, TransportError};
pub use types::{Bps, EntryId, OrderId, Side, Timestamp, UserId};
