// 7.0.2: engine-internal failures. these are invariant violations, not
// business rejections: admission checks are supposed to make them impossible,
// so surfacing one means the state machine itself is wrong and the process
// must stop rather than keep mutating financial state.

use crate::ledger::LedgerError;
use crate::types::{OrderId, UserId};

#[derive(Debug, Clone, thiserror::Error)]
pub enum EngineError {
    #[error("ledger invariant broken for user {user_id}: {source}")]
    Ledger {
        user_id: UserId,
        #[source]
        source: LedgerError,
    },

    #[error("no quote for asset {asset} while closing position {order_id}")]
    QuoteMissing { asset: String, order_id: OrderId },

    #[error("position {order_id} vanished from the book mid-close")]
    PositionVanished { order_id: OrderId },
}
