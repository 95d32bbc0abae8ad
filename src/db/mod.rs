//! Session and transaction persistence.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::TradingResult;
use crate::models::session::{TradeTransaction, TradingSession};

pub use memory::InMemorySessionRepository;
pub use postgres::PostgresSessionRepository;

/// Durable, ordered log of sessions and fills. Sessions are upserted by id;
/// transactions are append-only.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn save_session(&self, session: &TradingSession) -> TradingResult<()>;

    async fn append_transaction(&self, transaction: &TradeTransaction) -> TradingResult<()>;

    async fn load_session(&self, id: &str) -> TradingResult<Option<TradingSession>>;

    /// Most recently started active session for a symbol.
    async fn load_active_session(&self, symbol: &str) -> TradingResult<Option<TradingSession>>;

    /// Most recently started session for a symbol, whatever its status.
    async fn load_latest_session(&self, symbol: &str) -> TradingResult<Option<TradingSession>>;

    async fn list_transactions(&self, session_id: &str) -> TradingResult<Vec<TradeTransaction>>;
}
