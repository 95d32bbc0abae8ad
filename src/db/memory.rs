use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::db::SessionRepository;
use crate::error::TradingResult;
use crate::models::session::{TradeTransaction, TradingSession};

/// Process-local repository. Used when no database is configured and in
/// tests.
#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, TradingSession>>,
    transactions: RwLock<Vec<TradeTransaction>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sessions(&self) -> Vec<TradingSession> {
        let mut sessions: Vec<_> = self.sessions.read().await.values().cloned().collect();
        sessions.sort_by_key(|s| s.start_time);
        sessions
    }

    pub async fn transactions(&self) -> Vec<TradeTransaction> {
        self.transactions.read().await.clone()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn save_session(&self, session: &TradingSession) -> TradingResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn append_transaction(&self, transaction: &TradeTransaction) -> TradingResult<()> {
        self.transactions.write().await.push(transaction.clone());
        Ok(())
    }

    async fn load_session(&self, id: &str) -> TradingResult<Option<TradingSession>> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn load_active_session(&self, symbol: &str) -> TradingResult<Option<TradingSession>> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.symbol == symbol && s.is_active())
            .max_by_key(|s| s.start_time)
            .cloned())
    }

    async fn load_latest_session(&self, symbol: &str) -> TradingResult<Option<TradingSession>> {
        Ok(self
            .sessions
            .read()
            .await
            .values()
            .filter(|s| s.symbol == symbol)
            .max_by_key(|s| s.start_time)
            .cloned())
    }

    async fn list_transactions(&self, session_id: &str) -> TradingResult<Vec<TradeTransaction>> {
        Ok(self
            .transactions
            .read()
            .await
            .iter()
            .filter(|t| t.session_id == session_id)
            .cloned()
            .collect())
    }
}
