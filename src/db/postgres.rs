//! PostgreSQL repository for sessions and fills

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::str::FromStr;
use tokio_postgres::{Client, NoTls, Row};

use crate::db::SessionRepository;
use crate::error::{TradingError, TradingResult};
use crate::models::order::OrderSide;
use crate::models::session::{
    CloseReason, SessionStatus, StopReason, TradeTransaction, TradingSession,
};

const SESSION_COLUMNS: &str = "id, symbol, initial_balance, current_balance, profit_threshold_pct, \
     loss_threshold_pct, status, start_time, end_time, stop_reason, profit, profit_pct";

pub struct PostgresSessionRepository {
    client: Client,
}

fn db_err(context: &str, e: impl std::fmt::Display) -> TradingError {
    TradingError::Persistence(format!("{}: {}", context, e))
}

impl PostgresSessionRepository {
    pub async fn connect(database_url: &str) -> TradingResult<Self> {
        let (client, connection) = tokio_postgres::connect(database_url, NoTls)
            .await
            .map_err(|e| db_err("Failed to connect to PostgreSQL", e))?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "PostgreSQL connection error");
            }
        });

        let repository = Self { client };
        repository.init_schema().await?;
        Ok(repository)
    }

    async fn init_schema(&self) -> TradingResult<()> {
        self.client
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS trading_sessions (
                    id TEXT PRIMARY KEY,
                    symbol TEXT NOT NULL,
                    initial_balance DOUBLE PRECISION NOT NULL,
                    current_balance DOUBLE PRECISION NOT NULL,
                    profit_threshold_pct DOUBLE PRECISION NOT NULL,
                    loss_threshold_pct DOUBLE PRECISION NOT NULL,
                    status TEXT NOT NULL,
                    start_time TIMESTAMPTZ NOT NULL,
                    end_time TIMESTAMPTZ,
                    stop_reason TEXT,
                    profit DOUBLE PRECISION,
                    profit_pct DOUBLE PRECISION
                );
                CREATE TABLE IF NOT EXISTS trade_transactions (
                    seq BIGSERIAL PRIMARY KEY,
                    session_id TEXT NOT NULL REFERENCES trading_sessions(id),
                    order_id TEXT NOT NULL,
                    side TEXT NOT NULL,
                    price DOUBLE PRECISION NOT NULL,
                    amount DOUBLE PRECISION NOT NULL,
                    total DOUBLE PRECISION NOT NULL,
                    profit_pct DOUBLE PRECISION,
                    close_reason TEXT,
                    status TEXT NOT NULL,
                    executed_at TIMESTAMPTZ NOT NULL
                );",
            )
            .await
            .map_err(|e| db_err("Failed to create schema", e))
    }

    fn session_from_row(row: &Row) -> TradingResult<TradingSession> {
        let status: String = row.get(6);
        let stop_reason: Option<String> = row.get(9);
        Ok(TradingSession {
            id: row.get(0),
            symbol: row.get(1),
            initial_balance: row.get(2),
            current_balance: row.get(3),
            profit_threshold_pct: row.get(4),
            loss_threshold_pct: row.get(5),
            status: SessionStatus::from_str(&status).map_err(TradingError::Persistence)?,
            start_time: row.get(7),
            end_time: row.get(8),
            stop_reason: stop_reason
                .as_deref()
                .map(StopReason::from_str)
                .transpose()
                .map_err(TradingError::Persistence)?,
            profit: row.get(10),
            profit_pct: row.get(11),
        })
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn save_session(&self, session: &TradingSession) -> TradingResult<()> {
        let stop_reason = session.stop_reason.map(|r| r.as_str());
        self.client
            .execute(
                "INSERT INTO trading_sessions (id, symbol, initial_balance, current_balance, \
                 profit_threshold_pct, loss_threshold_pct, status, start_time, end_time, \
                 stop_reason, profit, profit_pct)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
                 ON CONFLICT (id) DO UPDATE SET
                    current_balance = EXCLUDED.current_balance,
                    status = EXCLUDED.status,
                    end_time = EXCLUDED.end_time,
                    stop_reason = EXCLUDED.stop_reason,
                    profit = EXCLUDED.profit,
                    profit_pct = EXCLUDED.profit_pct",
                &[
                    &session.id,
                    &session.symbol,
                    &session.initial_balance,
                    &session.current_balance,
                    &session.profit_threshold_pct,
                    &session.loss_threshold_pct,
                    &session.status.as_str(),
                    &session.start_time,
                    &session.end_time,
                    &stop_reason,
                    &session.profit,
                    &session.profit_pct,
                ],
            )
            .await
            .map_err(|e| db_err("Failed to save session", e))?;
        Ok(())
    }

    async fn append_transaction(&self, transaction: &TradeTransaction) -> TradingResult<()> {
        let side = transaction.side.to_string();
        let close_reason = transaction.close_reason.map(|r| r.as_str());
        self.client
            .execute(
                "INSERT INTO trade_transactions (session_id, order_id, side, price, amount, total, \
                 profit_pct, close_reason, status, executed_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
                &[
                    &transaction.session_id,
                    &transaction.order_id,
                    &side,
                    &transaction.price,
                    &transaction.amount,
                    &transaction.total,
                    &transaction.profit_pct,
                    &close_reason,
                    &transaction.status,
                    &transaction.executed_at,
                ],
            )
            .await
            .map_err(|e| db_err("Failed to append transaction", e))?;
        Ok(())
    }

    async fn load_session(&self, id: &str) -> TradingResult<Option<TradingSession>> {
        let query = format!("SELECT {} FROM trading_sessions WHERE id = $1", SESSION_COLUMNS);
        let row = self
            .client
            .query_opt(&query, &[&id])
            .await
            .map_err(|e| db_err("Failed to load session", e))?;
        row.as_ref().map(Self::session_from_row).transpose()
    }

    async fn load_active_session(&self, symbol: &str) -> TradingResult<Option<TradingSession>> {
        let query = format!(
            "SELECT {} FROM trading_sessions
             WHERE symbol = $1 AND status = 'active'
             ORDER BY start_time DESC
             LIMIT 1",
            SESSION_COLUMNS
        );
        let row = self
            .client
            .query_opt(&query, &[&symbol])
            .await
            .map_err(|e| db_err("Failed to load active session", e))?;
        row.as_ref().map(Self::session_from_row).transpose()
    }

    async fn load_latest_session(&self, symbol: &str) -> TradingResult<Option<TradingSession>> {
        let query = format!(
            "SELECT {} FROM trading_sessions
             WHERE symbol = $1
             ORDER BY start_time DESC
             LIMIT 1",
            SESSION_COLUMNS
        );
        let row = self
            .client
            .query_opt(&query, &[&symbol])
            .await
            .map_err(|e| db_err("Failed to load latest session", e))?;
        row.as_ref().map(Self::session_from_row).transpose()
    }

    async fn list_transactions(&self, session_id: &str) -> TradingResult<Vec<TradeTransaction>> {
        let rows = self
            .client
            .query(
                "SELECT session_id, order_id, side, price, amount, total, profit_pct, \
                 close_reason, status, executed_at
                 FROM trade_transactions
                 WHERE session_id = $1
                 ORDER BY seq",
                &[&session_id],
            )
            .await
            .map_err(|e| db_err("Failed to list transactions", e))?;

        rows.iter()
            .map(|row| {
                let side: String = row.get(2);
                let close_reason: Option<String> = row.get(7);
                let executed_at: DateTime<Utc> = row.get(9);
                Ok(TradeTransaction {
                    session_id: row.get(0),
                    order_id: row.get(1),
                    side: match side.as_str() {
                        "buy" => OrderSide::Buy,
                        "sell" => OrderSide::Sell,
                        other => {
                            return Err(TradingError::Persistence(format!(
                                "unknown order side '{}'",
                                other
                            )))
                        }
                    },
                    price: row.get(3),
                    amount: row.get(4),
                    total: row.get(5),
                    profit_pct: row.get(6),
                    close_reason: close_reason
                        .as_deref()
                        .map(CloseReason::from_str)
                        .transpose()
                        .map_err(TradingError::Persistence)?,
                    status: row.get(8),
                    executed_at,
                })
            })
            .collect()
    }
}
