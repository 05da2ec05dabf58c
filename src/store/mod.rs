//! Ledger Store: owns the six persisted entities.
//!
//! Backends implement the primitive reads and writes. The read-side
//! defaults and the audit-log error swallowing live in the provided
//! methods so every backend behaves the same.

pub mod memory;
pub mod postgres;

pub use memory::MemoryLedger;
pub use postgres::PgLedger;

use crate::error::Result;
use crate::models::{
    BotStatus, NewTrade, ProfitAggregate, StatusUpdate, StrategyConfig, Trade, TradeStatus,
    UserInteraction,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::warn;

pub const DEFAULT_TRADE_LIMIT: i64 = 100;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn latest_status(&self) -> Result<Option<BotStatus>>;

    /// Appends a row and returns it as stored; existing rows are never touched.
    async fn append_status(&self, status: &StatusUpdate) -> Result<BotStatus>;

    /// Most recent first, ties broken by insertion order.
    async fn list_recent_trades(&self, limit: i64) -> Result<Vec<Trade>>;

    /// Oldest first. `None` means the whole ledger.
    async fn trades_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Trade>>;

    /// Insert-or-ignore on trade_id. Returns whether a row was written.
    async fn insert_trade(&self, trade: &NewTrade) -> Result<bool>;

    async fn trade_status(&self, trade_id: &str) -> Result<Option<TradeStatus>>;

    /// Moves a trade from `from` to `to` only if it is still in `from`.
    async fn compare_and_set_trade_status(
        &self,
        trade_id: &str,
        from: TradeStatus,
        to: TradeStatus,
    ) -> Result<bool>;

    async fn find_profit_aggregate(&self, timeframe: &str) -> Result<Option<ProfitAggregate>>;

    /// Rejects values the backend could not store exactly (see `ProfitAggregate::validate`).
    async fn upsert_profit_aggregate(&self, aggregate: &ProfitAggregate) -> Result<()>;

    async fn latest_strategy(&self) -> Result<Option<StrategyConfig>>;

    async fn upsert_strategy(&self, strategy: &StrategyConfig) -> Result<()>;

    async fn record_balance_snapshot(&self, address: &str, balance: Decimal) -> Result<()>;

    async fn append_interaction(&self, interaction: &UserInteraction) -> Result<()>;

    async fn ping(&self) -> Result<()>;

    /// Latest status, or the idle default when nothing has been written.
    async fn current_status(&self) -> Result<BotStatus> {
        Ok(self.latest_status().await?.unwrap_or_else(BotStatus::idle))
    }

    async fn profit_aggregate(&self, timeframe: &str) -> Result<ProfitAggregate> {
        Ok(self
            .find_profit_aggregate(timeframe)
            .await?
            .unwrap_or_else(|| ProfitAggregate::empty(timeframe)))
    }

    async fn current_strategy(&self) -> Result<StrategyConfig> {
        Ok(self
            .latest_strategy()
            .await?
            .unwrap_or_else(StrategyConfig::builtin_default))
    }

    /// Validates and inserts. A duplicate trade_id is a no-op.
    async fn record_trade(&self, trade: &NewTrade) -> Result<bool> {
        trade.validate()?;
        self.insert_trade(trade).await
    }

    /// Audit side channel: failures are reported, never returned.
    async fn log_interaction(&self, interaction: UserInteraction) {
        if let Err(e) = self.append_interaction(&interaction).await {
            warn!(action = %interaction.action, error = %e, "Failed to log user interaction");
        }
    }
}
