use super::LedgerStore;
use crate::error::Result;
use crate::models::{
    BotStatus, NewTrade, ProfitAggregate, StatusUpdate, StrategyConfig, Trade, TradeStatus,
    UserInteraction, queries,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

/// Postgres-backed ledger. Each write is a single statement, so unique-key
/// conflict resolution is the only concurrency control.
#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedger {
    async fn latest_status(&self) -> Result<Option<BotStatus>> {
        queries::get_latest_status(&self.pool).await
    }

    async fn append_status(&self, status: &StatusUpdate) -> Result<BotStatus> {
        queries::insert_status(&self.pool, status).await
    }

    async fn list_recent_trades(&self, limit: i64) -> Result<Vec<Trade>> {
        queries::get_recent_trades(&self.pool, limit).await
    }

    async fn trades_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Trade>> {
        queries::get_trades_since(&self.pool, since).await
    }

    async fn insert_trade(&self, trade: &NewTrade) -> Result<bool> {
        queries::insert_trade(&self.pool, trade).await
    }

    async fn trade_status(&self, trade_id: &str) -> Result<Option<TradeStatus>> {
        queries::get_trade_status(&self.pool, trade_id).await
    }

    async fn compare_and_set_trade_status(
        &self,
        trade_id: &str,
        from: TradeStatus,
        to: TradeStatus,
    ) -> Result<bool> {
        queries::update_trade_status(&self.pool, trade_id, from, to).await
    }

    async fn find_profit_aggregate(&self, timeframe: &str) -> Result<Option<ProfitAggregate>> {
        queries::get_profit_aggregate(&self.pool, timeframe).await
    }

    async fn upsert_profit_aggregate(&self, aggregate: &ProfitAggregate) -> Result<()> {
        aggregate.validate()?;
        queries::upsert_profit_aggregate(&self.pool, aggregate).await
    }

    async fn latest_strategy(&self) -> Result<Option<StrategyConfig>> {
        queries::get_latest_strategy(&self.pool).await
    }

    async fn upsert_strategy(&self, strategy: &StrategyConfig) -> Result<()> {
        queries::upsert_strategy(&self.pool, strategy).await
    }

    async fn record_balance_snapshot(&self, address: &str, balance: Decimal) -> Result<()> {
        queries::insert_balance_snapshot(&self.pool, address, balance).await
    }

    async fn append_interaction(&self, interaction: &UserInteraction) -> Result<()> {
        queries::insert_interaction(&self.pool, interaction).await
    }

    async fn ping(&self) -> Result<()> {
        queries::ping(&self.pool).await
    }
}
