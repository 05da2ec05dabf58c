use crate::error::{Result, StatusError};
use crate::models::{
    BalancePoll, BotAction, BotStatus, DEFAULT_TIMEFRAME, Health, NewTrade, ProfitAggregate,
    StatusUpdate, StrategyConfig, Trade, TradeStatus, UserInteraction, chart_skeleton,
    timeframe_window,
};
use crate::rpc::BalanceFetcher;
use crate::store::{DEFAULT_TRADE_LIMIT, LedgerStore};
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

const MAX_TRADE_LIMIT: i64 = 1_000;

/// Read/write operations a transport maps onto requests.
///
/// The store and fetcher are built once at startup and injected here;
/// the service itself holds no locks.
pub struct StatusService {
    store: Arc<dyn LedgerStore>,
    fetcher: BalanceFetcher,
    wallet_address: String,
}

impl StatusService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        fetcher: BalanceFetcher,
        wallet_address: impl Into<String>,
    ) -> Self {
        Self {
            store,
            fetcher,
            wallet_address: wallet_address.into(),
        }
    }

    pub fn wallet_address(&self) -> &str {
        &self.wallet_address
    }

    pub async fn health(&self) -> Health {
        let backend_connected = match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Ledger store ping failed");
                false
            }
        };

        Health {
            status: (if backend_connected { "healthy" } else { "degraded" }).to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            backend_connected,
        }
    }

    // ==========================================
    // BOT LIFECYCLE
    // ==========================================

    pub async fn current_status(&self) -> Result<BotStatus> {
        self.store.current_status().await
    }

    pub async fn append_status(&self, status: &StatusUpdate) -> Result<BotStatus> {
        if status.total_trades < 0 || status.active_positions < 0 {
            return Err(StatusError::validation("status counters must not be negative"));
        }
        self.store.append_status(status).await
    }

    /// Counters are zeroed on every toggle, not carried over.
    pub async fn start_bot(&self) -> Result<BotStatus> {
        self.toggle(BotAction::Start).await
    }

    pub async fn stop_bot(&self) -> Result<BotStatus> {
        self.toggle(BotAction::Stop).await
    }

    /// "start" or "stop"; anything else is a validation error.
    pub async fn control_bot(&self, action: &str) -> Result<BotStatus> {
        let action: BotAction = action.parse()?;
        self.toggle(action).await
    }

    /// Returns the row this call wrote, not a re-read of the latest row.
    async fn toggle(&self, action: BotAction) -> Result<BotStatus> {
        let is_running = action == BotAction::Start;
        let written = self.store.append_status(&StatusUpdate::toggled(is_running)).await?;
        info!(is_running, "Bot status toggled");

        let audit_action = if is_running { "bot_start" } else { "bot_stop" };
        self.store
            .log_interaction(
                UserInteraction::new(Some(self.wallet_address.as_str()), audit_action)
                    .with_metadata(json!({ "isRunning": is_running })),
            )
            .await;

        Ok(written)
    }

    // ==========================================
    // TRADES
    // ==========================================

    pub async fn list_recent_trades(&self, limit: Option<i64>) -> Result<Vec<Trade>> {
        let limit = limit.unwrap_or(DEFAULT_TRADE_LIMIT);
        if !(1..=MAX_TRADE_LIMIT).contains(&limit) {
            return Err(StatusError::validation(format!(
                "limit must be between 1 and {MAX_TRADE_LIMIT}"
            )));
        }
        self.store.list_recent_trades(limit).await
    }

    /// Returns false when the trade id was already recorded.
    pub async fn record_trade(&self, trade: &NewTrade) -> Result<bool> {
        let inserted = self.store.record_trade(trade).await?;
        if !inserted {
            info!(trade_id = %trade.trade_id, "Duplicate trade ignored");
        }
        Ok(inserted)
    }

    pub async fn transition_trade(&self, trade_id: &str, next: TradeStatus) -> Result<()> {
        let current = self
            .store
            .trade_status(trade_id)
            .await?
            .ok_or_else(|| StatusError::validation(format!("Unknown trade: {trade_id}")))?;

        if !current.can_transition_to(next) {
            return Err(StatusError::validation(format!(
                "Trade {trade_id} cannot move from {current} to {next}"
            )));
        }

        if !self
            .store
            .compare_and_set_trade_status(trade_id, current, next)
            .await?
        {
            return Err(StatusError::validation(format!(
                "Trade {trade_id} left {current} before it could move to {next}"
            )));
        }

        info!(trade_id, from = %current, to = %next, "Trade status updated");
        Ok(())
    }

    // ==========================================
    // PROFIT
    // ==========================================

    pub async fn profit_report(&self, timeframe: Option<&str>) -> Result<ProfitAggregate> {
        self.store
            .profit_aggregate(timeframe.unwrap_or(DEFAULT_TIMEFRAME))
            .await
    }

    pub async fn upsert_profit_aggregate(&self, aggregate: &ProfitAggregate) -> Result<()> {
        aggregate.validate()?;
        self.store.upsert_profit_aggregate(aggregate).await
    }

    /// Recomputes totals from the trade ledger and upserts them.
    /// The stored chart series is carried over untouched.
    pub async fn refresh_profit_report(&self, timeframe: Option<&str>) -> Result<ProfitAggregate> {
        let timeframe = timeframe.unwrap_or(DEFAULT_TIMEFRAME);
        let since = timeframe_window(timeframe)?.map(|window| Utc::now() - window);

        let trades = self.store.trades_since(since).await?;
        let chart_data = match self.store.find_profit_aggregate(timeframe).await? {
            Some(existing) if !existing.chart_data.is_empty() => existing.chart_data,
            _ => chart_skeleton(),
        };

        let aggregate = ProfitAggregate::from_trades(timeframe, &trades, chart_data);
        self.store.upsert_profit_aggregate(&aggregate).await?;
        info!(timeframe, trades = aggregate.total_trades, "Profit aggregate refreshed");
        Ok(aggregate)
    }

    // ==========================================
    // STRATEGY
    // ==========================================

    pub async fn current_strategy(&self) -> Result<StrategyConfig> {
        self.store.current_strategy().await
    }

    pub async fn update_strategy(&self, strategy: &StrategyConfig) -> Result<StrategyConfig> {
        strategy.validate()?;
        self.store.upsert_strategy(strategy).await?;

        self.store
            .log_interaction(
                UserInteraction::new(Some(self.wallet_address.as_str()), "strategy_update")
                    .with_metadata(json!({ "name": strategy.name, "enabled": strategy.enabled })),
            )
            .await;

        Ok(strategy.clone())
    }

    // ==========================================
    // BALANCE
    // ==========================================

    /// Fetches the balance and appends a snapshot on success.
    /// When every endpoint fails the reply carries `success: false` and
    /// nothing is written.
    pub async fn poll_and_record_balance(&self, address: Option<&str>) -> Result<BalancePoll> {
        let address = address.unwrap_or(&self.wallet_address);

        match self.fetcher.fetch_balance(address).await {
            Ok(reading) => {
                self.store
                    .record_balance_snapshot(address, reading.balance)
                    .await?;
                Ok(BalancePoll {
                    address: address.to_string(),
                    balance: reading.balance,
                    success: true,
                    endpoint: Some(reading.endpoint),
                })
            }
            Err(StatusError::BalanceUnavailable { attempts, .. }) => {
                warn!(address, attempts, "Balance unavailable from every RPC endpoint");
                Ok(BalancePoll {
                    address: address.to_string(),
                    balance: Decimal::ZERO,
                    success: false,
                    endpoint: None,
                })
            }
            Err(e) => Err(e),
        }
    }
}
