use super::LedgerStore;
use crate::error::{Result, StoreError};
use crate::models::{
    BotStatus, NewTrade, ProfitAggregate, StatusUpdate, StrategyConfig, Trade, TradeStatus,
    UserInteraction, WalletBalanceSnapshot, to_ledger_scale,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    last_ts: Option<DateTime<Utc>>,
    statuses: Vec<BotStatus>,
    trades: Vec<Trade>,
    profits: HashMap<String, ProfitAggregate>,
    // (update sequence, row); the highest sequence is the most recently updated
    strategies: Vec<(u64, StrategyConfig)>,
    strategy_seq: u64,
    snapshots: Vec<WalletBalanceSnapshot>,
    interactions: Vec<UserInteraction>,
}

impl Tables {
    /// Server clock that never runs backwards, like a serial column would.
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_ts {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_ts = Some(ts);
        ts
    }
}

/// In-process ledger with the same semantics as the Postgres backend.
/// `set_offline` makes every call fail with a store error and
/// `set_fail_interactions` breaks only the audit log.
#[derive(Default)]
pub struct MemoryLedger {
    tables: Mutex<Tables>,
    offline: AtomicBool,
    fail_interactions: AtomicBool,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_fail_interactions(&self, fail: bool) {
        self.fail_interactions.store(fail, Ordering::SeqCst);
    }

    pub async fn status_history(&self) -> Vec<BotStatus> {
        self.tables.lock().await.statuses.clone()
    }

    pub async fn snapshots(&self) -> Vec<WalletBalanceSnapshot> {
        self.tables.lock().await.snapshots.clone()
    }

    pub async fn interactions(&self) -> Vec<UserInteraction> {
        self.tables.lock().await.interactions.clone()
    }

    pub async fn profit_rows(&self) -> usize {
        self.tables.lock().await.profits.len()
    }

    pub async fn strategy_rows(&self) -> usize {
        self.tables.lock().await.strategies.len()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory ledger is offline".into()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn latest_status(&self) -> Result<Option<BotStatus>> {
        self.check_online()?;
        Ok(self.tables.lock().await.statuses.last().cloned())
    }

    async fn append_status(&self, status: &StatusUpdate) -> Result<BotStatus> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;
        let row = BotStatus {
            is_running: status.is_running,
            last_update: tables.stamp(),
            total_trades: status.total_trades,
            active_positions: status.active_positions,
            backend_connected: status.backend_connected,
        };
        tables.statuses.push(row.clone());
        Ok(row)
    }

    async fn list_recent_trades(&self, limit: i64) -> Result<Vec<Trade>> {
        self.check_online()?;
        let take = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        let tables = self.tables.lock().await;
        Ok(tables.trades.iter().rev().take(take).cloned().collect())
    }

    async fn trades_since(&self, since: Option<DateTime<Utc>>) -> Result<Vec<Trade>> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .trades
            .iter()
            .filter(|t| since.is_none_or(|s| t.timestamp >= s))
            .cloned()
            .collect())
    }

    async fn insert_trade(&self, trade: &NewTrade) -> Result<bool> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;
        if tables.trades.iter().any(|t| t.trade_id == trade.trade_id) {
            return Ok(false);
        }
        let timestamp = tables.stamp();
        tables.trades.push(Trade {
            trade_id: trade.trade_id.clone(),
            token_symbol: trade.token_symbol.clone(),
            action: trade.action,
            amount: trade.amount,
            price: to_ledger_scale(trade.price),
            profit_loss: to_ledger_scale(trade.profit_loss),
            timestamp,
            status: trade.effective_status(),
        });
        Ok(true)
    }

    async fn trade_status(&self, trade_id: &str) -> Result<Option<TradeStatus>> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .trades
            .iter()
            .find(|t| t.trade_id == trade_id)
            .map(|t| t.status))
    }

    async fn compare_and_set_trade_status(
        &self,
        trade_id: &str,
        from: TradeStatus,
        to: TradeStatus,
    ) -> Result<bool> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;
        match tables
            .trades
            .iter_mut()
            .find(|t| t.trade_id == trade_id && t.status == from)
        {
            Some(trade) => {
                trade.status = to;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_profit_aggregate(&self, timeframe: &str) -> Result<Option<ProfitAggregate>> {
        self.check_online()?;
        Ok(self.tables.lock().await.profits.get(timeframe).cloned())
    }

    async fn upsert_profit_aggregate(&self, aggregate: &ProfitAggregate) -> Result<()> {
        self.check_online()?;
        aggregate.validate()?;
        self.tables
            .lock()
            .await
            .profits
            .insert(aggregate.timeframe.clone(), aggregate.clone());
        Ok(())
    }

    async fn latest_strategy(&self) -> Result<Option<StrategyConfig>> {
        self.check_online()?;
        let tables = self.tables.lock().await;
        Ok(tables
            .strategies
            .iter()
            .max_by_key(|(seq, _)| *seq)
            .map(|(_, s)| s.clone()))
    }

    async fn upsert_strategy(&self, strategy: &StrategyConfig) -> Result<()> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;
        tables.strategy_seq += 1;
        let seq = tables.strategy_seq;
        match tables.strategies.iter_mut().find(|(_, s)| s.name == strategy.name) {
            Some(row) => *row = (seq, strategy.clone()),
            None => tables.strategies.push((seq, strategy.clone())),
        }
        Ok(())
    }

    async fn record_balance_snapshot(&self, address: &str, balance: Decimal) -> Result<()> {
        self.check_online()?;
        let mut tables = self.tables.lock().await;
        let timestamp = tables.stamp();
        tables.snapshots.push(WalletBalanceSnapshot {
            wallet_address: address.to_string(),
            balance: to_ledger_scale(balance),
            timestamp,
        });
        Ok(())
    }

    async fn append_interaction(&self, interaction: &UserInteraction) -> Result<()> {
        self.check_online()?;
        if self.fail_interactions.load(Ordering::SeqCst) {
            let reason = "user_interactions rejected the write".to_string();
            return Err(StoreError::Unavailable(reason).into());
        }
        self.tables.lock().await.interactions.push(interaction.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.check_online()
    }
}
