use super::{
    BotStatus, BotStatusRow, NewTrade, ProfitAggregate, ProfitRow, StatusUpdate, StrategyConfig,
    Trade, TradeRow, TradeStatus, UserInteraction, to_ledger_scale,
};
use crate::error::{Result, StoreError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

// ==========================================
// BOT STATUS OPERATIONS
// ==========================================

/// Latest status row. Ties on created_at fall back to insertion order.
pub async fn get_latest_status(pool: &PgPool) -> Result<Option<BotStatus>> {
    let row = sqlx::query_as::<_, BotStatusRow>(
        r#"
        SELECT is_running, last_update, total_trades, active_positions, backend_connected
        FROM bot_status
        ORDER BY created_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(row.map(BotStatus::from))
}

/// Append a status row (never updates in place) and return it as stored
pub async fn insert_status(pool: &PgPool, status: &StatusUpdate) -> Result<BotStatus> {
    let row = sqlx::query_as::<_, BotStatusRow>(
        r#"
        INSERT INTO bot_status (is_running, total_trades, active_positions, backend_connected)
        VALUES ($1, $2, $3, $4)
        RETURNING is_running, last_update, total_trades, active_positions, backend_connected
        "#,
    )
    .bind(status.is_running)
    .bind(status.total_trades)
    .bind(status.active_positions)
    .bind(status.backend_connected)
    .fetch_one(pool)
    .await?;

    Ok(BotStatus::from(row))
}

// ==========================================
// TRADE OPERATIONS
// ==========================================

/// Insert a trade. Returns false when the trade_id already exists.
pub async fn insert_trade(pool: &PgPool, trade: &NewTrade) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO trades (trade_id, token_symbol, action, amount, price, profit_loss, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (trade_id) DO NOTHING
        "#,
    )
    .bind(&trade.trade_id)
    .bind(&trade.token_symbol)
    .bind(trade.action.as_str())
    .bind(trade.amount)
    .bind(to_ledger_scale(trade.price))
    .bind(to_ledger_scale(trade.profit_loss))
    .bind(trade.effective_status().as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub async fn get_recent_trades(pool: &PgPool, limit: i64) -> Result<Vec<Trade>> {
    let rows = sqlx::query_as::<_, TradeRow>(
        r#"
        SELECT trade_id, token_symbol, action, amount, price, profit_loss, timestamp, status
        FROM trades
        ORDER BY timestamp DESC, id DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    collect_trades(rows)
}

/// Trades at or after `since`, oldest first. `None` returns the whole ledger.
pub async fn get_trades_since(pool: &PgPool, since: Option<DateTime<Utc>>) -> Result<Vec<Trade>> {
    let rows = sqlx::query_as::<_, TradeRow>(
        r#"
        SELECT trade_id, token_symbol, action, amount, price, profit_loss, timestamp, status
        FROM trades
        WHERE $1::timestamp IS NULL OR timestamp >= $1::timestamp
        ORDER BY timestamp ASC, id ASC
        "#,
    )
    .bind(since.map(|t| t.naive_utc()))
    .fetch_all(pool)
    .await?;

    collect_trades(rows)
}

pub async fn get_trade_status(pool: &PgPool, trade_id: &str) -> Result<Option<TradeStatus>> {
    let status: Option<Option<String>> =
        sqlx::query_scalar("SELECT status FROM trades WHERE trade_id = $1")
            .bind(trade_id)
            .fetch_optional(pool)
            .await?;

    match status {
        None => Ok(None),
        Some(None) => Ok(Some(TradeStatus::Pending)),
        Some(Some(s)) => s
            .parse::<TradeStatus>()
            .map(Some)
            .map_err(|_| StoreError::Corrupt(format!("trade {trade_id} has status {s}")).into()),
    }
}

/// Compare-and-set on status. Returns false if the row was not in `from`.
pub async fn update_trade_status(
    pool: &PgPool,
    trade_id: &str,
    from: TradeStatus,
    to: TradeStatus,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE trades SET status = $3
        WHERE trade_id = $1 AND COALESCE(status, 'pending') = $2
        "#,
    )
    .bind(trade_id)
    .bind(from.as_str())
    .bind(to.as_str())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

fn collect_trades(rows: Vec<TradeRow>) -> Result<Vec<Trade>> {
    rows.into_iter()
        .map(|row| Trade::try_from(row).map_err(Into::into))
        .collect()
}

// ==========================================
// PROFIT OPERATIONS
// ==========================================

pub async fn get_profit_aggregate(
    pool: &PgPool,
    timeframe: &str,
) -> Result<Option<ProfitAggregate>> {
    let row = sqlx::query_as::<_, ProfitRow>(
        r#"
        SELECT total_profit, total_loss, net_profit, win_rate, total_trades, chart_data
        FROM profit_data
        WHERE timeframe = $1
        ORDER BY updated_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .bind(timeframe)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.into_aggregate(timeframe)))
}

/// Insert or update the aggregate for its timeframe.
/// Values are bound as given; callers validate scales first.
pub async fn upsert_profit_aggregate(pool: &PgPool, aggregate: &ProfitAggregate) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO profit_data (
            timeframe, total_profit, total_loss, net_profit, win_rate, total_trades, chart_data
        ) VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (timeframe)
        DO UPDATE SET
            total_profit = EXCLUDED.total_profit,
            total_loss = EXCLUDED.total_loss,
            net_profit = EXCLUDED.net_profit,
            win_rate = EXCLUDED.win_rate,
            total_trades = EXCLUDED.total_trades,
            chart_data = EXCLUDED.chart_data,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&aggregate.timeframe)
    .bind(aggregate.total_profit)
    .bind(aggregate.total_loss)
    .bind(aggregate.net_profit)
    .bind(aggregate.win_rate)
    .bind(aggregate.total_trades)
    .bind(Json(&aggregate.chart_data))
    .execute(pool)
    .await?;

    Ok(())
}

// ==========================================
// STRATEGY OPERATIONS
// ==========================================

pub async fn get_latest_strategy(pool: &PgPool) -> Result<Option<StrategyConfig>> {
    let strategy = sqlx::query_as::<_, StrategyConfig>(
        r#"
        SELECT
            name,
            description,
            risk_level,
            expected_return,
            max_position,
            stop_loss,
            take_profit,
            COALESCE(enabled, true) AS enabled
        FROM bot_strategy
        ORDER BY updated_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(strategy)
}

pub async fn upsert_strategy(pool: &PgPool, strategy: &StrategyConfig) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO bot_strategy (
            name, description, risk_level, expected_return, max_position,
            stop_loss, take_profit, enabled
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (name)
        DO UPDATE SET
            description = EXCLUDED.description,
            risk_level = EXCLUDED.risk_level,
            expected_return = EXCLUDED.expected_return,
            max_position = EXCLUDED.max_position,
            stop_loss = EXCLUDED.stop_loss,
            take_profit = EXCLUDED.take_profit,
            enabled = EXCLUDED.enabled,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&strategy.name)
    .bind(&strategy.description)
    .bind(&strategy.risk_level)
    .bind(&strategy.expected_return)
    .bind(&strategy.max_position)
    .bind(&strategy.stop_loss)
    .bind(&strategy.take_profit)
    .bind(strategy.enabled)
    .execute(pool)
    .await?;

    Ok(())
}

// ==========================================
// WALLET BALANCE / AUDIT LOG
// ==========================================

pub async fn insert_balance_snapshot(pool: &PgPool, address: &str, balance: Decimal) -> Result<()> {
    sqlx::query("INSERT INTO wallet_balances (wallet_address, balance) VALUES ($1, $2)")
        .bind(address)
        .bind(to_ledger_scale(balance))
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn insert_interaction(pool: &PgPool, interaction: &UserInteraction) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO user_interactions (user_wallet, action, amount, status, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(&interaction.user_wallet)
    .bind(&interaction.action)
    .bind(interaction.amount.map(to_ledger_scale))
    .bind(&interaction.status)
    .bind(Json(&interaction.metadata))
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn ping(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
