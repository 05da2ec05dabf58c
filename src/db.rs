use crate::models::StrategyConfig;
use anyhow::{Context, Result};
use sqlx::Executor;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::info;

/// Creates a connection pool to the Postgres database.
/// Every session runs in UTC so TIMESTAMP columns read back as UTC.
pub async fn get_db_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET TIME ZONE 'UTC'").await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
        .context("Failed to connect to Postgres")
}

const SCHEMA: &[(&str, &str)] = &[
    (
        "bot_status",
        r#"
        CREATE TABLE IF NOT EXISTS bot_status (
            id SERIAL PRIMARY KEY,
            is_running BOOLEAN DEFAULT false,
            last_update TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            total_trades INTEGER DEFAULT 0,
            active_positions INTEGER DEFAULT 0,
            backend_connected BOOLEAN DEFAULT true,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
    (
        "trades",
        r#"
        CREATE TABLE IF NOT EXISTS trades (
            id SERIAL PRIMARY KEY,
            trade_id VARCHAR(255) UNIQUE NOT NULL,
            token_symbol VARCHAR(50) NOT NULL,
            action VARCHAR(10) NOT NULL CHECK (action IN ('buy', 'sell')),
            amount BIGINT NOT NULL,
            price DECIMAL(20, 8) NOT NULL,
            profit_loss DECIMAL(20, 8) DEFAULT 0,
            timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            status VARCHAR(20) DEFAULT 'pending' CHECK (status IN ('pending', 'completed', 'failed')),
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
    (
        "profit_data",
        r#"
        CREATE TABLE IF NOT EXISTS profit_data (
            id SERIAL PRIMARY KEY,
            timeframe VARCHAR(20) NOT NULL,
            total_profit DECIMAL(20, 8) DEFAULT 0,
            total_loss DECIMAL(20, 8) DEFAULT 0,
            net_profit DECIMAL(20, 8) DEFAULT 0,
            win_rate DECIMAL(5, 2) DEFAULT 0,
            total_trades INTEGER DEFAULT 0,
            chart_data JSONB,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
    (
        "bot_strategy",
        r#"
        CREATE TABLE IF NOT EXISTS bot_strategy (
            id SERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL,
            description TEXT,
            risk_level VARCHAR(20) NOT NULL,
            expected_return VARCHAR(50),
            max_position VARCHAR(20),
            stop_loss VARCHAR(20),
            take_profit VARCHAR(20),
            enabled BOOLEAN DEFAULT true,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
    (
        "wallet_balances",
        r#"
        CREATE TABLE IF NOT EXISTS wallet_balances (
            id SERIAL PRIMARY KEY,
            wallet_address VARCHAR(255) NOT NULL,
            balance DECIMAL(20, 8) NOT NULL,
            timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
    (
        "user_interactions",
        r#"
        CREATE TABLE IF NOT EXISTS user_interactions (
            id SERIAL PRIMARY KEY,
            user_wallet VARCHAR(255),
            action VARCHAR(100) NOT NULL,
            amount DECIMAL(20, 8),
            status VARCHAR(20) DEFAULT 'pending',
            timestamp TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            metadata JSONB
        )
        "#,
    ),
];

// Conflict targets for the upserts. Separate from CREATE TABLE so tables
// created before the constraints existed pick them up too.
const INDEXES: &[&str] = &[
    "CREATE UNIQUE INDEX IF NOT EXISTS profit_data_timeframe_key ON profit_data (timeframe)",
    "CREATE UNIQUE INDEX IF NOT EXISTS bot_strategy_name_key ON bot_strategy (name)",
    "CREATE INDEX IF NOT EXISTS trades_timestamp_idx ON trades (timestamp DESC)",
    "CREATE INDEX IF NOT EXISTS bot_status_created_at_idx ON bot_status (created_at DESC)",
    "CREATE INDEX IF NOT EXISTS wallet_balances_address_idx ON wallet_balances (wallet_address, timestamp)",
];

/// Creates the six ledger tables and seeds the initial rows.
/// Any failure here is fatal for the process.
pub async fn init_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema");

    for (table, ddl) in SCHEMA {
        pool.execute(*ddl)
            .await
            .with_context(|| format!("Failed to create table {table}"))?;
    }

    for ddl in INDEXES {
        pool.execute(*ddl)
            .await
            .with_context(|| format!("Failed to create index: {ddl}"))?;
    }

    sqlx::query(
        r#"
        INSERT INTO bot_status (is_running, total_trades, active_positions, backend_connected)
        SELECT false, 0, 0, true
        WHERE NOT EXISTS (SELECT 1 FROM bot_status)
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to seed bot status")?;

    let seed = StrategyConfig::seed();
    sqlx::query(
        r#"
        INSERT INTO bot_strategy (
            name, description, risk_level, expected_return, max_position,
            stop_loss, take_profit, enabled
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (name) DO NOTHING
        "#,
    )
    .bind(&seed.name)
    .bind(&seed.description)
    .bind(&seed.risk_level)
    .bind(&seed.expected_return)
    .bind(&seed.max_position)
    .bind(&seed.stop_loss)
    .bind(&seed.take_profit)
    .bind(seed.enabled)
    .execute(pool)
    .await
    .context("Failed to seed default strategy")?;

    info!("Database schema ready");
    Ok(())
}
