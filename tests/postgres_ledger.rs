//! Runs the Postgres ledger against a real server. Each test gets a fresh
//! database from `sqlx::test`.
//!
//! DATABASE_URL=postgres://... cargo test --test postgres_ledger -- --ignored

use bot_status::db;
use bot_status::error::StatusError;
use bot_status::models::{
    ChartPoint, NewTrade, ProfitAggregate, StatusUpdate, StrategyConfig, TradeStatus,
};
use bot_status::store::{LedgerStore, PgLedger};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::PgPool;

async fn ledger(pool: &PgPool) -> PgLedger {
    db::init_schema(pool).await.unwrap();
    PgLedger::new(pool.clone())
}

async fn count(pool: &PgPool, sql: &str) -> i64 {
    sqlx::query_scalar(sql).fetch_one(pool).await.unwrap()
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn init_schema_seeds_once(pool: PgPool) {
    db::init_schema(&pool).await.unwrap();
    db::init_schema(&pool).await.unwrap();

    assert_eq!(count(&pool, "SELECT COUNT(*) FROM bot_status").await, 1);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM bot_strategy").await, 1);

    let ledger = PgLedger::new(pool.clone());
    assert_eq!(ledger.current_strategy().await.unwrap(), StrategyConfig::seed());
    let status = ledger.current_status().await.unwrap();
    assert!(!status.is_running);
    assert!(status.backend_connected);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn append_status_returns_stored_row(pool: PgPool) {
    let ledger = ledger(&pool).await;

    let written = ledger
        .append_status(&StatusUpdate {
            is_running: true,
            total_trades: 7,
            active_positions: 2,
            backend_connected: true,
        })
        .await
        .unwrap();
    assert!(written.is_running);
    assert_eq!(written.total_trades, 7);
    assert_eq!(written.active_positions, 2);

    assert_eq!(ledger.current_status().await.unwrap(), written);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM bot_status").await, 2);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn latest_status_ties_fall_back_to_insert_order(pool: PgPool) {
    let ledger = ledger(&pool).await;

    sqlx::query(
        r#"
        INSERT INTO bot_status (is_running, total_trades, created_at)
        VALUES (false, 1, '2999-01-01 00:00:00'), (true, 2, '2999-01-01 00:00:00')
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let current = ledger.current_status().await.unwrap();
    assert!(current.is_running);
    assert_eq!(current.total_trades, 2);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn duplicate_trade_id_is_ignored(pool: PgPool) {
    let ledger = ledger(&pool).await;
    let trade = NewTrade::new("t1", "BONK", "buy", 1_000_000, dec!(0.00001234)).unwrap();

    assert!(ledger.record_trade(&trade).await.unwrap());
    let dup = trade.clone().with_profit_loss(dec!(99));
    assert!(!ledger.record_trade(&dup).await.unwrap());

    let trades = ledger.list_recent_trades(10).await.unwrap();
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].trade_id, "t1");
    assert_eq!(trades[0].price, dec!(0.00001234));
    assert_eq!(trades[0].profit_loss, Decimal::ZERO);
    assert_eq!(trades[0].status, TradeStatus::Completed);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn recent_trades_order_and_limit(pool: PgPool) {
    let ledger = ledger(&pool).await;

    sqlx::query(
        r#"
        INSERT INTO trades (trade_id, token_symbol, action, amount, price, timestamp, status)
        VALUES
            ('old', 'BONK', 'buy', 1, 1, '2020-01-01 00:00:00', 'completed'),
            ('a', 'BONK', 'buy', 1, 1, '2021-01-01 00:00:00', 'completed'),
            ('b', 'WIF', 'sell', 1, 1, '2021-01-01 00:00:00', 'completed')
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    let ids: Vec<_> = ledger
        .list_recent_trades(10)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.trade_id)
        .collect();
    assert_eq!(ids, ["b", "a", "old"]);

    assert_eq!(ledger.list_recent_trades(2).await.unwrap().len(), 2);

    let oldest_first: Vec<_> = ledger
        .trades_since(None)
        .await
        .unwrap()
        .into_iter()
        .map(|t| t.trade_id)
        .collect();
    assert_eq!(oldest_first, ["old", "a", "b"]);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn trade_status_moves_once(pool: PgPool) {
    let ledger = ledger(&pool).await;

    // A row written without a status counts as pending.
    sqlx::query(
        r#"
        INSERT INTO trades (trade_id, token_symbol, action, amount, price, status)
        VALUES ('n1', 'BONK', 'buy', 1, 1, NULL)
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    assert_eq!(ledger.trade_status("n1").await.unwrap(), Some(TradeStatus::Pending));
    assert!(ledger
        .compare_and_set_trade_status("n1", TradeStatus::Pending, TradeStatus::Completed)
        .await
        .unwrap());
    assert!(!ledger
        .compare_and_set_trade_status("n1", TradeStatus::Pending, TradeStatus::Failed)
        .await
        .unwrap());
    assert_eq!(ledger.trade_status("n1").await.unwrap(), Some(TradeStatus::Completed));
    assert_eq!(ledger.trade_status("missing").await.unwrap(), None);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn profit_aggregate_upserts_by_timeframe(pool: PgPool) {
    let ledger = ledger(&pool).await;

    let mut agg = ProfitAggregate::empty("week");
    agg.total_profit = dec!(12.12345678);
    agg.total_loss = dec!(2.25);
    agg.net_profit = dec!(9.87345678);
    agg.win_rate = dec!(66.67);
    agg.total_trades = 3;
    let mut tagged = ChartPoint::new("Tue", -0.75);
    tagged.extra.insert("volume".into(), serde_json::json!(42));
    agg.chart_data = vec![ChartPoint::new("Mon", 1.5), tagged];

    ledger.upsert_profit_aggregate(&agg).await.unwrap();
    assert_eq!(ledger.profit_aggregate("week").await.unwrap(), agg);

    agg.total_trades = 4;
    ledger.upsert_profit_aggregate(&agg).await.unwrap();
    assert_eq!(ledger.profit_aggregate("week").await.unwrap(), agg);
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM profit_data").await, 1);

    let mut lossy = agg.clone();
    lossy.win_rate = dec!(66.666);
    assert!(matches!(
        ledger.upsert_profit_aggregate(&lossy).await,
        Err(StatusError::Validation(_))
    ));
    assert_eq!(ledger.profit_aggregate("week").await.unwrap(), agg);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn strategy_upserts_by_name(pool: PgPool) {
    let ledger = ledger(&pool).await;

    let mut seed = StrategyConfig::seed();
    seed.stop_loss = Some("4%".into());
    ledger.upsert_strategy(&seed).await.unwrap();
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM bot_strategy").await, 1);
    assert_eq!(ledger.current_strategy().await.unwrap(), seed);

    let mut other = StrategyConfig::builtin_default();
    other.name = "Scalper".into();
    ledger.upsert_strategy(&other).await.unwrap();
    assert_eq!(count(&pool, "SELECT COUNT(*) FROM bot_strategy").await, 2);
    assert_eq!(ledger.current_strategy().await.unwrap(), other);
}

#[sqlx::test]
#[ignore = "needs DATABASE_URL"]
async fn balance_snapshot_is_stored_at_ledger_scale(pool: PgPool) {
    let ledger = ledger(&pool).await;

    ledger
        .record_balance_snapshot("wallet", dec!(2.123456785))
        .await
        .unwrap();

    let stored: Decimal =
        sqlx::query_scalar("SELECT balance FROM wallet_balances WHERE wallet_address = 'wallet'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stored, dec!(2.12345679));
    assert!(ledger.ping().await.is_ok());
}
