use anyhow::Result;
use bot_status::config::Config;
use bot_status::db;
use bot_status::models::{NewTrade, StrategyConfig, TradeStatus};
use bot_status::rpc::BalanceFetcher;
use bot_status::store::PgLedger;
use bot_status::{ErrorKind, StatusError, StatusService};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bot-status", version, about = "Trading bot status backend")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Service and database health
    Health,
    /// Configured bot wallet address
    Wallet,
    /// Current bot status
    Status,
    Start,
    Stop,
    /// Apply "start" or "stop"
    Control { action: String },
    /// Most recent trades, newest first
    Trades {
        #[arg(long)]
        limit: Option<i64>,
    },
    RecordTrade {
        #[arg(long)]
        id: String,
        #[arg(long)]
        token: String,
        #[arg(long)]
        action: String,
        #[arg(long)]
        amount: i64,
        #[arg(long)]
        price: Decimal,
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        profit: Decimal,
        /// pending, completed or failed (default completed)
        #[arg(long)]
        status: Option<String>,
    },
    /// Move a pending trade to completed or failed
    #[command(name = "trade-status")]
    SetTradeStatus { id: String, status: String },
    Profit {
        #[arg(long)]
        timeframe: Option<String>,
    },
    /// Recompute a profit aggregate from the trade ledger
    RefreshProfit {
        #[arg(long)]
        timeframe: Option<String>,
    },
    Strategy,
    SetStrategy {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        risk_level: String,
        #[arg(long)]
        expected_return: Option<String>,
        #[arg(long)]
        max_position: Option<String>,
        #[arg(long)]
        stop_loss: Option<String>,
        #[arg(long)]
        take_profit: Option<String>,
        #[arg(long)]
        disabled: bool,
    },
    /// Poll the wallet balance and record a snapshot
    Balance {
        #[arg(long)]
        address: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            match e.downcast_ref::<StatusError>().map(StatusError::kind) {
                Some(ErrorKind::Validation) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;

    if let Command::Wallet = cli.command {
        return print_json(&json!({ "address": config.bot_wallet_address }));
    }

    info!("🚀 Starting trading bot status backend");
    info!("Bot wallet: {}", config.bot_wallet_address);

    let pool = db::get_db_pool(&config.database_url, config.db_max_connections).await?;
    db::init_schema(&pool).await?;

    let fetcher = BalanceFetcher::solana(
        &config.rpc_endpoints,
        &config.rpc_user_agent,
        config.rpc_timeout,
    )?;
    let service = StatusService::new(
        Arc::new(PgLedger::new(pool)),
        fetcher,
        config.bot_wallet_address.clone(),
    );

    match cli.command {
        Command::Wallet => print_json(&json!({ "address": service.wallet_address() })),
        Command::Health => print_json(&service.health().await),
        Command::Status => print_json(&service.current_status().await?),
        Command::Start => print_json(&service.start_bot().await?),
        Command::Stop => print_json(&service.stop_bot().await?),
        Command::Control { action } => print_json(&service.control_bot(&action).await?),
        Command::Trades { limit } => print_json(&service.list_recent_trades(limit).await?),
        Command::RecordTrade {
            id,
            token,
            action,
            amount,
            price,
            profit,
            status,
        } => {
            let mut trade =
                NewTrade::new(id, token, &action, amount, price)?.with_profit_loss(profit);
            if let Some(status) = status {
                trade = trade.with_status(status.parse::<TradeStatus>()?);
            }
            let inserted = service.record_trade(&trade).await?;
            print_json(&json!({ "id": trade.trade_id, "inserted": inserted }))
        }
        Command::SetTradeStatus { id, status } => {
            let next: TradeStatus = status.parse()?;
            service.transition_trade(&id, next).await?;
            print_json(&json!({ "id": id, "status": next }))
        }
        Command::Profit { timeframe } => {
            print_json(&service.profit_report(timeframe.as_deref()).await?)
        }
        Command::RefreshProfit { timeframe } => {
            print_json(&service.refresh_profit_report(timeframe.as_deref()).await?)
        }
        Command::Strategy => print_json(&service.current_strategy().await?),
        Command::SetStrategy {
            name,
            description,
            risk_level,
            expected_return,
            max_position,
            stop_loss,
            take_profit,
            disabled,
        } => {
            let strategy = StrategyConfig {
                name,
                description,
                risk_level,
                expected_return,
                max_position,
                stop_loss,
                take_profit,
                enabled: !disabled,
            };
            print_json(&service.update_strategy(&strategy).await?)
        }
        Command::Balance { address } => {
            print_json(&service.poll_and_record_balance(address.as_deref()).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
