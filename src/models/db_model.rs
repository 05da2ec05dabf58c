use crate::error::{Result, StatusError, StoreError};
use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use sqlx::types::Json;
use std::fmt;
use std::str::FromStr;

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Scale of every DECIMAL(20, 8) column.
pub const LEDGER_SCALE: u32 = 8;

/// Scale of the DECIMAL(5, 2) win rate column.
pub const WIN_RATE_SCALE: u32 = 2;

pub const DEFAULT_TIMEFRAME: &str = "day";

/// Rounds the way Postgres rounds into a NUMERIC(20, 8) column.
pub fn to_ledger_scale(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(LEDGER_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Exact lamports -> SOL conversion. No division involved.
pub fn lamports_to_sol(lamports: u64) -> Decimal {
    Decimal::from_i128_with_scale(lamports as i128, 9)
}

// ==========================================
// BOT STATUS
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotStatus {
    pub is_running: bool,
    pub last_update: DateTime<Utc>,
    pub total_trades: i32,
    pub active_positions: i32,
    pub backend_connected: bool,
}

impl BotStatus {
    /// Returned when no status row exists yet. Never written back.
    pub fn idle() -> Self {
        Self {
            is_running: false,
            last_update: Utc::now(),
            total_trades: 0,
            active_positions: 0,
            backend_connected: true,
        }
    }
}

/// Client-supplied part of a status row; the timestamp is assigned on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub is_running: bool,
    pub total_trades: i32,
    pub active_positions: i32,
    pub backend_connected: bool,
}

impl StatusUpdate {
    /// Start/stop rows zero the counters.
    pub fn toggled(is_running: bool) -> Self {
        Self {
            is_running,
            total_trades: 0,
            active_positions: 0,
            backend_connected: true,
        }
    }
}

#[derive(Debug, FromRow)]
pub struct BotStatusRow {
    pub is_running: Option<bool>,
    pub last_update: Option<NaiveDateTime>,
    pub total_trades: Option<i32>,
    pub active_positions: Option<i32>,
    pub backend_connected: Option<bool>,
}

impl From<BotStatusRow> for BotStatus {
    fn from(row: BotStatusRow) -> Self {
        Self {
            is_running: row.is_running.unwrap_or(false),
            last_update: row
                .last_update
                .map(|t| t.and_utc())
                .unwrap_or_else(Utc::now),
            total_trades: row.total_trades.unwrap_or(0),
            active_positions: row.active_positions.unwrap_or(0),
            backend_connected: row.backend_connected.unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotAction {
    Start,
    Stop,
}

impl FromStr for BotAction {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "start" => Ok(BotAction::Start),
            "stop" => Ok(BotAction::Stop),
            other => Err(StatusError::validation(format!("Invalid action: {other}"))),
        }
    }
}

// ==========================================
// TRADES
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeAction::Buy => "buy",
            TradeAction::Sell => "sell",
        }
    }
}

impl FromStr for TradeAction {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "buy" => Ok(TradeAction::Buy),
            "sell" => Ok(TradeAction::Sell),
            other => Err(StatusError::validation(format!(
                "Invalid trade action: {other} (expected buy or sell)"
            ))),
        }
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Pending,
    Completed,
    Failed,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Pending => "pending",
            TradeStatus::Completed => "completed",
            TradeStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TradeStatus::Pending)
    }

    /// pending -> completed | failed. Nothing leaves a terminal state.
    pub fn can_transition_to(&self, next: TradeStatus) -> bool {
        matches!(
            (self, next),
            (TradeStatus::Pending, TradeStatus::Completed)
                | (TradeStatus::Pending, TradeStatus::Failed)
        )
    }
}

impl FromStr for TradeStatus {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(TradeStatus::Pending),
            "completed" => Ok(TradeStatus::Completed),
            "failed" => Ok(TradeStatus::Failed),
            other => Err(StatusError::validation(format!("Invalid trade status: {other}"))),
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trade as submitted by a producer, before it gets a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrade {
    pub trade_id: String,
    pub token_symbol: String,
    pub action: TradeAction,
    pub amount: i64,
    pub price: Decimal,
    #[serde(default)]
    pub profit_loss: Decimal,
    #[serde(default)]
    pub status: Option<TradeStatus>,
}

impl NewTrade {
    pub fn new(
        trade_id: impl Into<String>,
        token_symbol: impl Into<String>,
        action: &str,
        amount: i64,
        price: Decimal,
    ) -> Result<Self> {
        let trade = Self {
            trade_id: trade_id.into(),
            token_symbol: token_symbol.into(),
            action: action.parse()?,
            amount,
            price,
            profit_loss: Decimal::ZERO,
            status: None,
        };
        trade.validate()?;
        Ok(trade)
    }

    pub fn with_profit_loss(mut self, profit_loss: Decimal) -> Self {
        self.profit_loss = profit_loss;
        self
    }

    pub fn with_status(mut self, status: TradeStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.trade_id.trim().is_empty() {
            return Err(StatusError::validation("trade id must not be empty"));
        }
        if self.token_symbol.trim().is_empty() {
            return Err(StatusError::validation("token symbol must not be empty"));
        }
        if self.token_symbol.len() > 50 {
            return Err(StatusError::validation("token symbol longer than 50 characters"));
        }
        if self.amount < 0 {
            return Err(StatusError::validation("amount must not be negative"));
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(StatusError::validation("price must not be negative"));
        }
        Ok(())
    }

    /// Trades written without an explicit status are already settled.
    pub fn effective_status(&self) -> TradeStatus {
        self.status.unwrap_or(TradeStatus::Completed)
    }
}

/// Field names follow the dashboard payload: id, token, profit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    #[serde(rename = "id")]
    pub trade_id: String,
    #[serde(rename = "token")]
    pub token_symbol: String,
    pub action: TradeAction,
    pub amount: i64,
    pub price: Decimal,
    #[serde(rename = "profit")]
    pub profit_loss: Decimal,
    pub timestamp: DateTime<Utc>,
    pub status: TradeStatus,
}

#[derive(Debug, FromRow)]
pub struct TradeRow {
    pub trade_id: String,
    pub token_symbol: String,
    pub action: String,
    pub amount: i64,
    pub price: Decimal,
    pub profit_loss: Option<Decimal>,
    pub timestamp: Option<NaiveDateTime>,
    pub status: Option<String>,
}

impl TryFrom<TradeRow> for Trade {
    type Error = StoreError;

    fn try_from(row: TradeRow) -> std::result::Result<Self, Self::Error> {
        let action = row
            .action
            .parse()
            .map_err(|_| {
                StoreError::Corrupt(format!("trade {} has action {}", row.trade_id, row.action))
            })?;
        let status = match row.status.as_deref() {
            None => TradeStatus::Pending,
            Some(s) => s
                .parse()
                .map_err(|_| {
                    StoreError::Corrupt(format!("trade {} has status {s}", row.trade_id))
                })?,
        };

        Ok(Self {
            trade_id: row.trade_id,
            token_symbol: row.token_symbol,
            action,
            amount: row.amount,
            price: row.price,
            profit_loss: row.profit_loss.unwrap_or(Decimal::ZERO),
            timestamp: row.timestamp.map(|t| t.and_utc()).unwrap_or_else(Utc::now),
            status,
        })
    }
}

// ==========================================
// PROFIT AGGREGATES
// ==========================================

/// One point of a chart series. Keys other than `time` and `profit`
/// are kept as-is so a stored series survives a refresh unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub time: String,
    pub profit: f64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ChartPoint {
    pub fn new(time: impl Into<String>, profit: f64) -> Self {
        Self {
            time: time.into(),
            profit,
            extra: serde_json::Map::new(),
        }
    }
}

/// Four zeroed buckets shown until real chart data exists.
pub fn chart_skeleton() -> Vec<ChartPoint> {
    ["00:00", "06:00", "12:00", "18:00"]
        .into_iter()
        .map(|time| ChartPoint::new(time, 0.0))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitAggregate {
    pub timeframe: String,
    pub total_profit: Decimal,
    pub total_loss: Decimal,
    pub net_profit: Decimal,
    pub win_rate: Decimal,
    #[serde(rename = "trades")]
    pub total_trades: i32,
    pub chart_data: Vec<ChartPoint>,
}

impl ProfitAggregate {
    pub fn empty(timeframe: impl Into<String>) -> Self {
        Self {
            timeframe: timeframe.into(),
            total_profit: Decimal::ZERO,
            total_loss: Decimal::ZERO,
            net_profit: Decimal::ZERO,
            win_rate: Decimal::ZERO,
            total_trades: 0,
            chart_data: chart_skeleton(),
        }
    }

    /// Folds settled trades into totals. Pending and failed trades are skipped.
    pub fn from_trades(
        timeframe: impl Into<String>,
        trades: &[Trade],
        chart_data: Vec<ChartPoint>,
    ) -> Self {
        let mut total_profit = Decimal::ZERO;
        let mut total_loss = Decimal::ZERO;
        let mut wins = 0i64;
        let mut count = 0i64;

        for trade in trades.iter().filter(|t| t.status == TradeStatus::Completed) {
            count += 1;
            if trade.profit_loss > Decimal::ZERO {
                wins += 1;
                total_profit += trade.profit_loss;
            } else {
                total_loss += trade.profit_loss.abs();
            }
        }

        let win_rate = if count == 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(wins * 100) / Decimal::from(count)).round_dp(WIN_RATE_SCALE)
        };

        Self {
            timeframe: timeframe.into(),
            total_profit,
            total_loss,
            net_profit: total_profit - total_loss,
            win_rate,
            total_trades: i32::try_from(count).unwrap_or(i32::MAX),
            chart_data,
        }
    }

    /// Rejects anything the profit_data columns would round or refuse, so a
    /// stored aggregate reads back exactly as written.
    pub fn validate(&self) -> Result<()> {
        if self.timeframe.trim().is_empty() || self.timeframe.len() > 20 {
            return Err(StatusError::validation("timeframe must be 1 to 20 characters"));
        }
        if self.win_rate < Decimal::ZERO || self.win_rate > Decimal::ONE_HUNDRED {
            return Err(StatusError::validation("win rate must be within 0..=100"));
        }
        if scale_of(self.win_rate) > WIN_RATE_SCALE {
            return Err(StatusError::validation(format!(
                "win rate allows at most {WIN_RATE_SCALE} decimal places"
            )));
        }
        for (field, value) in [
            ("total profit", self.total_profit),
            ("total loss", self.total_loss),
            ("net profit", self.net_profit),
        ] {
            if scale_of(value) > LEDGER_SCALE {
                return Err(StatusError::validation(format!(
                    "{field} allows at most {LEDGER_SCALE} decimal places"
                )));
            }
        }
        if self.total_trades < 0 {
            return Err(StatusError::validation("total trades must not be negative"));
        }
        if let Some(point) = self.chart_data.iter().find(|p| !p.profit.is_finite()) {
            return Err(StatusError::validation(format!(
                "chart point {} has a non-finite profit",
                point.time
            )));
        }
        Ok(())
    }
}

// Trailing zeros do not count: 1.50 fits a two-place column.
fn scale_of(value: Decimal) -> u32 {
    value.normalize().scale()
}

/// Lookback window for a timeframe label. `None` means unbounded.
pub fn timeframe_window(timeframe: &str) -> Result<Option<Duration>> {
    match timeframe {
        "hour" => Ok(Some(Duration::hours(1))),
        "day" => Ok(Some(Duration::days(1))),
        "week" => Ok(Some(Duration::days(7))),
        "month" => Ok(Some(Duration::days(30))),
        "all" => Ok(None),
        other => Err(StatusError::validation(format!("Unknown timeframe: {other}"))),
    }
}

#[derive(Debug, FromRow)]
pub struct ProfitRow {
    pub total_profit: Option<Decimal>,
    pub total_loss: Option<Decimal>,
    pub net_profit: Option<Decimal>,
    pub win_rate: Option<Decimal>,
    pub total_trades: Option<i32>,
    pub chart_data: Option<Json<Vec<ChartPoint>>>,
}

impl ProfitRow {
    pub fn into_aggregate(self, timeframe: &str) -> ProfitAggregate {
        ProfitAggregate {
            timeframe: timeframe.to_string(),
            total_profit: self.total_profit.unwrap_or(Decimal::ZERO),
            total_loss: self.total_loss.unwrap_or(Decimal::ZERO),
            net_profit: self.net_profit.unwrap_or(Decimal::ZERO),
            win_rate: self.win_rate.unwrap_or(Decimal::ZERO),
            total_trades: self.total_trades.unwrap_or(0),
            chart_data: self.chart_data.map(|Json(points)| points).unwrap_or_default(),
        }
    }
}

// ==========================================
// STRATEGY
// ==========================================

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyConfig {
    pub name: String,
    pub description: Option<String>,
    pub risk_level: String,
    pub expected_return: Option<String>,
    pub max_position: Option<String>,
    pub stop_loss: Option<String>,
    pub take_profit: Option<String>,
    pub enabled: bool,
}

impl StrategyConfig {
    /// Served when the strategy table is empty.
    pub fn builtin_default() -> Self {
        Self {
            name: "Default Strategy".into(),
            description: Some("Basic trading strategy".into()),
            risk_level: "Medium".into(),
            expected_return: Some("10% daily".into()),
            max_position: Some("5%".into()),
            stop_loss: Some("3%".into()),
            take_profit: Some("10%".into()),
            enabled: true,
        }
    }

    /// Row written by schema initialisation.
    pub fn seed() -> Self {
        Self {
            name: "Aggressive Meme Token Strategy".into(),
            description: Some(
                "High-frequency trading strategy focused on Solana meme tokens with advanced technical analysis"
                    .into(),
            ),
            risk_level: "High".into(),
            expected_return: Some("15-25% daily".into()),
            max_position: Some("10%".into()),
            stop_loss: Some("5%".into()),
            take_profit: Some("15%".into()),
            enabled: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.name.len() > 255 {
            return Err(StatusError::validation("strategy name must be 1 to 255 characters"));
        }
        if self.risk_level.trim().is_empty() || self.risk_level.len() > 20 {
            return Err(StatusError::validation("risk level must be 1 to 20 characters"));
        }
        for (field, value, max) in [
            ("expected return", &self.expected_return, 50),
            ("max position", &self.max_position, 20),
            ("stop loss", &self.stop_loss, 20),
            ("take profit", &self.take_profit, 20),
        ] {
            if value.as_ref().is_some_and(|v| v.len() > max) {
                return Err(StatusError::validation(format!(
                    "{field} longer than {max} characters"
                )));
            }
        }
        Ok(())
    }
}

// ==========================================
// WALLET BALANCES / AUDIT LOG
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBalanceSnapshot {
    pub wallet_address: String,
    pub balance: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInteraction {
    pub user_wallet: Option<String>,
    pub action: String,
    pub amount: Option<Decimal>,
    pub status: String,
    pub metadata: serde_json::Value,
}

impl UserInteraction {
    pub fn new(user_wallet: Option<&str>, action: impl Into<String>) -> Self {
        Self {
            user_wallet: user_wallet.map(str::to_string),
            action: action.into(),
            amount: None,
            status: "completed".into(),
            metadata: serde_json::json!({}),
        }
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

// ==========================================
// SERVICE REPLIES
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancePoll {
    pub address: String,
    pub balance: Decimal,
    pub success: bool,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub backend_connected: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn settled(id: &str, profit_loss: Decimal) -> Trade {
        Trade {
            trade_id: id.into(),
            token_symbol: "BONK".into(),
            action: TradeAction::Sell,
            amount: 1,
            price: dec!(1),
            profit_loss,
            timestamp: Utc::now(),
            status: TradeStatus::Completed,
        }
    }

    #[test]
    fn test_lamport_conversion_is_exact() {
        assert_eq!(lamports_to_sol(2_500_000_000), dec!(2.5));
        assert_eq!(lamports_to_sol(1), dec!(0.000000001));
        assert_eq!(lamports_to_sol(0), Decimal::ZERO);

        let mut total = Decimal::ZERO;
        for _ in 0..10_000 {
            total += lamports_to_sol(100_000_001);
        }
        assert_eq!(total, dec!(1000.00001));
        assert_eq!(lamports_to_sol(u64::MAX), dec!(18446744073.709551615));
    }

    #[test]
    fn test_ledger_scale_rounds_half_away_from_zero() {
        assert_eq!(to_ledger_scale(dec!(0.000000005)), dec!(0.00000001));
        assert_eq!(to_ledger_scale(dec!(0.000000004)), Decimal::ZERO);
        assert_eq!(to_ledger_scale(dec!(2.5)), dec!(2.5));
    }

    #[test]
    fn test_trade_action_parse() {
        assert_eq!("buy".parse::<TradeAction>().unwrap(), TradeAction::Buy);
        assert_eq!("sell".parse::<TradeAction>().unwrap(), TradeAction::Sell);
        assert!(matches!(
            "hold".parse::<TradeAction>(),
            Err(StatusError::Validation(_))
        ));
        assert!("BUY".parse::<TradeAction>().is_err());
    }

    #[test]
    fn test_trade_status_transitions() {
        use TradeStatus::*;
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Failed));
        assert!(!Pending.can_transition_to(Pending));
        for terminal in [Completed, Failed] {
            assert!(terminal.is_terminal());
            for next in [Pending, Completed, Failed] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_new_trade_validation() {
        assert!(NewTrade::new("t1", "BONK", "buy", 1_000_000, dec!(0.00001234)).is_ok());
        assert!(NewTrade::new("", "BONK", "buy", 1, dec!(1)).is_err());
        assert!(NewTrade::new("t1", " ", "buy", 1, dec!(1)).is_err());
        assert!(NewTrade::new("t1", "BONK", "swap", 1, dec!(1)).is_err());
        assert!(NewTrade::new("t1", "BONK", "sell", -5, dec!(1)).is_err());
        assert!(NewTrade::new("t1", "BONK", "sell", 5, dec!(-1)).is_err());

        let trade = NewTrade::new("t1", "BONK", "buy", 1, dec!(1)).unwrap();
        assert_eq!(trade.effective_status(), TradeStatus::Completed);
        assert_eq!(
            trade.with_status(TradeStatus::Pending).effective_status(),
            TradeStatus::Pending
        );
    }

    #[test]
    fn test_empty_profit_aggregate_has_skeleton() {
        let agg = ProfitAggregate::empty("week");
        assert_eq!(agg.timeframe, "week");
        assert_eq!(agg.total_trades, 0);
        assert_eq!(agg.net_profit, Decimal::ZERO);
        let times: Vec<_> = agg.chart_data.iter().map(|p| p.time.as_str()).collect();
        assert_eq!(times, ["00:00", "06:00", "12:00", "18:00"]);
        assert!(agg.chart_data.iter().all(|p| p.profit == 0.0));
    }

    #[test]
    fn test_profit_aggregate_from_trades() {
        let mut failed = settled("t4", dec!(100));
        failed.status = TradeStatus::Failed;
        let trades = vec![
            settled("t1", dec!(1.5)),
            settled("t2", dec!(-0.5)),
            settled("t3", dec!(0.25)),
            failed,
        ];

        let agg = ProfitAggregate::from_trades("day", &trades, chart_skeleton());
        assert_eq!(agg.total_trades, 3);
        assert_eq!(agg.total_profit, dec!(1.75));
        assert_eq!(agg.total_loss, dec!(0.5));
        assert_eq!(agg.net_profit, dec!(1.25));
        assert_eq!(agg.win_rate, dec!(66.67));
        assert!(agg.validate().is_ok());

        let none = ProfitAggregate::from_trades("day", &[], vec![]);
        assert_eq!(none.win_rate, Decimal::ZERO);
    }

    #[test]
    fn test_profit_aggregate_rejects_lossy_values() {
        let mut agg = ProfitAggregate::empty("day");
        agg.win_rate = dec!(66.666);
        assert!(matches!(agg.validate(), Err(StatusError::Validation(_))));
        agg.win_rate = dec!(66.670);
        assert!(agg.validate().is_ok());

        agg.total_profit = dec!(0.123456789);
        assert!(matches!(agg.validate(), Err(StatusError::Validation(_))));
        agg.total_profit = dec!(0.12345678);
        assert!(agg.validate().is_ok());

        agg.net_profit = dec!(-0.000000001);
        assert!(agg.validate().is_err());
    }

    #[test]
    fn test_profit_aggregate_rejects_non_finite_chart_points() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut agg = ProfitAggregate::empty("day");
            agg.chart_data.push(ChartPoint::new("23:00", bad));
            assert!(matches!(agg.validate(), Err(StatusError::Validation(_))));
        }
    }

    #[test]
    fn test_chart_point_keeps_unknown_keys() {
        let raw = serde_json::json!([{ "time": "09:00", "profit": 1.5, "volume": 42 }]);
        let points: Vec<ChartPoint> = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(points[0].profit, 1.5);
        assert_eq!(points[0].extra["volume"], 42);
        assert_eq!(serde_json::to_value(&points).unwrap(), raw);
    }

    #[test]
    fn test_timeframe_window() {
        assert_eq!(timeframe_window("day").unwrap(), Some(Duration::days(1)));
        assert_eq!(timeframe_window("all").unwrap(), None);
        assert!(timeframe_window("fortnight").is_err());
    }

    #[test]
    fn test_trade_payload_uses_dashboard_names() {
        let json = serde_json::to_value(settled("t1", dec!(0))).unwrap();
        assert_eq!(json["id"], "t1");
        assert_eq!(json["token"], "BONK");
        assert_eq!(json["action"], "sell");
        assert_eq!(json["status"], "completed");
        assert!(json.get("profit").is_some());
    }

    #[test]
    fn test_corrupt_trade_row_is_rejected() {
        let row = TradeRow {
            trade_id: "t9".into(),
            token_symbol: "BONK".into(),
            action: "hold".into(),
            amount: 1,
            price: dec!(1),
            profit_loss: None,
            timestamp: None,
            status: Some("completed".into()),
        };
        assert!(matches!(Trade::try_from(row), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_strategy_validation() {
        assert!(StrategyConfig::builtin_default().validate().is_ok());
        assert!(StrategyConfig::seed().validate().is_ok());
        let mut bad = StrategyConfig::seed();
        bad.name = String::new();
        assert!(bad.validate().is_err());
        let mut bad = StrategyConfig::seed();
        bad.stop_loss = Some("x".repeat(21));
        assert!(bad.validate().is_err());
    }
}
