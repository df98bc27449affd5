use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::TickerSymbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BacktestRunStatus {
    Running,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRun {
    pub id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BacktestRunStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeAction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedTrade {
    pub action: TradeAction,
    pub ticker: TickerSymbol,
    pub quantity: Decimal,
    pub price: Decimal,
    /// Spent amount for a buy, proceeds for a sell.
    pub amount_or_proceeds: Decimal,
    pub pnl: Option<Decimal>,
    pub reason: Option<String>,
    pub date: NaiveDate,
}

/// One row per `(run_id, trade_date, strategy_tag)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyResult {
    pub run_id: i64,
    pub trade_date: NaiveDate,
    pub strategy_tag: String,
    pub is_real: bool,
    pub invested: Decimal,
    pub value: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub trades: Vec<SimulatedTrade>,
}
