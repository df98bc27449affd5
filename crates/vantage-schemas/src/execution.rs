use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::TickerSymbol;

/// A live or simulated open position. `avg_buy_price` is a running cost-basis
/// average, not a FIFO ledger (see `vantage-portfolio` for the accounting rule).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub ticker: TickerSymbol,
    pub quantity: Decimal,
    pub avg_buy_price: Decimal,
    pub opened_at: NaiveDate,
    pub is_real: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeResult {
    pub ticker: TickerSymbol,
    pub success: bool,
    pub amount_spent: Decimal,
    pub quantity: Decimal,
    pub broker_ticker: Option<String>,
    pub error: Option<String>,
}

impl TradeResult {
    pub fn failed(ticker: impl Into<TickerSymbol>, error: impl Into<String>) -> Self {
        TradeResult {
            ticker: ticker.into(),
            success: false,
            amount_spent: Decimal::ZERO,
            quantity: Decimal::ZERO,
            broker_ticker: None,
            error: Some(error.into()),
        }
    }
}

/// Invariant: `total_spent == sum(bought.amount_spent) <= min(budget, available_cash) + tolerance`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub is_real: bool,
    pub budget: Decimal,
    pub available_cash: Decimal,
    pub total_spent: Decimal,
    pub bought: Vec<TradeResult>,
    pub failed: Vec<TradeResult>,
}
