use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::TickerSymbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellSignalType {
    StopLoss,
    TakeProfit,
    HoldPeriod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellSignal {
    pub ticker: TickerSymbol,
    pub signal_type: SellSignalType,
    pub trigger_price: Decimal,
    pub return_pct: Decimal,
    pub reasoning: String,
}
