use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::candidate::{Earnings, Fundamentals, Technicals};
use crate::TickerSymbol;

/// Sole standardized sentiment record (SPEC_FULL.md §9 open question 2: the source's
/// DB-coupled and DB-free model pairs are collapsed into one shape here).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerSentiment {
    pub mention_count: u32,
    /// In `[-1, 1]`.
    pub score: f64,
    pub subreddits: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    pub per_ticker: HashMap<TickerSymbol, TickerSentiment>,
    pub generated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerResearch {
    pub score: f64,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub catalyst: Option<String>,
    pub sector_peers: Vec<TickerSymbol>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchReport {
    pub per_ticker: HashMap<TickerSymbol, TickerResearch>,
    pub tool_rounds_used: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerMarketData {
    pub price: Option<rust_decimal::Decimal>,
    pub fundamentals: Option<Fundamentals>,
    pub technicals: Option<Technicals>,
    pub earnings: Option<Earnings>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub per_ticker: HashMap<TickerSymbol, TickerMarketData>,
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickAction {
    Buy,
    Sell,
    Hold,
}

/// Invariant: for any decision cycle, the sum of `allocation_pct` across `Buy` picks
/// in one `DailyPicks` must not exceed 100. Enforced by the trader/risk_review stages,
/// not re-validated here — this type only carries the value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPick {
    pub ticker: TickerSymbol,
    pub action: PickAction,
    /// `[0, 100]`.
    pub allocation_pct: f64,
    pub reasoning: String,
    /// `[0, 1]`.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPicks {
    pub picks: Vec<StockPick>,
    pub sell_recommendations: Vec<StockPick>,
    pub confidence: f64,
    pub market_summary: String,
    pub run_date: NaiveDate,
    pub strategy_tag: String,
}

/// Output of the `risk_review` stage. The Trade Executor consumes this, never the
/// pre-review `DailyPicks` it wraps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickReview {
    pub picks: Vec<StockPick>,
    pub sell_recommendations: Vec<StockPick>,
    pub confidence: f64,
    pub market_summary: String,
    pub run_date: NaiveDate,
    pub strategy_tag: String,
    pub risk_notes: String,
    pub adjustments: Vec<String>,
    pub vetoed_tickers: Vec<TickerSymbol>,
}

impl From<DailyPicks> for PickReview {
    /// Used when the risk_review stage has nothing to add (e.g. in the backtest's
    /// simplified replay, which skips risk_review — see `vantage-backtest`).
    fn from(p: DailyPicks) -> Self {
        PickReview {
            picks: p.picks,
            sell_recommendations: p.sell_recommendations,
            confidence: p.confidence,
            market_summary: p.market_summary,
            run_date: p.run_date,
            strategy_tag: p.strategy_tag,
            risk_notes: String::new(),
            adjustments: Vec::new(),
            vetoed_tickers: Vec::new(),
        }
    }
}
