use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::TickerSymbol;

/// Where a candidate's buy signal originated. A ticker seen in both feeds is
/// re-tagged `InsiderAndPoliticians` by the digest builder's merge step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Insider,
    Politicians,
    InsiderAndPoliticians,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Insider => "insider",
            Source::Politicians => "politicians",
            Source::InsiderAndPoliticians => "insider+politicians",
        }
    }
}

/// One filed insider transaction row as scraped from the source feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    pub insider_name: String,
    pub title: String,
    pub trade_type: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub value_usd: Decimal,
    /// Percentage change in the insider's stake; a brand-new stake is represented as `100`.
    pub delta_own_pct: Decimal,
    pub filing_date: NaiveDate,
    pub trade_date: NaiveDate,
}

/// A merged, scored buy signal before enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub ticker: TickerSymbol,
    pub company: String,
    pub source: Source,
    /// Insertion-order union when merged across sources; never reordered afterward.
    pub insiders: Vec<String>,
    pub is_cluster: bool,
    pub is_csuite_present: bool,
    pub total_value_usd: Decimal,
    pub conviction_score: Decimal,
    pub transactions: Vec<RawTransaction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteType {
    Equity,
    Etf,
    Mutualfund,
    Index,
    Future,
    Currency,
}

impl QuoteType {
    /// Instrument classes the digest builder drops outright (§4.3 filter step 5).
    pub fn is_non_equity(&self) -> bool {
        matches!(
            self,
            QuoteType::Mutualfund | QuoteType::Etf | QuoteType::Index | QuoteType::Future | QuoteType::Currency
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Returns {
    pub r1m: Option<Decimal>,
    pub r6m: Option<Decimal>,
    pub r1y: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub quote_type: QuoteType,
    pub market_cap: Option<Decimal>,
    pub sector: Option<String>,
    pub pe_ratio: Option<Decimal>,
    pub profit_margin: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Technicals {
    pub rsi: Option<Decimal>,
    pub macd: Option<Decimal>,
    pub bollinger_upper: Option<Decimal>,
    pub bollinger_lower: Option<Decimal>,
    pub sma_50: Option<Decimal>,
    pub sma_200: Option<Decimal>,
    pub ema_20: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Earnings {
    pub next_earnings_date: Option<NaiveDate>,
    pub last_eps_surprise_pct: Option<Decimal>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsiderHistory {
    pub buys_30d: u32,
    pub buys_60d: u32,
    pub buys_90d: u32,
    pub accelerating: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct News {
    pub headlines: Vec<String>,
    pub source: Option<String>,
}

/// `Candidate` plus whatever enrichment sub-fetches succeeded. Every field is
/// optional — an absent field means "unknown", never "zero" or "none happened".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    pub returns: Option<Returns>,
    pub fundamentals: Option<Fundamentals>,
    pub technicals: Option<Technicals>,
    pub earnings: Option<Earnings>,
    pub insider_history: Option<InsiderHistory>,
    pub news: Option<News>,
}

impl EnrichedCandidate {
    pub fn ticker(&self) -> &str {
        &self.candidate.ticker
    }

    pub fn conviction_score(&self) -> Decimal {
        self.candidate.conviction_score
    }
}
