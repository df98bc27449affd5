//! Shared data model for the orchestrator.
//!
//! Every type here is a plain, serializable value. Nothing in this crate talks to
//! the network, the filesystem, or a database — it exists so every other crate in
//! the workspace exchanges the same named records instead of ad-hoc maps.

pub mod backtest;
pub mod candidate;
pub mod digest;
pub mod execution;
pub mod pipeline;
pub mod sell;

pub use backtest::{BacktestRun, BacktestRunStatus, DailyResult, SimulatedTrade, TradeAction};
pub use candidate::{
    Candidate, Earnings, EnrichedCandidate, Fundamentals, InsiderHistory, News, QuoteType,
    RawTransaction, Returns, Source, Technicals,
};
pub use digest::{SignalDigest, SourceCounts};
pub use execution::{ExecutionSummary, Position, TradeResult};
pub use pipeline::{
    DailyPicks, MarketAnalysis, PickAction, PickReview, ResearchReport, SentimentReport,
    StockPick, TickerResearch, TickerSentiment,
};
pub use sell::{SellSignal, SellSignalType};

/// Opaque ticker key. The exchange suffix (`.AS`, `.DE`, `.L`, ...) is preserved
/// verbatim and never parsed into semantics by this crate or any of its callers.
pub type TickerSymbol = String;
