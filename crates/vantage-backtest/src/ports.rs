//! Narrow boundaries the Backtest Engine depends on (§1 SPEC_FULL.md: "database
//! persistence of historical sentiment" and all rendering are out of scope,
//! accessed only through the interfaces named here). Grounded on
//! `original_source/src/backtesting/data_source.py::BacktestDataSource`.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use vantage_schemas::{BacktestRunStatus, DailyResult, Fundamentals, SignalDigest, Technicals};

/// Replays stored sentiment-digest rows keyed by date. The Backtest Engine never
/// talks to a live signal source — only this reconstruction boundary.
#[async_trait]
pub trait HistoricalDigestSource: Send + Sync {
    async fn available_dates(&self, start: NaiveDate, end: NaiveDate) -> anyhow::Result<Vec<NaiveDate>>;

    /// Reconstructs the day's digest, already capped to `ticker_limit` tickers
    /// (§4.8 step 2's "top-N tickers, capped by `market_data_ticker_limit`").
    async fn digest_for_date(&self, date: NaiveDate, ticker_limit: usize) -> anyhow::Result<SignalDigest>;
}

/// Per-ticker price and market context for a single backtest day. Unlike the live
/// Supervisor's `MarketDataProvider`, this has no currency-conversion step — the
/// source feeds prices directly in the budget's own currency, matching
/// `original_source/src/backtesting/engine.py::_fetch_prices`/`_fetch_market_data`.
#[async_trait]
pub trait HistoricalMarketData: Send + Sync {
    async fn price(&self, ticker: &str, date: NaiveDate) -> anyhow::Result<Decimal>;
    async fn fundamentals(&self, ticker: &str, date: NaiveDate) -> anyhow::Result<Fundamentals>;
    async fn technicals(&self, ticker: &str, date: NaiveDate) -> anyhow::Result<Technicals>;
}

/// Persists run/daily-result rows. Grounded on
/// `BacktestDataSource::{save_backtest_run,complete_backtest_run,save_daily_result}`.
#[async_trait]
pub trait BacktestStore: Send + Sync {
    async fn create_run(&self, name: &str, start_date: NaiveDate, end_date: NaiveDate) -> anyhow::Result<i64>;
    async fn complete_run(&self, run_id: i64, status: BacktestRunStatus, notes: Option<&str>) -> anyhow::Result<()>;
    async fn save_daily_result(&self, result: &DailyResult) -> anyhow::Result<()>;
}
