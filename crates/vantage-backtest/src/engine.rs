//! Backtest Engine replay loop (§4.8 SPEC_FULL.md). Grounded on
//! `original_source/src/backtesting/engine.py::BacktestEngine.run`, generalized
//! from the source's single-pipeline-per-day run into this workspace's
//! `vantage-pipeline::run_both` two-strategy shape — the same conservative/
//! aggressive, Market/Research branch split `vantage-supervisor::decision_cycle`
//! already uses (see DESIGN.md).
//!
//! Each date is isolated: a pipeline failure on one date is logged and the
//! replay continues to the next (`original_source/src/backtesting/engine.py`'s
//! `try/except` around the per-day body, never aborting the run).

use std::collections::HashMap;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use vantage_pipeline::tools::{ToolDefinition, ToolExecutor};
use vantage_pipeline::{run_both, AnalysisBranch, CancelSignal, StrategyConfig, StructuredGenerator, ToolCallingGenerator};
use vantage_portfolio::SimulatedPortfolio;
use vantage_schemas::{BacktestRunStatus, DailyResult, PickAction, PickReview, Position, TickerSymbol};
use vantage_scheduler::is_trading_day;
use vantage_sell::{evaluate_positions, SellStrategyConfig};

use crate::ports::{BacktestStore, HistoricalDigestSource, HistoricalMarketData};
use crate::tool_backend::HistoricalToolBackend;

pub struct BacktestRunConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub run_name: Option<String>,
    pub conservative_budget: Decimal,
    pub aggressive_budget: Decimal,
    pub ticker_limit: usize,
    pub sell: SellStrategyConfig,
    pub model: String,
    pub max_tool_rounds: u32,
    pub pipeline_timeout: Duration,
}

pub struct BacktestPorts<'a> {
    pub digest_source: &'a dyn HistoricalDigestSource,
    pub market_data: &'a dyn HistoricalMarketData,
    pub store: &'a dyn BacktestStore,
    pub structured: &'a dyn StructuredGenerator,
    pub tool_calling: Option<&'a dyn ToolCallingGenerator>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategySummary {
    pub total_invested: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub open_positions: usize,
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub run_id: i64,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days_traded: usize,
    pub conservative: StrategySummary,
    pub aggressive: StrategySummary,
}

fn researched_tools() -> Vec<ToolDefinition> {
    let empty_schema = serde_json::json!({ "type": "object", "properties": { "ticker": { "type": "string" } }, "required": ["ticker"] });
    vec![
        ToolDefinition { name: "get_stock_price".into(), description: "Current price for a ticker".into(), parameters_schema: empty_schema.clone() },
        ToolDefinition { name: "get_fundamentals".into(), description: "Fundamentals for a ticker".into(), parameters_schema: empty_schema.clone() },
        ToolDefinition { name: "get_technical_indicators".into(), description: "Technical indicators for a ticker".into(), parameters_schema: empty_schema },
    ]
}

/// Converts live simulated positions into the `vantage-sell` evaluator's input
/// shape. `is_real` is meaningless for a simulated account; both portfolios are
/// tagged `false` since neither ever touches a live broker.
fn as_positions(portfolio: &SimulatedPortfolio) -> Vec<Position> {
    portfolio
        .positions
        .values()
        .map(|p| Position { ticker: p.ticker.clone(), quantity: p.quantity, avg_buy_price: p.avg_buy_price, opened_at: p.opened_date, is_real: false })
        .collect()
}

fn apply_sell_rules(portfolio: &mut SimulatedPortfolio, cfg: &SellStrategyConfig, prices: &HashMap<TickerSymbol, Decimal>, date: NaiveDate) {
    let positions = as_positions(portfolio);
    let signals = evaluate_positions(cfg, &positions, prices, date);
    for signal in signals {
        portfolio.sell(&signal.ticker, signal.trigger_price, date, signal.reasoning);
    }
}

/// Applies a strategy's picks directly to its simulated portfolio — no broker
/// abstraction, matching `original_source/src/backtesting/engine.py::_execute_picks`.
/// Sell recommendations close a position outright; buy picks spend
/// `budget * allocation_pct / 100` at the day's price, skipping tickers with no
/// known price (silent skip, matching the portfolio's own non-positive-price guard).
fn apply_picks(portfolio: &mut SimulatedPortfolio, picks: &PickReview, prices: &HashMap<TickerSymbol, Decimal>, budget: Decimal, date: NaiveDate) {
    for sell in &picks.sell_recommendations {
        if let Some(&price) = prices.get(&sell.ticker) {
            portfolio.sell(&sell.ticker, price, date, "model_sell_recommendation");
        }
    }

    for pick in &picks.picks {
        if pick.action != PickAction::Buy {
            continue;
        }
        let Some(&price) = prices.get(&pick.ticker) else { continue };
        let amount = budget * Decimal::from_f64_retain(pick.allocation_pct).unwrap_or_default() / Decimal::from(100);
        portfolio.buy(&pick.ticker, amount, price, date);
    }
}

fn summarize(portfolio: &SimulatedPortfolio, prices: &HashMap<TickerSymbol, Decimal>) -> StrategySummary {
    let wins = portfolio.trades.iter().filter(|t| t.pnl.is_some_and(|pnl| pnl > Decimal::ZERO)).count();
    let losses = portfolio.trades.iter().filter(|t| t.pnl.is_some_and(|pnl| pnl <= Decimal::ZERO)).count();
    StrategySummary {
        total_invested: portfolio.total_invested,
        realized_pnl: portfolio.realized_pnl,
        unrealized_pnl: portfolio.unrealized_pnl(prices),
        open_positions: portfolio.positions.len(),
        total_trades: portfolio.trades.len(),
        wins,
        losses,
    }
}

struct DayOutcome {
    trade_date: NaiveDate,
    strategy_tag: &'static str,
    invested: Decimal,
    value: Decimal,
    realized_pnl: Decimal,
    unrealized_pnl: Decimal,
    trades: Vec<vantage_schemas::SimulatedTrade>,
}

pub async fn run(ports: BacktestPorts<'_>, cfg: BacktestRunConfig) -> anyhow::Result<BacktestReport> {
    let name = cfg.run_name.clone().unwrap_or_else(|| format!("backtest_{}_{}", cfg.start_date, cfg.end_date));

    let run_id = ports.store.create_run(&name, cfg.start_date, cfg.end_date).await?;

    let available = ports.digest_source.available_dates(cfg.start_date, cfg.end_date).await.unwrap_or_default();
    let trading_dates: Vec<NaiveDate> = available.into_iter().filter(|d| is_trading_day(*d)).collect();

    if trading_dates.is_empty() {
        tracing::warn!(%cfg.start_date, %cfg.end_date, "no historical sentiment data available in range");
        ports.store.complete_run(run_id, BacktestRunStatus::Completed, Some("No data available")).await?;
        return Ok(BacktestReport {
            run_id,
            name,
            start_date: cfg.start_date,
            end_date: cfg.end_date,
            days_traded: 0,
            conservative: StrategySummary::default(),
            aggressive: StrategySummary::default(),
        });
    }

    let mut conservative_portfolio = SimulatedPortfolio::new();
    let mut aggressive_portfolio = SimulatedPortfolio::new();
    let mut days_traded = 0usize;
    let tools = researched_tools();

    for date in &trading_dates {
        match run_one_day(&ports, &cfg, &tools, *date, &mut conservative_portfolio, &mut aggressive_portfolio).await {
            Ok(outcomes) => {
                days_traded += 1;
                for outcome in outcomes {
                    let result = DailyResult {
                        run_id,
                        trade_date: outcome.trade_date,
                        strategy_tag: outcome.strategy_tag.to_string(),
                        is_real: false,
                        invested: outcome.invested,
                        value: outcome.value,
                        realized_pnl: outcome.realized_pnl,
                        unrealized_pnl: outcome.unrealized_pnl,
                        trades: outcome.trades,
                    };
                    if let Err(err) = ports.store.save_daily_result(&result).await {
                        tracing::warn!(%date, error = %err, "failed to persist daily result, continuing replay");
                    }
                }
            }
            Err(err) => {
                tracing::warn!(%date, error = %err, "backtest day failed, skipping to next trading date");
            }
        }
    }

    ports.store.complete_run(run_id, BacktestRunStatus::Completed, None).await?;

    let final_prices = HashMap::new();
    Ok(BacktestReport {
        run_id,
        name,
        start_date: cfg.start_date,
        end_date: cfg.end_date,
        days_traded,
        conservative: summarize(&conservative_portfolio, &final_prices),
        aggressive: summarize(&aggressive_portfolio, &final_prices),
    })
}

async fn run_one_day(
    ports: &BacktestPorts<'_>,
    cfg: &BacktestRunConfig,
    tools: &[ToolDefinition],
    date: NaiveDate,
    conservative_portfolio: &mut SimulatedPortfolio,
    aggressive_portfolio: &mut SimulatedPortfolio,
) -> anyhow::Result<Vec<DayOutcome>> {
    let digest = ports.digest_source.digest_for_date(date, cfg.ticker_limit).await?;
    if digest.is_empty() {
        tracing::debug!(%date, "no candidates for this date, skipping");
        return Ok(Vec::new());
    }

    let mut prices = HashMap::with_capacity(digest.candidates.len());
    for candidate in &digest.candidates {
        match ports.market_data.price(candidate.ticker(), date).await {
            Ok(price) => {
                prices.insert(candidate.ticker().to_string(), price);
            }
            Err(err) => {
                tracing::debug!(%date, ticker = candidate.ticker(), error = %err, "price fetch failed, ticker unpriced today");
            }
        }
    }

    apply_sell_rules(conservative_portfolio, &cfg.sell, &prices, date);
    apply_sell_rules(aggressive_portfolio, &cfg.sell, &prices, date);

    let market_data = build_market_data_table(ports.market_data, &digest.candidates, date).await;
    let conservative_snapshot = as_positions(conservative_portfolio);
    let aggressive_snapshot = as_positions(aggressive_portfolio);

    let tool_backend = HistoricalToolBackend::new(ports.market_data, date);
    let executor = ToolExecutor::new(Box::new(tool_backend));

    let conservative_cfg = StrategyConfig {
        strategy_tag: "conservative",
        model: &cfg.model,
        structured: ports.structured,
        tool_calling: ports.tool_calling,
        branch: AnalysisBranch::Market { market_data: &market_data },
        portfolio: &conservative_snapshot,
        budget: cfg.conservative_budget,
    };
    let aggressive_cfg = StrategyConfig {
        strategy_tag: "aggressive",
        model: &cfg.model,
        structured: ports.structured,
        tool_calling: ports.tool_calling,
        branch: AnalysisBranch::Research { tools, executor: &executor, max_tool_rounds: cfg.max_tool_rounds },
        portfolio: &aggressive_snapshot,
        budget: cfg.aggressive_budget,
    };

    let (conservative_result, aggressive_result) =
        run_both(&digest, conservative_cfg, aggressive_cfg, CancelSignal::new(), cfg.pipeline_timeout).await;

    let mut outcomes = Vec::with_capacity(2);

    match conservative_result {
        Ok(picks) => apply_picks(conservative_portfolio, &picks, &prices, cfg.conservative_budget, date),
        Err(err) => tracing::warn!(%date, error = %err, "conservative pipeline failed for this date"),
    }
    outcomes.push(day_outcome("conservative", date, conservative_portfolio, &prices));

    match aggressive_result {
        Ok(picks) => apply_picks(aggressive_portfolio, &picks, &prices, cfg.aggressive_budget, date),
        Err(err) => tracing::warn!(%date, error = %err, "aggressive pipeline failed for this date"),
    }
    outcomes.push(day_outcome("aggressive", date, aggressive_portfolio, &prices));

    Ok(outcomes)
}

fn day_outcome(tag: &'static str, date: NaiveDate, portfolio: &SimulatedPortfolio, prices: &HashMap<TickerSymbol, Decimal>) -> DayOutcome {
    let todays_trades: Vec<_> = portfolio.trades.iter().filter(|t| t.date == date).cloned().collect();
    DayOutcome {
        trade_date: date,
        strategy_tag: tag,
        invested: portfolio.total_invested,
        value: portfolio.portfolio_value(prices),
        realized_pnl: portfolio.realized_pnl,
        unrealized_pnl: portfolio.unrealized_pnl(prices),
        trades: todays_trades,
    }
}

async fn build_market_data_table(
    market_data: &dyn HistoricalMarketData,
    candidates: &[vantage_schemas::EnrichedCandidate],
    date: NaiveDate,
) -> HashMap<TickerSymbol, vantage_schemas::TickerMarketData> {
    let mut table = HashMap::with_capacity(candidates.len());
    for candidate in candidates {
        let ticker = candidate.ticker();
        let price = market_data.price(ticker, date).await.ok();
        let fundamentals = market_data.fundamentals(ticker, date).await.ok();
        let technicals = market_data.technicals(ticker, date).await.ok();
        table.insert(ticker.to_string(), vantage_schemas::TickerMarketData { price, fundamentals, technicals, earnings: None });
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;
    use vantage_schemas::{Candidate, EnrichedCandidate, Fundamentals, QuoteType, Returns, SignalDigest, SourceCounts, Technicals};

    struct StubDigestSource {
        dates: Vec<NaiveDate>,
        digest: SignalDigest,
    }

    #[async_trait]
    impl HistoricalDigestSource for StubDigestSource {
        async fn available_dates(&self, _start: NaiveDate, _end: NaiveDate) -> anyhow::Result<Vec<NaiveDate>> {
            Ok(self.dates.clone())
        }
        async fn digest_for_date(&self, _date: NaiveDate, _ticker_limit: usize) -> anyhow::Result<SignalDigest> {
            Ok(self.digest.clone())
        }
    }

    struct FixedMarketData(Decimal);

    #[async_trait]
    impl HistoricalMarketData for FixedMarketData {
        async fn price(&self, _ticker: &str, _date: NaiveDate) -> anyhow::Result<Decimal> {
            Ok(self.0)
        }
        async fn fundamentals(&self, _ticker: &str, _date: NaiveDate) -> anyhow::Result<Fundamentals> {
            Ok(Fundamentals { quote_type: QuoteType::Equity, market_cap: None, sector: None, pe_ratio: None, profit_margin: None })
        }
        async fn technicals(&self, _ticker: &str, _date: NaiveDate) -> anyhow::Result<Technicals> {
            Ok(Technicals::default())
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        completed: Mutex<Vec<(BacktestRunStatus, Option<String>)>>,
        daily_results: Mutex<Vec<DailyResult>>,
    }

    #[async_trait]
    impl BacktestStore for RecordingStore {
        async fn create_run(&self, _name: &str, _start_date: NaiveDate, _end_date: NaiveDate) -> anyhow::Result<i64> {
            Ok(1)
        }
        async fn complete_run(&self, _run_id: i64, status: BacktestRunStatus, notes: Option<&str>) -> anyhow::Result<()> {
            self.completed.lock().unwrap().push((status, notes.map(str::to_string)));
            Ok(())
        }
        async fn save_daily_result(&self, result: &DailyResult) -> anyhow::Result<()> {
            self.daily_results.lock().unwrap().push(result.clone());
            Ok(())
        }
    }

    struct StubGenerator;

    #[async_trait]
    impl StructuredGenerator for StubGenerator {
        async fn generate(&self, _model: &str, _system: &str, _user: &str, _schema: &Value) -> anyhow::Result<Value> {
            Ok(serde_json::json!({
                "per_ticker": {}, "generated_at": chrono::Utc::now().to_rfc3339(), "summary": "ok",
                "picks": [], "sell_recommendations": [], "confidence": 0.5, "market_summary": "ok",
                "run_date": "2026-01-01", "strategy_tag": "conservative",
                "risk_notes": "", "adjustments": [], "vetoed_tickers": [],
            }))
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl StructuredGenerator for FailingGenerator {
        async fn generate(&self, _model: &str, _system: &str, _user: &str, _schema: &Value) -> anyhow::Result<Value> {
            anyhow::bail!("generator unavailable")
        }
    }

    fn run_cfg(start: NaiveDate, end: NaiveDate) -> BacktestRunConfig {
        BacktestRunConfig {
            start_date: start,
            end_date: end,
            run_name: None,
            conservative_budget: Decimal::from(100),
            aggressive_budget: Decimal::from(100),
            ticker_limit: 10,
            sell: SellStrategyConfig { stop_loss_pct: Decimal::from(10), take_profit_pct: Decimal::from(15), max_hold_days: 30 },
            model: "test-model".into(),
            max_tool_rounds: 2,
            pipeline_timeout: Duration::from_secs(5),
        }
    }

    fn empty_digest() -> SignalDigest {
        SignalDigest { candidates: Vec::new(), insider_count: 0, lookback_days: 30, source_counts: SourceCounts::default() }
    }

    #[tokio::test]
    async fn empty_date_range_completes_with_zero_days_traded() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let digest_source = StubDigestSource { dates: Vec::new(), digest: empty_digest() };
        let market_data = FixedMarketData(Decimal::from(10));
        let store = RecordingStore::default();

        let ports = BacktestPorts { digest_source: &digest_source, market_data: &market_data, store: &store, structured: &StubGenerator, tool_calling: None };
        let report = run(ports, run_cfg(start, end)).await.unwrap();

        assert_eq!(report.days_traded, 0);
        assert_eq!(store.completed.lock().unwrap()[0], (BacktestRunStatus::Completed, Some("No data available".to_string())));
    }

    #[tokio::test]
    async fn date_with_no_candidates_is_skipped_without_error() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(); // Monday
        let digest_source = StubDigestSource { dates: vec![date], digest: empty_digest() };
        let market_data = FixedMarketData(Decimal::from(10));
        let store = RecordingStore::default();

        let ports = BacktestPorts { digest_source: &digest_source, market_data: &market_data, store: &store, structured: &StubGenerator, tool_calling: None };
        let report = run(ports, run_cfg(date, date)).await.unwrap();

        assert_eq!(report.days_traded, 1);
        assert!(store.daily_results.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn weekend_dates_are_filtered_out_before_replay() {
        let saturday = NaiveDate::from_ymd_opt(2026, 1, 3).unwrap();
        let digest_source = StubDigestSource { dates: vec![saturday], digest: empty_digest() };
        let market_data = FixedMarketData(Decimal::from(10));
        let store = RecordingStore::default();

        let ports = BacktestPorts { digest_source: &digest_source, market_data: &market_data, store: &store, structured: &StubGenerator, tool_calling: None };
        let report = run(ports, run_cfg(saturday, saturday)).await.unwrap();

        assert_eq!(report.days_traded, 0);
    }

    fn sample_candidate(ticker: &str) -> EnrichedCandidate {
        EnrichedCandidate {
            candidate: Candidate {
                ticker: ticker.to_string(),
                company: "Test Co".into(),
                source: vantage_schemas::Source::Insider,
                insiders: vec!["Jane Doe".into()],
                is_cluster: false,
                is_csuite_present: false,
                total_value_usd: Decimal::from(1000),
                conviction_score: Decimal::from(5),
                transactions: Vec::new(),
            },
            returns: Some(Returns::default()),
            fundamentals: Some(Fundamentals { quote_type: QuoteType::Equity, market_cap: None, sector: None, pe_ratio: None, profit_margin: None }),
            technicals: Some(Technicals::default()),
            earnings: None,
            insider_history: None,
            news: None,
        }
    }

    #[tokio::test]
    async fn a_day_with_candidates_buys_no_positions_when_model_returns_no_picks() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let digest = SignalDigest { candidates: vec![sample_candidate("AMD")], insider_count: 1, lookback_days: 30, source_counts: SourceCounts::default() };
        let digest_source = StubDigestSource { dates: vec![date], digest };
        let market_data = FixedMarketData(Decimal::from(10));
        let store = RecordingStore::default();

        let ports = BacktestPorts { digest_source: &digest_source, market_data: &market_data, store: &store, structured: &StubGenerator, tool_calling: None };
        let report = run(ports, run_cfg(date, date)).await.unwrap();

        assert_eq!(report.conservative.open_positions, 0);
        assert_eq!(report.aggressive.open_positions, 0);
    }

    #[tokio::test]
    async fn pipeline_failure_still_persists_a_daily_result_for_both_strategies() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let digest = SignalDigest { candidates: vec![sample_candidate("AMD")], insider_count: 1, lookback_days: 30, source_counts: SourceCounts::default() };
        let digest_source = StubDigestSource { dates: vec![date], digest };
        let market_data = FixedMarketData(Decimal::from(10));
        let store = RecordingStore::default();

        let ports = BacktestPorts { digest_source: &digest_source, market_data: &market_data, store: &store, structured: &FailingGenerator, tool_calling: None };
        let report = run(ports, run_cfg(date, date)).await.unwrap();

        assert_eq!(report.days_traded, 1);
        let results = store.daily_results.lock().unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().any(|r| r.strategy_tag == "conservative"));
        assert!(results.iter().any(|r| r.strategy_tag == "aggressive"));
    }
}
