//! Decision cycle (§4.7 SPEC_FULL.md steps 1-9), grounded on
//! `original_source/src/orchestrator/supervisor.py::Supervisor.run_decision_cycle`
//! and `build_insider_digest`, generalized from the source's single real-account
//! pipeline run into the two-strategy (`conservative`/`aggressive`) parallel run
//! this workspace's `vantage-pipeline::run_both` already implements.
//!
//! Design decision (not specified in the distillation): the conservative strategy
//! takes the `Market` analysis branch, the aggressive strategy takes the
//! tool-calling `Research` branch — aggressive trading tolerates the extra LLM
//! round-trips a deeper tool-assisted research pass costs (see DESIGN.md).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use vantage_blacklist::BlacklistStore;
use vantage_broker::Broker;
use vantage_execution::RankedCandidate;
use vantage_notify::Notifier;
use vantage_pipeline::tools::{ToolDefinition, ToolExecutor};
use vantage_pipeline::{run_both, AnalysisBranch, CancelSignal, StrategyConfig, StructuredGenerator, ToolCallingGenerator};
use vantage_schemas::{EnrichedCandidate, ExecutionSummary, PickAction, PickReview, Position, SignalDigest, Source, TickerSymbol};
use vantage_scheduler::is_trading_day;
use vantage_signals::{build_digest, DigestConfig, EnrichmentProvider, InsiderSource, NewsCircuitBreaker, NewsProvider, PoliticianSource};

use crate::market_data::{build_market_data, eur_usd_rate_or_fallback, to_eur, MarketDataProvider};

pub struct StrategyPorts<'a> {
    pub strategy_tag: &'a str,
    pub model: &'a str,
    pub structured: &'a dyn StructuredGenerator,
    pub tool_calling: Option<&'a dyn ToolCallingGenerator>,
    pub tool_definitions: &'a [ToolDefinition],
    pub tool_executor: &'a ToolExecutor,
    pub max_tool_rounds: u32,
    pub budget_eur: Decimal,
    /// `true` for the conservative/real-money account, `false` for the
    /// aggressive/practice account.
    pub is_real: bool,
}

pub struct DecisionCyclePorts<'a> {
    pub insider_source: &'a dyn InsiderSource,
    pub politician_source: Option<&'a dyn PoliticianSource>,
    pub enrichment: Arc<dyn EnrichmentProvider>,
    pub primary_news: Arc<dyn NewsProvider>,
    pub fallback_news: Option<Arc<dyn NewsProvider>>,
    pub news_breaker: Arc<NewsCircuitBreaker>,
    pub market_data: Arc<dyn MarketDataProvider>,
    pub broker: &'a dyn Broker,
    pub notifier: &'a dyn Notifier,
    pub blacklist: &'a mut BlacklistStore,
    pub conservative: StrategyPorts<'a>,
    pub aggressive: StrategyPorts<'a>,
}

pub struct DecisionCycleConfig {
    pub run_date: NaiveDate,
    pub force: bool,
    pub min_insider_tickers: usize,
    pub research_top_n: usize,
    pub politician_reserved_slots: usize,
    pub max_picks_per_run: usize,
    pub eur_usd_static_fallback_rate: Decimal,
    pub pipeline_timeout: Duration,
    pub recently_traded_days: i64,
    pub digest: DigestConfig,
}

pub enum StrategyCycleResult {
    Error(String),
    Completed { picks: PickReview, execution: ExecutionSummary },
}

pub struct StrategyOutcome {
    pub strategy_tag: String,
    pub result: StrategyCycleResult,
}

pub enum DecisionCycleOutcome {
    Skipped { reason: String },
    Completed {
        run_date: NaiveDate,
        insider_count: u32,
        blacklisted: Vec<TickerSymbol>,
        conservative: StrategyOutcome,
        aggressive: StrategyOutcome,
    },
}

pub async fn run_decision_cycle(ports: DecisionCyclePorts<'_>, cfg: DecisionCycleConfig) -> DecisionCycleOutcome {
    if !cfg.force && !is_trading_day(cfg.run_date) {
        return DecisionCycleOutcome::Skipped { reason: "non-trading-day".to_string() };
    }

    let digest = build_digest(
        ports.insider_source,
        ports.politician_source,
        ports.enrichment.clone(),
        ports.primary_news.clone(),
        ports.fallback_news.clone(),
        ports.news_breaker.clone(),
        &cfg.digest,
    )
    .await;

    let insider_count = digest.insider_count;
    if (insider_count as usize) < cfg.min_insider_tickers {
        tracing::info!(insider_count, min = cfg.min_insider_tickers, "low signal day, skipping buys");
        return DecisionCycleOutcome::Skipped {
            reason: format!("low signal day: {insider_count} candidates < min {}", cfg.min_insider_tickers),
        };
    }
    let lookback_days = digest.lookback_days;
    let source_counts = digest.source_counts.clone();

    let active_blacklist = ports.blacklist.active_set(cfg.recently_traded_days, cfg.run_date);
    let (blacklisted, filtered): (Vec<_>, Vec<_>) =
        digest.candidates.into_iter().partition(|c| active_blacklist.contains(c.ticker()));
    let blacklisted: Vec<TickerSymbol> = blacklisted.into_iter().map(|c| c.candidate.ticker).collect();
    if !blacklisted.is_empty() {
        tracing::info!(count = blacklisted.len(), tickers = ?blacklisted, "filtered blacklisted tickers");
    }

    let capped = pool_aware_cap(filtered, cfg.research_top_n, cfg.politician_reserved_slots);
    let capped_digest = SignalDigest { candidates: capped.clone(), insider_count, lookback_days, source_counts };

    let conservative_portfolio = fetch_portfolio(ports.broker, true).await;
    let aggressive_portfolio = fetch_portfolio(ports.broker, false).await;

    let eur_usd_rate = eur_usd_rate_or_fallback(ports.market_data.as_ref(), cfg.eur_usd_static_fallback_rate).await;
    tracing::info!(%eur_usd_rate, "EUR/USD rate for order sizing");

    let market_data = build_market_data(&capped, ports.market_data.as_ref()).await;
    let cancel = CancelSignal::new();

    let conservative_cfg = StrategyConfig {
        strategy_tag: ports.conservative.strategy_tag,
        model: ports.conservative.model,
        structured: ports.conservative.structured,
        tool_calling: ports.conservative.tool_calling,
        branch: AnalysisBranch::Market { market_data: &market_data },
        portfolio: &conservative_portfolio,
        budget: ports.conservative.budget_eur,
    };
    let aggressive_cfg = StrategyConfig {
        strategy_tag: ports.aggressive.strategy_tag,
        model: ports.aggressive.model,
        structured: ports.aggressive.structured,
        tool_calling: ports.aggressive.tool_calling,
        branch: AnalysisBranch::Research {
            tools: ports.aggressive.tool_definitions,
            executor: ports.aggressive.tool_executor,
            max_tool_rounds: ports.aggressive.max_tool_rounds,
        },
        portfolio: &aggressive_portfolio,
        budget: ports.aggressive.budget_eur,
    };

    let (conservative_picks, aggressive_picks) =
        run_both(&capped_digest, conservative_cfg, aggressive_cfg, cancel, cfg.pipeline_timeout).await;

    let conservative_outcome = execute_strategy(
        ports.conservative.strategy_tag,
        conservative_picks,
        ports.broker,
        ports.market_data.as_ref(),
        eur_usd_rate,
        cfg.max_picks_per_run,
        ports.conservative.budget_eur,
        true,
    )
    .await;

    let aggressive_outcome = execute_strategy(
        ports.aggressive.strategy_tag,
        aggressive_picks,
        ports.broker,
        ports.market_data.as_ref(),
        eur_usd_rate,
        cfg.max_picks_per_run,
        ports.aggressive.budget_eur,
        false,
    )
    .await;

    let mut bought: HashSet<TickerSymbol> = HashSet::new();
    for outcome in [&conservative_outcome, &aggressive_outcome] {
        if let StrategyCycleResult::Completed { execution, .. } = &outcome.result {
            bought.extend(execution.bought.iter().map(|t| t.ticker.clone()));
        }
    }
    if !bought.is_empty() {
        if let Err(err) = ports.blacklist.add_many(bought, cfg.run_date) {
            tracing::warn!(error = %err, "failed to persist blacklist additions");
        }
    }

    notify_outcome(ports.notifier, cfg.run_date, insider_count, &conservative_outcome).await;
    notify_outcome(ports.notifier, cfg.run_date, insider_count, &aggressive_outcome).await;

    DecisionCycleOutcome::Completed {
        run_date: cfg.run_date,
        insider_count,
        blacklisted,
        conservative: conservative_outcome,
        aggressive: aggressive_outcome,
    }
}

/// Reserves `politician_reserved_slots` for politician-only candidates, filling
/// the rest from the insider pool. Both pools retain their incoming conviction
/// order. A ticker merged across both sources counts as insider-pool, matching
/// `original_source/src/orchestrator/supervisor.py`'s `source != "capitol_trades"` check.
fn pool_aware_cap(filtered: Vec<EnrichedCandidate>, research_top_n: usize, reserved: usize) -> Vec<EnrichedCandidate> {
    let (politician_pool, insider_pool): (Vec<_>, Vec<_>) =
        filtered.into_iter().partition(|c| c.candidate.source == Source::Politicians);

    let politician_slots = politician_pool.len().min(reserved);
    let insider_slots = research_top_n.saturating_sub(politician_slots);

    let mut capped: Vec<EnrichedCandidate> = politician_pool.into_iter().take(politician_slots).collect();
    capped.extend(insider_pool.into_iter().take(insider_slots));
    capped
}

async fn fetch_portfolio(broker: &dyn Broker, is_real: bool) -> Vec<Position> {
    match broker.positions(is_real).await {
        Ok(positions) => positions,
        Err(err) => {
            tracing::warn!(error = %err, is_real, "failed to fetch broker portfolio, using empty portfolio");
            Vec::new()
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn execute_strategy(
    strategy_tag: &str,
    picks: anyhow::Result<PickReview>,
    broker: &dyn Broker,
    market_data: &dyn MarketDataProvider,
    eur_usd_rate: Decimal,
    max_picks_per_run: usize,
    budget_eur: Decimal,
    is_real: bool,
) -> StrategyOutcome {
    let picks = match picks {
        Ok(picks) => picks,
        Err(err) => {
            tracing::error!(strategy = strategy_tag, error = %err, "pipeline failed");
            return StrategyOutcome { strategy_tag: strategy_tag.to_string(), result: StrategyCycleResult::Error(err.to_string()) };
        }
    };

    let candidates = picks_to_ranked_candidates(&picks, market_data, eur_usd_rate, max_picks_per_run).await;
    let execution = vantage_execution::execute(broker, &candidates, budget_eur, is_real).await;

    StrategyOutcome {
        strategy_tag: strategy_tag.to_string(),
        result: StrategyCycleResult::Completed { picks, execution },
    }
}

/// §4.7 step 8: sort buys by allocation desc, cap, fetch price, convert to EUR,
/// drop unpriced tickers.
async fn picks_to_ranked_candidates(
    picks: &PickReview,
    market_data: &dyn MarketDataProvider,
    eur_usd_rate: Decimal,
    max_picks_per_run: usize,
) -> Vec<RankedCandidate> {
    let mut buys: Vec<_> = picks.picks.iter().filter(|p| p.action == PickAction::Buy).collect();
    buys.sort_by(|a, b| b.allocation_pct.partial_cmp(&a.allocation_pct).unwrap_or(std::cmp::Ordering::Equal));
    buys.truncate(max_picks_per_run);

    let mut candidates = Vec::with_capacity(buys.len());
    for pick in buys {
        let price_eur = match market_data.price(&pick.ticker).await {
            Ok(quote) => to_eur(quote, eur_usd_rate),
            Err(err) => {
                tracing::warn!(ticker = %pick.ticker, error = %err, "no price for pick, excluded from execution");
                None
            }
        };
        candidates.push(RankedCandidate {
            ticker: pick.ticker.clone(),
            price_in_local_ccy: price_eur,
            allocation_pct: Decimal::try_from(pick.allocation_pct).unwrap_or(Decimal::ZERO),
            reasoning: pick.reasoning.clone(),
        });
    }
    candidates
}

async fn notify_outcome(notifier: &dyn Notifier, run_date: NaiveDate, insider_count: u32, outcome: &StrategyOutcome) {
    let text = match &outcome.result {
        StrategyCycleResult::Completed { picks, execution } => vantage_notify::format_daily_summary(
            run_date,
            &outcome.strategy_tag,
            insider_count,
            &picks.picks,
            &execution.bought,
            &execution.failed,
            picks.confidence,
            &picks.market_summary,
        ),
        StrategyCycleResult::Error(err) => vantage_notify::format_error(run_date, "pipeline", err),
    };
    if let Err(err) = notifier.send(&text).await {
        tracing::warn!(error = %err, "notifier send failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vantage_schemas::{Candidate, RawTransaction, Source};

    fn candidate(ticker: &str, source: Source) -> EnrichedCandidate {
        EnrichedCandidate {
            candidate: Candidate {
                ticker: ticker.to_string(),
                company: ticker.to_string(),
                source,
                insiders: vec![],
                is_cluster: false,
                is_csuite_present: false,
                total_value_usd: Decimal::from(1000),
                conviction_score: Decimal::from(1),
                transactions: Vec::<RawTransaction>::new(),
            },
            returns: None,
            fundamentals: None,
            technicals: None,
            earnings: None,
            insider_history: None,
            news: None,
        }
    }

    #[test]
    fn pool_aware_cap_reserves_politician_slots() {
        let filtered = vec![
            candidate("P1", Source::Politicians),
            candidate("P2", Source::Politicians),
            candidate("I1", Source::Insider),
            candidate("I2", Source::Insider),
            candidate("I3", Source::Insider),
        ];
        let capped = pool_aware_cap(filtered, 3, 1);
        assert_eq!(capped.len(), 3);
        assert_eq!(capped[0].ticker(), "P1");
        assert_eq!(capped[1].ticker(), "I1");
        assert_eq!(capped[2].ticker(), "I2");
    }

    #[test]
    fn merged_source_candidate_counts_as_insider_pool() {
        let filtered = vec![candidate("M1", Source::InsiderAndPoliticians), candidate("P1", Source::Politicians)];
        let capped = pool_aware_cap(filtered, 2, 1);
        assert_eq!(capped.iter().filter(|c| c.ticker() == "M1").count(), 1);
    }
}
