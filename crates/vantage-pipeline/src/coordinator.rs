//! Pipeline coordinator (§4.4 SPEC_FULL.md): runs the fixed
//! `sentiment → (research | market) → trader → risk_review` sequence for one
//! strategy under a single deadline, and runs both strategies side by side.
//! Grounded on `src/agents/pipeline.py::AgentPipeline.run`'s stage sequencing,
//! generalized to the Rust trait-object providers and an explicit deadline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use vantage_schemas::{PickReview, Position, SignalDigest, TickerMarketData, TickerSymbol};

use crate::provider::{StructuredGenerator, ToolCallingGenerator};
use crate::schemas;
use crate::stages::{market, research, risk_review, sentiment, trader, AnalysisInput};
use crate::tools::{ToolDefinition, ToolExecutor};

/// Shared between the two concurrently-running strategies. An external caller
/// (e.g. a process-level shutdown signal) can flip this to ask both pipelines to
/// stop at their next stage boundary — "cancellation is cooperative" (§4.4).
#[derive(Clone, Default)]
pub struct CancelSignal(Arc<AtomicBool>);

impl CancelSignal {
    pub fn new() -> Self {
        CancelSignal(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Which alternate branch a strategy takes between sentiment and trader.
pub enum AnalysisBranch<'a> {
    Market { market_data: &'a HashMap<TickerSymbol, TickerMarketData> },
    Research { tools: &'a [ToolDefinition], executor: &'a ToolExecutor, max_tool_rounds: u32 },
}

pub struct StrategyConfig<'a> {
    pub strategy_tag: &'a str,
    pub model: &'a str,
    pub structured: &'a dyn StructuredGenerator,
    pub tool_calling: Option<&'a dyn ToolCallingGenerator>,
    pub branch: AnalysisBranch<'a>,
    pub portfolio: &'a [Position],
    pub budget: Decimal,
}

fn bail_if_cancelled(cancel: &CancelSignal, stage: &str) -> anyhow::Result<()> {
    if cancel.is_cancelled() {
        anyhow::bail!("pipeline cancelled before stage '{stage}'");
    }
    Ok(())
}

/// Runs one strategy's fixed stage sequence, checking `cancel` between each stage.
async fn run_sequence(digest: &SignalDigest, cfg: &StrategyConfig<'_>, cancel: &CancelSignal) -> anyhow::Result<PickReview> {
    bail_if_cancelled(cancel, "sentiment")?;
    let sentiment_report = sentiment::run(cfg.structured, cfg.model, digest, &schemas::sentiment_schema()).await?;

    bail_if_cancelled(cancel, "research_or_market")?;
    let (picks, research_report) = match &cfg.branch {
        AnalysisBranch::Market { market_data } => {
            let analysis = market::run(cfg.structured, cfg.model, &sentiment_report, market_data, &schemas::market_schema()).await?;

            bail_if_cancelled(cancel, "trader")?;
            let picks = trader::run(
                cfg.structured,
                cfg.model,
                &sentiment_report,
                AnalysisInput::Market(&analysis),
                cfg.portfolio,
                cfg.budget,
                &schemas::trader_schema(),
            )
            .await?;
            (picks, None)
        }
        AnalysisBranch::Research { tools, executor, max_tool_rounds } => {
            let tool_gen = cfg.tool_calling.ok_or_else(|| anyhow::anyhow!("research branch requires a ToolCallingGenerator"))?;
            let report =
                research::run(tool_gen, cfg.model, &sentiment_report, tools, executor, *max_tool_rounds, &schemas::research_schema())
                    .await?;

            bail_if_cancelled(cancel, "trader")?;
            let picks = trader::run(
                cfg.structured,
                cfg.model,
                &sentiment_report,
                AnalysisInput::Research(&report),
                cfg.portfolio,
                cfg.budget,
                &schemas::trader_schema(),
            )
            .await?;
            (picks, Some(report))
        }
    };

    bail_if_cancelled(cancel, "risk_review")?;
    risk_review::run(cfg.structured, cfg.model, &picks, research_report.as_ref(), cfg.portfolio, &schemas::risk_review_schema()).await
}

/// Runs one strategy under `pipeline_timeout`. Expiry maps to the
/// `{status:"error", stage:"pipeline", error:"timeout"}` contract (§4.4) by
/// returning a plain error the caller labels as a timeout — this crate stays
/// free of Supervisor-level status envelopes.
pub async fn run_strategy(
    digest: &SignalDigest,
    cfg: StrategyConfig<'_>,
    cancel: CancelSignal,
    pipeline_timeout: Duration,
) -> anyhow::Result<PickReview> {
    match tokio::time::timeout(pipeline_timeout, run_sequence(digest, &cfg, &cancel)).await {
        Ok(result) => result,
        Err(_) => anyhow::bail!("pipeline '{}' timed out after {:?}", cfg.strategy_tag, pipeline_timeout),
    }
}

/// Runs the conservative and aggressive strategies side by side. They share no
/// state and a failure in one never cancels the other — only `cancel` (driven by
/// an external signal) can stop both cooperatively.
pub async fn run_both(
    digest: &SignalDigest,
    conservative: StrategyConfig<'_>,
    aggressive: StrategyConfig<'_>,
    cancel: CancelSignal,
    pipeline_timeout: Duration,
) -> (anyhow::Result<PickReview>, anyhow::Result<PickReview>) {
    tokio::join!(
        run_strategy(digest, conservative, cancel.clone(), pipeline_timeout),
        run_strategy(digest, aggressive, cancel, pipeline_timeout),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use vantage_schemas::SourceCounts;

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

    fn empty_digest() -> SignalDigest {
        SignalDigest { candidates: Vec::new(), insider_count: 0, lookback_days: 30, source_counts: SourceCounts::default() }
    }

    #[tokio::test]
    async fn market_branch_runs_full_sequence() {
        let market_data = HashMap::new();
        let cfg = StrategyConfig {
            strategy_tag: "conservative",
            model: "test-model",
            structured: &StubGenerator,
            tool_calling: None,
            branch: AnalysisBranch::Market { market_data: &market_data },
            portfolio: &[],
            budget: Decimal::from(10),
        };
        let review = run_strategy(&empty_digest(), cfg, CancelSignal::new(), Duration::from_secs(5)).await.unwrap();
        assert_eq!(review.strategy_tag, "conservative");
    }

    #[tokio::test]
    async fn cancel_signal_stops_before_next_stage() {
        let market_data = HashMap::new();
        let cancel = CancelSignal::new();
        cancel.cancel();
        let cfg = StrategyConfig {
            strategy_tag: "conservative",
            model: "test-model",
            structured: &StubGenerator,
            tool_calling: None,
            branch: AnalysisBranch::Market { market_data: &market_data },
            portfolio: &[],
            budget: Decimal::from(10),
        };
        let result = run_strategy(&empty_digest(), cfg, cancel, Duration::from_secs(5)).await;
        assert!(result.is_err());
    }
}
