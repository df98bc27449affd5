//! Stage 3: trading decisions (§4.4 SPEC_FULL.md), grounded on
//! `src/agents/trader_agent.py`. Consumes whichever of the market/research
//! branch ran for this strategy.

use rust_decimal::Decimal;
use serde_json::Value;
use vantage_schemas::{DailyPicks, MarketAnalysis, Position, ResearchReport, SentimentReport};

use crate::json_parse::parse_with_retry;
use crate::provider::StructuredGenerator;

/// The trader stage is fed either branch of the `(research | market)` fork — never
/// both — so this carries exactly one of them rather than forcing callers to
/// synthesize a placeholder for the branch that didn't run.
pub enum AnalysisInput<'a> {
    Market(&'a MarketAnalysis),
    Research(&'a ResearchReport),
}

const SYSTEM_PROMPT: &str = "You are a trading strategy agent deciding buy/sell/hold \
picks from a sentiment report, a market or research analysis, the current portfolio, \
and today's budget. Respond with JSON only.";

pub async fn run(
    generator: &dyn StructuredGenerator,
    model: &str,
    sentiment: &SentimentReport,
    analysis: AnalysisInput<'_>,
    portfolio: &[Position],
    budget: Decimal,
    schema: &Value,
) -> anyhow::Result<DailyPicks> {
    let analysis_json = match analysis {
        AnalysisInput::Market(a) => serde_json::to_value(a)?,
        AnalysisInput::Research(r) => serde_json::to_value(r)?,
    };
    let user_prompt = serde_json::json!({
        "sentiment": sentiment,
        "analysis": analysis_json,
        "portfolio": portfolio,
        "budget": budget,
    })
    .to_string();
    let raw = generator.generate(model, SYSTEM_PROMPT, &user_prompt, schema).await?;
    parse_with_retry(&raw.to_string(), Some(schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct StubGenerator;

    #[async_trait]
    impl StructuredGenerator for StubGenerator {
        async fn generate(&self, _model: &str, _system: &str, _user: &str, _schema: &Value) -> anyhow::Result<Value> {
            Ok(serde_json::json!({
                "picks": [],
                "sell_recommendations": [],
                "confidence": 0.5,
                "market_summary": "stub",
                "run_date": "2026-01-01",
                "strategy_tag": "conservative",
            }))
        }
    }

    #[tokio::test]
    async fn runs_against_market_branch() {
        let market = MarketAnalysis::default();
        let picks = run(
            &StubGenerator,
            "test-model",
            &SentimentReport::default(),
            AnalysisInput::Market(&market),
            &[],
            Decimal::from(10),
            &serde_json::json!({}),
        )
        .await
        .unwrap();
        assert_eq!(picks.run_date, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
    }
}
