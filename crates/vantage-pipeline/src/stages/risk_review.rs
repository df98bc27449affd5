//! Stage 4: risk review (§4.4 SPEC_FULL.md), grounded on
//! `src/agents/risk_agent.py`. Final stage of the fixed sequence — its output,
//! never the pre-review `DailyPicks`, is what the Trade Executor consumes.

use serde_json::Value;
use vantage_schemas::{DailyPicks, PickReview, Position, ResearchReport};

use crate::json_parse::parse_with_retry;
use crate::provider::StructuredGenerator;

const SYSTEM_PROMPT: &str = "You review proposed trading picks and apply risk \
management rules: veto picks that breach position limits or contradict the \
research, and note any size adjustments. Respond with JSON only.";

pub async fn run(
    generator: &dyn StructuredGenerator,
    model: &str,
    picks: &DailyPicks,
    research: Option<&ResearchReport>,
    portfolio: &[Position],
    schema: &Value,
) -> anyhow::Result<PickReview> {
    let user_prompt = serde_json::json!({
        "picks": picks,
        "research": research,
        "portfolio": portfolio,
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
                "confidence": 0.4,
                "market_summary": "reviewed",
                "run_date": "2026-01-01",
                "strategy_tag": "conservative",
                "risk_notes": "within limits",
                "adjustments": [],
                "vetoed_tickers": ["RISKY"],
            }))
        }
    }

    #[tokio::test]
    async fn carries_veto_list_through() {
        let picks = DailyPicks {
            picks: Vec::new(),
            sell_recommendations: Vec::new(),
            confidence: 0.6,
            market_summary: "pre-review".into(),
            run_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            strategy_tag: "conservative".into(),
        };
        let review = run(&StubGenerator, "test-model", &picks, None, &[], &serde_json::json!({})).await.unwrap();
        assert_eq!(review.vetoed_tickers, vec!["RISKY".to_string()]);
    }
}
