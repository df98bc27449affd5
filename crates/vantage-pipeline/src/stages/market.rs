//! Stage 2 (alt. a): market analysis (§4.4 SPEC_FULL.md), grounded on
//! `src/agents/market_agent.py`. Takes precomputed enrichment data rather than
//! fetching it itself — fetching already happened in the digest builder.

use std::collections::HashMap;

use serde_json::Value;
use vantage_schemas::{MarketAnalysis, SentimentReport, TickerMarketData, TickerSymbol};

use crate::json_parse::parse_with_retry;
use crate::provider::StructuredGenerator;

const SYSTEM_PROMPT: &str = "You analyze precomputed market data (price returns, \
fundamentals, technicals, earnings) alongside a sentiment report and score each \
ticker's near-term setup. Respond with JSON only.";

pub async fn run(
    generator: &dyn StructuredGenerator,
    model: &str,
    sentiment: &SentimentReport,
    market_data: &HashMap<TickerSymbol, TickerMarketData>,
    schema: &Value,
) -> anyhow::Result<MarketAnalysis> {
    let user_prompt = serde_json::json!({
        "sentiment": sentiment,
        "market_data": market_data,
    })
    .to_string();
    let raw = generator.generate(model, SYSTEM_PROMPT, &user_prompt, schema).await?;
    parse_with_retry(&raw.to_string(), Some(schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StubGenerator;

    #[async_trait]
    impl StructuredGenerator for StubGenerator {
        async fn generate(&self, _model: &str, _system: &str, _user: &str, _schema: &Value) -> anyhow::Result<Value> {
            Ok(serde_json::json!({ "per_ticker": {}, "summary": "quiet day" }))
        }
    }

    #[tokio::test]
    async fn parses_summary_field() {
        let sentiment = SentimentReport::default();
        let analysis = run(&StubGenerator, "test-model", &sentiment, &HashMap::new(), &serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(analysis.summary, "quiet day");
    }
}
