//! Stage 1: sentiment (§4.4 SPEC_FULL.md), grounded on `src/agents/sentiment_agent.py`.

use serde_json::Value;
use vantage_schemas::{SentimentReport, SignalDigest};

use crate::json_parse::parse_with_retry;
use crate::provider::StructuredGenerator;

const SYSTEM_PROMPT: &str = "You score market sentiment for a list of equity tickers \
derived from insider and congressional trading activity. Respond with JSON only.";

pub async fn run(
    generator: &dyn StructuredGenerator,
    model: &str,
    digest: &SignalDigest,
    schema: &Value,
) -> anyhow::Result<SentimentReport> {
    let user_prompt = serde_json::to_string_pretty(digest)?;
    let raw = generator.generate(model, SYSTEM_PROMPT, &user_prompt, schema).await?;
    parse_with_retry(&raw.to_string(), Some(schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use vantage_schemas::SourceCounts;

    struct StubGenerator;

    #[async_trait]
    impl StructuredGenerator for StubGenerator {
        async fn generate(&self, _model: &str, _system: &str, _user: &str, _schema: &Value) -> anyhow::Result<Value> {
            Ok(serde_json::json!({ "per_ticker": {}, "generated_at": Utc::now().to_rfc3339() }))
        }
    }

    #[tokio::test]
    async fn parses_generator_output_into_sentiment_report() {
        let digest = SignalDigest {
            candidates: Vec::new(),
            insider_count: 0,
            lookback_days: 30,
            source_counts: SourceCounts::default(),
        };
        let report = run(&StubGenerator, "test-model", &digest, &serde_json::json!({})).await.unwrap();
        assert!(report.per_ticker.is_empty());
    }
}
