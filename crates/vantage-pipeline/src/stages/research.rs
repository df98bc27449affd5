//! Stage 2 (alt. b): tool-calling research (§4.4 SPEC_FULL.md), grounded on
//! `src/agents/research_agent.py`. Suspends through `ToolCallingGenerator` to
//! invoke the read-only allow-listed tools before producing a typed report.

use serde_json::Value;
use vantage_schemas::{ResearchReport, SentimentReport};

use crate::json_parse::parse_with_retry;
use crate::provider::ToolCallingGenerator;
use crate::tools::{ToolDefinition, ToolExecutor};

const SYSTEM_PROMPT: &str = "You research the most promising tickers from a sentiment \
report using the available read-only tools. Focus on the top 8-10 candidates with the \
strongest signals. Respond with JSON only once research is complete.";

pub async fn run(
    generator: &dyn ToolCallingGenerator,
    model: &str,
    sentiment: &SentimentReport,
    tools: &[ToolDefinition],
    executor: &ToolExecutor,
    max_tool_rounds: u32,
    schema: &Value,
) -> anyhow::Result<ResearchReport> {
    let user_prompt = serde_json::json!({ "sentiment": sentiment }).to_string();
    let (raw, rounds_used) = generator
        .generate_with_tools(model, SYSTEM_PROMPT, &user_prompt, schema, tools, executor, max_tool_rounds)
        .await?;
    let mut report: ResearchReport = parse_with_retry(&raw.to_string(), Some(schema))?;
    report.tool_rounds_used = rounds_used;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StubGenerator;

    #[async_trait]
    impl ToolCallingGenerator for StubGenerator {
        async fn generate_with_tools(
            &self,
            _model: &str,
            _system: &str,
            _user: &str,
            _schema: &Value,
            _tools: &[ToolDefinition],
            _executor: &ToolExecutor,
            _max_rounds: u32,
        ) -> anyhow::Result<(Value, u32)> {
            Ok((serde_json::json!({ "per_ticker": {} }), 3))
        }
    }

    struct NoopBackend;
    #[async_trait]
    impl crate::tools::ToolBackend for NoopBackend {
        async fn call(&self, _name: &str, _args: &Value) -> anyhow::Result<Value> {
            Ok(Value::Null)
        }
    }

    #[tokio::test]
    async fn tool_rounds_used_is_carried_onto_the_report() {
        let executor = ToolExecutor::new(Box::new(NoopBackend));
        let report = run(
            &StubGenerator,
            "test-model",
            &SentimentReport::default(),
            &[],
            &executor,
            15,
            &serde_json::json!({}),
        )
        .await
        .unwrap();
        assert_eq!(report.tool_rounds_used, 3);
    }
}
