//! Anthropic Messages API adapter implementing `vantage_pipeline`'s two generator
//! traits. Grounded on `original_source/src/llm/claude.py`'s `ClaudeProvider`:
//! a `JSON_INSTRUCTION` suffix appended to every system prompt, a direct-parse
//! attempt first, and the same fence/brace extraction fallback this workspace
//! already centralizes in `vantage_pipeline::json_parse` — so this adapter calls
//! that module directly rather than re-implementing the retry.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use vantage_pipeline::json_parse::parse_with_retry;
use vantage_pipeline::tools::{ToolCall, ToolDefinition, ToolExecutor};
use vantage_pipeline::{StructuredGenerator, ToolCallingGenerator};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Appended to every system prompt so the model answers with nothing but the
/// requested object — mirrors `claude.py::JSON_INSTRUCTION`.
const JSON_INSTRUCTION: &str =
    "Respond with a single JSON object only. No prose before or after it, no markdown fences.";

pub struct AnthropicGenerator {
    http: reqwest::Client,
    api_key: String,
}

impl AnthropicGenerator {
    pub fn new(api_key: String) -> Self {
        AnthropicGenerator {
            http: reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().unwrap_or_default(),
            api_key,
        }
    }

    fn request(&self, body: &Value) -> reqwest::RequestBuilder {
        self.http
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(body)
    }

    async fn send(&self, body: Value) -> Result<MessagesResponse> {
        self.request(&body)
            .send()
            .await
            .context("anthropic request failed")?
            .error_for_status()
            .context("anthropic returned an error status")?
            .json()
            .await
            .context("anthropic response decode failed")
    }
}

#[derive(Debug, serde::Deserialize)]
struct MessagesResponse {
    content: Vec<Value>,
    #[serde(default)]
    stop_reason: Option<String>,
}

fn text_of(content: &[Value]) -> Option<String> {
    content
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join("\n")
        .into()
}

fn tool_uses(content: &[Value]) -> Vec<(String, ToolCall)> {
    content
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("tool_use"))
        .filter_map(|block| {
            let id = block.get("id")?.as_str()?.to_string();
            let name = block.get("name")?.as_str()?.to_string();
            let args = block.get("input").cloned().unwrap_or(Value::Null);
            Some((id, ToolCall { name, args }))
        })
        .collect()
}

fn anthropic_tools(defs: &[ToolDefinition]) -> Vec<Value> {
    defs.iter()
        .map(|d| json!({ "name": d.name, "description": d.description, "input_schema": d.parameters_schema }))
        .collect()
}

#[async_trait]
impl StructuredGenerator for AnthropicGenerator {
    async fn generate(&self, model: &str, system_prompt: &str, user_prompt: &str, schema: &Value) -> Result<Value> {
        let body = json!({
            "model": model,
            "max_tokens": MAX_TOKENS,
            "system": format!("{system_prompt}\n\n{JSON_INSTRUCTION}"),
            "messages": [{ "role": "user", "content": user_prompt }],
        });

        let response = self.send(body).await?;
        let text = text_of(&response.content).ok_or_else(|| anyhow!("anthropic response contained no text block"))?;
        parse_with_retry(&text, Some(schema))
    }
}

#[async_trait]
impl ToolCallingGenerator for AnthropicGenerator {
    async fn generate_with_tools(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
        schema: &Value,
        tools: &[ToolDefinition],
        executor: &ToolExecutor,
        max_rounds: u32,
    ) -> Result<(Value, u32)> {
        let system = format!("{system_prompt}\n\n{JSON_INSTRUCTION}");
        let tool_specs = anthropic_tools(tools);
        let mut messages = vec![json!({ "role": "user", "content": user_prompt })];

        for round_idx in 0..max_rounds.max(1) {
            let body = json!({
                "model": model,
                "max_tokens": MAX_TOKENS,
                "system": system,
                "messages": messages,
                "tools": tool_specs,
            });

            let response = self.send(body).await?;
            let calls = tool_uses(&response.content);

            if calls.is_empty() || response.stop_reason.as_deref() != Some("tool_use") {
                let text = text_of(&response.content).ok_or_else(|| anyhow!("anthropic response contained no text block"))?;
                let value = parse_with_retry(&text, Some(schema))?;
                return Ok((value, round_idx + 1));
            }

            messages.push(json!({ "role": "assistant", "content": response.content }));

            let mut tool_results = Vec::with_capacity(calls.len());
            for (id, call) in &calls {
                let result = executor.execute(call).await;
                tool_results.push(json!({
                    "type": "tool_result",
                    "tool_use_id": id,
                    "content": result.to_string(),
                }));
            }
            messages.push(json!({ "role": "user", "content": tool_results }));
        }

        Err(anyhow!("exceeded max_tool_rounds ({max_rounds}) without a final answer"))
    }
}
