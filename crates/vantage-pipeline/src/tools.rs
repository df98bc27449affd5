//! Read-only tool allow-list for the `research` stage (§4.4 SPEC_FULL.md), grounded
//! on `src/agents/tool_executor.py`'s "blocked calls return a structured error,
//! never panic" shape and per-call `asyncio.wait_for` deadline.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

const PER_CALL_DEADLINE: Duration = Duration::from_secs(30);

pub const ALLOWED_TOOLS: &[&str] = &[
    "get_stock_price",
    "get_fundamentals",
    "get_technical_indicators",
    "get_stock_history",
    "get_news",
    "get_earnings",
    "get_earnings_calendar",
    "get_analyst_revisions",
    "get_insider_activity",
    "search_stocks",
    "screen_global_markets",
];

#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters_schema: Value,
}

#[derive(Debug, Clone)]
pub struct ToolCall {
    pub name: String,
    pub args: Value,
}

/// Backing implementation a concrete tool (e.g. `get_stock_price`) is dispatched to.
/// Kept separate from the allow-list check so the check never depends on a live
/// backend being reachable.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    async fn call(&self, name: &str, args: &Value) -> anyhow::Result<Value>;
}

pub struct ToolExecutor {
    backend: Box<dyn ToolBackend>,
    allowed: HashSet<&'static str>,
}

impl ToolExecutor {
    pub fn new(backend: Box<dyn ToolBackend>) -> Self {
        ToolExecutor { backend, allowed: ALLOWED_TOOLS.iter().copied().collect() }
    }

    /// Any call outside the allow-list returns a structured error without ever
    /// reaching the backend.
    pub async fn execute(&self, call: &ToolCall) -> Value {
        if !self.allowed.contains(call.name.as_str()) {
            tracing::warn!(tool = %call.name, "tool call blocked: not in allow-list");
            return serde_json::json!({ "error": format!("tool '{}' is not available", call.name) });
        }

        match tokio::time::timeout(PER_CALL_DEADLINE, self.backend.call(&call.name, &call.args)).await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                tracing::warn!(tool = %call.name, error = %err, "tool call failed");
                serde_json::json!({ "error": err.to_string() })
            }
            Err(_) => {
                tracing::warn!(tool = %call.name, "tool call timed out");
                serde_json::json!({ "error": format!("tool '{}' timed out", call.name) })
            }
        }
    }

    pub async fn execute_batch(&self, calls: &[ToolCall]) -> Vec<Value> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            results.push(self.execute(call).await);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoBackend;

    #[async_trait]
    impl ToolBackend for EchoBackend {
        async fn call(&self, name: &str, _args: &Value) -> anyhow::Result<Value> {
            Ok(serde_json::json!({ "tool": name }))
        }
    }

    struct SlowBackend;

    #[async_trait]
    impl ToolBackend for SlowBackend {
        async fn call(&self, _name: &str, _args: &Value) -> anyhow::Result<Value> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Value::Null)
        }
    }

    #[tokio::test]
    async fn disallowed_tool_is_blocked_without_touching_backend() {
        let executor = ToolExecutor::new(Box::new(EchoBackend));
        let result = executor.execute(&ToolCall { name: "rm_rf".into(), args: Value::Null }).await;
        assert_eq!(result["error"], "tool 'rm_rf' is not available");
    }

    #[tokio::test]
    async fn allowed_tool_reaches_backend() {
        let executor = ToolExecutor::new(Box::new(EchoBackend));
        let result = executor.execute(&ToolCall { name: "get_stock_price".into(), args: Value::Null }).await;
        assert_eq!(result["tool"], "get_stock_price");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_returns_structured_error_not_panic() {
        let executor = ToolExecutor::new(Box::new(SlowBackend));
        let call = ToolCall { name: "get_news".into(), args: Value::Null };
        let handle = tokio::spawn(async move { executor.execute(&call).await });
        tokio::time::advance(Duration::from_secs(31)).await;
        let result = handle.await.unwrap();
        assert!(result["error"].as_str().unwrap().contains("timed out"));
    }
}
