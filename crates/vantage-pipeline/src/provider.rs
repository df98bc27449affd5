//! LLM provider capability contracts (§4.4 SPEC_FULL.md, supplemented §9). Stages
//! depend on these traits, never on a concrete client — grounded on
//! `mqk-md::provider::Provider`'s "object-safe boundary, no concrete implementation
//! here" shape, adapted from a bars-fetching contract to a structured-generation one.

use async_trait::async_trait;
use serde_json::Value;

use crate::tools::{ToolDefinition, ToolExecutor};

/// A provider that can be asked for one schema-shaped JSON object. Used by the
/// `sentiment`, `market`, `trader`, and `risk_review` stages.
#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
        schema: &Value,
    ) -> anyhow::Result<Value>;
}

/// A provider that can additionally suspend to invoke read-only tools mid-generation.
/// Used only by the `research` stage.
#[async_trait]
pub trait ToolCallingGenerator: Send + Sync {
    async fn generate_with_tools(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
        schema: &Value,
        tools: &[ToolDefinition],
        executor: &ToolExecutor,
        max_rounds: u32,
    ) -> anyhow::Result<(Value, u32)>;
}
