//! Pipeline Coordinator: runs the fixed `sentiment → (research | market) → trader →
//! risk_review` stage sequence for the conservative and aggressive strategies.

pub mod coordinator;
pub mod json_parse;
pub mod provider;
pub mod schemas;
pub mod stages;
pub mod tools;

pub use coordinator::{run_both, run_strategy, AnalysisBranch, CancelSignal, StrategyConfig};
pub use provider::{StructuredGenerator, ToolCallingGenerator};
pub use tools::{ToolBackend, ToolCall, ToolDefinition, ToolExecutor, ALLOWED_TOOLS};
