//! `ToolBackend` adapter wiring the research stage's allow-listed tool calls onto
//! this workspace's concrete provider traits. Grounded on
//! `original_source/src/agents/tool_executor.py::ToolExecutor.execute`, which
//! dispatches by name to a generic MCP client and turns "tool not reachable" into
//! a structured `{"error": ...}` payload rather than failing the call — the same
//! shape this adapter uses for the handful of tools this workspace has no
//! concrete data source for (`get_stock_history`, `get_earnings_calendar`,
//! `get_analyst_revisions`, `search_stocks`, `screen_global_markets`).

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use vantage_pipeline::tools::ToolBackend;
use vantage_signals::EnrichmentProvider;

use crate::market_data::MarketDataProvider;

fn unsupported(tool: &str) -> Value {
    json!({ "error": format!("tool '{tool}' has no backing data source in this deployment") })
}

fn ticker_arg(args: &Value) -> Result<String> {
    args.get("ticker")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("missing required 'ticker' argument"))
}

pub struct SupervisorToolBackend {
    market_data: Arc<dyn MarketDataProvider>,
    enrichment: Arc<dyn EnrichmentProvider>,
    as_of: NaiveDate,
}

impl SupervisorToolBackend {
    pub fn new(market_data: Arc<dyn MarketDataProvider>, enrichment: Arc<dyn EnrichmentProvider>, as_of: NaiveDate) -> Self {
        SupervisorToolBackend { market_data, enrichment, as_of }
    }
}

#[async_trait]
impl ToolBackend for SupervisorToolBackend {
    async fn call(&self, name: &str, args: &Value) -> Result<Value> {
        match name {
            "get_stock_price" => {
                let ticker = ticker_arg(args)?;
                let quote = self.market_data.price(&ticker).await?;
                Ok(json!({ "ticker": ticker, "price": quote.price.to_string() }))
            }
            "get_fundamentals" => {
                let ticker = ticker_arg(args)?;
                let fundamentals = self.enrichment.fundamentals(&ticker).await?;
                Ok(serde_json::to_value(fundamentals)?)
            }
            "get_technical_indicators" => {
                let ticker = ticker_arg(args)?;
                let technicals = self.enrichment.technicals(&ticker).await?;
                Ok(serde_json::to_value(technicals)?)
            }
            "get_earnings" => {
                let ticker = ticker_arg(args)?;
                let earnings = self.enrichment.earnings(&ticker).await?;
                Ok(serde_json::to_value(earnings)?)
            }
            "get_insider_activity" => {
                let ticker = ticker_arg(args)?;
                let history = self.enrichment.insider_history(&ticker, self.as_of).await?;
                Ok(serde_json::to_value(history)?)
            }
            "get_news" => {
                // The research stage's news needs are covered by the digest's
                // enrichment pass already baked into `SignalDigest`; this tool
                // exists for the model to re-request news mid-research, which
                // this deployment has no standalone provider for.
                Ok(unsupported(name))
            }
            "get_stock_history" | "get_earnings_calendar" | "get_analyst_revisions" | "search_stocks" | "screen_global_markets" => {
                Ok(unsupported(name))
            }
            other => Ok(unsupported(other)),
        }
    }
}
