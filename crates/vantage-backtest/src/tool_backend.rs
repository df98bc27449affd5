//! `ToolBackend` adapter for the backtest's research-branch strategy, wrapping a
//! `HistoricalMarketData` source pinned to the day being replayed. Same
//! unsupported-tool-degrades-to-structured-error shape as the live Supervisor's
//! `SupervisorToolBackend`, grounded the same way on
//! `original_source/src/agents/tool_executor.py`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use vantage_pipeline::ToolBackend;

use crate::ports::HistoricalMarketData;

fn unsupported(tool: &str) -> Value {
    json!({ "error": format!("tool '{tool}' has no backing data source in backtest replay") })
}

fn ticker_arg(args: &Value) -> Result<String> {
    args.get("ticker").and_then(Value::as_str).map(str::to_string).ok_or_else(|| anyhow::anyhow!("missing required 'ticker' argument"))
}

pub struct HistoricalToolBackend<'a> {
    market_data: &'a dyn HistoricalMarketData,
    as_of: NaiveDate,
}

impl<'a> HistoricalToolBackend<'a> {
    pub fn new(market_data: &'a dyn HistoricalMarketData, as_of: NaiveDate) -> Self {
        HistoricalToolBackend { market_data, as_of }
    }
}

#[async_trait]
impl<'a> ToolBackend for HistoricalToolBackend<'a> {
    async fn call(&self, name: &str, args: &Value) -> Result<Value> {
        match name {
            "get_stock_price" => {
                let ticker = ticker_arg(args)?;
                let price = self.market_data.price(&ticker, self.as_of).await?;
                Ok(json!({ "ticker": ticker, "price": price.to_string() }))
            }
            "get_fundamentals" => {
                let ticker = ticker_arg(args)?;
                Ok(serde_json::to_value(self.market_data.fundamentals(&ticker, self.as_of).await?)?)
            }
            "get_technical_indicators" => {
                let ticker = ticker_arg(args)?;
                Ok(serde_json::to_value(self.market_data.technicals(&ticker, self.as_of).await?)?)
            }
            other => Ok(unsupported(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use vantage_schemas::{Fundamentals, QuoteType, Technicals};

    struct StubMarketData;

    #[async_trait]
    impl HistoricalMarketData for StubMarketData {
        async fn price(&self, _ticker: &str, _date: NaiveDate) -> Result<Decimal> {
            Ok(Decimal::from(42))
        }
        async fn fundamentals(&self, _ticker: &str, _date: NaiveDate) -> Result<Fundamentals> {
            Ok(Fundamentals { quote_type: QuoteType::Equity, market_cap: None, sector: None, pe_ratio: None, profit_margin: None })
        }
        async fn technicals(&self, _ticker: &str, _date: NaiveDate) -> Result<Technicals> {
            Ok(Technicals::default())
        }
    }

    fn backend(data: &StubMarketData) -> HistoricalToolBackend<'_> {
        HistoricalToolBackend::new(data, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
    }

    #[tokio::test]
    async fn get_stock_price_dispatches_to_market_data() {
        let data = StubMarketData;
        let result = backend(&data).call("get_stock_price", &json!({ "ticker": "AMD" })).await.unwrap();
        assert_eq!(result["ticker"], "AMD");
    }

    #[tokio::test]
    async fn unsupported_tool_returns_structured_error() {
        let data = StubMarketData;
        let result = backend(&data).call("search_stocks", &json!({})).await.unwrap();
        assert!(result["error"].as_str().is_some());
    }
}
