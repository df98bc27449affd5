//! Minimal JSON-schema contracts for each stage's output (§4.4 SPEC_FULL.md:
//! "schema-validate; on parse failure, retry once"). These only declare the
//! required top-level keys — see `json_parse::validates_value` for what's checked.

use serde_json::{json, Value};

pub fn sentiment_schema() -> Value {
    json!({ "required": ["per_ticker", "generated_at"] })
}

pub fn market_schema() -> Value {
    json!({ "required": ["per_ticker", "summary"] })
}

pub fn research_schema() -> Value {
    json!({ "required": ["per_ticker"] })
}

pub fn trader_schema() -> Value {
    json!({ "required": ["picks", "sell_recommendations", "confidence", "market_summary", "run_date", "strategy_tag"] })
}

pub fn risk_review_schema() -> Value {
    json!({
        "required": [
            "picks", "sell_recommendations", "confidence", "market_summary", "run_date",
            "strategy_tag", "risk_notes", "adjustments", "vetoed_tickers"
        ]
    })
}
