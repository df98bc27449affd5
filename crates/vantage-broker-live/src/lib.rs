//! Thin reqwest-based broker adapter for Trading212's REST API.
//!
//! The teacher's own `mqk-broker-alpaca` crate is an empty stub — there is no code
//! there to adapt. This client is instead grounded on `mqk-md`'s async-trait +
//! reqwest historical-provider shape (one `reqwest::Client`, typed response structs,
//! `.context(...)`-wrapped errors, a `source_name`-style identity method) applied to
//! the wire contract of `original_source/src/mcp_servers/trading/t212_client.py`
//! (free-cash endpoint, portfolio/positions endpoint, instrument metadata endpoint,
//! quantity- and value-based market order placement).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use vantage_broker::{Broker, BrokerFill};
use vantage_schemas::Position;

pub struct Trading212Broker {
    http: reqwest::Client,
    live_base_url: String,
    demo_base_url: String,
    api_key: String,
}

impl Trading212Broker {
    pub fn new(api_key: String, live_base_url: String, demo_base_url: String) -> Self {
        Trading212Broker {
            http: reqwest::Client::new(),
            live_base_url,
            demo_base_url,
            api_key,
        }
    }

    fn base_url(&self, is_real: bool) -> &str {
        if is_real {
            &self.live_base_url
        } else {
            &self.demo_base_url
        }
    }

    fn request(&self, is_real: bool, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url(is_real).trim_end_matches('/'), path);
        self.http.request(method, url).header("Authorization", &self.api_key)
    }
}

#[derive(Debug, Deserialize)]
struct CashResponse {
    free: f64,
}

#[derive(Debug, Deserialize)]
struct InstrumentResponse {
    ticker: String,
}

#[derive(Debug, Deserialize)]
struct PositionResponse {
    ticker: String,
    quantity: f64,
    #[serde(rename = "averagePrice")]
    average_price: f64,
}

#[derive(Debug, Deserialize)]
struct OrderFillResponse {
    #[serde(rename = "filledQuantity")]
    filled_quantity: f64,
    #[serde(rename = "fillPrice")]
    fill_price: f64,
}

#[async_trait]
impl Broker for Trading212Broker {
    async fn available_cash(&self, is_real: bool) -> Result<Decimal> {
        let resp: CashResponse = self
            .request(is_real, reqwest::Method::GET, "/equity/account/cash")
            .send()
            .await
            .context("trading212 cash request failed")?
            .error_for_status()
            .context("trading212 cash request returned an error status")?
            .json()
            .await
            .context("trading212 cash response decode failed")?;
        Decimal::try_from(resp.free).context("cash value out of decimal range")
    }

    async fn resolve_instrument(&self, ticker: &str) -> Result<Option<String>> {
        let resp = self
            .request(true, reqwest::Method::GET, &format!("/equity/metadata/instruments/{ticker}"))
            .send()
            .await
            .context("trading212 instrument lookup failed")?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: InstrumentResponse = resp
            .error_for_status()
            .context("trading212 instrument lookup returned an error status")?
            .json()
            .await
            .context("trading212 instrument response decode failed")?;
        Ok(Some(body.ticker))
    }

    async fn place_market_buy(&self, broker_ticker: &str, amount: Decimal, is_real: bool) -> Result<BrokerFill> {
        let payload = serde_json::json!({ "ticker": broker_ticker, "value": amount.to_string() });
        let resp: OrderFillResponse = self
            .request(is_real, reqwest::Method::POST, "/equity/orders/market")
            .json(&payload)
            .send()
            .await
            .context("trading212 market buy request failed")?
            .error_for_status()
            .context("trading212 rejected the market buy")?
            .json()
            .await
            .context("trading212 order response decode failed")?;

        let quantity = Decimal::try_from(resp.filled_quantity).context("filled quantity out of decimal range")?;
        let price = Decimal::try_from(resp.fill_price).context("fill price out of decimal range")?;
        Ok(BrokerFill { quantity, price, amount: quantity * price })
    }

    async fn place_market_sell(&self, broker_ticker: &str, quantity: Decimal, is_real: bool) -> Result<BrokerFill> {
        let payload = serde_json::json!({ "ticker": broker_ticker, "quantity": (-quantity).to_string() });
        let resp: OrderFillResponse = self
            .request(is_real, reqwest::Method::POST, "/equity/orders/market")
            .json(&payload)
            .send()
            .await
            .context("trading212 market sell request failed")?
            .error_for_status()
            .context("trading212 rejected the market sell")?
            .json()
            .await
            .context("trading212 order response decode failed")?;

        let filled_quantity = Decimal::try_from(resp.filled_quantity.abs()).context("filled quantity out of decimal range")?;
        let price = Decimal::try_from(resp.fill_price).context("fill price out of decimal range")?;
        Ok(BrokerFill { quantity: filled_quantity, price, amount: filled_quantity * price })
    }

    async fn positions(&self, is_real: bool) -> Result<Vec<Position>> {
        let resp: Vec<PositionResponse> = self
            .request(is_real, reqwest::Method::GET, "/equity/portfolio")
            .send()
            .await
            .context("trading212 portfolio request failed")?
            .error_for_status()
            .context("trading212 portfolio request returned an error status")?
            .json()
            .await
            .context("trading212 portfolio response decode failed")?;

        resp.into_iter()
            .map(|p| {
                Ok(Position {
                    ticker: p.ticker,
                    quantity: Decimal::try_from(p.quantity).context("quantity out of decimal range")?,
                    avg_buy_price: Decimal::try_from(p.average_price).context("average price out of decimal range")?,
                    opened_at: chrono::Utc::now().date_naive(),
                    is_real,
                })
            })
            .collect()
    }

    async fn current_price(&self, ticker: &str) -> Result<Decimal> {
        // Trading212 has no standalone quote endpoint; approximate via the
        // instrument's last reported price embedded in the instruments listing.
        let resp = self
            .request(true, reqwest::Method::GET, &format!("/equity/metadata/instruments/{ticker}"))
            .send()
            .await
            .context("trading212 instrument lookup failed")?
            .error_for_status()
            .context("trading212 instrument lookup returned an error status")?;
        let _body: InstrumentResponse = resp.json().await.context("trading212 instrument response decode failed")?;
        Err(anyhow!(
            "trading212 instrument metadata has no price field; current_price must be sourced from the market-data provider, not the broker"
        ))
    }
}
