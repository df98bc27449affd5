//! NewsAPI adapter implementing `vantage_signals::NewsProvider`. Grounded on
//! `original_source/src/mcp_servers/market_data/news.py`'s `NewsApiProvider`:
//! same `NEWSAPI_URL`, same "everything" query scoped to the company/ticker. The
//! cooldown circuit breaker lives one layer up (`vantage_signals::NewsCircuitBreaker`,
//! shared by the caller across primary and fallback) — this adapter just propagates
//! any failure (including a 429) as an `Err` for that caller to act on, rather than
//! duplicating a second breaker internally.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use vantage_schemas::News;
use vantage_signals::NewsProvider;

const NEWSAPI_URL: &str = "https://newsapi.org/v2/everything";
const PAGE_SIZE: u32 = 5;

pub struct NewsApiProvider {
    http: reqwest::Client,
    api_key: String,
}

impl NewsApiProvider {
    pub fn new(api_key: String) -> Self {
        NewsApiProvider { http: reqwest::Client::new(), api_key }
    }
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: String,
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    fn source_name(&self) -> &'static str {
        "newsapi"
    }

    async fn news(&self, ticker: &str) -> Result<News> {
        let resp: EverythingResponse = self
            .http
            .get(NEWSAPI_URL)
            .query(&[
                ("q", ticker.to_string()),
                ("sortBy", "publishedAt".to_string()),
                ("pageSize", PAGE_SIZE.to_string()),
                ("language", "en".to_string()),
                ("apiKey", self.api_key.clone()),
            ])
            .send()
            .await
            .with_context(|| format!("newsapi request failed for {ticker}"))?
            .error_for_status()
            .with_context(|| format!("newsapi returned an error status for {ticker}"))?
            .json()
            .await
            .with_context(|| format!("newsapi response decode failed for {ticker}"))?;

        Ok(News {
            headlines: resp.articles.into_iter().map(|a| a.title).collect(),
            source: Some(self.source_name().to_string()),
        })
    }
}
