//! External signal sources and enrichment providers (§4.3 SPEC_FULL.md), generalized
//! over concrete back-ends the same way `mqk-md::HistoricalProvider` generalizes over
//! historical data providers: a trait object the digest builder depends on, never a
//! concrete scraper/client type.

use async_trait::async_trait;
use chrono::NaiveDate;
use vantage_schemas::{Candidate, Earnings, Fundamentals, InsiderHistory, News, Returns, Technicals};

#[async_trait]
pub trait InsiderSource: Send + Sync {
    async fn fetch_candidates(&self, lookback_days: i64, top_n: usize) -> anyhow::Result<Vec<Candidate>>;
}

#[async_trait]
pub trait PoliticianSource: Send + Sync {
    async fn fetch_candidates(&self, top_n: usize) -> anyhow::Result<Vec<Candidate>>;
}

/// Per-candidate enrichment sub-fetches (§4.3 step 4). Each method is independent;
/// the digest builder calls them concurrently and treats a failure as an absent
/// field, never as a whole-candidate failure.
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    async fn returns(&self, ticker: &str) -> anyhow::Result<Returns>;
    async fn fundamentals(&self, ticker: &str) -> anyhow::Result<Fundamentals>;
    async fn technicals(&self, ticker: &str) -> anyhow::Result<Technicals>;
    async fn earnings(&self, ticker: &str) -> anyhow::Result<Earnings>;
    async fn insider_history(&self, ticker: &str, as_of: NaiveDate) -> anyhow::Result<InsiderHistory>;
}

/// News is split out from `EnrichmentProvider` because it alone is subject to the
/// concurrency semaphore and circuit breaker (§4.3 step 4, §5 "Shared-resource policy").
#[async_trait]
pub trait NewsProvider: Send + Sync {
    fn source_name(&self) -> &'static str;
    async fn news(&self, ticker: &str) -> anyhow::Result<News>;
}
