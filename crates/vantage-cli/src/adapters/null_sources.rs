//! Placeholder signal sources (DESIGN.md decision 6: the insider/politician feed
//! scrapers themselves are out of scope — there is no teacher or pack grounding
//! for an OpenInsider/CapitolTrades HTML scraper, and building one from scratch
//! would be invented rather than learned). These return an empty candidate list
//! rather than an error, since "no scraper wired up" is a deployment choice, not
//! a runtime failure — `build_digest` already treats either outcome as "empty".

use async_trait::async_trait;
use vantage_schemas::{Candidate, News};
use vantage_signals::{InsiderSource, NewsProvider, PoliticianSource};

pub struct NullInsiderSource;

#[async_trait]
impl InsiderSource for NullInsiderSource {
    async fn fetch_candidates(&self, _lookback_days: i64, _top_n: usize) -> anyhow::Result<Vec<Candidate>> {
        Ok(Vec::new())
    }
}

pub struct NullPoliticianSource;

#[async_trait]
impl PoliticianSource for NullPoliticianSource {
    async fn fetch_candidates(&self, _top_n: usize) -> anyhow::Result<Vec<Candidate>> {
        Ok(Vec::new())
    }
}

/// Stands in for the primary news feed when `NEWS_API_KEY` is unset. Always
/// errors so the caller's `NewsCircuitBreaker` trips immediately and falls back
/// (or, with no fallback configured either, leaves the `news` field absent).
pub struct NullNewsProvider;

#[async_trait]
impl NewsProvider for NullNewsProvider {
    fn source_name(&self) -> &'static str {
        "unconfigured"
    }

    async fn news(&self, _ticker: &str) -> anyhow::Result<News> {
        Err(anyhow::anyhow!("no news provider is configured for this deployment"))
    }
}
