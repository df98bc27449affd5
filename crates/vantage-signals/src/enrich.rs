//! Bounded concurrent enrichment fan-out (§4.3 step 4 SPEC_FULL.md), grounded on
//! `mqk-md`'s async-trait historical-provider pattern for the per-field calls and
//! on the Python orchestrator's `asyncio.Semaphore`-bounded news fetch for the
//! concurrency cap.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::Semaphore;
use vantage_schemas::{Candidate, EnrichedCandidate, Earnings, Fundamentals, InsiderHistory, News, Returns, Technicals};

use crate::circuit_breaker::NewsCircuitBreaker;
use crate::sources::{EnrichmentProvider, NewsProvider};

const SUB_FETCH_DEADLINE: Duration = Duration::from_secs(20);

pub struct EnrichConfig {
    pub news_fetch_concurrency: usize,
    pub as_of: NaiveDate,
}

/// Fans out the five enrichment sub-fetches for one candidate. Any sub-fetch that
/// fails or times out leaves its field `None` — it never fails the whole candidate.
async fn enrich_one(
    candidate: Candidate,
    provider: &dyn EnrichmentProvider,
    primary_news: &dyn NewsProvider,
    fallback_news: Option<&dyn NewsProvider>,
    breaker: &NewsCircuitBreaker,
    news_semaphore: &Semaphore,
    cfg: &EnrichConfig,
) -> EnrichedCandidate {
    let ticker = candidate.ticker.clone();

    let returns = with_deadline(provider.returns(&ticker)).await;
    let fundamentals = with_deadline(provider.fundamentals(&ticker)).await;
    let technicals = with_deadline(provider.technicals(&ticker)).await;
    let earnings = with_deadline(provider.earnings(&ticker)).await;
    let insider_history = with_deadline(provider.insider_history(&ticker, cfg.as_of)).await;
    let news = fetch_news(&ticker, primary_news, fallback_news, breaker, news_semaphore).await;

    EnrichedCandidate {
        candidate,
        returns: ok(returns),
        fundamentals: ok(fundamentals),
        technicals: ok(technicals),
        earnings: ok(earnings),
        insider_history: ok(insider_history),
        news,
    }
}

async fn with_deadline<T>(fut: impl std::future::Future<Output = anyhow::Result<T>>) -> anyhow::Result<T> {
    match tokio::time::timeout(SUB_FETCH_DEADLINE, fut).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!("enrichment sub-fetch timed out")),
    }
}

fn ok<T>(result: anyhow::Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::debug!(error = %err, "enrichment sub-fetch failed, field left absent");
            None
        }
    }
}

/// Holds the concurrency permit only for the duration of the primary/fallback
/// call, then releases it — the semaphore bounds simultaneous news fetches, not
/// the rest of a candidate's enrichment.
async fn fetch_news(
    ticker: &str,
    primary: &dyn NewsProvider,
    fallback: Option<&dyn NewsProvider>,
    breaker: &NewsCircuitBreaker,
    semaphore: &Semaphore,
) -> Option<News> {
    let _permit = semaphore.acquire().await.ok()?;

    if !breaker.is_open() {
        match with_deadline(primary.news(ticker)).await {
            Ok(news) => return Some(news),
            Err(err) => {
                tracing::warn!(error = %err, source = primary.source_name(), "primary news provider failed, tripping breaker");
                breaker.trip();
            }
        }
    }

    match fallback {
        Some(provider) => ok(with_deadline(provider.news(ticker)).await),
        None => None,
    }
}

/// Runs `enrich_one` over every merged candidate concurrently. The semaphore is
/// shared across the whole batch so `news_fetch_concurrency` bounds the entire
/// fan-out, not just one candidate's call.
pub async fn enrich_all(
    candidates: Vec<Candidate>,
    provider: Arc<dyn EnrichmentProvider>,
    primary_news: Arc<dyn NewsProvider>,
    fallback_news: Option<Arc<dyn NewsProvider>>,
    breaker: Arc<NewsCircuitBreaker>,
    cfg: EnrichConfig,
) -> Vec<EnrichedCandidate> {
    let semaphore = Arc::new(Semaphore::new(cfg.news_fetch_concurrency.max(1)));
    let cfg = Arc::new(cfg);

    let tasks = candidates.into_iter().map(|candidate| {
        let provider = provider.clone();
        let primary_news = primary_news.clone();
        let fallback_news = fallback_news.clone();
        let breaker = breaker.clone();
        let semaphore = semaphore.clone();
        let cfg = cfg.clone();
        tokio::spawn(async move {
            enrich_one(
                candidate,
                provider.as_ref(),
                primary_news.as_ref(),
                fallback_news.as_deref(),
                breaker.as_ref(),
                semaphore.as_ref(),
                cfg.as_ref(),
            )
            .await
        })
    });

    let mut results = Vec::new();
    for task in tasks {
        if let Ok(enriched) = task.await {
            results.push(enriched);
        }
    }
    results
}
