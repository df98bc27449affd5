//! Top-level digest assembly (§4.3 step 1 and step 6 SPEC_FULL.md).

use std::sync::Arc;

use chrono::NaiveDate;
use vantage_schemas::{SignalDigest, SourceCounts as SchemaSourceCounts};

use crate::circuit_breaker::NewsCircuitBreaker;
use crate::enrich::{enrich_all, EnrichConfig};
use crate::merge::{count_by_source, filter_candidates, merge_by_ticker, sort_by_conviction, FilterConfig};
use crate::sources::{EnrichmentProvider, InsiderSource, NewsProvider, PoliticianSource};

pub struct DigestConfig {
    pub insider_lookback_days: i64,
    pub insider_top_n: usize,
    pub politician_top_n: usize,
    pub politician_source_enabled: bool,
    pub news_fetch_concurrency: usize,
    pub capitol_trades_max_market_cap: rust_decimal::Decimal,
    pub as_of: NaiveDate,
}

/// Builds a `SignalDigest` end to end: fetch both sources best-effort, merge by
/// ticker, enrich concurrently, filter, sort, and count. A total failure of both
/// source fetches yields an empty digest — the caller decides what "low signal
/// day" means, this function never does.
#[allow(clippy::too_many_arguments)]
pub async fn build_digest(
    insider_source: &dyn InsiderSource,
    politician_source: Option<&dyn PoliticianSource>,
    enrichment: Arc<dyn EnrichmentProvider>,
    primary_news: Arc<dyn NewsProvider>,
    fallback_news: Option<Arc<dyn NewsProvider>>,
    breaker: Arc<NewsCircuitBreaker>,
    cfg: &DigestConfig,
) -> SignalDigest {
    let insider = match insider_source.fetch_candidates(cfg.insider_lookback_days, cfg.insider_top_n).await {
        Ok(candidates) => candidates,
        Err(err) => {
            tracing::warn!(error = %err, "insider source fetch failed, treating as empty");
            Vec::new()
        }
    };

    let insider_count = insider.len() as u32;

    let politicians = if cfg.politician_source_enabled {
        match politician_source {
            Some(source) => match source.fetch_candidates(cfg.politician_top_n).await {
                Ok(candidates) => candidates,
                Err(err) => {
                    tracing::warn!(error = %err, "politician source fetch failed, treating as empty");
                    Vec::new()
                }
            },
            None => Vec::new(),
        }
    } else {
        Vec::new()
    };

    let merged = merge_by_ticker(insider, politicians);

    let enriched = enrich_all(
        merged,
        enrichment,
        primary_news,
        fallback_news,
        breaker,
        EnrichConfig { news_fetch_concurrency: cfg.news_fetch_concurrency, as_of: cfg.as_of },
    )
    .await;

    let filter_cfg = FilterConfig { capitol_trades_max_market_cap: cfg.capitol_trades_max_market_cap };
    let mut filtered = filter_candidates(enriched, &filter_cfg);
    sort_by_conviction(&mut filtered);

    let counts = count_by_source(&filtered);

    SignalDigest {
        candidates: filtered,
        insider_count,
        lookback_days: cfg.insider_lookback_days,
        source_counts: SchemaSourceCounts {
            insider: counts.insider,
            politicians: counts.politicians,
            insider_and_politicians: counts.insider_and_politicians,
        },
    }
}
