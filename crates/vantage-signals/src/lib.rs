//! Signal Digest Builder: turns raw insider/politician feeds into a ranked,
//! enriched `SignalDigest` for the decision cycle.

pub mod circuit_breaker;
pub mod digest;
pub mod enrich;
pub mod merge;
pub mod scoring;
pub mod sources;

pub use circuit_breaker::NewsCircuitBreaker;
pub use digest::{build_digest, DigestConfig};
pub use enrich::{enrich_all, EnrichConfig};
pub use merge::{count_by_source, filter_candidates, merge_by_ticker, sort_by_conviction, FilterConfig};
pub use scoring::{candidate_score, is_csuite_title, normalize_delta_own_pct, transaction_score};
pub use sources::{EnrichmentProvider, InsiderSource, NewsProvider, PoliticianSource};
