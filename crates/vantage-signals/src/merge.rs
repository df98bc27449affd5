//! Merge-by-ticker and filter steps (§4.3 SPEC_FULL.md steps 3 and 5).

use std::collections::HashMap;

use rust_decimal::Decimal;
use vantage_schemas::{Candidate, EnrichedCandidate, Source, SourceCounts};

/// Merges insider and politician candidate lists by ticker. A ticker present in
/// both becomes one `InsiderAndPoliticians` candidate with summed conviction/value
/// and an insertion-order union of insiders; the combined entry preserves the
/// insider candidate's `is_csuite_present` flag.
pub fn merge_by_ticker(insider: Vec<Candidate>, politicians: Vec<Candidate>) -> Vec<Candidate> {
    let mut by_ticker: HashMap<String, Candidate> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for c in insider {
        order.push(c.ticker.clone());
        by_ticker.insert(c.ticker.clone(), c);
    }

    for p in politicians {
        match by_ticker.get_mut(&p.ticker) {
            Some(existing) => {
                existing.source = Source::InsiderAndPoliticians;
                for name in p.insiders {
                    if !existing.insiders.contains(&name) {
                        existing.insiders.push(name);
                    }
                }
                existing.conviction_score += p.conviction_score;
                existing.total_value_usd += p.total_value_usd;
                existing.transactions.extend(p.transactions);
                // is_csuite_present / is_cluster deliberately left as the insider side's values.
            }
            None => {
                order.push(p.ticker.clone());
                by_ticker.insert(p.ticker.clone(), p);
            }
        }
    }

    order.into_iter().filter_map(|t| by_ticker.remove(&t)).collect()
}

#[derive(Debug, Clone, Copy)]
pub struct FilterConfig {
    pub capitol_trades_max_market_cap: Decimal,
}

/// Drops non-equity instruments outright, and politician-sourced mega-caps
/// (insider-sourced mega-caps are retained — §4.3 step 5).
pub fn filter_candidates(candidates: Vec<EnrichedCandidate>, cfg: &FilterConfig) -> Vec<EnrichedCandidate> {
    candidates
        .into_iter()
        .filter(|c| {
            if let Some(fundamentals) = &c.fundamentals {
                if fundamentals.quote_type.is_non_equity() {
                    return false;
                }
                if c.candidate.source == Source::Politicians {
                    if let Some(cap) = fundamentals.market_cap {
                        if cap > cfg.capitol_trades_max_market_cap {
                            return false;
                        }
                    }
                }
            }
            true
        })
        .collect()
}

/// Sorts by `(-conviction_score, ticker)` — descending conviction, ties broken
/// lexicographically by ticker (§3, §5 "Ordering guarantees").
pub fn sort_by_conviction(candidates: &mut [EnrichedCandidate]) {
    candidates.sort_by(|a, b| {
        b.conviction_score()
            .cmp(&a.conviction_score())
            .then_with(|| a.ticker().cmp(b.ticker()))
    });
}

pub fn count_by_source(candidates: &[EnrichedCandidate]) -> SourceCounts {
    let mut counts = SourceCounts::default();
    for c in candidates {
        match c.candidate.source {
            Source::Insider => counts.insider += 1,
            Source::Politicians => counts.politicians += 1,
            Source::InsiderAndPoliticians => counts.insider_and_politicians += 1,
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn candidate(ticker: &str, source: Source, insiders: &[&str], conviction: i64, value: i64) -> Candidate {
        Candidate {
            ticker: ticker.to_string(),
            company: ticker.to_string(),
            source,
            insiders: insiders.iter().map(|s| s.to_string()).collect(),
            is_cluster: insiders.len() > 1,
            is_csuite_present: false,
            total_value_usd: Decimal::from(value),
            conviction_score: Decimal::from(conviction),
            transactions: Vec::new(),
        }
    }

    #[test]
    fn merge_combines_and_unions_insiders_in_insertion_order() {
        let insider = vec![candidate("AMD", Source::Insider, &["A", "B"], 100, 50_000)];
        let politicians = vec![candidate("AMD", Source::Politicians, &["Pelosi"], 75, 30_000)];

        let merged = merge_by_ticker(insider, politicians);
        assert_eq!(merged.len(), 1);
        let c = &merged[0];
        assert_eq!(c.source, Source::InsiderAndPoliticians);
        assert_eq!(c.insiders, vec!["A", "B", "Pelosi"]);
        assert_eq!(c.conviction_score, Decimal::from(175));
        assert_eq!(c.total_value_usd, Decimal::from(80_000));
    }

    #[test]
    fn merge_preserves_order_for_unmatched_tickers() {
        let insider = vec![candidate("AMD", Source::Insider, &["A"], 10, 1)];
        let politicians = vec![candidate("NVDA", Source::Politicians, &["B"], 10, 1)];
        let merged = merge_by_ticker(insider, politicians);
        assert_eq!(merged.iter().map(|c| c.ticker.as_str()).collect::<Vec<_>>(), vec!["AMD", "NVDA"]);
    }

    #[test]
    fn politician_mega_cap_is_dropped_insider_mega_cap_is_kept() {
        use vantage_schemas::{Fundamentals, QuoteType};

        let fundamentals = Fundamentals {
            quote_type: QuoteType::Equity,
            market_cap: Some(Decimal::new(3_000_000_000_000, 0)),
            sector: None,
            pe_ratio: None,
            profit_margin: None,
        };

        let make = |ticker: &str, source: Source| EnrichedCandidate {
            candidate: candidate(ticker, source, &["A"], 10, 1),
            returns: None,
            fundamentals: Some(fundamentals.clone()),
            technicals: None,
            earnings: None,
            insider_history: None,
            news: None,
        };

        let candidates = vec![
            make("POL", Source::Politicians),
            make("INS", Source::Insider),
        ];

        let cfg = FilterConfig { capitol_trades_max_market_cap: Decimal::new(1_000_000_000_000, 0) };
        let filtered = filter_candidates(candidates, &cfg);

        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].ticker(), "INS");
        let _ = NaiveDate::from_ymd_opt(2026, 1, 1);
    }

    #[test]
    fn sort_orders_by_conviction_desc_then_ticker_asc() {
        let make = |ticker: &str, conviction: i64| EnrichedCandidate {
            candidate: candidate(ticker, Source::Insider, &["A"], conviction, 1),
            returns: None,
            fundamentals: None,
            technicals: None,
            earnings: None,
            insider_history: None,
            news: None,
        };
        let mut candidates = vec![make("B", 50), make("A", 50), make("C", 100)];
        sort_by_conviction(&mut candidates);
        assert_eq!(
            candidates.iter().map(|c| c.ticker()).collect::<Vec<_>>(),
            vec!["C", "A", "B"]
        );
    }
}
