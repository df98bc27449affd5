//! Supervisor-level market-data access: current prices (for execution sizing and
//! the market-branch pipeline input) and the EUR/USD spot rate (for currency
//! conversion, §4.7 "Currency conversion"). Generalized over a concrete provider
//! the same way `vantage-broker::Broker` generalizes the broker boundary —
//! grounded on `original_source/src/mcp_servers/market_data/finance.py`'s
//! `get_stock_price`/`get_eur_usd_rate` wrappers.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use vantage_schemas::{EnrichedCandidate, TickerMarketData, TickerSymbol};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    pub price: Decimal,
    pub currency: Currency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Currency {
    Usd,
    Eur,
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn price(&self, ticker: &str) -> Result<PriceQuote>;
    async fn eur_usd_rate(&self) -> Result<Decimal>;
}

/// Converts a native-currency price into EUR so `quantity = amount_eur / price_eur`
/// is correct (§4.7 "Currency conversion"). USD prices are divided by the spot rate;
/// EUR prices pass through unchanged.
pub fn to_eur(quote: PriceQuote, eur_usd_rate: Decimal) -> Option<Decimal> {
    if eur_usd_rate <= Decimal::ZERO {
        return None;
    }
    Some(match quote.currency {
        Currency::Usd => quote.price / eur_usd_rate,
        Currency::Eur => quote.price,
    })
}

/// Best-effort spot-rate fetch: a failure falls back to `static_rate` and logs a
/// warning rather than aborting the cycle (§4.7 step 8, §7 "Currency-conversion
/// fallback"). Cached once per cycle by the caller — this function only performs
/// one fetch attempt.
pub async fn eur_usd_rate_or_fallback(provider: &dyn MarketDataProvider, static_rate: Decimal) -> Decimal {
    match provider.eur_usd_rate().await {
        Ok(rate) if rate > Decimal::ZERO => rate,
        Ok(_) => {
            tracing::warn!("EUR/USD spot rate returned a non-positive value, using static fallback");
            static_rate
        }
        Err(err) => {
            tracing::warn!(error = %err, "EUR/USD spot rate fetch failed, using static fallback");
            static_rate
        }
    }
}

/// Builds the market-branch pipeline input from the already-enriched digest
/// candidates, fetching only the one field the digest doesn't carry: current
/// price. A per-ticker price fetch failure leaves that ticker's `price` field
/// `None` rather than dropping the ticker from the map (§4.3 "absent field" rule
/// applied here to the market-branch boundary).
pub async fn build_market_data(
    candidates: &[EnrichedCandidate],
    provider: &dyn MarketDataProvider,
) -> HashMap<TickerSymbol, TickerMarketData> {
    let mut out = HashMap::with_capacity(candidates.len());
    for candidate in candidates {
        let price = match provider.price(candidate.ticker()).await {
            Ok(quote) => Some(quote.price),
            Err(err) => {
                tracing::warn!(ticker = %candidate.ticker(), error = %err, "price fetch failed for market data");
                None
            }
        };
        out.insert(
            candidate.ticker().to_string(),
            TickerMarketData {
                price,
                fundamentals: candidate.fundamentals.clone(),
                technicals: candidate.technicals.clone(),
                earnings: candidate.earnings.clone(),
            },
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider {
        rate: Option<Decimal>,
    }

    #[async_trait]
    impl MarketDataProvider for FixedProvider {
        async fn price(&self, _ticker: &str) -> Result<PriceQuote> {
            Ok(PriceQuote { price: Decimal::from(10), currency: Currency::Usd })
        }
        async fn eur_usd_rate(&self) -> Result<Decimal> {
            self.rate.ok_or_else(|| anyhow::anyhow!("no rate"))
        }
    }

    #[test]
    fn usd_price_divided_by_rate() {
        let quote = PriceQuote { price: Decimal::from(110), currency: Currency::Usd };
        assert_eq!(to_eur(quote, Decimal::new(110, 2)).unwrap(), Decimal::from(100));
    }

    #[test]
    fn eur_price_passes_through() {
        let quote = PriceQuote { price: Decimal::from(50), currency: Currency::Eur };
        assert_eq!(to_eur(quote, Decimal::new(108, 2)).unwrap(), Decimal::from(50));
    }

    #[tokio::test]
    async fn rate_fetch_failure_falls_back_to_static() {
        let provider = FixedProvider { rate: None };
        let rate = eur_usd_rate_or_fallback(&provider, Decimal::new(108, 2)).await;
        assert_eq!(rate, Decimal::new(108, 2));
    }
}
