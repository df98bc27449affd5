//! Market-data adapter backed by Yahoo Finance's public chart/quoteSummary JSON
//! endpoints. Grounded on `original_source/src/mcp_servers/market_data/finance.py`:
//! same three data shapes (daily closes for returns/technicals, a quote snapshot
//! for fundamentals, a calendar/earningsHistory module for earnings) and the same
//! pure-math indicator formulas (`compute_rsi`/`compute_macd`/
//! `compute_bollinger_bands`/`compute_moving_averages`), ported here to operate on
//! `&[f64]` instead of a pandas Series. Serves triple duty as `vantage_supervisor`'s
//! `MarketDataProvider`, `vantage_signals`' `EnrichmentProvider`, and
//! `vantage_backtest`'s date-scoped `HistoricalMarketData` (DESIGN.md decision 6).

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use vantage_backtest::HistoricalMarketData;
use vantage_schemas::{Earnings, Fundamentals, QuoteType, Returns, Technicals};
use vantage_signals::EnrichmentProvider;
use vantage_supervisor::{Currency, MarketDataProvider, PriceQuote};

const CHART_BASE: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const QUOTE_SUMMARY_BASE: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

pub struct YahooMarketData {
    http: reqwest::Client,
}

impl YahooMarketData {
    pub fn new() -> Self {
        YahooMarketData { http: reqwest::Client::new() }
    }

    async fn fetch_chart(&self, ticker: &str, range: &str) -> Result<ChartData> {
        let url = format!("{CHART_BASE}/{ticker}?range={range}&interval=1d");
        let resp: ChartResponse = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("yahoo chart request failed for {ticker}"))?
            .error_for_status()
            .with_context(|| format!("yahoo chart returned an error status for {ticker}"))?
            .json()
            .await
            .with_context(|| format!("yahoo chart response decode failed for {ticker}"))?;

        let result = resp
            .chart
            .result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("yahoo chart has no result for {ticker}"))?;

        let closes = result
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .unwrap_or_default();

        Ok(ChartData {
            currency: result.meta.currency,
            regular_market_price: result.meta.regular_market_price,
            timestamps: result.timestamp.unwrap_or_default(),
            closes,
        })
    }

    async fn fetch_quote_summary(&self, ticker: &str, modules: &str) -> Result<serde_json::Value> {
        let url = format!("{QUOTE_SUMMARY_BASE}/{ticker}?modules={modules}");
        let value: serde_json::Value = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("yahoo quoteSummary request failed for {ticker}"))?
            .error_for_status()
            .with_context(|| format!("yahoo quoteSummary returned an error status for {ticker}"))?
            .json()
            .await
            .with_context(|| format!("yahoo quoteSummary response decode failed for {ticker}"))?;

        value
            .pointer("/quoteSummary/result/0")
            .cloned()
            .ok_or_else(|| anyhow!("yahoo quoteSummary has no result for {ticker}"))
    }
}

impl Default for YahooMarketData {
    fn default() -> Self {
        Self::new()
    }
}

struct ChartData {
    currency: Option<String>,
    regular_market_price: Option<f64>,
    timestamps: Vec<i64>,
    closes: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartWrapper,
}

#[derive(Debug, Deserialize)]
struct ChartWrapper {
    result: Vec<ChartResult>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    currency: Option<String>,
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    close: Vec<Option<f64>>,
}

fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::try_from(value).ok()
}

fn currency_of(raw: &Option<String>) -> Currency {
    match raw.as_deref() {
        Some("EUR") => Currency::Eur,
        _ => Currency::Usd,
    }
}

/// Closes in chronological order (oldest first), trailing `None` gaps dropped.
fn clean_closes(closes: &[Option<f64>]) -> Vec<f64> {
    closes.iter().filter_map(|c| *c).collect()
}

fn pct_return(closes: &[f64], bars_back: usize) -> Option<f64> {
    if closes.len() <= bars_back {
        return None;
    }
    let latest = *closes.last()?;
    let past = closes[closes.len() - 1 - bars_back];
    if past == 0.0 {
        return None;
    }
    Some((latest - past) / past * 100.0)
}

fn compute_sma(closes: &[f64], window: usize) -> Option<f64> {
    if closes.len() < window {
        return None;
    }
    let slice = &closes[closes.len() - window..];
    Some(slice.iter().sum::<f64>() / window as f64)
}

fn compute_ema_series(closes: &[f64], window: usize) -> Option<Vec<f64>> {
    if closes.len() < window {
        return None;
    }
    let k = 2.0 / (window as f64 + 1.0);
    let seed = closes[..window].iter().sum::<f64>() / window as f64;
    let mut ema = vec![seed];
    for price in &closes[window..] {
        let prev = *ema.last().unwrap();
        ema.push(price * k + prev * (1.0 - k));
    }
    Some(ema)
}

fn compute_ema(closes: &[f64], window: usize) -> Option<f64> {
    compute_ema_series(closes, window).and_then(|series| series.last().copied())
}

fn compute_rsi(closes: &[f64], period: usize) -> Option<f64> {
    if closes.len() <= period {
        return None;
    }
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let recent = &deltas[deltas.len() - period..];
    let gain_sum: f64 = recent.iter().filter(|d| **d > 0.0).sum();
    let loss_sum: f64 = recent.iter().filter(|d| **d < 0.0).map(|d| -d).sum();
    let avg_gain = gain_sum / period as f64;
    let avg_loss = loss_sum / period as f64;
    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

fn compute_macd(closes: &[f64]) -> Option<f64> {
    let ema12 = compute_ema(closes, 12)?;
    let ema26 = compute_ema(closes, 26)?;
    Some(ema12 - ema26)
}

fn compute_bollinger_bands(closes: &[f64], window: usize, num_std: f64) -> Option<(f64, f64)> {
    if closes.len() < window {
        return None;
    }
    let slice = &closes[closes.len() - window..];
    let mean = slice.iter().sum::<f64>() / window as f64;
    let variance = slice.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / window as f64;
    let std_dev = variance.sqrt();
    Some((mean + num_std * std_dev, mean - num_std * std_dev))
}

fn technicals_from_closes(closes: &[f64]) -> Technicals {
    let bands = compute_bollinger_bands(closes, 20, 2.0);
    Technicals {
        rsi: compute_rsi(closes, 14).and_then(to_decimal),
        macd: compute_macd(closes).and_then(to_decimal),
        bollinger_upper: bands.and_then(|(u, _)| to_decimal(u)),
        bollinger_lower: bands.and_then(|(_, l)| to_decimal(l)),
        sma_50: compute_sma(closes, 50).and_then(to_decimal),
        sma_200: compute_sma(closes, 200).and_then(to_decimal),
        ema_20: compute_ema(closes, 20).and_then(to_decimal),
    }
}

fn quote_type_of(raw: Option<&str>) -> QuoteType {
    match raw {
        Some("ETF") => QuoteType::Etf,
        Some("MUTUALFUND") => QuoteType::Mutualfund,
        Some("INDEX") => QuoteType::Index,
        Some("FUTURE") => QuoteType::Future,
        Some("CURRENCY") => QuoteType::Currency,
        _ => QuoteType::Equity,
    }
}

#[async_trait]
impl MarketDataProvider for YahooMarketData {
    async fn price(&self, ticker: &str) -> Result<PriceQuote> {
        let chart = self.fetch_chart(ticker, "5d").await?;
        let price = chart.regular_market_price.ok_or_else(|| anyhow!("no regularMarketPrice for {ticker}"))?;
        Ok(PriceQuote {
            price: to_decimal(price).ok_or_else(|| anyhow!("price out of decimal range for {ticker}"))?,
            currency: currency_of(&chart.currency),
        })
    }

    async fn eur_usd_rate(&self) -> Result<Decimal> {
        let chart = self.fetch_chart("EURUSD=X", "5d").await?;
        let rate = chart.regular_market_price.ok_or_else(|| anyhow!("no regularMarketPrice for EURUSD=X"))?;
        to_decimal(rate).ok_or_else(|| anyhow!("EUR/USD rate out of decimal range"))
    }
}

#[async_trait]
impl EnrichmentProvider for YahooMarketData {
    async fn returns(&self, ticker: &str) -> Result<Returns> {
        let chart = self.fetch_chart(ticker, "1y").await?;
        let closes = clean_closes(&chart.closes);
        Ok(Returns {
            r1m: pct_return(&closes, 21).and_then(to_decimal),
            r6m: pct_return(&closes, 126).and_then(to_decimal),
            r1y: pct_return(&closes, 252).and_then(to_decimal),
        })
    }

    async fn fundamentals(&self, ticker: &str) -> Result<Fundamentals> {
        let summary = self
            .fetch_quote_summary(ticker, "price,summaryDetail,defaultKeyStatistics,assetProfile")
            .await?;

        let quote_type = quote_type_of(summary.pointer("/price/quoteType").and_then(|v| v.as_str()));
        let market_cap = summary
            .pointer("/summaryDetail/marketCap/raw")
            .and_then(|v| v.as_f64())
            .and_then(to_decimal);
        let sector = summary
            .pointer("/assetProfile/sector")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let pe_ratio = summary
            .pointer("/summaryDetail/trailingPE/raw")
            .and_then(|v| v.as_f64())
            .and_then(to_decimal);
        let profit_margin = summary
            .pointer("/defaultKeyStatistics/profitMargins/raw")
            .and_then(|v| v.as_f64())
            .and_then(to_decimal);

        Ok(Fundamentals { quote_type, market_cap, sector, pe_ratio, profit_margin })
    }

    async fn technicals(&self, ticker: &str) -> Result<Technicals> {
        let chart = self.fetch_chart(ticker, "1y").await?;
        let closes = clean_closes(&chart.closes);
        Ok(technicals_from_closes(&closes))
    }

    async fn earnings(&self, ticker: &str) -> Result<Earnings> {
        let summary = self.fetch_quote_summary(ticker, "calendarEvents,earningsHistory").await?;

        let next_earnings_date = summary
            .pointer("/calendarEvents/earnings/earningsDate/0/raw")
            .and_then(|v| v.as_i64())
            .and_then(|epoch| chrono::DateTime::from_timestamp(epoch, 0))
            .map(|dt| dt.date_naive());
        let last_eps_surprise_pct = summary
            .pointer("/earningsHistory/history/0/surprisePercent/raw")
            .and_then(|v| v.as_f64())
            .and_then(to_decimal);

        Ok(Earnings { next_earnings_date, last_eps_surprise_pct })
    }

    async fn insider_history(&self, _ticker: &str, _as_of: NaiveDate) -> Result<vantage_schemas::InsiderHistory> {
        Err(anyhow!("no insider-history data source is wired for this deployment"))
    }
}

#[async_trait]
impl HistoricalMarketData for YahooMarketData {
    async fn price(&self, ticker: &str, date: NaiveDate) -> Result<Decimal> {
        let chart = self.fetch_chart(ticker, "2y").await?;
        let cutoff = date.and_hms_opt(23, 59, 59).unwrap().and_utc().timestamp();

        let mut best: Option<(i64, f64)> = None;
        for (ts, close) in chart.timestamps.iter().zip(chart.closes.iter()) {
            let Some(close) = close else { continue };
            if *ts <= cutoff && best.map(|(best_ts, _)| *ts > best_ts).unwrap_or(true) {
                best = Some((*ts, *close));
            }
        }

        let (_, close) = best.ok_or_else(|| anyhow!("no historical close on or before {date} for {ticker}"))?;
        to_decimal(close).ok_or_else(|| anyhow!("historical close out of decimal range for {ticker}"))
    }

    async fn fundamentals(&self, ticker: &str, _date: NaiveDate) -> Result<Fundamentals> {
        Err(anyhow!("no historical fundamentals snapshot source for {ticker}; Yahoo's quoteSummary is current-only"))
    }

    async fn technicals(&self, ticker: &str, _date: NaiveDate) -> Result<Technicals> {
        Err(anyhow!("no historical technicals source for {ticker}; Yahoo's chart indicators are current-only"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_needs_the_full_window() {
        let closes: Vec<f64> = (1..=10).map(|n| n as f64).collect();
        assert!(compute_sma(&closes, 20).is_none());
        assert_eq!(compute_sma(&closes, 10), Some(5.5));
    }

    #[test]
    fn rsi_is_100_when_every_move_is_a_gain() {
        let closes: Vec<f64> = (1..=20).map(|n| n as f64).collect();
        assert_eq!(compute_rsi(&closes, 14), Some(100.0));
    }

    #[test]
    fn pct_return_handles_short_history() {
        assert!(pct_return(&[1.0, 2.0], 21).is_none());
    }

    #[test]
    fn quote_type_defaults_to_equity() {
        assert_eq!(quote_type_of(None), QuoteType::Equity);
        assert_eq!(quote_type_of(Some("ETF")), QuoteType::Etf);
    }
}
