//! End-of-day snapshot (§4.7 SPEC_FULL.md "EOD snapshot", supplemented): reads
//! broker positions only, computes portfolio value at current prices, and hands
//! the result to a narrow `SnapshotSink` the reporting boundary implements —
//! this crate only produces the value, it never renders it. Grounded on
//! `original_source/src/orchestrator/supervisor.py::run_end_of_day`.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use vantage_broker::Broker;
use vantage_schemas::Position;

use crate::market_data::{to_eur, MarketDataProvider};

#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub total_invested: Decimal,
    pub total_value: Decimal,
    pub unrealized_pnl: Decimal,
    pub positions: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioSnapshot {
    pub run_date: NaiveDate,
    pub real: AccountSnapshot,
    pub virtual_: AccountSnapshot,
}

/// Narrow reporting boundary (out of scope per SPEC_FULL.md §1) the core depends
/// on only through this trait, never a concrete store.
#[async_trait]
pub trait SnapshotSink: Send + Sync {
    async fn record(&self, snapshot: &PortfolioSnapshot) -> anyhow::Result<()>;
}

/// `market_data`/`eur_usd_rate` back the broker's own `current_price` (which
/// Trading212 cannot answer — see `vantage-broker-live`) with the same
/// EUR-converted quote source the decision cycle prices buys with.
pub async fn run_end_of_day(
    broker: &dyn Broker,
    market_data: &dyn MarketDataProvider,
    eur_usd_rate: Decimal,
    run_date: NaiveDate,
) -> PortfolioSnapshot {
    PortfolioSnapshot {
        run_date,
        real: account_snapshot(broker, market_data, eur_usd_rate, true).await,
        virtual_: account_snapshot(broker, market_data, eur_usd_rate, false).await,
    }
}

async fn account_snapshot(broker: &dyn Broker, market_data: &dyn MarketDataProvider, eur_usd_rate: Decimal, is_real: bool) -> AccountSnapshot {
    let positions = match broker.positions(is_real).await {
        Ok(positions) => positions,
        Err(err) => {
            tracing::warn!(error = %err, is_real, "failed to fetch positions for EOD snapshot");
            Vec::new()
        }
    };

    let mut total_invested = Decimal::ZERO;
    let mut total_value = Decimal::ZERO;
    for position in &positions {
        total_invested += position.quantity * position.avg_buy_price;
        let current = resolve_current_price(broker, market_data, eur_usd_rate, &position.ticker).await.unwrap_or(position.avg_buy_price);
        total_value += position.quantity * current;
    }

    AccountSnapshot { total_invested, total_value, unrealized_pnl: total_value - total_invested, positions }
}

/// Tries the broker first (some adapters, e.g. the paper broker, answer this
/// directly), then falls back to the market-data provider converted to EUR.
async fn resolve_current_price(
    broker: &dyn Broker,
    market_data: &dyn MarketDataProvider,
    eur_usd_rate: Decimal,
    ticker: &str,
) -> Option<Decimal> {
    if let Ok(price) = broker.current_price(ticker).await {
        if price > Decimal::ZERO {
            return Some(price);
        }
    }

    match market_data.price(ticker).await {
        Ok(quote) => to_eur(quote, eur_usd_rate).filter(|price| *price > Decimal::ZERO),
        Err(err) => {
            tracing::warn!(ticker, error = %err, "market-data price fetch failed for EOD snapshot");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use vantage_broker::BrokerFill;

    struct FakeBroker {
        positions: Vec<Position>,
        price: Decimal,
    }

    #[async_trait]
    impl Broker for FakeBroker {
        async fn available_cash(&self, _is_real: bool) -> Result<Decimal> {
            Ok(Decimal::ZERO)
        }
        async fn resolve_instrument(&self, ticker: &str) -> Result<Option<String>> {
            Ok(Some(ticker.to_string()))
        }
        async fn place_market_buy(&self, _broker_ticker: &str, _amount: Decimal, _is_real: bool) -> Result<BrokerFill> {
            unreachable!("EOD snapshot never trades")
        }
        async fn place_market_sell(&self, _broker_ticker: &str, _quantity: Decimal, _is_real: bool) -> Result<BrokerFill> {
            unreachable!("EOD snapshot never trades")
        }
        async fn positions(&self, _is_real: bool) -> Result<Vec<Position>> {
            Ok(self.positions.clone())
        }
        async fn current_price(&self, _ticker: &str) -> Result<Decimal> {
            Ok(self.price)
        }
    }

    /// Always errors, simulating a broker with no quote support and no market-data
    /// coverage, so tests can exercise the avg-buy-price fallback.
    struct NoMarketData;

    #[async_trait]
    impl MarketDataProvider for NoMarketData {
        async fn price(&self, _ticker: &str) -> Result<crate::market_data::PriceQuote> {
            Err(anyhow::anyhow!("no market data in this test"))
        }
        async fn eur_usd_rate(&self) -> Result<Decimal> {
            Err(anyhow::anyhow!("no market data in this test"))
        }
    }

    fn position(ticker: &str, qty: i64, avg: i64) -> Position {
        Position {
            ticker: ticker.to_string(),
            quantity: Decimal::from(qty),
            avg_buy_price: Decimal::from(avg),
            opened_at: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            is_real: true,
        }
    }

    #[tokio::test]
    async fn computes_unrealized_pnl_at_current_price() {
        let broker = FakeBroker { positions: vec![position("AMD", 10, 100)], price: Decimal::from(110) };
        let snapshot = run_end_of_day(&broker, &NoMarketData, Decimal::ONE, NaiveDate::from_ymd_opt(2026, 1, 2).unwrap()).await;

        assert_eq!(snapshot.real.total_invested, Decimal::from(1000));
        assert_eq!(snapshot.real.total_value, Decimal::from(1100));
        assert_eq!(snapshot.real.unrealized_pnl, Decimal::from(100));
    }

    #[tokio::test]
    async fn non_positive_price_falls_back_to_avg_buy_price() {
        let broker = FakeBroker { positions: vec![position("AMD", 10, 100)], price: Decimal::ZERO };
        let snapshot = run_end_of_day(&broker, &NoMarketData, Decimal::ONE, NaiveDate::from_ymd_opt(2026, 1, 2).unwrap()).await;

        assert_eq!(snapshot.real.total_value, snapshot.real.total_invested);
        assert_eq!(snapshot.real.unrealized_pnl, Decimal::ZERO);
    }

    #[tokio::test]
    async fn empty_positions_yield_zeroed_snapshot() {
        let broker = FakeBroker { positions: vec![], price: Decimal::from(1) };
        let snapshot = run_end_of_day(&broker, &NoMarketData, Decimal::ONE, NaiveDate::from_ymd_opt(2026, 1, 2).unwrap()).await;

        assert_eq!(snapshot.real.total_invested, Decimal::ZERO);
        assert_eq!(snapshot.virtual_.total_invested, Decimal::ZERO);
    }
}
