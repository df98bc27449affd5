//! Deterministic in-memory broker, adapted from the teacher's `mqk-broker-paper`
//! (an in-process fill simulator rather than a wire client) to this system's
//! `Broker` trait and `Decimal`-denominated amounts. Used by `dry_run`, tests, and
//! as the backtest's price source is NOT this broker — the backtest uses its own
//! `SimulatedPortfolio` (`vantage-portfolio`); this crate simulates order *placement*
//! for live-shaped runs without a real account.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use vantage_broker::{Broker, BrokerFill};
use vantage_schemas::Position;

#[derive(Debug, Clone)]
struct PaperPosition {
    quantity: Decimal,
    avg_buy_price: Decimal,
    opened_at: chrono::NaiveDate,
}

pub struct PaperBroker {
    /// Deterministic ticker -> price map, seeded by the caller (dry_run / tests).
    prices: HashMap<String, Decimal>,
    cash: Mutex<Decimal>,
    positions: Mutex<HashMap<String, PaperPosition>>,
}

impl PaperBroker {
    pub fn new(starting_cash: Decimal, prices: HashMap<String, Decimal>) -> Self {
        PaperBroker {
            prices,
            cash: Mutex::new(starting_cash),
            positions: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_price(&mut self, ticker: impl Into<String>, price: Decimal) {
        self.prices.insert(ticker.into(), price);
    }
}

#[async_trait]
impl Broker for PaperBroker {
    async fn available_cash(&self, _is_real: bool) -> Result<Decimal> {
        Ok(*self.cash.lock().unwrap())
    }

    async fn resolve_instrument(&self, ticker: &str) -> Result<Option<String>> {
        Ok(self.prices.contains_key(ticker).then(|| ticker.to_string()))
    }

    async fn place_market_buy(&self, broker_ticker: &str, amount: Decimal, _is_real: bool) -> Result<BrokerFill> {
        let price = *self
            .prices
            .get(broker_ticker)
            .filter(|p| **p > Decimal::ZERO)
            .ok_or_else(|| anyhow::anyhow!("no valid price for {broker_ticker}"))?;

        let mut cash = self.cash.lock().unwrap();
        if amount > *cash {
            bail!("insufficient funds: requested {amount}, available {cash}");
        }
        *cash -= amount;
        drop(cash);

        let qty = amount / price;
        let mut positions = self.positions.lock().unwrap();
        let entry = positions
            .entry(broker_ticker.to_string())
            .or_insert_with(|| PaperPosition {
                quantity: Decimal::ZERO,
                avg_buy_price: price,
                opened_at: Utc::now().date_naive(),
            });
        let total_qty = entry.quantity + qty;
        entry.avg_buy_price = (entry.quantity * entry.avg_buy_price + qty * price) / total_qty;
        entry.quantity = total_qty;

        Ok(BrokerFill { quantity: qty, price, amount })
    }

    async fn place_market_sell(&self, broker_ticker: &str, quantity: Decimal, _is_real: bool) -> Result<BrokerFill> {
        let price = *self
            .prices
            .get(broker_ticker)
            .filter(|p| **p > Decimal::ZERO)
            .ok_or_else(|| anyhow::anyhow!("no valid price for {broker_ticker}"))?;

        let mut positions = self.positions.lock().unwrap();
        let Some(pos) = positions.get_mut(broker_ticker) else {
            bail!("no open position for {broker_ticker}");
        };
        if quantity > pos.quantity {
            bail!("cannot sell {quantity}, only {} held", pos.quantity);
        }
        pos.quantity -= quantity;
        if pos.quantity <= Decimal::ZERO {
            positions.remove(broker_ticker);
        }
        drop(positions);

        let proceeds = quantity * price;
        *self.cash.lock().unwrap() += proceeds;

        Ok(BrokerFill { quantity, price, amount: proceeds })
    }

    async fn positions(&self, is_real: bool) -> Result<Vec<Position>> {
        let positions = self.positions.lock().unwrap();
        Ok(positions
            .iter()
            .map(|(ticker, pos)| Position {
                ticker: ticker.clone(),
                quantity: pos.quantity,
                avg_buy_price: pos.avg_buy_price,
                opened_at: pos.opened_at,
                is_real,
            })
            .collect())
    }

    async fn current_price(&self, ticker: &str) -> Result<Decimal> {
        self.prices
            .get(ticker)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("no price known for {ticker}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broker() -> PaperBroker {
        let mut prices = HashMap::new();
        prices.insert("AMD".to_string(), Decimal::from(10));
        PaperBroker::new(Decimal::from(100), prices)
    }

    #[tokio::test]
    async fn buy_then_sell_round_trips_cash() {
        let b = broker();
        let fill = b.place_market_buy("AMD", Decimal::from(50), true).await.unwrap();
        assert_eq!(fill.quantity, Decimal::from(5));
        assert_eq!(b.available_cash(true).await.unwrap(), Decimal::from(50));

        let sell = b.place_market_sell("AMD", Decimal::from(5), true).await.unwrap();
        assert_eq!(sell.amount, Decimal::from(50));
        assert_eq!(b.available_cash(true).await.unwrap(), Decimal::from(100));
    }

    #[tokio::test]
    async fn buy_without_price_fails() {
        let b = broker();
        assert!(b.place_market_buy("ZZZ", Decimal::from(10), true).await.is_err());
    }

    #[tokio::test]
    async fn buy_beyond_cash_fails() {
        let b = broker();
        assert!(b.place_market_buy("AMD", Decimal::from(1000), true).await.is_err());
    }
}
