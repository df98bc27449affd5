//! Sell-check cycle (§4.7 SPEC_FULL.md "Sell-check cycle", supplemented): runs
//! independently of the decision cycle, evaluates the Sell Strategy Engine
//! against live broker positions, and places market sells for any triggered
//! signal. No blacklist interaction — only the Trade Executor's buy path
//! blacklists a ticker.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use vantage_broker::Broker;
use vantage_notify::Notifier;
use vantage_schemas::{Position, SellSignal, TickerSymbol, TradeResult};
use vantage_sell::{evaluate_positions, SellStrategyConfig};

use crate::market_data::{to_eur, MarketDataProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountScope {
    Real,
    Virtual,
    Both,
}

impl AccountScope {
    fn accounts(self) -> &'static [bool] {
        match self {
            AccountScope::Real => &[true],
            AccountScope::Virtual => &[false],
            AccountScope::Both => &[true, false],
        }
    }
}

pub struct SellCycleConfig {
    pub run_date: NaiveDate,
    pub scope: AccountScope,
    pub sell: SellStrategyConfig,
}

pub struct SellCycleOutcome {
    pub executed: Vec<(SellSignal, TradeResult)>,
}

/// `market_data`/`eur_usd_rate` back the broker's own `current_price` (which
/// Trading212 cannot answer — see `vantage-broker-live`) with the same
/// EUR-converted quote source the decision cycle prices buys with.
pub async fn run_sell_checks(
    broker: &dyn Broker,
    market_data: &dyn MarketDataProvider,
    eur_usd_rate: Decimal,
    notifier: &dyn Notifier,
    cfg: SellCycleConfig,
) -> SellCycleOutcome {
    let mut executed = Vec::new();

    for &is_real in cfg.scope.accounts() {
        let positions = match broker.positions(is_real).await {
            Ok(positions) => positions,
            Err(err) => {
                tracing::warn!(error = %err, is_real, "failed to fetch positions for sell check, skipping this account");
                continue;
            }
        };
        if positions.is_empty() {
            continue;
        }

        let prices = fetch_prices(broker, market_data, eur_usd_rate, &positions).await;
        let signals = evaluate_positions(&cfg.sell, &positions, &prices, cfg.run_date);

        for signal in signals {
            let quantity = positions.iter().find(|p| p.ticker == signal.ticker).map(|p| p.quantity).unwrap_or(Decimal::ZERO);
            let result = execute_sell(broker, &signal, quantity, is_real).await;
            executed.push((signal, result));
        }
    }

    if let Some(text) = vantage_notify::format_sell_signals(cfg.run_date, &executed) {
        if let Err(err) = notifier.send(&text).await {
            tracing::warn!(error = %err, "notifier send failed for sell signals");
        }
    }

    SellCycleOutcome { executed }
}

async fn fetch_prices(
    broker: &dyn Broker,
    market_data: &dyn MarketDataProvider,
    eur_usd_rate: Decimal,
    positions: &[Position],
) -> HashMap<TickerSymbol, Decimal> {
    let mut prices = HashMap::with_capacity(positions.len());
    for position in positions {
        match broker.current_price(&position.ticker).await {
            Ok(price) if price > Decimal::ZERO => {
                prices.insert(position.ticker.clone(), price);
                continue;
            }
            _ => {}
        }

        match market_data.price(&position.ticker).await {
            Ok(quote) => match to_eur(quote, eur_usd_rate) {
                Some(price) => {
                    prices.insert(position.ticker.clone(), price);
                }
                None => tracing::warn!(ticker = %position.ticker, "EUR conversion failed for sell check, skipping"),
            },
            Err(err) => {
                tracing::warn!(ticker = %position.ticker, error = %err, "price fetch failed for sell check, skipping");
            }
        }
    }
    prices
}

async fn execute_sell(broker: &dyn Broker, signal: &SellSignal, quantity: Decimal, is_real: bool) -> TradeResult {
    let broker_ticker = match broker.resolve_instrument(&signal.ticker).await {
        Ok(Some(broker_ticker)) => broker_ticker,
        Ok(None) => return TradeResult::failed(signal.ticker.clone(), "not tradable"),
        Err(err) => return TradeResult::failed(signal.ticker.clone(), err.to_string()),
    };

    match broker.place_market_sell(&broker_ticker, quantity, is_real).await {
        Ok(fill) => TradeResult {
            ticker: signal.ticker.clone(),
            success: true,
            amount_spent: fill.amount,
            quantity: fill.quantity,
            broker_ticker: Some(broker_ticker),
            error: None,
        },
        Err(err) => {
            tracing::warn!(ticker = %signal.ticker, error = %err, "broker rejected sell order");
            TradeResult {
                ticker: signal.ticker.clone(),
                success: false,
                amount_spent: Decimal::ZERO,
                quantity: Decimal::ZERO,
                broker_ticker: Some(broker_ticker),
                error: Some(err.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use vantage_broker::BrokerFill;
    use vantage_notify::NullNotifier;

    /// A minimal fixed-price/fixed-position broker, letting tests set an
    /// `avg_buy_price` independent of the current quoted price — the scenario
    /// `vantage-broker-paper`'s single price map can't represent.
    struct FakeBroker {
        positions: Vec<Position>,
        current_price: Decimal,
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
            unreachable!("sell cycle never buys")
        }
        async fn place_market_sell(&self, broker_ticker: &str, quantity: Decimal, _is_real: bool) -> Result<BrokerFill> {
            Ok(BrokerFill { quantity, price: self.current_price, amount: quantity * self.current_price })
        }
        async fn positions(&self, _is_real: bool) -> Result<Vec<Position>> {
            Ok(self.positions.clone())
        }
        async fn current_price(&self, _ticker: &str) -> Result<Decimal> {
            Ok(self.current_price)
        }
    }

    /// Always errors, exercising the broker-price-only path since `FakeBroker`
    /// already answers `current_price` directly.
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

    fn sell_cfg(run_date: NaiveDate, scope: AccountScope) -> SellCycleConfig {
        SellCycleConfig {
            run_date,
            scope,
            sell: SellStrategyConfig { stop_loss_pct: Decimal::from(10), take_profit_pct: Decimal::from(15), max_hold_days: 30 },
        }
    }

    fn position(ticker: &str, avg: i64, opened_days_ago: i64, today: NaiveDate) -> Position {
        Position {
            ticker: ticker.to_string(),
            quantity: Decimal::from(5),
            avg_buy_price: Decimal::from(avg),
            opened_at: today - chrono::Duration::days(opened_days_ago),
            is_real: true,
        }
    }

    #[tokio::test]
    async fn stop_loss_position_is_sold() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let broker = FakeBroker { positions: vec![position("AMD", 100, 10, today)], current_price: Decimal::from(85) };

        let outcome = run_sell_checks(&broker, &NoMarketData, Decimal::ONE, &NullNotifier, sell_cfg(today, AccountScope::Real)).await;
        assert_eq!(outcome.executed.len(), 1);
        assert_eq!(outcome.executed[0].0.ticker, "AMD");
        assert!(outcome.executed[0].1.success);
    }

    #[tokio::test]
    async fn no_trigger_yields_no_executed_sells() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let broker = FakeBroker { positions: vec![position("AMD", 100, 1, today)], current_price: Decimal::from(101) };

        let outcome = run_sell_checks(&broker, &NoMarketData, Decimal::ONE, &NullNotifier, sell_cfg(today, AccountScope::Real)).await;
        assert!(outcome.executed.is_empty());
    }

    #[tokio::test]
    async fn no_positions_yields_no_executed_sells() {
        let broker = FakeBroker { positions: vec![], current_price: Decimal::from(1) };
        let outcome = run_sell_checks(
            &broker,
            &NoMarketData,
            Decimal::ONE,
            &NullNotifier,
            sell_cfg(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), AccountScope::Both),
        )
        .await;
        assert!(outcome.executed.is_empty());
    }
}
