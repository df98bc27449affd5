//! Simulated-portfolio running-average cost-basis accounting, used by the Backtest
//! Engine (§3, §4.8 SPEC_FULL.md).
//!
//! Grounded on the teacher's `mqk-portfolio::accounting` shape — a pure `apply_*`
//! function over a mutable state struct, a ledger of every trade appended
//! deterministically — but the accounting rule itself is the simpler running-average
//! model from `original_source/src/backtesting/engine.py::SimulatedPortfolio`, not the
//! teacher's FIFO-lot model (a backtest's simulated portfolio has no short side and no
//! lot-level tax lots to track; a single running average is the correct, simpler rule
//! for this system, and per-lot FIFO would be invented complexity the spec never asks for).

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use vantage_schemas::{SimulatedTrade, TickerSymbol, TradeAction};

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedPosition {
    pub ticker: TickerSymbol,
    pub quantity: Decimal,
    pub avg_buy_price: Decimal,
    pub opened_date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct SimulatedPortfolio {
    pub positions: HashMap<TickerSymbol, SimulatedPosition>,
    pub realized_pnl: Decimal,
    pub total_invested: Decimal,
    pub trades: Vec<SimulatedTrade>,
}

impl SimulatedPortfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// No-op on non-positive price, matching the source's silent-skip behavior.
    pub fn buy(&mut self, ticker: &str, amount: Decimal, price: Decimal, trade_date: NaiveDate) {
        if price <= Decimal::ZERO {
            return;
        }
        let qty = amount / price;

        match self.positions.get_mut(ticker) {
            Some(pos) => {
                let total_qty = pos.quantity + qty;
                pos.avg_buy_price =
                    (pos.quantity * pos.avg_buy_price + qty * price) / total_qty;
                pos.quantity = total_qty;
            }
            None => {
                self.positions.insert(
                    ticker.to_string(),
                    SimulatedPosition {
                        ticker: ticker.to_string(),
                        quantity: qty,
                        avg_buy_price: price,
                        opened_date: trade_date,
                    },
                );
            }
        }

        self.total_invested += amount;
        self.trades.push(SimulatedTrade {
            action: TradeAction::Buy,
            ticker: ticker.to_string(),
            quantity: qty,
            price,
            amount_or_proceeds: amount,
            pnl: None,
            reason: None,
            date: trade_date,
        });
    }

    /// Closes the position entirely and realizes its P&L. No-op (returns `None`) if
    /// the ticker has no open position.
    pub fn sell(
        &mut self,
        ticker: &str,
        price: Decimal,
        trade_date: NaiveDate,
        reason: impl Into<String>,
    ) -> Option<SimulatedTrade> {
        let pos = self.positions.get(ticker)?;
        if pos.quantity <= Decimal::ZERO {
            return None;
        }

        let proceeds = pos.quantity * price;
        let cost_basis = pos.quantity * pos.avg_buy_price;
        let pnl = proceeds - cost_basis;
        self.realized_pnl += pnl;

        let trade = SimulatedTrade {
            action: TradeAction::Sell,
            ticker: ticker.to_string(),
            quantity: pos.quantity,
            price,
            amount_or_proceeds: proceeds,
            pnl: Some(pnl),
            reason: Some(reason.into()),
            date: trade_date,
        };
        self.trades.push(trade.clone());
        self.positions.remove(ticker);
        Some(trade)
    }

    /// Sum of `qty * price`, falling back to the position's average buy price for
    /// any ticker missing from `prices` (an unpriced open position is still worth
    /// something — its last known cost basis — not zero).
    pub fn portfolio_value(&self, prices: &HashMap<TickerSymbol, Decimal>) -> Decimal {
        self.positions
            .values()
            .map(|pos| {
                let price = prices.get(&pos.ticker).copied().unwrap_or(pos.avg_buy_price);
                pos.quantity * price
            })
            .sum()
    }

    pub fn unrealized_pnl(&self, prices: &HashMap<TickerSymbol, Decimal>) -> Decimal {
        self.portfolio_value(prices) - self.total_invested + self.realized_pnl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[test]
    fn buy_then_buy_again_updates_running_average() {
        let mut pf = SimulatedPortfolio::new();
        pf.buy("AMD", Decimal::from(100), Decimal::from(10), date(1));
        pf.buy("AMD", Decimal::from(100), Decimal::from(20), date(2));

        let pos = pf.positions.get("AMD").unwrap();
        // qty: 10 + 5 = 15; avg = (10*10 + 5*20)/15 = 200/15
        assert_eq!(pos.quantity, Decimal::new(15, 0));
        assert_eq!(pos.avg_buy_price, Decimal::from(200) / Decimal::from(15));
    }

    #[test]
    fn zero_price_buy_is_a_noop() {
        let mut pf = SimulatedPortfolio::new();
        pf.buy("AMD", Decimal::from(100), Decimal::ZERO, date(1));
        assert!(pf.positions.is_empty());
        assert!(pf.trades.is_empty());
    }

    #[test]
    fn sell_realizes_pnl_and_closes_position() {
        let mut pf = SimulatedPortfolio::new();
        pf.buy("AMD", Decimal::from(100), Decimal::from(10), date(1));
        let trade = pf.sell("AMD", Decimal::from(15), date(5), "take_profit").unwrap();

        assert_eq!(trade.pnl, Some(Decimal::from(50)));
        assert_eq!(pf.realized_pnl, Decimal::from(50));
        assert!(!pf.positions.contains_key("AMD"));
    }

    #[test]
    fn selling_unheld_ticker_is_a_noop() {
        let mut pf = SimulatedPortfolio::new();
        assert!(pf.sell("AMD", Decimal::from(10), date(1), "x").is_none());
    }

    #[test]
    fn portfolio_value_falls_back_to_avg_price_when_unpriced() {
        let mut pf = SimulatedPortfolio::new();
        pf.buy("AMD", Decimal::from(100), Decimal::from(10), date(1));
        let value = pf.portfolio_value(&HashMap::new());
        assert_eq!(value, Decimal::from(100));
    }
}
