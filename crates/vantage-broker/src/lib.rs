//! The `Broker` capability trait. Concrete implementations (`vantage-broker-paper`,
//! `vantage-broker-live`) live in their own crates; the Trade Executor, Sell Strategy
//! caller, and EOD snapshot job depend on this trait object only, never on a concrete
//! client — the same "generalize over providers" pattern `vantage-md`'s
//! `HistoricalProvider` trait applies to historical-data sources (§9 SPEC_FULL.md
//! "Per-stage polymorphism" design note, applied here to the broker boundary).

use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use vantage_schemas::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct BrokerFill {
    pub quantity: Decimal,
    pub price: Decimal,
    pub amount: Decimal,
}

/// A narrow, read-through view over the external broker. Every method may fail;
/// callers are responsible for converting a failure into a structured result
/// (§7 SPEC_FULL.md) rather than propagating it as fatal.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Free cash available to trade for the given account (`true` = live, `false` = demo/practice).
    async fn available_cash(&self, is_real: bool) -> Result<Decimal>;

    /// Resolves a ticker to the broker's own instrument identifier. `Ok(None)` means
    /// the broker has no tradable instrument for this ticker (not an error).
    async fn resolve_instrument(&self, ticker: &str) -> Result<Option<String>>;

    /// Places a market buy for a currency `amount` (value-based order).
    async fn place_market_buy(&self, broker_ticker: &str, amount: Decimal, is_real: bool) -> Result<BrokerFill>;

    /// Places a market sell for a `quantity` (quantity-based order).
    async fn place_market_sell(&self, broker_ticker: &str, quantity: Decimal, is_real: bool) -> Result<BrokerFill>;

    /// Current open positions for the given account.
    async fn positions(&self, is_real: bool) -> Result<Vec<Position>>;

    /// Last traded price for a ticker, used by the EOD snapshot and sell-check cycle.
    async fn current_price(&self, ticker: &str) -> Result<Decimal>;
}
