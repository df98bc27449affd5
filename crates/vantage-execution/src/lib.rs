//! Trade Executor (§4.5 SPEC_FULL.md): a strictly sequential, budget-aware fallback
//! loop over the broker.
//!
//! Grounded on the teacher's `mqk-execution::order_router` — a thin, deterministic
//! boundary between ranked order intents and a broker adapter, broker-agnostic and
//! free of strategy/risk concerns — generalized here from the teacher's single-order
//! submission call into the ordered "attempt, record, continue on failure" loop the
//! spec's fallback semantics require.

use rust_decimal::Decimal;
use vantage_broker::Broker;
use vantage_schemas::{ExecutionSummary, TickerSymbol, TradeResult};

/// One already-ranked buy candidate. Order in the slice *is* the fallback order —
/// the executor never re-sorts.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub ticker: TickerSymbol,
    /// Price in the broker account's currency, already converted (§4.5 "Currency
    /// conversion"). `None` means no price could be resolved for this candidate.
    pub price_in_local_ccy: Option<Decimal>,
    /// `[0, 100]`.
    pub allocation_pct: Decimal,
    pub reasoning: String,
}

const MIN_REMAINING: Decimal = Decimal::ONE;

/// Runs the fallback loop against `broker` for `candidates`, in the order given.
/// `configured_budget` is the real or practice budget per §4.5 step 1; the cash
/// fetch failing falls back to it rather than aborting the cycle.
pub async fn execute(
    broker: &dyn Broker,
    candidates: &[RankedCandidate],
    configured_budget: Decimal,
    is_real: bool,
) -> ExecutionSummary {
    let available_cash = match broker.available_cash(is_real).await {
        Ok(cash) => cash,
        Err(err) => {
            tracing::warn!(error = %err, "available cash fetch failed, falling back to configured budget");
            configured_budget
        }
    };
    let effective_budget = configured_budget.min(available_cash);

    let mut total_spent = Decimal::ZERO;
    let mut bought = Vec::new();
    let mut failed = Vec::new();

    for candidate in candidates {
        let remaining = effective_budget - total_spent;
        if remaining < MIN_REMAINING {
            break;
        }

        if candidate.price_in_local_ccy.filter(|p| *p > Decimal::ZERO).is_none() {
            failed.push(TradeResult::failed(candidate.ticker.clone(), "no valid price"));
            continue;
        }

        let Ok(Some(broker_ticker)) = broker.resolve_instrument(&candidate.ticker).await else {
            failed.push(TradeResult::failed(candidate.ticker.clone(), "not tradable"));
            continue;
        };

        let target_amount = (candidate.allocation_pct / Decimal::from(100)) * effective_budget;
        let amount = target_amount.min(remaining);

        match broker.place_market_buy(&broker_ticker, amount, is_real).await {
            Ok(fill) => {
                total_spent += fill.amount;
                bought.push(TradeResult {
                    ticker: candidate.ticker.clone(),
                    success: true,
                    amount_spent: fill.amount,
                    quantity: fill.quantity,
                    broker_ticker: Some(broker_ticker),
                    error: None,
                });
            }
            Err(err) => {
                tracing::warn!(ticker = %candidate.ticker, error = %err, "broker rejected order");
                failed.push(TradeResult {
                    ticker: candidate.ticker.clone(),
                    success: false,
                    amount_spent: Decimal::ZERO,
                    quantity: Decimal::ZERO,
                    broker_ticker: Some(broker_ticker),
                    error: Some(err.to_string()),
                });
            }
        }
    }

    ExecutionSummary {
        is_real,
        budget: configured_budget,
        available_cash,
        total_spent,
        bought,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use vantage_broker_paper::PaperBroker;

    fn candidate(ticker: &str, price: Option<i64>, allocation_pct: i64) -> RankedCandidate {
        RankedCandidate {
            ticker: ticker.to_string(),
            price_in_local_ccy: price.map(Decimal::from),
            allocation_pct: Decimal::from(allocation_pct),
            reasoning: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn fallback_skips_invalid_price_and_clamps_to_remaining() {
        let mut prices = HashMap::new();
        prices.insert("X".to_string(), Decimal::from(10));
        prices.insert("Z".to_string(), Decimal::from(20));
        let broker = PaperBroker::new(Decimal::from(100), prices);

        let candidates = vec![
            candidate("X", Some(10), 60),
            candidate("Y", Some(0), 30),
            candidate("Z", Some(20), 40),
        ];

        let summary = execute(&broker, &candidates, Decimal::from(100), true).await;

        assert_eq!(summary.bought.len(), 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].ticker, "Y");
        assert!(summary.total_spent <= Decimal::from(100));
        assert!(summary.bought.iter().all(|t| t.amount_spent > Decimal::ZERO));
    }

    #[tokio::test]
    async fn stops_when_remaining_drops_below_minimum() {
        let mut prices = HashMap::new();
        prices.insert("A".to_string(), Decimal::from(10));
        prices.insert("B".to_string(), Decimal::from(10));
        let broker = PaperBroker::new(Decimal::new(1005, 2), prices); // 10.05

        let candidates = vec![candidate("A", Some(10), 100), candidate("B", Some(10), 100)];
        let summary = execute(&broker, &candidates, Decimal::new(1005, 2), true).await;

        assert_eq!(summary.bought.len(), 1);
        assert_eq!(summary.failed.len(), 0);
    }

    #[tokio::test]
    async fn order_of_attempts_equals_input_order() {
        let mut prices = HashMap::new();
        prices.insert("A".to_string(), Decimal::from(1));
        prices.insert("B".to_string(), Decimal::from(1));
        let broker = PaperBroker::new(Decimal::from(100), prices);

        let candidates = vec![candidate("A", Some(1), 10), candidate("B", Some(1), 10)];
        let summary = execute(&broker, &candidates, Decimal::from(100), true).await;

        assert_eq!(summary.bought[0].ticker, "A");
        assert_eq!(summary.bought[1].ticker, "B");
    }
}
