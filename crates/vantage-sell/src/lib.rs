//! Sell Strategy Engine (§4.6 SPEC_FULL.md): a pure, deterministic, priority-ordered
//! evaluator over open positions. Grounded on the teacher's `mqk-risk::engine` shape —
//! a free function taking config + state by reference, checked arithmetic guards
//! instead of panics, and fixed-priority rule checks that return on first match.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use vantage_schemas::{Position, SellSignal, SellSignalType, TickerSymbol};

#[derive(Debug, Clone, Copy)]
pub struct SellStrategyConfig {
    pub stop_loss_pct: Decimal,
    pub take_profit_pct: Decimal,
    pub max_hold_days: i64,
}

/// Evaluates every position against `prices`, in fixed rule priority
/// (stop_loss > take_profit > hold_period, first match wins). Positions with a
/// non-positive price or quantity are skipped — not an error, just no signal.
pub fn evaluate_positions(
    cfg: &SellStrategyConfig,
    positions: &[Position],
    prices: &HashMap<TickerSymbol, Decimal>,
    today: NaiveDate,
) -> Vec<SellSignal> {
    positions
        .iter()
        .filter_map(|position| evaluate_one(cfg, position, prices.get(&position.ticker), today))
        .collect()
}

fn evaluate_one(
    cfg: &SellStrategyConfig,
    position: &Position,
    price: Option<&Decimal>,
    today: NaiveDate,
) -> Option<SellSignal> {
    let price = *price?;
    if price <= Decimal::ZERO || position.quantity <= Decimal::ZERO {
        return None;
    }
    if position.avg_buy_price <= Decimal::ZERO {
        return None;
    }

    let return_pct = (price - position.avg_buy_price)
        .checked_div(position.avg_buy_price)?
        .checked_mul(Decimal::from(100))?;

    if return_pct <= -cfg.stop_loss_pct {
        return Some(SellSignal {
            ticker: position.ticker.clone(),
            signal_type: SellSignalType::StopLoss,
            trigger_price: price,
            return_pct,
            reasoning: format!("stop_loss ({return_pct:.1}%)"),
        });
    }

    if return_pct >= cfg.take_profit_pct {
        return Some(SellSignal {
            ticker: position.ticker.clone(),
            signal_type: SellSignalType::TakeProfit,
            trigger_price: price,
            return_pct,
            reasoning: format!("take_profit (+{return_pct:.1}%)"),
        });
    }

    let days_held = (today - position.opened_at).num_days();
    if days_held >= cfg.max_hold_days {
        return Some(SellSignal {
            ticker: position.ticker.clone(),
            signal_type: SellSignalType::HoldPeriod,
            trigger_price: price,
            return_pct,
            reasoning: format!("hold_period ({days_held}d)"),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SellStrategyConfig {
        SellStrategyConfig {
            stop_loss_pct: Decimal::from(10),
            take_profit_pct: Decimal::from(15),
            max_hold_days: 5,
        }
    }

    fn position(avg: i64, opened_days_ago: i64, today: NaiveDate) -> Position {
        Position {
            ticker: "AMD".into(),
            quantity: Decimal::ONE,
            avg_buy_price: Decimal::from(avg),
            opened_at: today - chrono::Duration::days(opened_days_ago),
            is_real: true,
        }
    }

    #[test]
    fn stop_loss_wins_over_also_triggered_hold_period() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let pos = position(100, 10, today);
        let mut prices = HashMap::new();
        prices.insert("AMD".to_string(), Decimal::from(85));

        let signals = evaluate_positions(&cfg(), &[pos], &prices, today);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].signal_type, SellSignalType::StopLoss);
    }

    #[test]
    fn take_profit_fires_when_threshold_crossed() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let pos = position(100, 1, today);
        let mut prices = HashMap::new();
        prices.insert("AMD".to_string(), Decimal::from(116));

        let signals = evaluate_positions(&cfg(), &[pos], &prices, today);
        assert_eq!(signals[0].signal_type, SellSignalType::TakeProfit);
    }

    #[test]
    fn hold_period_fires_when_nothing_else_triggers() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let pos = position(100, 5, today);
        let mut prices = HashMap::new();
        prices.insert("AMD".to_string(), Decimal::from(101));

        let signals = evaluate_positions(&cfg(), &[pos], &prices, today);
        assert_eq!(signals[0].signal_type, SellSignalType::HoldPeriod);
    }

    #[test]
    fn no_signal_within_bounds() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let pos = position(100, 1, today);
        let mut prices = HashMap::new();
        prices.insert("AMD".to_string(), Decimal::from(105));

        assert!(evaluate_positions(&cfg(), &[pos], &prices, today).is_empty());
    }

    #[test]
    fn missing_price_is_skipped_not_errored() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let pos = position(100, 20, today);
        let prices = HashMap::new();

        assert!(evaluate_positions(&cfg(), &[pos], &prices, today).is_empty());
    }

    #[test]
    fn non_positive_price_is_skipped() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let pos = position(100, 20, today);
        let mut prices = HashMap::new();
        prices.insert("AMD".to_string(), Decimal::ZERO);

        assert!(evaluate_positions(&cfg(), &[pos], &prices, today).is_empty());
    }
}
