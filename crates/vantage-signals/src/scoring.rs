//! Conviction scoring (§4.3 SPEC_FULL.md), grounded on
//! `original_source/src/mcp_servers/market_data/insider.py`'s OpenInsider scraper:
//! `score = value_usd_weighted * title_multiplier * recency_decay`, where C-suite
//! titles get a 3x multiplier and recency decays exponentially.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use vantage_schemas::RawTransaction;

const CSUITE_TITLES: &[&str] = &[
    "ceo",
    "chief executive",
    "cfo",
    "chief financial",
    "coo",
    "chief operating",
    "president",
    "chairman",
    "chair",
    "cto",
    "chief technology",
    "executive chairman",
];

fn title_multiplier(title: &str) -> Decimal {
    let lower = title.to_lowercase();
    if CSUITE_TITLES.iter().any(|t| lower.contains(t)) {
        Decimal::from(3)
    } else {
        Decimal::ONE
    }
}

/// `e^(-0.2 * days_since_trade)`; computed in `f64` (the decay curve has no need for
/// exact decimal arithmetic — only the monetary amounts it scales do) and converted
/// back to `Decimal` for the final score.
fn recency_decay(trade_date: NaiveDate, today: NaiveDate) -> Decimal {
    let days = (today - trade_date).num_days().max(0) as f64;
    let decay = (-0.2 * days).exp();
    Decimal::try_from(decay).unwrap_or(Decimal::ONE)
}

pub fn is_csuite_title(title: &str) -> bool {
    let lower = title.to_lowercase();
    CSUITE_TITLES.iter().any(|t| lower.contains(t))
}

/// Score for a single filed transaction.
pub fn transaction_score(tx: &RawTransaction, today: NaiveDate) -> Decimal {
    let weighted_value = tx.value_usd.max(Decimal::ZERO);
    weighted_value * title_multiplier(&tx.title) * recency_decay(tx.trade_date, today)
}

/// Sum of transaction scores — a candidate's `conviction_score`.
pub fn candidate_score(transactions: &[RawTransaction], today: NaiveDate) -> Decimal {
    transactions.iter().map(|tx| transaction_score(tx, today)).sum()
}

/// `"New"`/absent delta-own is maximum conviction (100%), never zero.
pub fn normalize_delta_own_pct(raw: Option<&str>) -> Decimal {
    match raw.map(str::trim) {
        None | Some("") | Some("-") | Some("New") | Some("new") => Decimal::from(100),
        Some(other) => other
            .trim_start_matches('+')
            .trim_end_matches('%')
            .parse::<Decimal>()
            .unwrap_or(Decimal::ZERO),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(title: &str, value: i64, trade_date: NaiveDate) -> RawTransaction {
        RawTransaction {
            insider_name: "A".into(),
            title: title.into(),
            trade_type: "P - Purchase".into(),
            price: Decimal::from(10),
            quantity: Decimal::from(100),
            value_usd: Decimal::from(value),
            delta_own_pct: Decimal::from(100),
            filing_date: trade_date,
            trade_date,
        }
    }

    #[test]
    fn csuite_title_scores_3x_non_officer() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let csuite = tx("Chief Financial Officer", 1_000_000, today);
        let other = tx("Director", 1_000_000, today);

        let ratio = transaction_score(&csuite, today) / transaction_score(&other, today);
        assert_eq!(ratio, Decimal::from(3));
    }

    #[test]
    fn recency_decay_is_full_strength_for_same_day_trade() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let score = transaction_score(&tx("Director", 100, today), today);
        assert_eq!(score, Decimal::from(100));
    }

    #[test]
    fn older_trades_decay() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let recent = tx("Director", 100, today);
        let stale = tx("Director", 100, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert!(transaction_score(&recent, today) > transaction_score(&stale, today));
    }

    #[test]
    fn new_delta_own_is_maximum_conviction() {
        assert_eq!(normalize_delta_own_pct(Some("New")), Decimal::from(100));
        assert_eq!(normalize_delta_own_pct(None), Decimal::from(100));
        assert_eq!(normalize_delta_own_pct(Some("+22%")), Decimal::from(22));
    }
}
