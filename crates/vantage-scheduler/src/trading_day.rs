//! Trading-day gate, grounded on `original_source/src/orchestrator/rotation.py::is_trading_day`
//! (weekday check only, no holiday calendar — see SPEC_FULL.md §9 open question).

use chrono::{NaiveDate, Weekday};
use chrono_tz::Tz;

pub fn is_trading_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn today_in(timezone: Tz) -> NaiveDate {
    chrono::Utc::now().with_timezone(&timezone).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturday_and_sunday_are_not_trading_days() {
        assert!(!is_trading_day(NaiveDate::from_ymd_opt(2026, 8, 1).unwrap())); // Saturday
        assert!(!is_trading_day(NaiveDate::from_ymd_opt(2026, 8, 2).unwrap())); // Sunday
    }

    #[test]
    fn weekday_is_a_trading_day() {
        assert!(is_trading_day(NaiveDate::from_ymd_opt(2026, 8, 3).unwrap())); // Monday
    }
}
