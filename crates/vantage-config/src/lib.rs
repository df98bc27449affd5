//! Environment-sourced, validated-at-construction settings (§6, §10.3 SPEC_FULL.md).
//!
//! Adapted from the teacher's `mqk-config` "load once, validate, hand out a typed
//! value" spirit; the teacher loads layered YAML and hashes the canonical result; this
//! system has no YAML files to layer, so it reads `std::env` directly and performs the
//! same kind of validation inline at construction instead of after a merge step.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::NaiveTime;
use chrono_tz::Tz;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct Settings {
    // Broker credentials (live trading). Required.
    pub broker_api_key: String,
    pub broker_api_secret: String,
    pub broker_base_url: String,
    pub broker_demo_base_url: String,

    // LLM credentials. Primary is required; aggressive tier falls back to primary.
    pub llm_primary_api_key: String,
    pub llm_aggressive_api_key: String,

    pub daily_budget_eur: Decimal,
    pub practice_daily_budget_eur: Decimal,

    pub orchestrator_timezone: Tz,
    pub scheduler_collect_times: Vec<NaiveTime>,
    pub scheduler_execute_time: NaiveTime,
    pub scheduler_eod_time: NaiveTime,

    pub pipeline_timeout_seconds: u64,
    pub max_tool_rounds: u32,

    pub sell_stop_loss_pct: Decimal,
    pub sell_take_profit_pct: Decimal,
    pub sell_max_hold_days: i64,

    pub insider_lookback_days: i64,
    pub insider_top_n: usize,
    pub politician_top_n: usize,
    pub politician_reserved_slots: usize,
    pub research_top_n: usize,
    pub max_picks_per_run: usize,
    pub min_insider_tickers: usize,
    pub capitol_trades_max_market_cap: Decimal,

    pub recently_traded_days: i64,
    pub blacklist_file_path: String,

    pub news_fetch_concurrency: usize,
    pub news_circuit_breaker_cooldown_seconds: u64,
    pub news_api_key: Option<String>,

    pub eur_usd_static_fallback_rate: Decimal,
    pub market_data_ticker_limit: usize,
    pub backtest_daily_budget_eur: Decimal,

    pub telegram_enabled: bool,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,

    pub database_url: String,

    /// Politician source can be disabled entirely (§4.3 step 1).
    pub politician_source_enabled: bool,
}

impl Settings {
    /// Loads `.env.local` if present (dev convenience, silently ignored otherwise),
    /// then reads and validates every field from the process environment.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::from_filename(".env.local");
        Self::from_env(&env::vars().collect())
    }

    fn from_env(vars: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| vars.get(key).cloned();
        let required = |key: &str| -> Result<String> {
            get(key).filter(|v| !v.is_empty()).with_context(|| {
                format!("missing required configuration variable: {key}")
            })
        };
        let opt_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());
        let parse_or = |key: &str, default: &str| -> Result<Decimal> {
            opt_or(key, default)
                .parse::<Decimal>()
                .with_context(|| format!("invalid decimal for {key}"))
        };
        let parse_u64_or = |key: &str, default: u64| -> Result<u64> {
            opt_or(key, &default.to_string())
                .parse::<u64>()
                .with_context(|| format!("invalid integer for {key}"))
        };
        let parse_usize_or = |key: &str, default: usize| -> Result<usize> {
            opt_or(key, &default.to_string())
                .parse::<usize>()
                .with_context(|| format!("invalid integer for {key}"))
        };
        let parse_i64_or = |key: &str, default: i64| -> Result<i64> {
            opt_or(key, &default.to_string())
                .parse::<i64>()
                .with_context(|| format!("invalid integer for {key}"))
        };
        let parse_bool_or = |key: &str, default: bool| -> bool {
            match get(key) {
                Some(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
                None => default,
            }
        };
        let parse_time = |key: &str, default: &str| -> Result<NaiveTime> {
            let raw = opt_or(key, default);
            NaiveTime::parse_from_str(&raw, "%H:%M")
                .with_context(|| format!("invalid HH:MM time for {key}: {raw}"))
        };

        let tz_name = opt_or("ORCHESTRATOR_TIMEZONE", "Europe/Amsterdam");
        let orchestrator_timezone: Tz = tz_name
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid IANA timezone for ORCHESTRATOR_TIMEZONE: {tz_name}"))?;

        let collect_times_raw = opt_or("SCHEDULER_COLLECT_TIMES", "08:00,12:00,16:00");
        let mut scheduler_collect_times = Vec::new();
        for part in collect_times_raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            scheduler_collect_times.push(
                NaiveTime::parse_from_str(part, "%H:%M")
                    .with_context(|| format!("invalid HH:MM time in SCHEDULER_COLLECT_TIMES: {part}"))?,
            );
        }

        let sell_stop_loss_pct = parse_or("SELL_STOP_LOSS_PCT", "10")?;
        let sell_take_profit_pct = parse_or("SELL_TAKE_PROFIT_PCT", "20")?;
        if sell_stop_loss_pct <= Decimal::ZERO {
            bail!("SELL_STOP_LOSS_PCT must be > 0");
        }
        if sell_take_profit_pct <= Decimal::ZERO {
            bail!("SELL_TAKE_PROFIT_PCT must be > 0");
        }

        let politician_source_enabled = parse_bool_or("POLITICIAN_SOURCE_ENABLED", true);

        Ok(Settings {
            broker_api_key: required("BROKER_API_KEY")?,
            broker_api_secret: required("BROKER_API_SECRET")?,
            broker_base_url: opt_or("BROKER_BASE_URL", "https://live.trading212.com/api/v0"),
            broker_demo_base_url: opt_or("BROKER_DEMO_BASE_URL", "https://demo.trading212.com/api/v0"),

            llm_primary_api_key: required("LLM_PRIMARY_API_KEY")?,
            llm_aggressive_api_key: get("LLM_AGGRESSIVE_API_KEY")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| vars.get("LLM_PRIMARY_API_KEY").cloned().unwrap_or_default()),

            daily_budget_eur: parse_or("DAILY_BUDGET_EUR", "100")?,
            practice_daily_budget_eur: parse_or("PRACTICE_DAILY_BUDGET_EUR", "500")?,

            orchestrator_timezone,
            scheduler_collect_times,
            scheduler_execute_time: parse_time("SCHEDULER_EXECUTE_TIME", "17:45")?,
            scheduler_eod_time: parse_time("SCHEDULER_EOD_TIME", "22:15")?,

            pipeline_timeout_seconds: parse_u64_or("PIPELINE_TIMEOUT_SECONDS", 900)?,
            max_tool_rounds: parse_u64_or("MAX_TOOL_ROUNDS", 6)? as u32,

            sell_stop_loss_pct,
            sell_take_profit_pct,
            sell_max_hold_days: parse_i64_or("SELL_MAX_HOLD_DAYS", 30)?,

            insider_lookback_days: parse_i64_or("INSIDER_LOOKBACK_DAYS", 7)?,
            insider_top_n: parse_usize_or("INSIDER_TOP_N", 40)?,
            politician_top_n: parse_usize_or("POLITICIAN_TOP_N", 40)?,
            politician_reserved_slots: parse_usize_or("POLITICIAN_RESERVED_SLOTS", 3)?,
            research_top_n: parse_usize_or("RESEARCH_TOP_N", 15)?,
            max_picks_per_run: parse_usize_or("MAX_PICKS_PER_RUN", 8)?,
            min_insider_tickers: parse_usize_or("MIN_INSIDER_TICKERS", 1)?,
            capitol_trades_max_market_cap: parse_or("CAPITOL_TRADES_MAX_MARKET_CAP", "1000000000000")?,

            recently_traded_days: parse_i64_or("RECENTLY_TRADED_DAYS", 14)?,
            blacklist_file_path: opt_or("BLACKLIST_FILE_PATH", "data/blacklist.json"),

            news_fetch_concurrency: parse_usize_or("NEWS_FETCH_CONCURRENCY", 5)?,
            news_circuit_breaker_cooldown_seconds: parse_u64_or(
                "NEWS_CIRCUIT_BREAKER_COOLDOWN_SECONDS",
                3600,
            )?,
            news_api_key: get("NEWS_API_KEY").filter(|v| !v.is_empty()),

            eur_usd_static_fallback_rate: parse_or("EUR_USD_STATIC_FALLBACK_RATE", "1.08")?,
            market_data_ticker_limit: parse_usize_or("MARKET_DATA_TICKER_LIMIT", 25)?,
            backtest_daily_budget_eur: parse_or("BACKTEST_DAILY_BUDGET_EUR", "100")?,

            telegram_enabled: parse_bool_or("TELEGRAM_ENABLED", false),
            telegram_bot_token: get("TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: get("TELEGRAM_CHAT_ID"),

            database_url: required("DATABASE_URL")?,

            politician_source_enabled,
        })
    }

    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_env() -> HashMap<String, String> {
        let mut m = HashMap::new();
        m.insert("BROKER_API_KEY".into(), "k".into());
        m.insert("BROKER_API_SECRET".into(), "s".into());
        m.insert("LLM_PRIMARY_API_KEY".into(), "l".into());
        m.insert("DATABASE_URL".into(), "postgres://localhost/vantage".into());
        m
    }

    #[test]
    fn loads_with_defaults() {
        let settings = Settings::from_env(&base_env()).unwrap();
        assert_eq!(settings.orchestrator_timezone, chrono_tz::Europe::Amsterdam);
        assert_eq!(settings.scheduler_collect_times.len(), 3);
        assert!(settings.politician_source_enabled);
    }

    #[test]
    fn missing_required_is_fatal() {
        let mut env = base_env();
        env.remove("BROKER_API_KEY");
        assert!(Settings::from_env(&env).is_err());
    }

    #[test]
    fn invalid_timezone_is_fatal() {
        let mut env = base_env();
        env.insert("ORCHESTRATOR_TIMEZONE".into(), "Not/AZone".into());
        assert!(Settings::from_env(&env).is_err());
    }

    #[test]
    fn non_positive_stop_loss_is_fatal() {
        let mut env = base_env();
        env.insert("SELL_STOP_LOSS_PCT".into(), "0".into());
        assert!(Settings::from_env(&env).is_err());
    }

    #[test]
    fn aggressive_key_falls_back_to_primary() {
        let settings = Settings::from_env(&base_env()).unwrap();
        assert_eq!(settings.llm_aggressive_api_key, "l");
    }
}
