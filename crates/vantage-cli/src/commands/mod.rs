//! Command handler modules for the `vantage` CLI. Shared helpers live here;
//! command-specific logic lives in the submodules, following the teacher's
//! `mqk-cli::commands` split (`mod.rs` holds cross-cutting helpers, each
//! concern gets its own file).

pub mod backtest;
pub mod dry_run;
pub mod report;
pub mod run_daily;
pub mod run_scheduler;
pub mod run_sell_checks;

use anyhow::{Context, Result};
use chrono::NaiveDate;

/// Parses a `--date YYYY-MM-DD` argument, shared by every command that accepts one.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").with_context(|| format!("invalid --date '{raw}', expected YYYY-MM-DD"))
}
