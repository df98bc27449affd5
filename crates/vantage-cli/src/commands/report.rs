//! `report` — prints the same account snapshots the end-of-day job computes,
//! scoped to the requested account, without persisting anything (§6 SPEC_FULL.md).

use anyhow::{bail, Result};
use chrono::NaiveDate;
use vantage_supervisor::eod::{run_end_of_day, AccountSnapshot};
use vantage_supervisor::eur_usd_rate_or_fallback;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountFilter {
    Live,
    Demo,
    Both,
}

impl std::str::FromStr for AccountFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "live" => Ok(AccountFilter::Live),
            "demo" => Ok(AccountFilter::Demo),
            "both" => Ok(AccountFilter::Both),
            other => bail!("invalid --account value '{other}', expected live|demo|both"),
        }
    }
}

fn print_account(label: &str, snapshot: &AccountSnapshot) {
    println!(
        "{label}_invested={} {label}_value={} {label}_pnl={} {label}_positions={}",
        snapshot.total_invested,
        snapshot.total_value,
        snapshot.unrealized_pnl,
        snapshot.positions.len()
    );
}

pub async fn run(ctx: &crate::context::AppContext, run_date: NaiveDate, account: AccountFilter) -> Result<()> {
    let eur_usd_rate = eur_usd_rate_or_fallback(ctx.market_data.as_ref(), ctx.settings.eur_usd_static_fallback_rate).await;
    let snapshot = run_end_of_day(&ctx.broker, ctx.market_data.as_ref(), eur_usd_rate, run_date).await;

    if matches!(account, AccountFilter::Live | AccountFilter::Both) {
        print_account("live", &snapshot.real);
    }
    if matches!(account, AccountFilter::Demo | AccountFilter::Both) {
        print_account("demo", &snapshot.virtual_);
    }

    Ok(())
}
