//! `run_daily` — manual trigger for the decision cycle (and, unless skipped,
//! the end-of-day snapshot), outside the scheduler's own fire times.

use anyhow::Result;
use chrono::NaiveDate;

use crate::context::AppContext;
use crate::jobs::{log_decision_outcome, run_decision_cycle_for};

pub async fn run(ctx: &AppContext, date: Option<NaiveDate>, force: bool, skip_eod: bool) -> Result<()> {
    let run_date = date.unwrap_or_else(|| vantage_scheduler::today_in(ctx.settings.orchestrator_timezone));

    let span = tracing::info_span!("run_daily", %run_date, force);
    let _enter = span.enter();

    let outcome = run_decision_cycle_for(ctx, run_date, force).await;
    log_decision_outcome(&outcome);

    if !skip_eod {
        let eur_usd_rate =
            vantage_supervisor::eur_usd_rate_or_fallback(ctx.market_data.as_ref(), ctx.settings.eur_usd_static_fallback_rate).await;
        let snapshot =
            vantage_supervisor::eod::run_end_of_day(&ctx.broker, ctx.market_data.as_ref(), eur_usd_rate, run_date).await;
        println!("eod_real_invested={}", snapshot.real.total_invested);
        println!("eod_real_value={}", snapshot.real.total_value);
        println!("eod_real_pnl={}", snapshot.real.unrealized_pnl);
        println!("eod_virtual_invested={}", snapshot.virtual_.total_invested);
        println!("eod_virtual_value={}", snapshot.virtual_.total_value);
        println!("eod_virtual_pnl={}", snapshot.virtual_.unrealized_pnl);
    }

    Ok(())
}
