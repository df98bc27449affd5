//! `run_sell_checks` — manual-only trigger for the Sell Strategy Engine
//! (§4.1 SPEC_FULL.md: no scheduled job runs this, unlike the other three).

use anyhow::Result;
use chrono::NaiveDate;
use vantage_sell::SellStrategyConfig;
use vantage_supervisor::eur_usd_rate_or_fallback;
use vantage_supervisor::sell_cycle::{run_sell_checks, AccountScope, SellCycleConfig};

use crate::context::AppContext;

pub async fn run(ctx: &AppContext, date: Option<NaiveDate>, real_only: bool, virtual_only: bool) -> Result<()> {
    let run_date = date.unwrap_or_else(|| vantage_scheduler::today_in(ctx.settings.orchestrator_timezone));
    let scope = match (real_only, virtual_only) {
        (true, true) => anyhow::bail!("--real-only and --virtual-only are mutually exclusive"),
        (true, false) => AccountScope::Real,
        (false, true) => AccountScope::Virtual,
        (false, false) => AccountScope::Both,
    };

    let settings = &ctx.settings;
    let cfg = SellCycleConfig {
        run_date,
        scope,
        sell: SellStrategyConfig {
            stop_loss_pct: settings.sell_stop_loss_pct,
            take_profit_pct: settings.sell_take_profit_pct,
            max_hold_days: settings.sell_max_hold_days,
        },
    };

    let eur_usd_rate = eur_usd_rate_or_fallback(ctx.market_data.as_ref(), settings.eur_usd_static_fallback_rate).await;
    let outcome = run_sell_checks(&ctx.broker, ctx.market_data.as_ref(), eur_usd_rate, ctx.notifier.as_ref(), cfg).await;
    println!("executed_sells={}", outcome.executed.len());
    for (signal, result) in &outcome.executed {
        println!(
            "ticker={} signal={:?} success={} quantity={} amount_spent={}",
            signal.ticker, signal.signal_type, result.success, result.quantity, result.amount_spent
        );
    }

    Ok(())
}
