//! `backtest` — the only command that opens a database connection
//! (§1 SPEC_FULL.md: "the Backtest Engine is the only module that talks to a
//! database"). Connects directly off `Settings::database_url` rather than
//! `vantage_db::connect_from_env`, which reads the differently-named
//! `VANTAGE_DATABASE_URL` — see DESIGN.md.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use vantage_backtest::{BacktestPorts, BacktestReport, BacktestRunConfig};
use vantage_db::{migrate, PgBacktestStore, PgDigestSource};
use vantage_sell::SellStrategyConfig;

use crate::context::AppContext;

#[allow(clippy::too_many_arguments)]
pub async fn run(
    ctx: &AppContext,
    start: NaiveDate,
    end: NaiveDate,
    name: Option<String>,
    budget: Option<Decimal>,
) -> Result<()> {
    let settings = &ctx.settings;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.database_url)
        .await
        .context("failed to connect to Postgres for backtest")?;
    migrate(&pool).await?;

    let store = PgBacktestStore::new(pool.clone());
    let digest_source = PgDigestSource::new(pool, settings.insider_lookback_days);

    let configured_budget = budget.unwrap_or(settings.backtest_daily_budget_eur);
    let cfg = BacktestRunConfig {
        start_date: start,
        end_date: end,
        run_name: name,
        conservative_budget: configured_budget,
        aggressive_budget: configured_budget,
        ticker_limit: settings.market_data_ticker_limit,
        sell: SellStrategyConfig {
            stop_loss_pct: settings.sell_stop_loss_pct,
            take_profit_pct: settings.sell_take_profit_pct,
            max_hold_days: settings.sell_max_hold_days,
        },
        model: crate::context::CONSERVATIVE_MODEL.to_string(),
        max_tool_rounds: settings.max_tool_rounds,
        pipeline_timeout: Duration::from_secs(settings.pipeline_timeout_seconds),
    };

    let ports = BacktestPorts {
        digest_source: &digest_source,
        market_data: ctx.market_data_historical(),
        store: &store,
        structured: &ctx.conservative_generator,
        tool_calling: Some(&ctx.aggressive_generator),
    };

    let report: BacktestReport = vantage_backtest::run(ports, cfg).await?;
    print_report(&report);

    Ok(())
}

fn print_report(report: &BacktestReport) {
    println!("run_id={} name={} days_traded={}", report.run_id, report.name, report.days_traded);
    for (tag, summary) in [("conservative", &report.conservative), ("aggressive", &report.aggressive)] {
        println!(
            "{tag}_invested={} {tag}_realized_pnl={} {tag}_unrealized_pnl={} {tag}_open_positions={} {tag}_trades={} {tag}_wins={} {tag}_losses={}",
            summary.total_invested,
            summary.realized_pnl,
            summary.unrealized_pnl,
            summary.open_positions,
            summary.total_trades,
            summary.wins,
            summary.losses,
        );
    }
}
