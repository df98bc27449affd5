mod adapters;
mod commands;
mod context;
mod jobs;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

use commands::report::AccountFilter;
use context::AppContext;
use vantage_config::Settings;

#[derive(Parser)]
#[command(name = "vantage")]
#[command(about = "Autonomous, signal-driven equity trading orchestrator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the decision cycle (and, unless --skip-eod, the EOD snapshot) once, now.
    RunDaily {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        force: bool,
        #[arg(long)]
        skip_eod: bool,
    },

    /// Start the long-running scheduler daemon; blocks until SIGINT/SIGTERM.
    RunScheduler,

    /// Evaluate the Sell Strategy Engine against live broker positions and execute any triggered sells.
    RunSellChecks {
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        real_only: bool,
        #[arg(long)]
        virtual_only: bool,
    },

    /// Replay historical sentiment data through both strategies day by day.
    Backtest {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        budget: Option<Decimal>,
    },

    /// Build a digest and run both strategies without placing any orders.
    DryRun {
        #[arg(long)]
        budget: Option<Decimal>,
        #[arg(long)]
        lookback: Option<i64>,
    },

    /// Print the current account snapshot(s), live/demo/both.
    Report {
        #[arg(long, default_value = "both")]
        account: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(err) = run().await {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }

    Ok(())
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load()?;

    match cli.cmd {
        Commands::RunDaily { date, force, skip_eod } => {
            let ctx = AppContext::build(settings)?;
            let date = date.map(|d| commands::parse_date(&d)).transpose()?;
            commands::run_daily::run(&ctx, date, force, skip_eod).await
        }

        Commands::RunScheduler => {
            let ctx = Arc::new(AppContext::build(settings)?);
            commands::run_scheduler::run(ctx).await
        }

        Commands::RunSellChecks { date, real_only, virtual_only } => {
            let ctx = AppContext::build(settings)?;
            let date = date.map(|d| commands::parse_date(&d)).transpose()?;
            commands::run_sell_checks::run(&ctx, date, real_only, virtual_only).await
        }

        Commands::Backtest { start, end, name, budget } => {
            let ctx = AppContext::build(settings)?;
            let start = commands::parse_date(&start)?;
            let end = commands::parse_date(&end)?;
            commands::backtest::run(&ctx, start, end, name, budget).await
        }

        Commands::DryRun { budget, lookback } => {
            let ctx = AppContext::build(settings)?;
            commands::dry_run::run(&ctx, budget, lookback).await
        }

        Commands::Report { account } => {
            let ctx = AppContext::build(settings)?;
            let account: AccountFilter = account.parse()?;
            let run_date = vantage_scheduler::today_in(ctx.settings.orchestrator_timezone);
            commands::report::run(&ctx, run_date, account).await
        }
    }
}
