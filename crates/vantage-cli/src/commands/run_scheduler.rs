//! `run_scheduler` — the long-running daemon path. Registers the three job
//! classes named in §4.1 SPEC_FULL.md and blocks until SIGINT/SIGTERM.

use std::sync::Arc;

use anyhow::Result;
use vantage_scheduler::{collection_job_specs, shutdown_signal, JobSpec, Scheduler};

use crate::context::AppContext;
use crate::jobs::{CollectionJob, DecisionCycleJob, EndOfDayJob};

pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    let settings = &ctx.settings;
    let mut scheduler = Scheduler::new(settings.orchestrator_timezone);

    for spec in collection_job_specs(&settings.scheduler_collect_times) {
        let round: usize = spec.id.trim_start_matches("collect_round_").parse().unwrap_or(0);
        scheduler.add_job(spec, Arc::new(CollectionJob::new(round)));
    }

    scheduler.add_job(
        JobSpec { id: "decision_and_execution".to_string(), fire_time: settings.scheduler_execute_time, weekdays_only: false },
        Arc::new(DecisionCycleJob { ctx: ctx.clone() }),
    );

    scheduler.add_job(
        JobSpec { id: "end_of_day_snapshot".to_string(), fire_time: settings.scheduler_eod_time, weekdays_only: true },
        Arc::new(EndOfDayJob { ctx: ctx.clone() }),
    );

    tracing::info!("scheduler starting, awaiting shutdown signal");
    scheduler.run(shutdown_signal()).await;
    Ok(())
}
