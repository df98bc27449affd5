//! Cron-like scheduler (§4.1 SPEC_FULL.md), grounded on
//! `original_source/src/orchestrator/scheduler.py`'s `job_defaults` —
//! `coalesce=True, max_instances=1, misfire_grace_time=300` — reimplemented as
//! an explicit poll loop over `mqk-daemon::state::spawn_heartbeat`'s
//! tick-interval shape rather than wrapping an external cron library.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use tokio::sync::Mutex;

use crate::job::Job;

const POLL_INTERVAL: Duration = Duration::from_secs(15);
const MISFIRE_GRACE: chrono::Duration = chrono::Duration::seconds(300);

pub struct JobSpec {
    pub id: String,
    pub fire_time: NaiveTime,
    /// `false` for jobs (like the decision cycle) that re-check the trading-day
    /// gate themselves and want to be invoked even on non-trading days so the
    /// gate's "skipped" outcome gets logged. Collection rounds set this `true`
    /// since they have no such internal gate.
    pub weekdays_only: bool,
}

struct Scheduled {
    spec: JobSpec,
    job: Arc<dyn Job>,
    last_fired: Mutex<Option<NaiveDate>>,
    running: Arc<AtomicBool>,
}

pub struct Scheduler {
    timezone: Tz,
    jobs: Vec<Scheduled>,
}

impl Scheduler {
    pub fn new(timezone: Tz) -> Self {
        Scheduler { timezone, jobs: Vec::new() }
    }

    pub fn add_job(&mut self, spec: JobSpec, job: Arc<dyn Job>) {
        self.jobs.push(Scheduled { spec, job, last_fired: Mutex::new(None), running: Arc::new(AtomicBool::new(false)) });
    }

    /// Runs until `shutdown` resolves (SIGINT/SIGTERM in production, a manual
    /// trigger in tests). Returns once the poll loop has exited cleanly.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("scheduler received shutdown signal, stopping");
                        break;
                    }
                }
            }
        }
    }

    async fn poll_once(&self) {
        let now = chrono::Utc::now().with_timezone(&self.timezone);
        let today = now.date_naive();
        let now_time = now.time();

        for scheduled in &self.jobs {
            if scheduled.spec.weekdays_only && is_weekend(today) {
                continue;
            }

            let mut last_fired = scheduled.last_fired.lock().await;
            if *last_fired == Some(today) {
                continue;
            }
            if now_time < scheduled.spec.fire_time {
                continue;
            }

            let lateness = now_time - scheduled.spec.fire_time;
            if lateness > MISFIRE_GRACE {
                tracing::warn!(job = %scheduled.spec.id, lateness_secs = lateness.num_seconds(), "misfire grace exceeded, skipping today's run");
                *last_fired = Some(today);
                continue;
            }

            if scheduled.running.swap(true, Ordering::SeqCst) {
                tracing::debug!(job = %scheduled.spec.id, "previous run still in progress, coalescing (skip this fire)");
                continue;
            }
            *last_fired = Some(today);
            drop(last_fired);

            let job = scheduled.job.clone();
            let running = scheduled.running.clone();
            let job_id = scheduled.spec.id.clone();
            tokio::spawn(async move {
                tracing::info!(job = %job_id, "firing scheduled job");
                job.run().await;
                running.store(false, Ordering::SeqCst);
            });
        }
    }
}

fn is_weekend(date: NaiveDate) -> bool {
    use chrono::Weekday::*;
    matches!(date.weekday(), Sat | Sun)
}

/// Parses `"HH:MM"` into a `NaiveTime`, as `scheduler_collect_times` is configured.
pub fn parse_hhmm(value: &str) -> anyhow::Result<NaiveTime> {
    let (hour, minute) = value.split_once(':').ok_or_else(|| anyhow::anyhow!("expected HH:MM, got {value:?}"))?;
    NaiveTime::from_hms_opt(hour.parse()?, minute.parse()?, 0).ok_or_else(|| anyhow::anyhow!("invalid time {value:?}"))
}

/// Builds one `JobSpec` per `scheduler_collect_times` entry, ids `collect_round_1`, `collect_round_2`, ...
pub fn collection_job_specs(collect_times: &[NaiveTime]) -> Vec<JobSpec> {
    collect_times
        .iter()
        .enumerate()
        .map(|(i, time)| JobSpec { id: format!("collect_round_{}", i + 1), fire_time: *time, weekdays_only: true })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    struct CountingJob {
        id: String,
        count: Arc<AtomicU32>,
    }

    #[async_trait::async_trait]
    impl Job for CountingJob {
        fn id(&self) -> &str {
            &self.id
        }
        async fn run(&self) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn job_fires_once_today_then_skips_on_later_poll() {
        let tz: Tz = "UTC".parse().unwrap();
        let scheduler = Scheduler::new(tz);
        let count = Arc::new(AtomicU32::new(0));
        let job = Arc::new(CountingJob { id: "test".into(), count: count.clone() });

        let past_time = chrono::Utc::now().time() - chrono::Duration::seconds(5);
        let mut scheduler = scheduler;
        scheduler.add_job(JobSpec { id: "test".into(), fire_time: past_time, weekdays_only: false }, job);

        scheduler.poll_once().await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.poll_once().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn parse_hhmm_rejects_malformed_input() {
        assert!(parse_hhmm("9:30am").is_err());
        assert_eq!(parse_hhmm("09:30").unwrap(), NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn collection_job_specs_numbered_in_order() {
        let times = vec![NaiveTime::from_hms_opt(9, 0, 0).unwrap(), NaiveTime::from_hms_opt(13, 0, 0).unwrap()];
        let specs = collection_job_specs(&times);
        assert_eq!(specs[0].id, "collect_round_1");
        assert_eq!(specs[1].id, "collect_round_2");
    }
}
