//! Cron-like clock and scheduler for the decision, collection, and end-of-day jobs.

pub mod job;
pub mod scheduler;
pub mod shutdown;
pub mod trading_day;

pub use job::Job;
pub use scheduler::{collection_job_specs, parse_hhmm, JobSpec, Scheduler};
pub use shutdown::shutdown_signal;
pub use trading_day::{is_trading_day, today_in};
