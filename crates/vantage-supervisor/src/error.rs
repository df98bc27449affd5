//! Crate-wide error taxonomy (§7 SPEC_FULL.md). Hand-written `Display`/`Error`
//! impls, no `thiserror` — following the teacher's own error style. Most code in
//! this workspace uses `anyhow::Result`; `OrchestratorError` exists only at the
//! handful of seams (scheduler startup, config load, blacklist init) where the
//! caller needs to distinguish a fatal condition from one it should downgrade.

use std::fmt;

#[derive(Debug)]
pub enum OrchestratorError {
    // --- Fatal: unwind to `main`, set a non-zero exit code. ---
    MissingConfig(String),
    BlacklistStoreUnavailable(String),
    SchedulerStartFailed(String),

    // --- Non-fatal: calling code catches these and converts to a structured result. ---
    ProviderUnavailable(String),
    RateLimited(String),
    SchemaValidation(String),
    BrokerRefusal(String),
    DeadlineExceeded(String),
}

impl OrchestratorError {
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            OrchestratorError::MissingConfig(_)
                | OrchestratorError::BlacklistStoreUnavailable(_)
                | OrchestratorError::SchedulerStartFailed(_)
        )
    }
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorError::MissingConfig(msg) => write!(f, "missing configuration: {msg}"),
            OrchestratorError::BlacklistStoreUnavailable(msg) => write!(f, "blacklist store unavailable: {msg}"),
            OrchestratorError::SchedulerStartFailed(msg) => write!(f, "scheduler failed to start: {msg}"),
            OrchestratorError::ProviderUnavailable(msg) => write!(f, "provider unavailable: {msg}"),
            OrchestratorError::RateLimited(msg) => write!(f, "rate limited: {msg}"),
            OrchestratorError::SchemaValidation(msg) => write!(f, "schema validation failed: {msg}"),
            OrchestratorError::BrokerRefusal(msg) => write!(f, "broker refused order: {msg}"),
            OrchestratorError::DeadlineExceeded(msg) => write!(f, "deadline exceeded: {msg}"),
        }
    }
}

impl std::error::Error for OrchestratorError {}
