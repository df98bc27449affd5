//! Process-wide circuit breaker for the primary news provider (§4.3, §5 SPEC_FULL.md
//! "Shared-resource policy": "writes are infrequent and may race harmlessly
//! (last-writer-wins on the cooldown timestamp)").

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct NewsCircuitBreaker {
    /// Unix seconds until which the primary provider is suppressed. `0` = closed (not tripped).
    cooldown_until: AtomicI64,
    cooldown_seconds: i64,
}

impl NewsCircuitBreaker {
    pub fn new(cooldown_seconds: u64) -> Self {
        NewsCircuitBreaker {
            cooldown_until: AtomicI64::new(0),
            cooldown_seconds: cooldown_seconds as i64,
        }
    }

    fn now() -> i64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
    }

    /// `true` while the primary provider should be skipped in favor of the fallback.
    pub fn is_open(&self) -> bool {
        Self::now() < self.cooldown_until.load(Ordering::Relaxed)
    }

    /// Called after a quota-exceeded response from the primary provider.
    pub fn trip(&self) {
        self.cooldown_until.store(Self::now() + self.cooldown_seconds, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed() {
        let cb = NewsCircuitBreaker::new(3600);
        assert!(!cb.is_open());
    }

    #[test]
    fn trip_opens_the_breaker() {
        let cb = NewsCircuitBreaker::new(3600);
        cb.trip();
        assert!(cb.is_open());
    }
}
