use serde::{Deserialize, Serialize};

use crate::candidate::EnrichedCandidate;

/// Per-source candidate counts, taken after the merge step so a merged
/// `insider+politicians` ticker counts once under its own bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceCounts {
    pub insider: u32,
    pub politicians: u32,
    pub insider_and_politicians: u32,
}

/// The output of the signal digest builder (§3, §4.3): a ranked, enriched,
/// filtered candidate list plus the counters a daily summary reports on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalDigest {
    pub candidates: Vec<EnrichedCandidate>,
    pub insider_count: u32,
    pub lookback_days: i64,
    pub source_counts: SourceCounts,
}

impl SignalDigest {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
