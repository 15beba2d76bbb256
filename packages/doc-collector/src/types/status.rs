//! Per-run counters and the status artifact written after each batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Counters accumulated during one collection pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub sources_processed: usize,
    pub documents_added: usize,
    pub duplicates_skipped: usize,
    pub failed_sources: usize,
    /// AI-assisted sources not attempted because the quota was exhausted
    pub ai_sources_skipped: usize,
    pub quota_exhausted: bool,
    pub sources_discovered: usize,
}

/// Liveness signal written to `status.json`; never read back by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStatus {
    pub last_run: DateTime<Utc>,
    pub index_size: usize,
    #[serde(flatten)]
    pub summary: RunSummary,
}

impl RunStatus {
    pub fn new(summary: RunSummary, index_size: usize) -> Self {
        Self {
            last_run: Utc::now(),
            index_size,
            summary,
        }
    }
}
