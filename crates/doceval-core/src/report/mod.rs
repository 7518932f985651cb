pub mod console;
pub mod progress;
pub mod summary;

use crate::errors::CaseFailure;
use crate::model::ExecutionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything a finished run produced, handed to sinks and reporters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunArtifacts {
    pub run_id: String,
    pub suite: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Sorted by (model, prompt_id, document_id) for deterministic output.
    pub results: Vec<ExecutionResult>,
    pub failures: Vec<CaseFailure>,
    /// Number of scheduled cases; always `results.len() + failures.len()`.
    pub total: usize,
}

impl RunArtifacts {
    pub fn succeeded(&self) -> usize {
        self.results.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn duration_ms(&self) -> u64 {
        (self.finished_at - self.started_at)
            .num_milliseconds()
            .max(0) as u64
    }
}
