//! Aggregation of per-case results and the `summary.json` document.

use crate::errors::{CaseFailure, RunErrorKind};
use crate::evaluator::round4;
use crate::model::ExecutionResult;
use crate::report::RunArtifacts;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const SCHEMA_VERSION: u32 = 1;

/// Arithmetic means over one group of results, rounded to 4 decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricAverages {
    pub count: usize,
    pub overall: f64,
    pub accuracy: f64,
    pub completeness: f64,
    pub relevance: f64,
}

#[derive(Default)]
struct Sums {
    count: usize,
    overall: f64,
    accuracy: f64,
    completeness: f64,
    relevance: f64,
}

impl Sums {
    fn add(&mut self, r: &ExecutionResult) {
        let q = &r.quantitative;
        self.count += 1;
        self.overall += q.overall;
        self.accuracy += q.accuracy;
        self.completeness += q.completeness;
        self.relevance += q.relevance;
    }

    fn averages(&self) -> MetricAverages {
        // groups are only created on first observation, so count > 0
        let n = self.count.max(1) as f64;
        MetricAverages {
            count: self.count,
            overall: round4(self.overall / n),
            accuracy: round4(self.accuracy / n),
            completeness: round4(self.completeness / n),
            relevance: round4(self.relevance / n),
        }
    }
}

fn group_by<F>(results: &[ExecutionResult], key: F) -> BTreeMap<String, MetricAverages>
where
    F: Fn(&ExecutionResult) -> &str,
{
    let mut groups: BTreeMap<String, Sums> = BTreeMap::new();
    for r in results {
        groups.entry(key(r).to_string()).or_default().add(r);
    }
    groups
        .into_iter()
        .map(|(k, s)| (k, s.averages()))
        .collect()
}

/// Per-model means. Only models with at least one result appear.
pub fn averages_by_model(results: &[ExecutionResult]) -> BTreeMap<String, MetricAverages> {
    group_by(results, |r| r.model.as_str())
}

/// Per-prompt-family (base name) means.
pub fn averages_by_prompt(results: &[ExecutionResult]) -> BTreeMap<String, MetricAverages> {
    group_by(results, |r| r.prompt_base_name.as_str())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub schema_version: u32,
    pub suite: String,
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cache_hits: usize,
    pub by_model: BTreeMap<String, MetricAverages>,
    pub by_prompt: BTreeMap<String, MetricAverages>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failures_by_kind: BTreeMap<RunErrorKind, usize>,
    #[serde(default)]
    pub failures: Vec<CaseFailure>,
}

impl RunSummary {
    pub fn from_artifacts(artifacts: &RunArtifacts) -> Self {
        let mut failures_by_kind = BTreeMap::new();
        for f in &artifacts.failures {
            *failures_by_kind.entry(f.kind).or_insert(0) += 1;
        }
        Self {
            schema_version: SCHEMA_VERSION,
            suite: artifacts.suite.clone(),
            run_id: artifacts.run_id.clone(),
            started_at: artifacts.started_at,
            finished_at: artifacts.finished_at,
            duration_ms: artifacts.duration_ms(),
            total: artifacts.total,
            succeeded: artifacts.succeeded(),
            failed: artifacts.failed(),
            cache_hits: artifacts.results.iter().filter(|r| r.cached).count(),
            by_model: averages_by_model(&artifacts.results),
            by_prompt: averages_by_prompt(&artifacts.results),
            failures_by_kind,
            failures: artifacts.failures.clone(),
        }
    }
}

pub async fn write_summary(summary: &RunSummary, out: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    tokio::fs::write(out, json)
        .await
        .with_context(|| format!("failed to write {}", out.display()))?;
    Ok(())
}
