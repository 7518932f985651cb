//! Persistence of run output. Results are written through one at a time as
//! cases complete; the finished batch is handed over once at the end.

use crate::model::ExecutionResult;
use crate::report::summary::{write_summary, RunSummary};
use crate::report::RunArtifacts;
use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Persists one result. Called concurrently from case tasks.
    async fn record(&self, result: &ExecutionResult) -> anyhow::Result<()>;

    /// Persists the finished batch and its summary.
    async fn finish(&self, artifacts: &RunArtifacts, summary: &RunSummary) -> anyhow::Result<()>;
}

/// Writes `results/<model>_<prompt>_<document>_<id>.json` per case, then
/// `results.json` and `summary.json` at the end.
pub struct FileResultSink {
    dir: PathBuf,
}

fn slug(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub fn result_file_name(result: &ExecutionResult) -> String {
    format!(
        "{}_{}_{}_{}.json",
        slug(&result.model),
        slug(&result.prompt_id),
        slug(&result.document_id),
        slug(&result.id)
    )
}

impl FileResultSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn results_dir(&self) -> PathBuf {
        self.dir.join("results")
    }
}

#[async_trait]
impl ResultSink for FileResultSink {
    async fn record(&self, result: &ExecutionResult) -> anyhow::Result<()> {
        let dir = self.results_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let path = dir.join(result_file_name(result));
        let json = serde_json::to_vec_pretty(result)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::debug!(path = %path.display(), "result written");
        Ok(())
    }

    async fn finish(&self, artifacts: &RunArtifacts, summary: &RunSummary) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create {}", self.dir.display()))?;
        let results_path = self.dir.join("results.json");
        let results = serde_json::to_vec_pretty(&artifacts.results)?;
        tokio::fs::write(&results_path, results)
            .await
            .with_context(|| format!("failed to write {}", results_path.display()))?;
        write_summary(summary, &self.dir.join("summary.json")).await?;
        tracing::info!(dir = %self.dir.display(), "run output written");
        Ok(())
    }
}

/// Keeps everything in memory. Useful for embedding and tests.
#[derive(Default)]
pub struct MemorySink {
    results: Mutex<Vec<ExecutionResult>>,
    summary: Mutex<Option<RunSummary>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Vec<ExecutionResult> {
        self.results.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn summary(&self) -> Option<RunSummary> {
        self.summary.lock().ok().and_then(|g| g.clone())
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn record(&self, result: &ExecutionResult) -> anyhow::Result<()> {
        self.results
            .lock()
            .map_err(|_| anyhow::anyhow!("memory sink poisoned"))?
            .push(result.clone());
        Ok(())
    }

    async fn finish(&self, _artifacts: &RunArtifacts, summary: &RunSummary) -> anyhow::Result<()> {
        *self
            .summary
            .lock()
            .map_err(|_| anyhow::anyhow!("memory sink poisoned"))? = Some(summary.clone());
        Ok(())
    }
}
