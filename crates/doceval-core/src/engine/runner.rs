use crate::cache::key::cache_key;
use crate::cache::ResponseCache;
use crate::correlate::build_plan;
use crate::corpus::PromptCorpus;
use crate::engine::plan::partition_by_model;
use crate::errors::{CaseFailure, RunErrorKind};
use crate::evaluator::{EvalOptions, Evaluator};
use crate::extract::extract_with_strategy;
use crate::model::{ExecutionResult, TestCase};
use crate::providers::llm::{InvokeOptions, LlmClient};
use crate::report::progress::{ProgressEvent, ProgressSink};
use crate::report::RunArtifacts;
use crate::storage::ResultSink;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};
use tracing::Instrument;

#[derive(Debug, Clone)]
pub struct RunPolicy {
    /// Maximum in-flight cases per model.
    pub concurrency: usize,
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self { concurrency: 3 }
    }
}

/// A model name resolved to the client that serves it and its call settings.
#[derive(Clone)]
pub struct ModelBinding {
    pub client: Arc<dyn LlmClient>,
    pub options: InvokeOptions,
}

#[derive(Clone)]
pub struct Runner {
    pub suite: String,
    pub prompts: Arc<PromptCorpus>,
    pub cache: ResponseCache,
    pub models: Arc<BTreeMap<String, ModelBinding>>,
    pub evaluator: Arc<dyn Evaluator>,
    pub sink: Arc<dyn ResultSink>,
    pub policy: RunPolicy,
}

type CaseKey = (String, String, String);

/// Completion bookkeeping shared by all partitions of one run.
struct Collector {
    total: usize,
    results: Vec<ExecutionResult>,
    failures: Vec<CaseFailure>,
    progress: Option<ProgressSink>,
}

impl Collector {
    fn settle(
        &mut self,
        joined: Result<(Id, Result<ExecutionResult, CaseFailure>), JoinError>,
        pending: &mut HashMap<Id, CaseKey>,
    ) {
        match joined {
            Ok((id, Ok(result))) => {
                pending.remove(&id);
                self.results.push(result);
            }
            Ok((id, Err(failure))) => {
                pending.remove(&id);
                self.failures.push(failure);
            }
            Err(e) => {
                let (model, prompt_id, document_id) = pending
                    .remove(&e.id())
                    .unwrap_or_else(|| ("unknown".into(), "unknown".into(), "unknown".into()));
                tracing::error!(
                    model = %model,
                    prompt = %prompt_id,
                    document = %document_id,
                    error = %e,
                    "case task aborted"
                );
                self.failures.push(CaseFailure {
                    model,
                    prompt_id,
                    document_id,
                    kind: RunErrorKind::Other,
                    message: format!("join error: {}", e),
                });
            }
        }
        if let Some(sink) = &self.progress {
            sink(ProgressEvent {
                done: self.results.len() + self.failures.len(),
                total: self.total,
            });
        }
    }
}

fn case_failure(case: &TestCase, kind: RunErrorKind, message: String) -> CaseFailure {
    CaseFailure {
        model: case.model.clone(),
        prompt_id: case.prompt.id.clone(),
        document_id: case.document.id.clone(),
        kind,
        message,
    }
}

impl Runner {
    /// Runs every case exactly once. Partitions (one per model) run strictly one
    /// after another; inside a partition at most `policy.concurrency` cases are in
    /// flight, and a finished case frees its slot immediately. A failing case is
    /// recorded and never affects its siblings.
    pub async fn run(
        &self,
        cases: Vec<TestCase>,
        progress: Option<ProgressSink>,
    ) -> anyhow::Result<RunArtifacts> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let limit = self.policy.concurrency.max(1);
        let mut collector = Collector {
            total: cases.len(),
            results: Vec::with_capacity(cases.len()),
            failures: Vec::new(),
            progress,
        };

        tracing::info!(
            run_id = %run_id,
            suite = %self.suite,
            cases = collector.total,
            concurrency = limit,
            cache = self.cache.is_enabled(),
            "run started"
        );

        for (model, partition) in partition_by_model(cases) {
            let span = tracing::info_span!("partition", model = %model, cases = partition.len());
            self.run_partition(partition, limit, &mut collector)
                .instrument(span)
                .await?;
        }

        let Collector {
            total,
            mut results,
            mut failures,
            ..
        } = collector;
        results.sort_by(|a, b| {
            (&a.model, &a.prompt_id, &a.document_id).cmp(&(&b.model, &b.prompt_id, &b.document_id))
        });
        failures.sort_by(|a, b| {
            (&a.model, &a.prompt_id, &a.document_id).cmp(&(&b.model, &b.prompt_id, &b.document_id))
        });

        tracing::info!(
            run_id = %run_id,
            succeeded = results.len(),
            failed = failures.len(),
            "run finished"
        );

        Ok(RunArtifacts {
            run_id,
            suite: self.suite.clone(),
            started_at,
            finished_at: Utc::now(),
            results,
            failures,
            total,
        })
    }

    async fn run_partition(
        &self,
        partition: Vec<TestCase>,
        limit: usize,
        collector: &mut Collector,
    ) -> anyhow::Result<()> {
        let sem = Arc::new(Semaphore::new(limit));
        let mut join_set = JoinSet::new();
        let mut pending: HashMap<Id, CaseKey> = HashMap::new();

        for case in partition {
            let permit = sem.clone().acquire_owned().await?;
            // report completions that freed this slot before admitting the next case
            while let Some(joined) = join_set.try_join_next_with_id() {
                collector.settle(joined, &mut pending);
            }

            let key = (
                case.model.clone(),
                case.prompt.id.clone(),
                case.document.id.clone(),
            );
            let this = self.clone();
            let handle = join_set.spawn(
                async move {
                    let _permit = permit;
                    this.run_case(&case).await
                }
                .in_current_span(),
            );
            pending.insert(handle.id(), key);
        }

        while let Some(joined) = join_set.join_next_with_id().await {
            collector.settle(joined, &mut pending);
        }
        Ok(())
    }

    /// correlate → cache → invoke → extract → evaluate → persist
    async fn run_case(&self, case: &TestCase) -> Result<ExecutionResult, CaseFailure> {
        let result = self.execute(case).await;
        if let Err(f) = &result {
            tracing::warn!(
                model = %f.model,
                prompt = %f.prompt_id,
                document = %f.document_id,
                kind = f.kind.as_str(),
                error = %f.message,
                "case failed"
            );
        }
        result
    }

    async fn execute(&self, case: &TestCase) -> Result<ExecutionResult, CaseFailure> {
        let started = Instant::now();
        let binding = self.models.get(&case.model).ok_or_else(|| {
            case_failure(
                case,
                RunErrorKind::UnknownModel,
                format!("no client configured for model '{}'", case.model),
            )
        })?;

        let plan = build_plan(&case.prompt, &self.prompts, &case.document);
        let key = cache_key(&case.model, &case.prompt, &case.document.content);

        let (response, cached) = match self.cache.lookup(&key).await {
            Some(resp) => {
                tracing::debug!(key = %key, case = %case.label(), "cache hit");
                (resp, true)
            }
            None => {
                // the adapter owns the timeout; the runner never cancels a call
                let resp = binding
                    .client
                    .invoke(&plan, &binding.options)
                    .await
                    .map_err(|e| case_failure(case, RunErrorKind::from(&e), e.to_string()))?;
                self.cache.store(&key, &resp).await;
                (resp, false)
            }
        };

        let extraction = extract_with_strategy(&response.content);
        tracing::debug!(
            case = %case.label(),
            strategy = extraction.strategy.as_str(),
            "response extracted"
        );
        let opts = EvalOptions {
            model: &case.model,
            prompt_base_name: &case.prompt.base_name,
            document_id: &case.document.id,
            document: &case.document.content,
            structured: extraction.is_structured(),
        };
        let evaluation = self.evaluator.evaluate(&extraction.value, &opts);

        let result = ExecutionResult {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            model: case.model.clone(),
            prompt_id: case.prompt.id.clone(),
            prompt_role: case.prompt.role,
            prompt_base_name: case.prompt.base_name.clone(),
            document_id: case.document.id.clone(),
            quantitative: evaluation.quantitative,
            qualitative: evaluation.qualitative,
            parsed_response: extraction.value,
            cached,
            duration_ms: started.elapsed().as_millis() as u64,
            usage: response.usage,
        };

        self.sink
            .record(&result)
            .await
            .map_err(|e| case_failure(case, RunErrorKind::Persistence, format!("{:#}", e)))?;
        Ok(result)
    }
}
