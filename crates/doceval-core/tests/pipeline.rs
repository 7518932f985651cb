//! Corpus on disk → cases → runner → summary, with the offline client.

use doceval_core::cache::ResponseCache;
use doceval_core::corpus::{DocumentCorpus, PromptCorpus};
use doceval_core::engine::{generate_cases, ModelBinding, RunPolicy, Runner};
use doceval_core::evaluator::{as_object, EvalOptions, Evaluator};
use doceval_core::model::{Evaluation, QuantitativeMetrics};
use doceval_core::providers::llm::fake::FakeClient;
use doceval_core::providers::llm::InvokeOptions;
use doceval_core::report::summary::RunSummary;
use doceval_core::storage::{MemorySink, ResultSink};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

/// Scores 1.0 when the response has a `summary` field.
struct HasSummary;

impl Evaluator for HasSummary {
    fn name(&self) -> &str {
        "has_summary"
    }

    fn evaluate(&self, value: &Value, _opts: &EvalOptions<'_>) -> Evaluation {
        let score = if as_object(value).contains_key("summary") {
            1.0
        } else {
            0.0
        };
        Evaluation {
            quantitative: QuantitativeMetrics {
                accuracy: score,
                completeness: score,
                relevance: score,
                overall: score,
                errors: vec![],
            },
            ..Default::default()
        }
    }
}

fn binding(model: &str, client: FakeClient) -> (String, ModelBinding) {
    (
        model.to_string(),
        ModelBinding {
            client: Arc::new(client),
            options: InvokeOptions::new(model),
        },
    )
}

#[tokio::test]
async fn corpus_to_summary() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let prompts_dir = dir.path().join("prompts");
    let docs_dir = dir.path().join("documents");
    fs::create_dir_all(&prompts_dir)?;
    fs::create_dir_all(&docs_dir)?;
    fs::write(prompts_dir.join("system_summary.txt"), "You are terse.")?;
    fs::write(prompts_dir.join("user_summary.txt"), "Summarize.")?;
    fs::write(prompts_dir.join("outline.md"), "Outline the document.")?;
    fs::write(docs_dir.join("a.txt"), "Quarterly revenue increased")?;
    fs::write(docs_dir.join("b.txt"), "Shipping costs climbed sharply")?;
    fs::write(docs_dir.join("notes.json"), "{}")?;

    let prompts = PromptCorpus::load_dir(&prompts_dir)?;
    let documents = DocumentCorpus::load_dir(&docs_dir)?;
    assert_eq!(documents.len(), 2);

    let models = vec!["json".to_string(), "prose".to_string()];
    let cases = generate_cases(&models, &prompts, &documents)?;
    assert_eq!(cases.len(), 8);

    let bindings: BTreeMap<_, _> = [
        binding("json", FakeClient::new()),
        binding("prose", FakeClient::new().with_response("I could not find anything.")),
    ]
    .into_iter()
    .collect();

    let sink = Arc::new(MemorySink::new());
    let runner = Runner {
        suite: "pipeline".into(),
        prompts: Arc::new(prompts),
        cache: ResponseCache::new(dir.path().join("cache")),
        models: Arc::new(bindings),
        evaluator: Arc::new(HasSummary),
        sink: sink.clone(),
        policy: RunPolicy { concurrency: 2 },
    };

    let artifacts = runner.run(cases, None).await?;
    assert_eq!(artifacts.total, 8);
    assert_eq!(artifacts.results.len(), 8);
    assert!(artifacts.failures.is_empty());
    assert_eq!(sink.results().len(), 8);

    let prose = artifacts
        .results
        .iter()
        .find(|r| r.model == "prose")
        .unwrap();
    assert_eq!(
        prose.parsed_response,
        Value::String("I could not find anything.".into())
    );

    let summary = RunSummary::from_artifacts(&artifacts);
    assert_eq!(summary.by_model["json"].overall, 1.0);
    assert_eq!(summary.by_model["prose"].overall, 0.0);
    assert_eq!(summary.by_prompt["summary"].overall, 0.5);
    assert_eq!(summary.by_prompt["outline"].count, 4);

    sink.finish(&artifacts, &summary).await?;
    assert_eq!(sink.summary().map(|s| s.succeeded), Some(8));
    Ok(())
}
