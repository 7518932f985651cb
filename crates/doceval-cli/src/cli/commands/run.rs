use super::super::args::RunArgs;
use super::runner_builder::build_runner;
use crate::exit_codes;
use anyhow::Context;
use doceval_core::config::{load_config, EvalConfig};
use doceval_core::corpus::{DocumentCorpus, PromptCorpus};
use doceval_core::engine::generate_cases;
use doceval_core::model::PromptRole;
use doceval_core::report::console::print_summary;
use doceval_core::report::progress::default_progress_sink;
use doceval_core::report::summary::RunSummary;
use doceval_core::storage::{FileResultSink, ResultSink};
use std::sync::Arc;

/// Applies command-line overrides on top of the loaded config.
pub(crate) fn apply_overrides(cfg: &mut EvalConfig, args: &RunArgs) -> anyhow::Result<()> {
    if let Some(c) = args.concurrency {
        cfg.settings.concurrency = c;
    }
    if args.no_cache {
        cfg.settings.cache = false;
    }
    if let Some(dir) = &args.output_dir {
        cfg.output_dir = dir.clone();
    }
    if args.prompt_filter.is_some() {
        cfg.settings.prompt_filter = args.prompt_filter.clone();
    }
    if args.document_filter.is_some() {
        cfg.settings.document_filter = args.document_filter.clone();
    }
    if !args.models.is_empty() {
        if let Some(unknown) = args
            .models
            .iter()
            .find(|m| !cfg.models.iter().any(|s| &s.name == *m))
        {
            anyhow::bail!("config error: model '{}' is not defined in the config", unknown);
        }
        cfg.models.retain(|s| args.models.contains(&s.name));
    }
    cfg.validate()?;
    Ok(())
}

pub(crate) async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let path = &args.config.config;
    let mut cfg = load_config(path).with_context(|| format!("loading {}", path.display()))?;
    apply_overrides(&mut cfg, &args)?;

    let prompts = PromptCorpus::load_dir(&cfg.prompts_dir)?
        .filtered(cfg.settings.prompt_filter.as_deref());
    let documents = DocumentCorpus::load_dir(&cfg.documents_dir)?
        .filtered(cfg.settings.document_filter.as_deref());
    tracing::info!(
        prompts = prompts.len(),
        system = prompts.count_role(PromptRole::System),
        user = prompts.count_role(PromptRole::User),
        assistant = prompts.count_role(PromptRole::Assistant),
        legacy = prompts.count_role(PromptRole::Legacy),
        documents = documents.len(),
        "corpus loaded"
    );

    let model_names: Vec<String> = cfg.models.iter().map(|m| m.name.clone()).collect();
    let cases = generate_cases(&model_names, &prompts, &documents)?;

    let sink = Arc::new(FileResultSink::new(&cfg.output_dir));
    let runner = build_runner(&cfg, prompts, sink.clone())?;
    let progress = default_progress_sink(cases.len());
    let artifacts = runner.run(cases, progress).await?;

    let summary = RunSummary::from_artifacts(&artifacts);
    if let Err(e) = sink.finish(&artifacts, &summary).await {
        tracing::warn!(error = %format!("{e:#}"), "failed to write run output");
    }
    print_summary(&summary);

    Ok(exit_codes::for_run(summary.failed, args.strict))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::ConfigArg;
    use doceval_core::config::parse_config;
    use std::path::PathBuf;

    fn args() -> RunArgs {
        RunArgs {
            config: ConfigArg {
                config: PathBuf::from("eval.yaml"),
            },
            concurrency: None,
            no_cache: false,
            output_dir: None,
            prompt_filter: None,
            document_filter: None,
            models: vec![],
            strict: false,
        }
    }

    fn cfg() -> EvalConfig {
        parse_config("version: 1\nsuite: s\nmodels: [{name: a}, {name: b}]\n").unwrap()
    }

    #[test]
    fn overrides_replace_settings() -> anyhow::Result<()> {
        let mut c = cfg();
        let a = RunArgs {
            concurrency: Some(7),
            no_cache: true,
            models: vec!["b".into()],
            ..args()
        };
        apply_overrides(&mut c, &a)?;
        assert_eq!(c.settings.concurrency, 7);
        assert!(!c.settings.cache);
        assert_eq!(c.models.len(), 1);
        assert_eq!(c.models[0].name, "b");
        Ok(())
    }

    #[test]
    fn unknown_model_override_is_rejected() {
        let mut c = cfg();
        let a = RunArgs {
            models: vec!["zzz".into()],
            ..args()
        };
        assert!(apply_overrides(&mut c, &a).is_err());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let mut c = cfg();
        let a = RunArgs {
            concurrency: Some(0),
            ..args()
        };
        assert!(apply_overrides(&mut c, &a).is_err());
    }
}
