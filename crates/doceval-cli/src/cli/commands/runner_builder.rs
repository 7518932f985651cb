use doceval_core::cache::ResponseCache;
use doceval_core::config::{EvalConfig, ModelSpec, ProviderKind};
use doceval_core::corpus::PromptCorpus;
use doceval_core::engine::{ModelBinding, RunPolicy, Runner};
use doceval_core::providers::llm::fake::FakeClient;
use doceval_core::providers::llm::openai::OpenAIClient;
use doceval_core::providers::llm::tracing::TracingLlmClient;
use doceval_core::providers::llm::{InvokeOptions, LlmClient};
use doceval_core::storage::ResultSink;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const API_KEY_VARS: [&str; 2] = ["DOCEVAL_API_KEY", "OPENAI_API_KEY"];

/// First non-empty credential from the environment, passed through untouched.
pub(crate) fn api_key_from_env() -> Option<String> {
    API_KEY_VARS
        .iter()
        .find_map(|v| std::env::var(v).ok().filter(|k| !k.trim().is_empty()))
}

pub(crate) fn build_client(spec: &ModelSpec, api_key: Option<String>) -> Arc<dyn LlmClient> {
    let client: Arc<dyn LlmClient> = match spec.provider {
        ProviderKind::Fake => Arc::new(FakeClient::new()),
        ProviderKind::Openai => {
            if api_key.is_none() && spec.base_url.is_none() {
                tracing::warn!(
                    model = %spec.name,
                    "no API key found in DOCEVAL_API_KEY or OPENAI_API_KEY; requests will likely be rejected"
                );
            }
            Arc::new(OpenAIClient::new(spec.base_url.clone(), api_key))
        }
    };
    Arc::new(TracingLlmClient::new(client))
}

pub(crate) fn invoke_options(spec: &ModelSpec, cfg: &EvalConfig) -> InvokeOptions {
    InvokeOptions {
        model: spec.name.clone(),
        temperature: spec.temperature,
        max_tokens: spec.max_tokens,
        timeout: Duration::from_secs(cfg.settings.timeout_seconds),
    }
}

pub(crate) fn build_cache(cfg: &EvalConfig) -> ResponseCache {
    if cfg.settings.cache {
        ResponseCache::new(&cfg.settings.cache_dir)
    } else {
        ResponseCache::disabled()
    }
}

/// Wires config, corpus and sink into a runner. The evaluator is selected here,
/// once per process.
pub(crate) fn build_runner(
    cfg: &EvalConfig,
    prompts: PromptCorpus,
    sink: Arc<dyn ResultSink>,
) -> anyhow::Result<Runner> {
    let evaluator = doceval_metrics::default_registry().build(&cfg.evaluator)?;

    let api_key = api_key_from_env();
    let models: BTreeMap<String, ModelBinding> = cfg
        .models
        .iter()
        .map(|spec| {
            (
                spec.name.clone(),
                ModelBinding {
                    client: build_client(spec, api_key.clone()),
                    options: invoke_options(spec, cfg),
                },
            )
        })
        .collect();

    Ok(Runner {
        suite: cfg.suite.clone(),
        prompts: Arc::new(prompts),
        cache: build_cache(cfg),
        models: Arc::new(models),
        evaluator,
        sink,
        policy: RunPolicy {
            concurrency: cfg.settings.concurrency,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use doceval_core::config::parse_config;
    use doceval_core::storage::MemorySink;

    const CFG: &str = r#"
version: 1
suite: s
models:
  - name: offline
    provider: fake
  - name: local
    base_url: http://localhost:11434/v1
    max_tokens: 256
settings:
  cache: false
  timeout_seconds: 5
"#;

    #[test]
    fn bindings_follow_config() -> anyhow::Result<()> {
        let cfg = parse_config(CFG)?;
        let runner = build_runner(&cfg, PromptCorpus::default(), Arc::new(MemorySink::new()))?;
        assert_eq!(runner.models.len(), 2);
        assert_eq!(runner.models["offline"].client.provider_name(), "fake");
        assert_eq!(runner.models["local"].client.provider_name(), "openai");
        assert_eq!(runner.models["local"].options.max_tokens, 256);
        assert_eq!(runner.models["local"].options.timeout, Duration::from_secs(5));
        assert!(!runner.cache.is_enabled());
        assert_eq!(runner.evaluator.name(), "structure");
        Ok(())
    }
}
