use crate::errors::ConfigError;
use crate::evaluator::EvaluatorSettings;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvalConfig {
    pub version: u32,
    pub suite: String,
    pub models: Vec<ModelSpec>,
    #[serde(default = "default_prompts_dir")]
    pub prompts_dir: PathBuf,
    #[serde(default = "default_documents_dir")]
    pub documents_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub evaluator: EvaluatorSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Openai,
    Fake,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSpec {
    pub name: String,
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Per-model in-flight ceiling.
    pub concurrency: usize,
    pub cache: bool,
    pub cache_dir: PathBuf,
    pub timeout_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_filter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_filter: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            concurrency: 3,
            cache: true,
            cache_dir: PathBuf::from(".doceval/cache"),
            timeout_seconds: 60,
            prompt_filter: None,
            document_filter: None,
        }
    }
}

fn default_prompts_dir() -> PathBuf {
    PathBuf::from("prompts")
}

fn default_documents_dir() -> PathBuf {
    PathBuf::from("documents")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_max_tokens() -> u32 {
    2048
}

impl EvalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != SUPPORTED_CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                supported: SUPPORTED_CONFIG_VERSION,
            });
        }
        if self.suite.trim().is_empty() {
            return Err(ConfigError::Invalid("suite must not be empty".into()));
        }
        if self.models.is_empty() {
            return Err(ConfigError::Invalid("at least one model is required".into()));
        }
        let mut seen = HashSet::new();
        for m in &self.models {
            if m.name.trim().is_empty() {
                return Err(ConfigError::Invalid("model name must not be empty".into()));
            }
            if !seen.insert(m.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "model '{}' is listed twice",
                    m.name
                )));
            }
        }
        if self.settings.concurrency == 0 {
            return Err(ConfigError::Invalid(
                "settings.concurrency must be at least 1".into(),
            ));
        }
        if self.settings.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "settings.timeout_seconds must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Resolves relative directories against `base` (the config file's directory).
    pub fn resolve_paths(&mut self, base: &Path) {
        for p in [
            &mut self.prompts_dir,
            &mut self.documents_dir,
            &mut self.output_dir,
            &mut self.settings.cache_dir,
        ] {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
        if let Some(p) = self.evaluator.path.as_mut() {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        }
    }
}

pub fn parse_config(yaml: &str) -> Result<EvalConfig, ConfigError> {
    let cfg: EvalConfig = serde_yaml::from_str(yaml)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Reads, parses and validates a config file. Relative paths inside it are
/// resolved against the file's directory.
pub fn load_config(path: &Path) -> Result<EvalConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cfg = parse_config(&raw)?;
    if let Some(base) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        cfg.resolve_paths(base);
    }
    tracing::debug!(
        path = %path.display(),
        suite = %cfg.suite,
        models = cfg.models.len(),
        "config loaded"
    );
    Ok(cfg)
}
