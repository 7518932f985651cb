//! Scoring of extracted model output.
//!
//! Evaluators are selected once at startup through an [`EvaluatorRegistry`]:
//! built-ins register under a name, and a config entry picks one, optionally
//! pointing it at a definition file to load.

use crate::model::Evaluation;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Context for one evaluation call.
#[derive(Debug, Clone, Copy)]
pub struct EvalOptions<'a> {
    pub model: &'a str,
    pub prompt_base_name: &'a str,
    pub document_id: &'a str,
    pub document: &'a str,
    /// False when extraction fell back to raw text.
    pub structured: bool,
}

/// Scores structured output. Implementations must not panic; internal problems
/// are reported through `quantitative.errors` with best-effort scores.
pub trait Evaluator: Send + Sync {
    fn name(&self) -> &str;
    fn evaluate(&self, value: &Value, opts: &EvalOptions<'_>) -> Evaluation;
}

/// Views any extracted value as an object; non-objects become `{raw_text: ...}`.
pub fn as_object(value: &Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map.clone(),
        Value::String(s) => {
            let mut map = Map::new();
            map.insert("raw_text".into(), Value::String(s.clone()));
            map
        }
        other => {
            let mut map = Map::new();
            map.insert("raw_text".into(), Value::String(other.to_string()));
            map
        }
    }
}

/// True when a JSON value carries content (non-null, non-empty).
pub fn has_content(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorSettings {
    pub name: String,
    /// Definition file for evaluators that load one (e.g. a rubric).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<std::path::PathBuf>,
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            name: "structure".to_string(),
            path: None,
        }
    }
}

pub type EvaluatorFactory =
    Box<dyn Fn(Option<&Path>) -> anyhow::Result<Arc<dyn Evaluator>> + Send + Sync>;

#[derive(Default)]
pub struct EvaluatorRegistry {
    factories: BTreeMap<String, EvaluatorFactory>,
}

impl EvaluatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(Option<&Path>) -> anyhow::Result<Arc<dyn Evaluator>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Instantiates the evaluator named in `settings`.
    pub fn build(&self, settings: &EvaluatorSettings) -> anyhow::Result<Arc<dyn Evaluator>> {
        let factory = self.factories.get(&settings.name).ok_or_else(|| {
            anyhow::anyhow!(
                "config error: unknown evaluator '{}' (available: {})",
                settings.name,
                self.names().join(", ")
            )
        })?;
        let evaluator = factory(settings.path.as_deref())?;
        tracing::info!(
            evaluator = evaluator.name(),
            path = ?settings.path,
            "evaluator selected"
        );
        Ok(evaluator)
    }
}
