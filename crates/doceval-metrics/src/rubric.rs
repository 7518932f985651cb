use crate::terms::{flatten_text, overlap, salient_terms};
use anyhow::Context;
use doceval_core::evaluator::{as_object, has_content, round4, EvalOptions, Evaluator};
use doceval_core::model::{Evaluation, QualitativeFeedback, QuantitativeMetrics};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

pub const NAME: &str = "rubric";

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Weights {
    pub accuracy: f64,
    pub completeness: f64,
    pub relevance: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            accuracy: 1.0,
            completeness: 1.0,
            relevance: 1.0,
        }
    }
}

/// Scoring rules loaded from YAML.
///
/// ```yaml
/// required_keys: [summary, key_points]
/// keywords: [revenue, margin]
/// expected_values:
///   sentiment: positive
/// weights: { accuracy: 2, completeness: 1, relevance: 1 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Rubric {
    pub required_keys: Vec<String>,
    pub keywords: Vec<String>,
    /// Top-level key → expected value, compared case-insensitively as text.
    pub expected_values: BTreeMap<String, String>,
    pub weights: Weights,
}

impl Rubric {
    pub fn validate(&self) -> anyhow::Result<()> {
        let w = self.weights;
        if [w.accuracy, w.completeness, w.relevance]
            .iter()
            .any(|x| !x.is_finite() || *x < 0.0)
        {
            anyhow::bail!("rubric weights must be finite and non-negative");
        }
        if w.accuracy + w.completeness + w.relevance <= 0.0 {
            anyhow::bail!("rubric weights must not all be zero");
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RubricEvaluator {
    rubric: Rubric,
}

impl RubricEvaluator {
    pub fn new(rubric: Rubric) -> anyhow::Result<Self> {
        rubric.validate()?;
        Ok(Self { rubric })
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read rubric {}", path.display()))?;
        let rubric: Rubric = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse rubric {}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            required_keys = rubric.required_keys.len(),
            keywords = rubric.keywords.len(),
            "rubric loaded"
        );
        Self::new(rubric)
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }
}

fn value_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.trim().to_lowercase(),
        other => other.to_string().to_lowercase(),
    }
}

impl Evaluator for RubricEvaluator {
    fn name(&self) -> &str {
        NAME
    }

    fn evaluate(&self, value: &Value, opts: &EvalOptions<'_>) -> Evaluation {
        let r = &self.rubric;
        let fields = as_object(value);
        let mut errors = Vec::new();
        let mut feedback = QualitativeFeedback::default();
        if !opts.structured {
            errors.push("response was not valid JSON; scored as raw text".to_string());
        }

        let completeness = if r.required_keys.is_empty() {
            if fields.values().any(has_content) {
                1.0
            } else {
                0.0
            }
        } else {
            let missing: Vec<&str> = r
                .required_keys
                .iter()
                .filter(|k| !fields.get(k.as_str()).is_some_and(has_content))
                .map(String::as_str)
                .collect();
            if missing.is_empty() {
                feedback.strengths.push("all required keys present".into());
            } else {
                feedback
                    .weaknesses
                    .push(format!("missing required keys: {}", missing.join(", ")));
                feedback
                    .suggestions
                    .push(format!("Include {} in the JSON output.", missing.join(", ")));
            }
            1.0 - missing.len() as f64 / r.required_keys.len() as f64
        };

        let text = flatten_text(value).to_lowercase();
        let relevance = if r.keywords.is_empty() {
            overlap(&salient_terms(opts.document), &salient_terms(&text)).unwrap_or(0.0)
        } else {
            let absent: Vec<&str> = r
                .keywords
                .iter()
                .filter(|k| !text.contains(&k.to_lowercase()))
                .map(String::as_str)
                .collect();
            if !absent.is_empty() {
                feedback
                    .weaknesses
                    .push(format!("keywords not mentioned: {}", absent.join(", ")));
            }
            1.0 - absent.len() as f64 / r.keywords.len() as f64
        };

        let accuracy = if r.expected_values.is_empty() {
            match overlap(&salient_terms(&text), &salient_terms(opts.document)) {
                Some(a) => a,
                None => {
                    errors.push("response contains no scorable text".to_string());
                    0.0
                }
            }
        } else {
            let mut hits = 0usize;
            for (key, expected) in &r.expected_values {
                match fields.get(key) {
                    Some(v) if value_text(v) == expected.trim().to_lowercase() => hits += 1,
                    Some(v) => feedback.weaknesses.push(format!(
                        "{key}: expected '{expected}', got '{}'",
                        value_text(v)
                    )),
                    None => feedback.weaknesses.push(format!("{key}: missing")),
                }
            }
            hits as f64 / r.expected_values.len() as f64
        };

        let w = r.weights;
        let overall = (accuracy * w.accuracy + completeness * w.completeness + relevance * w.relevance)
            / (w.accuracy + w.completeness + w.relevance);

        Evaluation {
            quantitative: QuantitativeMetrics {
                accuracy: round4(accuracy),
                completeness: round4(completeness),
                relevance: round4(relevance),
                overall: round4(overall),
                errors,
            },
            qualitative: feedback,
        }
    }
}
