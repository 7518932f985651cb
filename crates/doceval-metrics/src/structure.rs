//! Default evaluator: scores any response against its source document without
//! prompt-specific configuration.
//!
//! - accuracy: share of the response's salient terms that occur in the document
//!   (a grounding proxy; invented content lowers it)
//! - completeness: share of top-level fields that carry content
//! - relevance: share of the document's salient terms the response covers
//! - overall: mean of the three

use crate::terms::{flatten_text, overlap, ranked_terms, salient_terms};
use doceval_core::evaluator::{as_object, has_content, round4, EvalOptions, Evaluator};
use doceval_core::model::{Evaluation, QualitativeFeedback, QuantitativeMetrics};
use serde_json::Value;

pub const NAME: &str = "structure";

/// Score given to completeness when the model returned no structure at all.
const RAW_TEXT_COMPLETENESS: f64 = 0.2;

#[derive(Debug, Clone)]
pub struct StructureEvaluator {
    /// Coverage is checked against the document's most frequent terms, at most
    /// this many.
    pub max_document_terms: usize,
}

impl Default for StructureEvaluator {
    fn default() -> Self {
        Self {
            max_document_terms: 50,
        }
    }
}

impl Evaluator for StructureEvaluator {
    fn name(&self) -> &str {
        NAME
    }

    fn evaluate(&self, value: &Value, opts: &EvalOptions<'_>) -> Evaluation {
        let fields = as_object(value);
        let mut errors = Vec::new();
        let mut feedback = QualitativeFeedback::default();

        if !opts.structured {
            errors.push("response was not valid JSON; scored as raw text".to_string());
            feedback
                .suggestions
                .push("Ask for a single JSON object without surrounding prose.".into());
        }

        let completeness = if !opts.structured {
            RAW_TEXT_COMPLETENESS
        } else if fields.is_empty() {
            0.0
        } else {
            let filled = fields.values().filter(|v| has_content(v)).count();
            let empty: Vec<&str> = fields
                .iter()
                .filter(|(_, v)| !has_content(v))
                .map(|(k, _)| k.as_str())
                .collect();
            if !empty.is_empty() {
                feedback
                    .weaknesses
                    .push(format!("empty fields: {}", empty.join(", ")));
            }
            filled as f64 / fields.len() as f64
        };

        let response_terms = salient_terms(&flatten_text(value));
        let document_terms = ranked_terms(opts.document, self.max_document_terms);

        let accuracy = match overlap(&response_terms, &salient_terms(opts.document)) {
            Some(a) => a,
            None => {
                errors.push("response contains no scorable text".to_string());
                0.0
            }
        };
        let relevance = overlap(&document_terms, &response_terms).unwrap_or(0.0);

        if accuracy >= 0.8 {
            feedback
                .strengths
                .push("content is well grounded in the document".into());
        } else if accuracy < 0.5 && !response_terms.is_empty() {
            feedback
                .weaknesses
                .push("much of the response does not appear in the document".into());
        }
        if relevance >= 0.5 {
            feedback
                .strengths
                .push("covers the document's key terms".into());
        } else if relevance < 0.2 {
            feedback
                .suggestions
                .push("Cover more of the document's main points.".into());
        }
        if opts.structured && completeness == 1.0 {
            feedback.strengths.push("all fields populated".into());
        }

        let overall = (accuracy + completeness + relevance) / 3.0;
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DOC: &str = "Quarterly revenue increased strongly while operating margins \
                       narrowed because of higher shipping costs.";

    fn opts(structured: bool) -> EvalOptions<'static> {
        EvalOptions {
            model: "m",
            prompt_base_name: "summary",
            document_id: "q3",
            document: DOC,
            structured,
        }
    }

    #[test]
    fn grounded_complete_answer_scores_high() {
        let v = json!({
            "summary": "Quarterly revenue increased strongly",
            "risks": ["operating margins narrowed", "higher shipping costs"]
        });
        let e = StructureEvaluator::default().evaluate(&v, &opts(true));
        let q = &e.quantitative;
        assert_eq!(q.accuracy, 1.0);
        assert_eq!(q.completeness, 1.0);
        assert!(q.relevance > 0.5);
        assert!(q.overall > 0.8);
        assert!(q.errors.is_empty());
        assert!(e.qualitative.strengths.iter().any(|s| s.contains("grounded")));
    }

    #[test]
    fn empty_fields_lower_completeness() {
        let v = json!({"summary": "Quarterly revenue increased", "risks": [], "notes": null});
        let e = StructureEvaluator::default().evaluate(&v, &opts(true));
        assert_eq!(e.quantitative.completeness, 0.3333);
        assert!(e.qualitative.weaknesses[0].contains("risks"));
    }

    #[test]
    fn raw_text_is_scored_with_error() {
        let v = json!("revenue increased strongly");
        let e = StructureEvaluator::default().evaluate(&v, &opts(false));
        assert_eq!(e.quantitative.completeness, RAW_TEXT_COMPLETENESS);
        assert_eq!(e.quantitative.errors.len(), 1);
        assert!(e.quantitative.accuracy > 0.0);
    }

    #[test]
    fn invented_content_lowers_accuracy() {
        let v = json!({"summary": "Dividends tripled after acquisition announcement"});
        let e = StructureEvaluator::default().evaluate(&v, &opts(true));
        assert_eq!(e.quantitative.accuracy, 0.0);
        assert_eq!(e.quantitative.relevance, 0.0);
    }

    #[test]
    fn coverage_uses_most_frequent_document_terms() {
        let ev = StructureEvaluator {
            max_document_terms: 1,
        };
        let opts = EvalOptions {
            document: "Apples arrived. Zebras zebras zebras everywhere.",
            ..opts(true)
        };
        let e = ev.evaluate(&json!({"summary": "zebras"}), &opts);
        assert_eq!(e.quantitative.relevance, 1.0);
    }

    #[test]
    fn empty_object_never_panics() {
        let e = StructureEvaluator::default().evaluate(&json!({}), &opts(true));
        assert_eq!(e.quantitative.overall, 0.0);
        assert!(!e.quantitative.errors.is_empty());
    }
}
