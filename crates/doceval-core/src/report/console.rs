use crate::report::summary::{MetricAverages, RunSummary};
use std::collections::BTreeMap;

const MAX_LISTED_FAILURES: usize = 20;

fn table(title: &str, rows: &BTreeMap<String, MetricAverages>) -> Vec<String> {
    let mut lines = Vec::with_capacity(rows.len() + 2);
    let width = rows.keys().map(String::len).max().unwrap_or(0).max(title.len());
    lines.push(format!(
        "{:<width$}  {:>5}  {:>7}  {:>8}  {:>12}  {:>9}",
        title, "n", "overall", "accuracy", "completeness", "relevance"
    ));
    for (name, m) in rows {
        lines.push(format!(
            "{:<width$}  {:>5}  {:>7.4}  {:>8.4}  {:>12.4}  {:>9.4}",
            name, m.count, m.overall, m.accuracy, m.completeness, m.relevance
        ));
    }
    lines
}

/// Renders the end-of-run report. Deterministic, so it can be tested.
#[must_use]
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = vec![String::new()];
    if !summary.by_model.is_empty() {
        out.extend(table("model", &summary.by_model));
        out.push(String::new());
        out.extend(table("prompt", &summary.by_prompt));
        out.push(String::new());
    }

    for f in summary.failures.iter().take(MAX_LISTED_FAILURES) {
        out.push(format!(
            "❌ {} / {} / {}  [{}] {}",
            f.model,
            f.prompt_id,
            f.document_id,
            f.kind.as_str(),
            f.message
        ));
    }
    if summary.failures.len() > MAX_LISTED_FAILURES {
        out.push(format!(
            "   ... and {} more (see summary.json)",
            summary.failures.len() - MAX_LISTED_FAILURES
        ));
    }

    out.push(format!(
        "Summary: {} total, {} succeeded, {} failed, {} cached ({:.1}s)",
        summary.total,
        summary.succeeded,
        summary.failed,
        summary.cache_hits,
        summary.duration_ms as f64 / 1000.0
    ));
    out.join("\n")
}

pub fn print_summary(summary: &RunSummary) {
    eprintln!("{}", render_summary(summary));
}
