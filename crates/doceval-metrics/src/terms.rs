use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};

lazy_static! {
    static ref WORD: Regex = Regex::new(r"[\p{L}\p{N}]+").unwrap();
}

/// Words shorter than this carry little signal (articles, pronouns, ...).
const MIN_TERM_LEN: usize = 5;

/// Distinct lowercase terms of at least five characters.
pub fn salient_terms(text: &str) -> BTreeSet<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.chars().count() >= MIN_TERM_LEN)
        .collect()
}

/// The `limit` most frequent salient terms of `text`. Ties go to the
/// alphabetically first term.
pub fn ranked_terms(text: &str, limit: usize) -> BTreeSet<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for term in WORD
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.chars().count() >= MIN_TERM_LEN)
    {
        *counts.entry(term).or_insert(0) += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(t, _)| t).collect()
}

/// All string leaves of a JSON value joined by newlines; keys are ignored.
pub fn flatten_text(value: &Value) -> String {
    fn walk(v: &Value, out: &mut Vec<String>) {
        match v {
            Value::String(s) => out.push(s.clone()),
            Value::Array(items) => items.iter().for_each(|i| walk(i, out)),
            Value::Object(map) => map.values().for_each(|i| walk(i, out)),
            Value::Number(n) => out.push(n.to_string()),
            Value::Bool(_) | Value::Null => {}
        }
    }
    let mut out = Vec::new();
    walk(value, &mut out);
    out.join("\n")
}

/// Share of `needles` found in `haystack`; `None` when there are no needles.
pub fn overlap(needles: &BTreeSet<String>, haystack: &BTreeSet<String>) -> Option<f64> {
    if needles.is_empty() {
        return None;
    }
    let hits = needles.iter().filter(|t| haystack.contains(*t)).count();
    Some(hits as f64 / needles.len() as f64)
}
