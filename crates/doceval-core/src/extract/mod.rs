//! Structured-data extraction from free-form model output.
//!
//! Strategies run in order and the first one that yields an object or array
//! wins. Nothing in here fails: text that resists every strategy comes back
//! verbatim as a JSON string.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

lazy_static! {
    static ref OBJECT_SPAN: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
    static ref ARRAY_SPAN: Regex = Regex::new(r"(?s)\[.*\]").unwrap();
    static ref TRAILING_COMMA: Regex = Regex::new(r",\s*([}\]])").unwrap();
    static ref LINE_COMMENT: Regex = Regex::new(r"(?m)(^|[ \t])//[^\n]*").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    DirectParse,
    FencedObject,
    FencedArray,
    RepairedReparse,
    RawFallback,
}

impl Strategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectParse => "direct_parse",
            Self::FencedObject => "fenced_object",
            Self::FencedArray => "fenced_array",
            Self::RepairedReparse => "repaired_reparse",
            Self::RawFallback => "raw_fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub value: Value,
    pub strategy: Strategy,
}

impl Extraction {
    pub fn is_structured(&self) -> bool {
        self.strategy != Strategy::RawFallback
    }
}

type StrategyFn = fn(&str) -> Option<Value>;

const CHAIN: [(Strategy, StrategyFn); 4] = [
    (Strategy::DirectParse, direct_parse),
    (Strategy::FencedObject, fenced_object),
    (Strategy::FencedArray, fenced_array),
    (Strategy::RepairedReparse, repaired_reparse),
];

/// Extracts structured data from `raw`, falling back to the raw text.
pub fn extract(raw: &str) -> Value {
    extract_with_strategy(raw).value
}

pub fn extract_with_strategy(raw: &str) -> Extraction {
    CHAIN
        .iter()
        .find_map(|(strategy, f)| {
            f(raw).map(|value| Extraction {
                value,
                strategy: *strategy,
            })
        })
        .unwrap_or_else(|| Extraction {
            value: Value::String(raw.to_string()),
            strategy: Strategy::RawFallback,
        })
}

fn structured(v: Value) -> Option<Value> {
    match v {
        Value::Object(_) | Value::Array(_) => Some(v),
        _ => None,
    }
}

pub fn direct_parse(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text.trim())
        .ok()
        .and_then(structured)
}

fn strip_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "")
}

pub fn fenced_object(text: &str) -> Option<Value> {
    let cleaned = strip_fences(text);
    let span = OBJECT_SPAN.find(&cleaned)?;
    serde_json::from_str::<Value>(span.as_str())
        .ok()
        .filter(Value::is_object)
}

pub fn fenced_array(text: &str) -> Option<Value> {
    let cleaned = strip_fences(text);
    let span = ARRAY_SPAN.find(&cleaned)?;
    serde_json::from_str::<Value>(span.as_str())
        .ok()
        .filter(Value::is_array)
}

/// Applies the near-JSON repairs: single quotes become double quotes, trailing
/// commas before `}`/`]` are dropped, `//` line comments are removed.
pub fn repair(text: &str) -> String {
    let quoted = text.replace('\'', "\"");
    let uncommented = LINE_COMMENT.replace_all(&quoted, "$1");
    TRAILING_COMMA.replace_all(&uncommented, "$1").into_owned()
}

pub fn repaired_reparse(text: &str) -> Option<Value> {
    let repaired = repair(text);
    let parsed = fenced_object(&repaired);
    if parsed.is_none() && OBJECT_SPAN.is_match(&repaired) {
        tracing::warn!(
            len = text.len(),
            "JSON repair produced an object span that still does not parse"
        );
    }
    parsed
}
