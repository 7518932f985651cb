use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("unsupported config version {found} (supported: {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("config error: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("corpus directory not found: {0}")]
    MissingDir(PathBuf),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("duplicate {kind} id '{id}' ({path})")]
    DuplicateId {
        kind: &'static str,
        id: String,
        path: PathBuf,
    },
}

/// Failures raised by a model invocation adapter.
///
/// Timeouts and transport/status errors stay distinguishable for reporting, but the
/// scheduler treats every variant as an ordinary case failure.
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt cache entry {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Run-fatal conditions detected before any case is scheduled.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("no prompts found (need at least one user_ or legacy prompt)")]
    NoPrompts,
    #[error("no documents found")]
    NoDocuments,
    #[error("no models configured")]
    NoModels,
    #[error("prompts '{first}' and '{second}' share the base name '{base_name}'; rename one of them")]
    DuplicateBaseName {
        base_name: String,
        first: String,
        second: String,
    },
}

/// Coarse failure classification recorded per failed case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunErrorKind {
    ProviderTimeout,
    ProviderServer,
    Network,
    MalformedResponse,
    UnknownModel,
    Persistence,
    Other,
}

impl RunErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProviderTimeout => "provider_timeout",
            Self::ProviderServer => "provider_server",
            Self::Network => "network",
            Self::MalformedResponse => "malformed_response",
            Self::UnknownModel => "unknown_model",
            Self::Persistence => "persistence",
            Self::Other => "other",
        }
    }
}

impl From<&InvokeError> for RunErrorKind {
    fn from(e: &InvokeError) -> Self {
        match e {
            InvokeError::Timeout(_) => Self::ProviderTimeout,
            InvokeError::Transport(_) => Self::Network,
            InvokeError::HttpStatus { .. } => Self::ProviderServer,
            InvokeError::MalformedResponse(_) => Self::MalformedResponse,
        }
    }
}

/// A test case that did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFailure {
    pub model: String,
    pub prompt_id: String,
    pub document_id: String,
    pub kind: RunErrorKind,
    pub message: String,
}
