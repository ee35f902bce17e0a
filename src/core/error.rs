use std::fmt;
use thiserror::Error;

/// Markers that identify a rate limit or a temporarily unavailable model.
const TRANSIENT_MARKERS: [&str; 4] = ["429", "RESOURCE_EXHAUSTED", "503", "UNAVAILABLE"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    Fatal,
}

/// A failed completion call, already classified.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl ProviderError {
    /// Classifies by HTTP status when one is known, otherwise by the message text.
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = classify(status, &message);
        Self {
            kind,
            status,
            message,
        }
    }

    pub fn from_message(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    pub fn is_transient(&self) -> bool {
        self.kind == ErrorKind::Transient
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        Self::new(status, err.to_string())
    }
}

pub fn classify(status: Option<u16>, message: &str) -> ErrorKind {
    if matches!(status, Some(429) | Some(503)) {
        return ErrorKind::Transient;
    }
    let normalized = message.to_uppercase();
    if TRANSIENT_MARKERS.iter().any(|m| normalized.contains(m)) {
        ErrorKind::Transient
    } else {
        ErrorKind::Fatal
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Premise,
    Outline,
    Opening,
    Continuation(usize),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Premise => write!(f, "premise"),
            Stage::Outline => write!(f, "outline"),
            Stage::Opening => write!(f, "opening draft"),
            Stage::Continuation(n) => write!(f, "continuation #{}", n),
        }
    }
}

/// Failure of a completion call after the retry policy gave up.
#[derive(Debug, Clone, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Fatal(ProviderError),

    #[error("all {attempts} attempts failed, last error: {last}")]
    Exhausted { attempts: usize, last: ProviderError },
}

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("missing credential: set {0} in config.yml or the environment")]
    MissingCredential(&'static str),

    #[error("invalid story request: {0}")]
    InvalidRequest(String),

    #[error("{stage} generation failed: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: SubmitError,
    },

    #[error("{stage} generation returned no text")]
    EmptyResult { stage: Stage },
}

impl StoryError {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            StoryError::Stage { stage, .. } | StoryError::EmptyResult { stage } => Some(*stage),
            _ => None,
        }
    }
}
