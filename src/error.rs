//! Error types for the lookup field.

use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("record source error: {0}")]
    Source(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("record source returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    #[error("invalid payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("record '{0}' is not in the current result list")]
    CandidateNotFound(String),

    #[error("a record is already selected; remove it first")]
    SelectionPresent,

    #[error("no record is selected")]
    NothingSelected,

    #[error("no owning record id is configured")]
    MissingOwner,

    #[error("lookup field has been torn down")]
    TornDown,
}

pub type Result<T> = std::result::Result<T, LookupError>;

impl LookupError {
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }

    /// Misuse of the state machine, as opposed to a collaborator failing.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::CandidateNotFound(_)
                | Self::SelectionPresent
                | Self::NothingSelected
                | Self::MissingOwner
                | Self::TornDown
        )
    }
}

impl From<ureq::Error> for LookupError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(status, response) => Self::Status {
                status,
                url: response.get_url().to_string(),
            },
            ureq::Error::Transport(transport) => Self::Transport(transport.to_string()),
        }
    }
}

/// Collaborator failures the lookup recovers from locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Search,
    DefaultLoad,
    Persistence,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search => f.write_str("search"),
            Self::DefaultLoad => f.write_str("default_load"),
            Self::Persistence => f.write_str("persistence"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl LookupFailure {
    pub fn new(kind: FailureKind, err: &LookupError) -> Self {
        Self {
            kind,
            message: err.to_string(),
        }
    }
}
