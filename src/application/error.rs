//! Application-level errors (wraps domain errors)

use std::fmt;

use thiserror::Error;

use crate::domain::DomainError;

/// External source a refresh depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Directory,
    Scores,
    Baseline,
    Links,
    Cache,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Directory => "partner directory",
            SourceKind::Scores => "score source",
            SourceKind::Baseline => "baseline",
            SourceKind::Links => "link table",
            SourceKind::Cache => "facet cache",
        };
        f.write_str(name)
    }
}

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{source_kind} unavailable: {reason}")]
    MissingSource {
        source_kind: SourceKind,
        reason: String,
    },

    #[error("no facet cache found at {0}: run `tiermatrix refresh` first")]
    CacheMissing(String),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    pub fn missing(source_kind: SourceKind, reason: impl Into<String>) -> Self {
        Self::MissingSource {
            source_kind,
            reason: reason.into(),
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
