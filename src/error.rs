//! Error taxonomy for a single export run.
//!
//! Every variant is terminal for the current event: nothing is retried
//! in-process, the caller decides whether the event is redelivered.

use crate::event::ResourceKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExportError>;

#[derive(Debug, Error)]
pub enum ExportError {
    /// Malformed envelope, base64 payload or JSON document
    #[error("decode error: {0}")]
    Decode(String),

    /// Missing or unknown resource kind, or unusable identifier
    #[error("classification error: {0}")]
    Classification(String),

    /// A kind tag that no handler is registered for
    #[error("unsupported resource kind: {0}")]
    UnsupportedKind(String),

    #[error("failed to fetch {kind} '{identifier}': {source}")]
    Fetch {
        kind: ResourceKind,
        identifier: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("render error: {0}")]
    Render(String),

    #[error("failed to persist '{path}': {source}")]
    Persist {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ExportError {
    pub fn fetch(kind: ResourceKind, identifier: &str, source: impl Into<anyhow::Error>) -> Self {
        Self::Fetch {
            kind,
            identifier: identifier.to_string(),
            source: source.into(),
        }
    }

    pub fn persist(path: &str, source: impl Into<anyhow::Error>) -> Self {
        Self::Persist {
            path: path.to_string(),
            source: source.into(),
        }
    }

    /// True when redelivering the same event cannot succeed
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::Decode(_) | Self::Classification(_) | Self::UnsupportedKind(_)
        )
    }
}
