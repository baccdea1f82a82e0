//! Resource classification of audit-log entries

use super::envelope::LogEntry;
use crate::error::{ExportError, Result};
use serde::Serialize;
use std::fmt;

/// Where the resource kind lives in an audit-log entry
pub const KIND_POINTER: &str = "/resource/type";
/// Where the resource identifier lives in an audit-log entry
pub const IDENTIFIER_POINTER: &str = "/protoPayload/resourceName";

/// The closed set of resource kinds the exporter understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    GcsBucket,
    CloudFunction,
    PubsubTopic,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [Self::GcsBucket, Self::CloudFunction, Self::PubsubTopic];

    /// Map an audit-log `resource.type` tag to a kind
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "gcs_bucket" => Some(Self::GcsBucket),
            "cloud_function" => Some(Self::CloudFunction),
            "pubsub_topic" => Some(Self::PubsubTopic),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::GcsBucket => "gcs_bucket",
            Self::CloudFunction => "cloud_function",
            Self::PubsubTopic => "pubsub_topic",
        }
    }

    /// Derive the short name of a resource from its full identifier.
    ///
    /// Buckets and functions use the last `/` segment. Topics use the
    /// segment at index 3 (`projects/<p>/topics/<name>`), positionally.
    pub fn short_name<'a>(&self, full_identifier: &'a str) -> Option<&'a str> {
        let segment = match self {
            Self::GcsBucket | Self::CloudFunction => full_identifier.rsplit('/').next(),
            Self::PubsubTopic => full_identifier.split('/').nth(3),
        };
        segment.filter(|s| !s.is_empty())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Immutable result of classifying one log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: ResourceKind,
    pub identifier: String,
}

impl Classification {
    pub fn new(kind: ResourceKind, identifier: impl Into<String>) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
        }
    }
}

/// Determine which resource a log entry describes
pub fn classify(entry: &LogEntry) -> Result<Classification> {
    let tag = entry.str_at(KIND_POINTER).ok_or_else(|| {
        ExportError::Classification("log entry has no resource.type".to_string())
    })?;

    let identifier = entry.str_at(IDENTIFIER_POINTER).ok_or_else(|| {
        ExportError::Classification("log entry has no protoPayload.resourceName".to_string())
    })?;

    let kind = ResourceKind::from_tag(tag).ok_or_else(|| {
        ExportError::Classification(format!("unsupported resource type '{}'", tag))
    })?;

    Ok(Classification::new(kind, identifier))
}
