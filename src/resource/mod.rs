//! Resource abstraction layer
//!
//! One fetcher per [`ResourceKind`] reads the live configuration from the
//! owning API; [`Renderer`] turns it into a Terraform declaration.
//!
//! # Architecture
//!
//! - [`gcs_bucket`], [`cloud_function`], [`pubsub_topic`] - per-kind API models,
//!   fetchers and templates
//! - [`render`] - Template registry and HCL escaping
//!
//! # Example
//!
//! ```ignore
//! use tfrec::resource::{ResourceHandler, Renderer};
//!
//! async fn export(client: &GcpClient) -> tfrec::error::Result<()> {
//!     let handler = ResourceHandler::from_tag("gcs_bucket")?;
//!     let descriptor = handler.fetch(client, "projects/_/buckets/my-bucket").await?;
//!     let artifact = Renderer::new()?.render(&descriptor)?;
//!     println!("{}", artifact.text);
//!     Ok(())
//! }
//! ```

pub mod cloud_function;
pub mod gcs_bucket;
pub mod pubsub_topic;
pub mod render;

pub use render::Renderer;

use crate::error::{ExportError, Result};
use crate::event::ResourceKind;
use crate::gcp::client::GcpClient;
use cloud_function::FunctionConfig;
use gcs_bucket::BucketConfig;
use pubsub_topic::TopicConfig;

/// Live configuration of a resource, as reported by its API
#[derive(Debug, Clone, PartialEq)]
pub enum Configuration {
    Bucket(BucketConfig),
    Function(FunctionConfig),
    Topic(TopicConfig),
}

impl Configuration {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Bucket(_) => ResourceKind::GcsBucket,
            Self::Function(_) => ResourceKind::CloudFunction,
            Self::Topic(_) => ResourceKind::PubsubTopic,
        }
    }

    /// Name reported by the provider
    pub fn name(&self) -> &str {
        match self {
            Self::Bucket(config) => &config.name,
            Self::Function(config) => &config.name,
            Self::Topic(config) => &config.name,
        }
    }
}

/// A fetched resource, owned by a single export run
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub full_identifier: String,
    pub short_name: String,
    pub configuration: Configuration,
}

/// Rendered Terraform text and the object path it is stored under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub kind: ResourceKind,
    pub short_name: String,
    pub path: String,
    pub text: String,
}

impl RenderedArtifact {
    pub fn new(kind: ResourceKind, short_name: &str, text: String) -> Self {
        Self {
            kind,
            short_name: short_name.to_string(),
            path: artifact_path(kind, short_name),
            text,
        }
    }
}

/// Destination object path for a resource: `records/<kind>/<short name>.tf`
pub fn artifact_path(kind: ResourceKind, short_name: &str) -> String {
    format!("records/{}/{}.tf", kind.as_tag(), short_name)
}

/// Fetcher for one resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceHandler {
    kind: ResourceKind,
}

impl ResourceHandler {
    pub fn for_kind(kind: ResourceKind) -> Self {
        Self { kind }
    }

    /// Look up a handler from a free-text kind tag
    pub fn from_tag(tag: &str) -> Result<Self> {
        ResourceKind::from_tag(tag)
            .map(Self::for_kind)
            .ok_or_else(|| ExportError::UnsupportedKind(tag.to_string()))
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Fetch the live configuration of the resource behind `identifier`.
    ///
    /// The short name is derived before any API call, so a malformed
    /// identifier never reaches the network.
    pub async fn fetch(&self, client: &GcpClient, identifier: &str) -> Result<ResourceDescriptor> {
        let kind = self.kind;
        let short_name = kind.short_name(identifier).ok_or_else(|| {
            ExportError::Classification(format!(
                "cannot derive a {} name from '{}'",
                kind, identifier
            ))
        })?;

        let configuration = match kind {
            ResourceKind::GcsBucket => gcs_bucket::fetch(client, short_name)
                .await
                .map(Configuration::Bucket),
            ResourceKind::CloudFunction => cloud_function::fetch(client, identifier)
                .await
                .map(Configuration::Function),
            ResourceKind::PubsubTopic => pubsub_topic::fetch(client, identifier)
                .await
                .map(Configuration::Topic),
        }
        .map_err(|e| ExportError::fetch(kind, identifier, e))?;

        Ok(ResourceDescriptor {
            kind,
            full_identifier: identifier.to_string(),
            short_name: short_name.to_string(),
            configuration,
        })
    }
}
