//! Export pipeline
//!
//! Received → Decoded → Classified → Fetched → Rendered → Persisted.
//! The first failing stage ends the run; later stages never execute and
//! nothing is rolled back (the artifact path is simply never written).

use crate::error::Result;
use crate::event::{classify, Classification, Envelope, ResourceKind};
use crate::gcp::client::GcpClient;
use crate::resource::{Renderer, ResourceHandler};
use crate::sink::Sink;
use serde::Serialize;
use std::fmt;
use tracing::Instrument;
use uuid::Uuid;

/// Pipeline stages, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Decoded,
    Classified,
    Fetched,
    Rendered,
    Persisted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Decoded => "decoded",
            Stage::Classified => "classified",
            Stage::Fetched => "fetched",
            Stage::Rendered => "rendered",
            Stage::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportOutcome {
    pub kind: ResourceKind,
    pub identifier: String,
    pub short_name: String,
    pub path: String,
    pub location: String,
}

/// Drives one event at a time through classification, fetch, render and persist
pub struct Exporter {
    client: GcpClient,
    renderer: Renderer,
    sink: Sink,
}

impl Exporter {
    pub fn new(client: GcpClient, sink: Sink) -> Result<Self> {
        Ok(Self {
            client,
            renderer: Renderer::new()?,
            sink,
        })
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    /// Handle one inbound envelope end to end
    pub async fn handle_envelope(&self, envelope: &Envelope) -> Result<ExportOutcome> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "export",
            %run_id,
            message_id = envelope.message_id.as_deref().unwrap_or("-")
        );

        async {
            log_stage(Stage::Received);
            let entry = envelope.decode().inspect_err(log_failure)?;
            log_stage(Stage::Decoded);

            let classification = classify(&entry).inspect_err(log_failure)?;
            self.run_classified(&classification).await
        }
        .instrument(span)
        .await
    }

    /// Run the pipeline from an already classified resource
    pub async fn export(&self, classification: &Classification) -> Result<ExportOutcome> {
        let span = tracing::info_span!("export", run_id = %Uuid::new_v4());
        self.run_classified(classification).instrument(span).await
    }

    async fn run_classified(&self, classification: &Classification) -> Result<ExportOutcome> {
        let Classification { kind, identifier } = classification;
        tracing::info!(%kind, %identifier, "Stage: {}", Stage::Classified);

        let handler = ResourceHandler::for_kind(*kind);

        let descriptor = handler
            .fetch(&self.client, identifier)
            .await
            .inspect_err(log_failure)?;
        tracing::info!(
            short_name = %descriptor.short_name,
            "Stage: {} ({})",
            Stage::Fetched,
            descriptor.configuration.name()
        );

        let artifact = self
            .renderer
            .render(&descriptor)
            .inspect_err(log_failure)?;
        log_stage(Stage::Rendered);

        self.sink.persist(&artifact).await.inspect_err(log_failure)?;
        log_stage(Stage::Persisted);

        Ok(ExportOutcome {
            kind: *kind,
            identifier: identifier.clone(),
            short_name: descriptor.short_name,
            location: self.sink.location(&artifact),
            path: artifact.path,
        })
    }
}

fn log_stage(stage: Stage) {
    tracing::info!("Stage: {}", stage);
}

fn log_failure(error: &crate::error::ExportError) {
    tracing::error!("Export failed: {}", error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExportError;
    use crate::gcp::auth::GcpCredentials;
    use crate::gcp::client::Endpoints;

    fn exporter() -> Exporter {
        // Unroutable endpoint: any network call would fail with a fetch error
        let client = GcpClient::with_credentials(
            GcpCredentials::from_static_token("t"),
            Endpoints::single("http://127.0.0.1:9"),
        )
        .unwrap();
        Exporter::new(client, Sink::Stdout).unwrap()
    }

    #[tokio::test]
    async fn test_missing_data_fails_before_fetch() {
        let err = exporter()
            .handle_envelope(&Envelope::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Decode(_)));
    }

    #[tokio::test]
    async fn test_unclassifiable_entry_fails_before_fetch() {
        let envelope = Envelope::from_entry(&serde_json::json!({"resource": {"type": "gcs_bucket"}}));
        let err = exporter().handle_envelope(&envelope).await.unwrap_err();
        assert!(matches!(err, ExportError::Classification(_)));
    }

    #[tokio::test]
    async fn test_malformed_topic_identifier_fails_before_fetch() {
        let classification = Classification::new(ResourceKind::PubsubTopic, "topics/t");
        let err = exporter().export(&classification).await.unwrap_err();
        assert!(matches!(err, ExportError::Classification(_)));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Received.to_string(), "received");
        assert_eq!(Stage::Persisted.to_string(), "persisted");
    }
}
