//! Artifact persistence

use crate::error::{ExportError, Result};
use crate::gcp::client::GcpClient;
use crate::resource::RenderedArtifact;
use std::io::Write;

/// Where rendered artifacts end up
#[derive(Clone)]
pub enum Sink {
    /// Whole-object overwrite in a Cloud Storage bucket
    Gcs { client: GcpClient, bucket: String },
    /// Print to stdout instead of uploading (dry run)
    Stdout,
}

impl Sink {
    pub fn gcs(client: GcpClient, bucket: impl Into<String>) -> Self {
        Self::Gcs {
            client,
            bucket: bucket.into(),
        }
    }

    /// True when artifacts are printed, leaving stdout unavailable for anything else
    pub fn writes_to_stdout(&self) -> bool {
        matches!(self, Self::Stdout)
    }

    /// Human-readable destination of an artifact
    pub fn location(&self, artifact: &RenderedArtifact) -> String {
        match self {
            Self::Gcs { bucket, .. } => format!("gs://{}/{}", bucket, artifact.path),
            Self::Stdout => format!("stdout:{}", artifact.path),
        }
    }

    /// Write an artifact, replacing anything already stored at its path
    pub async fn persist(&self, artifact: &RenderedArtifact) -> Result<()> {
        match self {
            Self::Gcs { client, bucket } => {
                client
                    .upload_text(bucket, &artifact.path, &artifact.text)
                    .await
                    .map_err(|e| ExportError::persist(&artifact.path, e))?;
            }
            Self::Stdout => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "# {}", artifact.path)
                    .and_then(|_| stdout.write_all(artifact.text.as_bytes()))
                    .and_then(|_| stdout.flush())
                    .map_err(|e| ExportError::persist(&artifact.path, e))?;
            }
        }

        tracing::info!("File written: {}", self.location(artifact));
        Ok(())
    }
}
