//! GCP Client
//!
//! Main client for interacting with GCP APIs, combining authentication
//! and HTTP functionality.

use super::auth::GcpCredentials;
use super::http::GcpHttpClient;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

/// Base URLs of the GCP services used by the exporter.
///
/// Overridable so the client can target emulators or a mock server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub storage: String,
    pub functions: String,
    pub pubsub: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            storage: "https://storage.googleapis.com".to_string(),
            functions: "https://cloudfunctions.googleapis.com".to_string(),
            pubsub: "https://pubsub.googleapis.com".to_string(),
        }
    }
}

impl Endpoints {
    /// Point every service at the same base URL
    pub fn single(base: &str) -> Self {
        Self {
            storage: base.to_string(),
            functions: base.to_string(),
            pubsub: base.to_string(),
        }
    }

    /// Check that every endpoint is an absolute http(s) URL and strip
    /// trailing slashes
    pub fn validated(self) -> Result<Self> {
        Ok(Self {
            storage: normalize_base(&self.storage).context("Invalid storage endpoint")?,
            functions: normalize_base(&self.functions).context("Invalid functions endpoint")?,
            pubsub: normalize_base(&self.pubsub).context("Invalid pubsub endpoint")?,
        })
    }
}

fn normalize_base(raw: &str) -> Result<String> {
    let parsed = url::Url::parse(raw).with_context(|| format!("'{}' is not a URL", raw))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(anyhow::anyhow!("unsupported scheme '{}'", parsed.scheme()));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

/// Encode each `/`-separated segment of a resource path, keeping the separators
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Main GCP client
#[derive(Clone)]
pub struct GcpClient {
    pub credentials: GcpCredentials,
    pub http: GcpHttpClient,
    pub endpoints: Endpoints,
}

impl GcpClient {
    /// Create a new GCP client authenticated with Application Default Credentials
    pub async fn new(endpoints: Endpoints) -> Result<Self> {
        let credentials = GcpCredentials::new()
            .await
            .context("Failed to initialize GCP credentials")?;

        Self::with_credentials(credentials, endpoints)
    }

    /// Create a client from existing credentials
    pub fn with_credentials(credentials: GcpCredentials, endpoints: Endpoints) -> Result<Self> {
        let http = GcpHttpClient::new()?;

        Ok(Self {
            credentials,
            http,
            endpoints: endpoints.validated()?,
        })
    }

    /// Get the current access token
    pub async fn get_token(&self) -> Result<String> {
        self.credentials.get_token().await
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str) -> Result<Value> {
        let token = self.get_token().await?;
        self.http.get(url, &token).await
    }

    /// Upload UTF-8 text as a whole object, overwriting any existing one
    pub async fn upload_text(&self, bucket: &str, object_name: &str, text: &str) -> Result<Value> {
        let token = self.get_token().await?;
        let url = self.storage_upload_url(bucket);
        self.http
            .upload(
                &url,
                &token,
                object_name,
                "text/plain; charset=utf-8",
                text.as_bytes().to_vec(),
            )
            .await
    }

    // =========================================================================
    // Cloud Storage API helpers
    // =========================================================================

    /// Build Cloud Storage API URL
    pub fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1/{}", self.endpoints.storage, path)
    }

    /// Build Cloud Storage bucket URL
    pub fn storage_bucket_url(&self, bucket: &str) -> String {
        self.storage_url(&format!("b/{}", urlencoding::encode(bucket)))
    }

    /// Build Cloud Storage media upload URL
    pub fn storage_upload_url(&self, bucket: &str) -> String {
        format!(
            "{}/upload/storage/v1/b/{}/o",
            self.endpoints.storage,
            urlencoding::encode(bucket)
        )
    }

    // =========================================================================
    // Cloud Functions API helpers
    // =========================================================================

    /// Build Cloud Functions (v1) URL for a fully qualified function name
    pub fn function_url(&self, name: &str) -> String {
        format!("{}/v1/{}", self.endpoints.functions, encode_path(name))
    }

    // =========================================================================
    // Pub/Sub API helpers
    // =========================================================================

    /// Build Pub/Sub (v1) URL for a fully qualified topic name
    pub fn pubsub_topic_url(&self, topic: &str) -> String {
        format!("{}/v1/{}", self.endpoints.pubsub, encode_path(topic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> GcpClient {
        GcpClient::with_credentials(
            GcpCredentials::from_static_token("test-token"),
            Endpoints::single(base),
        )
        .unwrap()
    }

    #[test]
    fn test_default_endpoints_are_google_apis() {
        let endpoints = Endpoints::default().validated().unwrap();
        assert_eq!(endpoints.storage, "https://storage.googleapis.com");
        assert_eq!(endpoints.functions, "https://cloudfunctions.googleapis.com");
        assert_eq!(endpoints.pubsub, "https://pubsub.googleapis.com");
    }

    #[test]
    fn test_invalid_endpoint_is_rejected() {
        assert!(Endpoints::single("not a url").validated().is_err());
        assert!(Endpoints::single("ftp://example.com").validated().is_err());
    }

    #[test]
    fn test_url_builders() {
        let client = client("http://localhost:8080/");
        assert_eq!(
            client.storage_bucket_url("my-bucket"),
            "http://localhost:8080/storage/v1/b/my-bucket"
        );
        assert_eq!(
            client.storage_upload_url("out"),
            "http://localhost:8080/upload/storage/v1/b/out/o"
        );
        assert_eq!(
            client.function_url("projects/p/locations/us-central1/functions/fn"),
            "http://localhost:8080/v1/projects/p/locations/us-central1/functions/fn"
        );
        assert_eq!(
            client.pubsub_topic_url("projects/p1/topics/t"),
            "http://localhost:8080/v1/projects/p1/topics/t"
        );
    }

    #[test]
    fn test_path_segments_are_encoded() {
        assert_eq!(encode_path("projects/p 1/topics/a?b"), "projects/p%201/topics/a%3Fb");
    }
}
