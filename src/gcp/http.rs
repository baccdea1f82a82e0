//! HTTP utilities for GCP REST API calls

use anyhow::{Context, Result};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use thiserror::Error;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips non-printable characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Non-2xx response from a GCP API
#[derive(Debug, Error)]
#[error("API request failed: {status}")]
pub struct ApiError {
    pub status: StatusCode,
}

/// HTTP client wrapper for GCP API calls
#[derive(Clone)]
pub struct GcpHttpClient {
    client: Client,
}

impl GcpHttpClient {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("tfrec/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Make a GET request to a GCP API
    pub async fn get(&self, url: &str, token: &str) -> Result<Value> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .context("Failed to send request")?;

        let body = read_success_body(response).await?;
        serde_json::from_str(&body).context("Failed to parse response JSON")
    }

    /// Upload a whole object with a single media request, replacing any
    /// existing object at the same name
    pub async fn upload(
        &self,
        url: &str,
        token: &str,
        object_name: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<Value> {
        tracing::debug!("POST {} (name={}, {} bytes)", url, object_name, body.len());

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .query(&[("uploadType", "media"), ("name", object_name)])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await
            .context("Failed to send request")?;

        let response_body = read_success_body(response).await?;

        if response_body.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&response_body).context("Failed to parse response JSON")
    }
}

/// Read the body of a response, turning non-2xx statuses into errors
async fn read_success_body(response: Response) -> Result<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .context("Failed to read response body")?;

    if !status.is_success() {
        // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
        tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
        return Err(ApiError { status }.into());
    }

    Ok(body)
}

/// Format a GCP API error for display
/// Security: Sanitizes error messages to avoid leaking sensitive API details
///
/// The hint comes from the status of the first [`ApiError`] in the source
/// chain, never from the message text (which may embed resource names).
pub fn format_gcp_error(error: &(dyn std::error::Error + 'static)) -> String {
    let api_error = std::iter::successors(Some(error), |e| e.source())
        .find_map(|e| e.downcast_ref::<ApiError>());

    if let Some(api_error) = api_error {
        let hint = match api_error.status {
            StatusCode::FORBIDDEN => {
                "Permission denied. Check the service account's IAM permissions."
            }
            StatusCode::UNAUTHORIZED => {
                "Authentication failed. Run 'gcloud auth application-default login'."
            }
            StatusCode::NOT_FOUND => "Resource not found.",
            StatusCode::TOO_MANY_REQUESTS => "Rate limit exceeded. Please try again later.",
            StatusCode::BAD_REQUEST => "Invalid request. Check your parameters.",
            StatusCode::INTERNAL_SERVER_ERROR | StatusCode::SERVICE_UNAVAILABLE => {
                "GCP service temporarily unavailable. Please try again."
            }
            _ => "Request failed. Check your network connection and try again.",
        };
        return hint.to_string();
    }

    let error_str = error.to_string();
    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(80)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
