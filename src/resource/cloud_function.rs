//! Cloud Functions (1st gen)

use crate::gcp::client::GcpClient;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};

pub const TEMPLATE: &str = r#"resource "google_cloudfunctions_function" "{{label}}" {
  name = "{{name}}"
  description = "{{description}}"
  runtime = "{{runtime}}"
  entry_point = "{{entry_point}}"

  trigger_http = {{trigger_http}}
  available_memory_mb = {{available_memory_mb}}
}
"#;

/// Memory the Cloud Functions API assigns when none is requested
pub const DEFAULT_MEMORY_MB: u32 = 256;

fn default_memory_mb() -> u32 {
    DEFAULT_MEMORY_MB
}

/// Subset of the Cloud Functions v1 `CloudFunction` resource that gets exported
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub runtime: String,
    #[serde(default)]
    pub entry_point: String,
    /// Present only for HTTP-triggered functions
    #[serde(default)]
    pub https_trigger: Option<Value>,
    #[serde(default = "default_memory_mb")]
    pub available_memory_mb: u32,
}

impl FunctionConfig {
    pub fn is_http_triggered(&self) -> bool {
        self.https_trigger.is_some()
    }
}

/// Fetch a function by its fully qualified name
/// (`projects/<p>/locations/<region>/functions/<name>`)
pub async fn fetch(client: &GcpClient, name: &str) -> Result<FunctionConfig> {
    let response = client.get(&client.function_url(name)).await?;
    serde_json::from_value(response).context("Unexpected function response")
}

pub fn template_data(label: &str, config: &FunctionConfig) -> Value {
    json!({
        "label": label,
        "name": config.name,
        "description": config.description,
        "runtime": config.runtime,
        "entry_point": config.entry_point,
        "trigger_http": config.is_http_triggered(),
        "available_memory_mb": config.available_memory_mb,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_http_function() {
        let response = json!({
            "name": "projects/p1/locations/us-central1/functions/test-fn",
            "description": "exports things",
            "status": "ACTIVE",
            "entryPoint": "handler",
            "runtime": "python311",
            "availableMemoryMb": 512,
            "httpsTrigger": {"url": "https://us-central1-p1.cloudfunctions.net/test-fn"}
        });
        let config: FunctionConfig = serde_json::from_value(response).unwrap();
        assert!(config.is_http_triggered());
        assert_eq!(config.entry_point, "handler");
        assert_eq!(config.available_memory_mb, 512);
    }

    #[test]
    fn test_parse_event_function_defaults() {
        let response = json!({
            "name": "projects/p1/locations/us-central1/functions/on-upload",
            "runtime": "go121",
            "entryPoint": "OnUpload",
            "eventTrigger": {"eventType": "google.storage.object.finalize"}
        });
        let config: FunctionConfig = serde_json::from_value(response).unwrap();
        assert!(!config.is_http_triggered());
        assert_eq!(config.description, "");
        assert_eq!(config.available_memory_mb, DEFAULT_MEMORY_MB);
    }
}
