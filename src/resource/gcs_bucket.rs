//! Cloud Storage buckets

use crate::gcp::client::GcpClient;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};

pub const TEMPLATE: &str = r#"resource "google_storage_bucket" "{{label}}" {
  name = "{{name}}"
  location = "{{location}}"
  force_destroy = true
  storage_class = "{{storage_class}}"
}
"#;

/// Subset of the Cloud Storage bucket resource that gets exported
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketConfig {
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub storage_class: String,
}

/// Fetch a bucket by its bare name
pub async fn fetch(client: &GcpClient, bucket: &str) -> Result<BucketConfig> {
    let response = client.get(&client.storage_bucket_url(bucket)).await?;
    serde_json::from_value(response).context("Unexpected bucket response")
}

pub fn template_data(label: &str, config: &BucketConfig) -> Value {
    json!({
        "label": label,
        "name": config.name,
        "location": config.location,
        "storage_class": config.storage_class,
    })
}
