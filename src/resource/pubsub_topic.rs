//! Pub/Sub topics

use crate::gcp::client::GcpClient;
use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};

pub const TEMPLATE: &str = r#"resource "google_pubsub_topic" "{{label}}" {
  name = "{{name}}"
}
"#;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TopicConfig {
    pub name: String,
}

/// Fetch a topic by its fully qualified name (`projects/<p>/topics/<name>`)
pub async fn fetch(client: &GcpClient, topic: &str) -> Result<TopicConfig> {
    let response = client.get(&client.pubsub_topic_url(topic)).await?;
    serde_json::from_value(response).context("Unexpected topic response")
}

pub fn template_data(label: &str, config: &TopicConfig) -> Value {
    json!({
        "label": label,
        "name": config.name,
    })
}
