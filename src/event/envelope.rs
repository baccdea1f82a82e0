//! Inbound Pub/Sub envelope decoding
//!
//! Accepts both the bare message shape delivered to background functions
//! (`{"data": "...", "attributes": {...}}`) and the push-subscription
//! wrapper (`{"message": {...}, "subscription": "..."}`).

use crate::error::{ExportError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// A single Pub/Sub message carrying an encoded audit-log entry
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Base64-encoded UTF-8 JSON
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub attributes: Option<HashMap<String, String>>,
    #[serde(default, alias = "message_id")]
    pub message_id: Option<String>,
}

/// Push-subscription request body
#[derive(Debug, Clone, Deserialize)]
pub struct PushRequest {
    pub message: Envelope,
    #[serde(default)]
    pub subscription: Option<String>,
}

/// Decoded audit-log entry
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry(pub Value);

impl LogEntry {
    /// Look up a non-empty string at a JSON pointer path
    pub fn str_at(&self, pointer: &str) -> Option<&str> {
        self.0
            .pointer(pointer)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

impl Envelope {
    /// Envelope around an already-serialized log entry
    pub fn from_entry(entry: &Value) -> Self {
        Self {
            data: Some(STANDARD.encode(entry.to_string())),
            ..Self::default()
        }
    }

    /// Parse either a bare message or a push request
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| ExportError::Decode(format!("envelope is not valid JSON: {}", e)))?;

        let is_push = value.get("message").map(Value::is_object).unwrap_or(false);
        if is_push {
            let push: PushRequest = serde_json::from_value(value)
                .map_err(|e| ExportError::Decode(format!("malformed push request: {}", e)))?;
            if let Some(subscription) = &push.subscription {
                tracing::debug!("Push delivery from {}", subscription);
            }
            return Ok(push.message);
        }

        serde_json::from_value(value)
            .map_err(|e| ExportError::Decode(format!("malformed envelope: {}", e)))
    }

    /// Decode the payload into a log entry
    pub fn decode(&self) -> Result<LogEntry> {
        let data = self
            .data
            .as_deref()
            .ok_or_else(|| ExportError::Decode("no data found in event".to_string()))?;

        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|e| ExportError::Decode(format!("data is not valid base64: {}", e)))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| ExportError::Decode(format!("data is not valid UTF-8: {}", e)))?;
        let value: Value = serde_json::from_str(&text)
            .map_err(|e| ExportError::Decode(format!("data is not valid JSON: {}", e)))?;

        if !value.is_object() {
            return Err(ExportError::Decode(
                "log entry must be a JSON object".to_string(),
            ));
        }

        Ok(LogEntry(value))
    }
}
