//! Terraform rendering
//!
//! Each kind has a handlebars template. Interpolated values pass through
//! [`escape_hcl`], registered as the template escape function, so a quote
//! or newline in a fetched field cannot break out of its string literal.

use super::{
    cloud_function, gcs_bucket, pubsub_topic, Configuration, RenderedArtifact,
    ResourceDescriptor,
};
use crate::error::{ExportError, Result};
use crate::event::ResourceKind;
use handlebars::Handlebars;
use std::fmt::Write;

fn template_for(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::GcsBucket => gcs_bucket::TEMPLATE,
        ResourceKind::CloudFunction => cloud_function::TEMPLATE,
        ResourceKind::PubsubTopic => pubsub_topic::TEMPLATE,
    }
}

/// Escape a value for use inside an HCL quoted string
pub fn escape_hcl(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // `${` and `%{` open template sequences; doubling the sigil makes them literal
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }

    out
}

/// Turn a short name into a valid Terraform resource label
pub fn resource_label(short_name: &str) -> String {
    let mut label: String = short_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let starts_ok = label
        .chars()
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if !starts_ok {
        label.insert(0, '_');
    }

    label
}

/// Renders resource descriptors into Terraform declarations
pub struct Renderer {
    registry: Handlebars<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(escape_hcl);

        for kind in ResourceKind::ALL {
            registry
                .register_template_string(kind.as_tag(), template_for(kind))
                .map_err(|e| {
                    ExportError::Render(format!("invalid {} template: {}", kind, e))
                })?;
        }

        Ok(Self { registry })
    }

    /// Render a descriptor. Output depends only on the descriptor.
    pub fn render(&self, descriptor: &ResourceDescriptor) -> Result<RenderedArtifact> {
        let config_kind = descriptor.configuration.kind();
        if config_kind != descriptor.kind {
            return Err(ExportError::Render(format!(
                "descriptor for {} carries a {} configuration",
                descriptor.kind, config_kind
            )));
        }

        let label = resource_label(&descriptor.short_name);
        let data = match &descriptor.configuration {
            Configuration::Bucket(config) => gcs_bucket::template_data(&label, config),
            Configuration::Function(config) => cloud_function::template_data(&label, config),
            Configuration::Topic(config) => pubsub_topic::template_data(&label, config),
        };

        let text = self
            .registry
            .render(descriptor.kind.as_tag(), &data)
            .map_err(|e| ExportError::Render(format!("{} template: {}", descriptor.kind, e)))?;

        Ok(RenderedArtifact::new(
            descriptor.kind,
            &descriptor.short_name,
            text,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::cloud_function::FunctionConfig;
    use crate::resource::gcs_bucket::BucketConfig;
    use crate::resource::pubsub_topic::TopicConfig;
    use serde_json::json;

    fn bucket_descriptor() -> ResourceDescriptor {
        ResourceDescriptor {
            kind: ResourceKind::GcsBucket,
            full_identifier: "projects/_/buckets/my-bucket".to_string(),
            short_name: "my-bucket".to_string(),
            configuration: Configuration::Bucket(BucketConfig {
                name: "my-bucket".to_string(),
                location: "US".to_string(),
                storage_class: "STANDARD".to_string(),
            }),
        }
    }

    fn function_descriptor(https_trigger: Option<serde_json::Value>) -> ResourceDescriptor {
        ResourceDescriptor {
            kind: ResourceKind::CloudFunction,
            full_identifier: "projects/p1/locations/us-central1/functions/test-fn".to_string(),
            short_name: "test-fn".to_string(),
            configuration: Configuration::Function(FunctionConfig {
                name: "projects/p1/locations/us-central1/functions/test-fn".to_string(),
                description: "Says \"hi\"\nthen ${leaves}".to_string(),
                runtime: "python311".to_string(),
                entry_point: "main".to_string(),
                https_trigger,
                available_memory_mb: 512,
            }),
        }
    }

    #[test]
    fn test_render_bucket() {
        let renderer = Renderer::new().unwrap();
        let artifact = renderer.render(&bucket_descriptor()).unwrap();

        assert_eq!(artifact.path, "records/gcs_bucket/my-bucket.tf");
        assert_eq!(
            artifact.text,
            "resource \"google_storage_bucket\" \"my-bucket\" {\n  name = \"my-bucket\"\n  location = \"US\"\n  force_destroy = true\n  storage_class = \"STANDARD\"\n}\n"
        );
    }

    #[test]
    fn test_render_function_escapes_description() {
        let renderer = Renderer::new().unwrap();
        let artifact = renderer
            .render(&function_descriptor(Some(json!({"url": "https://x"}))))
            .unwrap();

        assert!(artifact
            .text
            .contains(r#"description = "Says \"hi\"\nthen $${leaves}""#));
        assert!(artifact.text.contains("trigger_http = true\n"));
        assert!(artifact.text.contains("available_memory_mb = 512\n"));
        assert!(artifact
            .text
            .starts_with("resource \"google_cloudfunctions_function\" \"test-fn\" {"));
    }

    #[test]
    fn test_render_function_without_http_trigger() {
        let renderer = Renderer::new().unwrap();
        let artifact = renderer.render(&function_descriptor(None)).unwrap();
        assert!(artifact.text.contains("trigger_http = false\n"));
    }

    #[test]
    fn test_render_topic() {
        let renderer = Renderer::new().unwrap();
        let descriptor = ResourceDescriptor {
            kind: ResourceKind::PubsubTopic,
            full_identifier: "projects/p1/topics/test-topic".to_string(),
            short_name: "test-topic".to_string(),
            configuration: Configuration::Topic(TopicConfig {
                name: "projects/p1/topics/test-topic".to_string(),
            }),
        };
        let artifact = renderer.render(&descriptor).unwrap();
        assert_eq!(artifact.path, "records/pubsub_topic/test-topic.tf");
        assert_eq!(
            artifact.text,
            "resource \"google_pubsub_topic\" \"test-topic\" {\n  name = \"projects/p1/topics/test-topic\"\n}\n"
        );
    }

    #[test]
    fn test_mismatched_descriptor_is_rejected() {
        let renderer = Renderer::new().unwrap();
        let mut descriptor = bucket_descriptor();
        descriptor.kind = ResourceKind::PubsubTopic;
        assert!(matches!(
            renderer.render(&descriptor),
            Err(ExportError::Render(_))
        ));
    }

    #[test]
    fn test_escape_hcl() {
        assert_eq!(escape_hcl("plain"), "plain");
        assert_eq!(escape_hcl(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(escape_hcl("line\r\n\ttab"), "line\\r\\n\\ttab");
        assert_eq!(escape_hcl("${var} %{if}"), "$${var} %%{if}");
        assert_eq!(escape_hcl("$5 100%"), "$5 100%");
        assert_eq!(escape_hcl("\u{7}"), "\\u0007");
    }

    #[test]
    fn test_resource_label() {
        assert_eq!(resource_label("my-bucket"), "my-bucket");
        assert_eq!(resource_label("my.bucket.example.com"), "my_bucket_example_com");
        assert_eq!(resource_label("1st-bucket"), "_1st-bucket");
        assert_eq!(resource_label("_private"), "_private");
        assert_eq!(resource_label(""), "_");
    }
}
