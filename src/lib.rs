//! Export GCP resources described by audit-log events as Terraform declarations.
//!
//! An audit-log entry arrives wrapped in a Pub/Sub message. The exporter
//! decodes it, works out which resource it talks about, fetches that
//! resource's live configuration, renders it as HCL and stores the result
//! at `records/<kind>/<name>.tf` in the output bucket.

pub mod config;
pub mod error;
pub mod event;
pub mod gcp;
pub mod pipeline;
pub mod resource;
pub mod server;
pub mod sink;

pub use error::{ExportError, Result};
pub use pipeline::{ExportOutcome, Exporter};
