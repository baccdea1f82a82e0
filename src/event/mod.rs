//! Inbound events
//!
//! - [`envelope`] - Pub/Sub envelope and push request decoding
//! - [`classify`] - Mapping a decoded log entry to a resource kind and identifier

pub mod classify;
pub mod envelope;

pub use classify::{classify, Classification, ResourceKind};
pub use envelope::{Envelope, LogEntry, PushRequest};
