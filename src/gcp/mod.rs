//! GCP API interaction module
//!
//! This module provides the core functionality for talking to the Google
//! Cloud APIs the exporter depends on: authentication, the HTTP client,
//! and URL builders for Cloud Storage, Cloud Functions and Pub/Sub.
//!
//! # Module Structure
//!
//! - [`auth`] - GCP authentication using Application Default Credentials
//! - [`client`] - Main GCP client for making API requests
//! - [`http`] - HTTP utilities for REST API calls
//!
//! # Example
//!
//! ```ignore
//! use tfrec::gcp::client::{Endpoints, GcpClient};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = GcpClient::new(Endpoints::default()).await?;
//!     let bucket = client.get(&client.storage_bucket_url("my-bucket")).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod http;
