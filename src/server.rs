//! Pub/Sub push endpoint
//!
//! `POST /` accepts a push delivery and runs the export pipeline. A 2xx
//! response acknowledges the message; anything else lets Pub/Sub redeliver.

use crate::error::ExportError;
use crate::event::Envelope;
use crate::pipeline::Exporter;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;

pub fn router(exporter: Arc<Exporter>) -> Router {
    Router::new()
        .route("/", post(handle_push))
        .route("/healthz", get(health_check))
        .with_state(exporter)
}

/// Serve until the process is stopped
pub async fn serve(exporter: Arc<Exporter>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        tracing::error!("Failed to bind to {}: {}", addr, e);
        anyhow::anyhow!("Failed to bind to {}: {}", addr, e)
    })?;

    tracing::info!("Listening for push deliveries on {}", addr);
    axum::serve(listener, router(exporter)).await?;
    Ok(())
}

async fn health_check() -> &'static str {
    "ok"
}

async fn handle_push(State(exporter): State<Arc<Exporter>>, body: Bytes) -> Response {
    let envelope = match Envelope::from_json_slice(&body) {
        Ok(envelope) => envelope,
        Err(e) => return error_response(&e),
    };

    match exporter.handle_envelope(&envelope).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Map an export failure to the status returned to Pub/Sub
pub fn status_for(error: &ExportError) -> StatusCode {
    if error.is_permanent() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn error_response(error: &ExportError) -> Response {
    let status = status_for(error);
    tracing::warn!("Rejecting delivery with {}: {}", status, error);
    (status, error.to_string()).into_response()
}
