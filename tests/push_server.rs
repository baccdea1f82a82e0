//! Push endpoint tests: the axum router runs on an ephemeral port and
//! GCP is mocked with wiremock.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tfrec::gcp::auth::GcpCredentials;
use tfrec::gcp::client::{Endpoints, GcpClient};
use tfrec::server::router;
use tfrec::sink::Sink;
use tfrec::Exporter;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn spawn_server(gcp: &MockServer) -> SocketAddr {
    let client = GcpClient::with_credentials(
        GcpCredentials::from_static_token("test-token"),
        Endpoints::single(&gcp.uri()),
    )
    .unwrap();
    let exporter = Arc::new(Exporter::new(client.clone(), Sink::gcs(client, "out")).unwrap());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(exporter)).await.unwrap();
    });
    addr
}

fn push_body(entry: &Value) -> Value {
    json!({
        "message": {
            "data": STANDARD.encode(entry.to_string()),
            "messageId": "1",
            "publishTime": "2024-05-01T10:00:00Z"
        },
        "subscription": "projects/p1/subscriptions/tfrec-push"
    })
}

#[tokio::test]
async fn test_health_check() {
    let gcp = MockServer::start().await;
    let addr = spawn_server(&gcp).await;

    let body = reqwest::get(format!("http://{}/healthz", addr))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_push_delivery_is_acknowledged() {
    let gcp = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/projects/p1/topics/test-topic"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"name": "projects/p1/topics/test-topic"})),
        )
        .mount(&gcp)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload/storage/v1/b/out/o"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "x"})))
        .expect(1)
        .mount(&gcp)
        .await;

    let addr = spawn_server(&gcp).await;
    let entry = json!({
        "resource": {"type": "pubsub_topic"},
        "protoPayload": {"resourceName": "projects/p1/topics/test-topic"}
    });

    let response = reqwest::Client::new()
        .post(format!("http://{}/", addr))
        .json(&push_body(&entry))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let outcome: Value = response.json().await.unwrap();
    assert_eq!(outcome["kind"], "pubsub_topic");
    assert_eq!(outcome["path"], "records/pubsub_topic/test-topic.tf");
}

#[tokio::test]
async fn test_malformed_delivery_is_rejected_with_400() {
    let gcp = MockServer::start().await;
    let addr = spawn_server(&gcp).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/", addr))
        .json(&json!({"message": {"attributes": {}}}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert!(response.text().await.unwrap().contains("no data"));
}

#[tokio::test]
async fn test_fetch_failure_is_500_for_redelivery() {
    let gcp = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/storage/v1/b/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&gcp)
        .await;

    let addr = spawn_server(&gcp).await;
    let entry = json!({
        "resource": {"type": "gcs_bucket"},
        "protoPayload": {"resourceName": "projects/_/buckets/flaky"}
    });

    let response = reqwest::Client::new()
        .post(format!("http://{}/", addr))
        .json(&push_body(&entry))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
}
