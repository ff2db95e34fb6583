use std::time::Duration;

use serde_json::{json, Value};
use statement_relay::{build_app, retry::RetryPolicy, RelayConfig};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/test-model:generateContent";

fn config_for(upstream: &MockServer) -> RelayConfig {
    RelayConfig::default()
        .with_api_key("test-key")
        .with_model("test-model")
        .with_api_base(upstream.uri())
        .with_retry(RetryPolicy::new(3, Duration::from_millis(10), 1.5))
}

async fn start_relay(config: &RelayConfig) -> String {
    let app = build_app(config).expect("build app");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}")
}

async fn analyze(base: &str, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(format!("{base}/analyze-statement"))
        .json(&body)
        .send()
        .await
        .expect("send");
    let status = resp.status().as_u16();
    (status, resp.json().await.expect("json body"))
}

fn success_body() -> Value {
    json!({ "candidates": [{ "content": { "parts": [{ "text": "{\"transactions\":[]}" }] } }] })
}

#[tokio::test]
async fn relays_model_text_verbatim() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .expect(1)
        .mount(&upstream)
        .await;

    let base = start_relay(&config_for(&upstream)).await;
    let (status, body) = analyze(
        &base,
        json!({ "imageParts": [{ "data": "iVBORw0KGgo=", "mimeType": "image/png" }] }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body, json!({ "result": "{\"transactions\":[]}" }));
}

#[tokio::test]
async fn empty_list_never_reaches_upstream() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .expect(0)
        .mount(&upstream)
        .await;

    let base = start_relay(&config_for(&upstream)).await;
    let (status, body) = analyze(&base, json!({ "imageParts": [] })).await;

    assert_eq!(status, 400);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn two_overloads_then_success() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "error": { "code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE" }
        })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(success_body()))
        .expect(1)
        .mount(&upstream)
        .await;

    let base = start_relay(&config_for(&upstream)).await;
    let (status, body) = analyze(
        &base,
        json!({ "imageParts": [{ "inlineData": { "data": "JVBERi0=", "mimeType": "application/pdf" } }] }),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["result"], "{\"transactions\":[]}");
}

#[tokio::test]
async fn permanent_rejection_is_tried_once() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT" }
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let base = start_relay(&config_for(&upstream)).await;
    let (status, body) = analyze(
        &base,
        json!({ "imageParts": [{ "data": "iVBORw0KGgo=", "mimeType": "image/png" }] }),
    )
    .await;

    assert_eq!(status, 500);
    assert_eq!(body["code"], "upstream_rejected");
    assert!(!body["error"].as_str().unwrap().contains("API key"));
}
