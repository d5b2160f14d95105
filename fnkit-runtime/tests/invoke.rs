//! Invoke endpoint integration tests
//!
//! Drive the router directly with `tower::ServiceExt::oneshot`; no
//! live listener needed.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;

use fnkit_core::{InvocationContext, ResponseEnvelope};
use fnkit_runtime::{invoke_router, Handler, HandlerResult, RuntimeConfig, RuntimeState};

fn test_config() -> RuntimeConfig {
    let mut config = HashMap::new();
    config.insert("DB_HOST_URL".to_string(), "db.example.com".to_string());
    config.insert("DB_USER".to_string(), "u".to_string());
    config.insert("DB_PASSWD".to_string(), "p".to_string());

    RuntimeConfig {
        app_id: "app-01".to_string(),
        fn_id: "fn-01".to_string(),
        format: "http-stream".to_string(),
        listener: "127.0.0.1:0".to_string(),
        config,
    }
}

fn test_router(handler: impl Handler) -> axum::Router {
    invoke_router(Arc::new(RuntimeState::new(test_config(), handler)))
}

fn call_request() -> axum::http::request::Builder {
    Request::builder()
        .method("POST")
        .uri("/call")
        .header("Fn-Call-Id", "call-01")
        .header("Fn-Deadline", "2024-06-01T12:00:00Z")
        .header("Fn-Http-Method", "GET")
        .header("Fn-Http-Request-Url", "http://localhost:8080/t/echo")
}

async fn body_bytes(response: axum::response::Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

async fn echo_context(ctx: InvocationContext, _body: Bytes) -> HandlerResult {
    let envelope = ResponseEnvelope::from_payload(json!({
        "app_id": ctx.app_id(),
        "fn_id": ctx.fn_id(),
        "call_id": ctx.call_id(),
        "format": ctx.format().as_str(),
        "method": ctx.method(),
        "request_url": ctx.request_url(),
        "db_host": ctx.config().get("DB_HOST_URL"),
        "x_custom": ctx.header("X-Custom"),
    }))?
    .header("Content-Type", "application/json");

    Ok(envelope)
}

#[tokio::test]
async fn test_invoke_builds_context_from_wire_metadata() {
    let router = test_router(echo_context);
    let request = call_request()
        .header("Fn-Http-H-X-Custom", "abc")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );

    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["app_id"], "app-01");
    assert_eq!(body["fn_id"], "fn-01");
    assert_eq!(body["call_id"], "call-01");
    assert_eq!(body["format"], "http-stream");
    assert_eq!(body["method"], "GET");
    assert_eq!(body["request_url"], "http://localhost:8080/t/echo");
    assert_eq!(body["db_host"], "db.example.com");
    // Fn-Http-H- prefix stripped before handler logic sees the header
    assert_eq!(body["x_custom"], "abc");
}

#[tokio::test]
async fn test_missing_call_id_aborts_before_handler() {
    async fn must_not_run(_ctx: InvocationContext, _body: Bytes) -> HandlerResult {
        panic!("handler ran despite malformed context");
    }

    let router = test_router(must_not_run);
    let request = Request::builder()
        .method("POST")
        .uri("/call")
        .header("Fn-Deadline", "2024-06-01T12:00:00Z")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_handler_error_yields_generic_failure() {
    async fn broken(_ctx: InvocationContext, _body: Bytes) -> HandlerResult {
        Err(anyhow::anyhow!("db password was hunter2"))
    }

    let router = test_router(broken);
    let response = router
        .oneshot(call_request().body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    // Internal detail stays in the log, never in the response body
    let body = body_bytes(response).await;
    let text = std::str::from_utf8(&body).unwrap();
    assert!(!text.contains("hunter2"));
    assert_eq!(text, r#"{"message": "function error"}"#);
}

#[tokio::test]
async fn test_envelope_status_and_headers_transmitted() {
    async fn created(_ctx: InvocationContext, _body: Bytes) -> HandlerResult {
        let envelope = ResponseEnvelope::from_payload("made a thing")?
            .header("X-Build", "7")
            .status(201);
        Ok(envelope)
    }

    let router = test_router(created);
    let response = router
        .oneshot(call_request().body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers().get("X-Build").unwrap(), "7");
    assert_eq!(&body_bytes(response).await[..], b"made a thing");
}

#[tokio::test]
async fn test_request_body_reaches_handler() {
    async fn echo_body(_ctx: InvocationContext, body: Bytes) -> HandlerResult {
        let text = String::from_utf8(body.to_vec())?;
        Ok(ResponseEnvelope::from_payload(text)?)
    }

    let router = test_router(echo_body);
    let response = router
        .oneshot(call_request().body(Body::from("ping")).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], b"ping");
}
