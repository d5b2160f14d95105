//! Fn-style HTTP invoke endpoint
//!
//! One route, `POST /call`. The platform's wire metadata rides in on
//! `Fn-*` headers: `Fn-Call-Id` and `Fn-Deadline` per call, caller
//! headers prefixed `Fn-Http-H-`, the original method and URL in
//! `Fn-Http-Method` / `Fn-Http-Request-Url`. Responses go back as
//! plain HTTP with the envelope's status and headers.

use axum::{
    body::Body,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use bytes::Bytes;
use http::StatusCode;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info};

use fnkit_core::{ContextError, InvocationContext};

use crate::config::RuntimeConfig;
use crate::handler::Handler;

const CALL_ID_HEADER: &str = "fn-call-id";
const DEADLINE_HEADER: &str = "fn-deadline";
const METHOD_HEADER: &str = "fn-http-method";
const REQUEST_URL_HEADER: &str = "fn-http-request-url";
const CALLER_HEADER_PREFIX: &str = "fn-http-h-";

/// Shared state for the invoke endpoint: the process-wide config and
/// the single hosted handler.
pub struct RuntimeState {
    pub config: RuntimeConfig,
    pub handler: Arc<dyn Handler>,
}

impl RuntimeState {
    pub fn new(config: RuntimeConfig, handler: impl Handler) -> Self {
        Self {
            config,
            handler: Arc::new(handler),
        }
    }
}

/// Create the invoke router.
pub fn invoke_router(state: Arc<RuntimeState>) -> Router {
    Router::new().route("/call", post(invoke)).with_state(state)
}

/// Bind the listener from the config and serve the handler until the
/// process is stopped.
pub async fn serve(config: RuntimeConfig, handler: impl Handler) -> anyhow::Result<()> {
    let addr: SocketAddr = config.listener.parse()?;
    let state = Arc::new(RuntimeState::new(config, handler));
    let app = invoke_router(state);

    info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// POST /call
///
/// Builds the invocation context, runs the handler, transmits the
/// serialized envelope. Context and handler failures are terminal for
/// the invocation: the caller gets a generic failure body, the detail
/// only goes to the log.
async fn invoke(
    State(state): State<Arc<RuntimeState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = match build_context(&state.config, &headers) {
        Ok(ctx) => ctx,
        Err(err) => {
            error!(error = %err, "rejecting invocation: malformed context");
            return (StatusCode::BAD_GATEWAY, "invocation failed\n").into_response();
        }
    };

    debug!(call_id = %ctx.call_id(), "dispatching invocation");

    let envelope = match state.handler.handle(ctx, body).await {
        Ok(envelope) => envelope,
        Err(err) => {
            error!(error = %err, "handler failed");
            return generic_failure();
        }
    };

    let serialized = match envelope.build() {
        Ok(serialized) => serialized,
        Err(err) => {
            error!(error = %err, "response serialization failed");
            return generic_failure();
        }
    };

    let mut response = Response::new(Body::from(serialized.body));
    *response.status_mut() = serialized.status;
    *response.headers_mut() = serialized.headers;
    response
}

/// Assemble the per-invocation context from process config plus the
/// `Fn-*` request headers.
fn build_context(
    config: &RuntimeConfig,
    headers: &HeaderMap,
) -> Result<InvocationContext, ContextError> {
    let mut builder = InvocationContext::builder()
        .config(config.config.clone())
        .app_id(&config.app_id)
        .fn_id(&config.fn_id)
        .format(&config.format);

    if let Some(call_id) = header_str(headers, CALL_ID_HEADER)? {
        builder = builder.call_id(call_id);
    }
    if let Some(deadline) = header_str(headers, DEADLINE_HEADER)? {
        builder = builder.deadline(deadline);
    }
    if let Some(method) = header_str(headers, METHOD_HEADER)? {
        builder = builder.method(method);
    }
    if let Some(url) = header_str(headers, REQUEST_URL_HEADER)? {
        builder = builder.request_url(url);
    }

    // Caller headers arrive prefixed; strip the prefix before they
    // reach handler logic.
    for (name, value) in headers {
        if let Some(original) = name.as_str().strip_prefix(CALLER_HEADER_PREFIX) {
            let value = value.to_str().map_err(|_| {
                ContextError::Malformed(format!("non-UTF8 value for header {original}"))
            })?;
            builder = builder.header(original, value);
        }
    }

    builder.build()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ContextError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(Some)
            .map_err(|_| ContextError::Malformed(format!("non-UTF8 value for header {name}"))),
    }
}

fn generic_failure() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        [("content-type", "application/json")],
        r#"{"message": "function error"}"#,
    )
        .into_response()
}
