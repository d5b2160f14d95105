//! The classic runtime-context sample functions
//!
//! Three small handlers over the invocation context: dump everything,
//! dump the config map, extract a fixed set of database settings.
//! All three respond with canonical JSON.

use bytes::Bytes;
use serde_json::json;
use std::collections::HashMap;
use tracing::{info, warn};

use fnkit_core::{InvocationContext, ResponseEnvelope};
use fnkit_runtime::HandlerResult;

/// Keys the database samples expect in app or function config.
const DB_KEYS: [&str; 3] = ["DB_HOST_URL", "DB_USER", "DB_PASSWD"];

/// Dump every context accessor into one JSON object.
pub async fn print_all(ctx: InvocationContext, _body: Bytes) -> HandlerResult {
    info!("print all context fields");

    let headers: HashMap<String, Vec<String>> = ctx
        .headers()
        .keys()
        .map(|name| {
            let values = ctx
                .headers()
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .map(str::to_string)
                .collect();
            (name.to_string(), values)
        })
        .collect();

    let payload = json!({
        "config": ctx.config(),
        "headers": headers,
        "app_id": ctx.app_id(),
        "fn_id": ctx.fn_id(),
        "call_id": ctx.call_id(),
        "format": ctx.format().as_str(),
        "deadline": ctx.deadline().to_rfc3339(),
        "request_url": ctx.request_url(),
        "method": ctx.method(),
    });

    Ok(ResponseEnvelope::from_payload(payload)?.header("Content-Type", "application/json"))
}

/// Dump the configuration visible to this invocation.
///
/// An empty config map is a valid result, not an error.
pub async fn print_env(ctx: InvocationContext, _body: Bytes) -> HandlerResult {
    info!("print all config entries");

    Ok(ResponseEnvelope::from_payload(ctx.config())?.header("Content-Type", "application/json"))
}

/// Extract the three database settings from config.
///
/// A missing key is a handler-level failure: it becomes an explicit
/// error payload with status 500, still routed through the envelope.
pub async fn print_three(ctx: InvocationContext, _body: Bytes) -> HandlerResult {
    info!("print three database config entries");

    let mut extracted = HashMap::new();
    for key in DB_KEYS {
        match ctx.config().get(key) {
            Some(value) => {
                extracted.insert(key, value.clone());
            }
            None => {
                warn!(key, "required config key missing");
                let envelope =
                    ResponseEnvelope::from_payload(json!({"error": format!("missing config key {key}")}))?
                        .header("Content-Type", "application/json")
                        .status(500);
                return Ok(envelope);
            }
        }
    }

    Ok(ResponseEnvelope::from_payload(extracted)?.header("Content-Type", "application/json"))
}
