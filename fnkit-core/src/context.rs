//! Per-invocation context facade
//!
//! The hosting runtime assembles an [`InvocationContext`] once per
//! invocation from its own wire metadata and hands it to handler
//! logic. Every field is validated at construction; accessors are
//! infallible, side-effect-free reads of an immutable snapshot.

use chrono::{DateTime, Utc};
use http::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;

use crate::error::ContextError;

/// Payload framing negotiated between the runtime and the function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// HTTP request/response framing over the runtime socket.
    HttpStream,
    /// Bare JSON envelopes.
    Json,
    /// Runtime default framing.
    Default,
}

impl Format {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "http-stream" => Some(Self::HttpStream),
            "json" => Some(Self::Json),
            "default" => Some(Self::Default),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HttpStream => "http-stream",
            Self::Json => "json",
            Self::Default => "default",
        }
    }
}

/// Read-only metadata for one invocation.
///
/// Fixed at construction for the lifetime of the invocation; never
/// shared across invocations and never mutated by handler logic.
#[derive(Debug, Clone)]
pub struct InvocationContext {
    config: HashMap<String, String>,
    headers: HeaderMap,
    app_id: String,
    fn_id: String,
    call_id: String,
    format: Format,
    deadline: DateTime<Utc>,
    request_url: String,
    method: String,
}

impl InvocationContext {
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// Configuration visible to this invocation.
    ///
    /// A stable snapshot: repeated calls return the same mapping, the
    /// underlying environment is not re-read mid-invocation. Missing
    /// keys are the caller's business; lookup never fails here.
    pub fn config(&self) -> &HashMap<String, String> {
        &self.config
    }

    /// HTTP headers as received. Name lookup is case-insensitive.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// First value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// ID of the application this function belongs to.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// ID of the function being invoked.
    pub fn fn_id(&self) -> &str {
        &self.fn_id
    }

    /// ID assigned to this invocation by the runtime.
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Communication format negotiated with the runtime.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Instant after which execution should be abandoned.
    ///
    /// Informational only: enforcement is the runtime's job, the
    /// context imposes no timeout of its own.
    pub fn deadline(&self) -> DateTime<Utc> {
        self.deadline
    }

    /// URL used to invoke the function.
    pub fn request_url(&self) -> &str {
        &self.request_url
    }

    /// HTTP method of the triggering request.
    pub fn method(&self) -> &str {
        &self.method
    }
}

/// Builder used by the runtime boundary to assemble a context.
///
/// `build` performs all validation, so a missing identifier surfaces
/// as [`ContextError::NotAvailable`] at construction rather than on
/// first access inside handler logic.
#[derive(Debug, Default)]
pub struct ContextBuilder {
    config: HashMap<String, String>,
    headers: Vec<(String, String)>,
    app_id: Option<String>,
    fn_id: Option<String>,
    call_id: Option<String>,
    format: Option<String>,
    deadline: Option<String>,
    request_url: Option<String>,
    method: Option<String>,
}

impl ContextBuilder {
    /// Replace the configuration snapshot wholesale.
    pub fn config(mut self, config: HashMap<String, String>) -> Self {
        self.config = config;
        self
    }

    /// Merge application-level and function-level configuration.
    ///
    /// Function-level settings win on key collision.
    pub fn merge_config(
        mut self,
        app: HashMap<String, String>,
        function: HashMap<String, String>,
    ) -> Self {
        self.config.extend(app);
        self.config.extend(function);
        self
    }

    pub fn config_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Append a header as received from the caller. Repeated names
    /// accumulate as a multi-valued entry.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn app_id(mut self, id: impl Into<String>) -> Self {
        self.app_id = Some(id.into());
        self
    }

    pub fn fn_id(mut self, id: impl Into<String>) -> Self {
        self.fn_id = Some(id.into());
        self
    }

    pub fn call_id(mut self, id: impl Into<String>) -> Self {
        self.call_id = Some(id.into());
        self
    }

    /// Format token as supplied by the runtime, e.g. "http-stream".
    pub fn format(mut self, token: impl Into<String>) -> Self {
        self.format = Some(token.into());
        self
    }

    /// Deadline as supplied by the runtime: RFC 3339 or epoch seconds.
    pub fn deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }

    pub fn request_url(mut self, url: impl Into<String>) -> Self {
        self.request_url = Some(url.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Validate the collected metadata and freeze it into a context.
    pub fn build(self) -> Result<InvocationContext, ContextError> {
        let app_id = required(self.app_id, "app_id")?;
        let fn_id = required(self.fn_id, "fn_id")?;
        let call_id = required(self.call_id, "call_id")?;

        let format = match self.format.as_deref() {
            None => Format::Default,
            Some(token) => Format::from_str(token)
                .ok_or_else(|| ContextError::Malformed(format!("unknown format token: {token}")))?,
        };

        let deadline = match self.deadline {
            Some(raw) => parse_deadline(&raw)?,
            None => {
                return Err(ContextError::Malformed(
                    "deadline not supplied by runtime".to_string(),
                ))
            }
        };

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ContextError::Malformed(format!("invalid header name: {name}")))?;
            let value = HeaderValue::from_str(&value).map_err(|_| {
                ContextError::Malformed(format!("invalid value for header {name}"))
            })?;
            headers.append(name, value);
        }

        Ok(InvocationContext {
            config: self.config,
            headers,
            app_id,
            fn_id,
            call_id,
            format,
            deadline,
            request_url: self.request_url.unwrap_or_default(),
            method: self.method.unwrap_or_default(),
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ContextError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ContextError::NotAvailable(field)),
    }
}

fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, ContextError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    // Some runtimes hand out epoch seconds instead of RFC 3339
    if let Ok(secs) = raw.parse::<i64>() {
        if let Some(ts) = DateTime::from_timestamp(secs, 0) {
            return Ok(ts);
        }
    }

    Err(ContextError::Malformed(format!(
        "deadline is not a timestamp: {raw}"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_builder() -> ContextBuilder {
        InvocationContext::builder()
            .app_id("app-01")
            .fn_id("fn-01")
            .call_id("call-01")
            .format("http-stream")
            .deadline("2024-06-01T12:00:00Z")
            .request_url("http://localhost:8080/invoke/fn-01")
            .method("POST")
    }

    #[test]
    fn test_accessors_return_construction_values() {
        let ctx = base_builder()
            .config_entry("DB_HOST_URL", "db.example.com")
            .build()
            .unwrap();

        assert_eq!(ctx.app_id(), "app-01");
        assert_eq!(ctx.fn_id(), "fn-01");
        assert_eq!(ctx.call_id(), "call-01");
        assert_eq!(ctx.format(), Format::HttpStream);
        assert_eq!(ctx.method(), "POST");
        assert_eq!(ctx.request_url(), "http://localhost:8080/invoke/fn-01");
        assert_eq!(ctx.deadline().to_rfc3339(), "2024-06-01T12:00:00+00:00");
    }

    #[test]
    fn test_config_snapshot_is_stable() {
        let mut config = HashMap::new();
        config.insert("A".to_string(), "1".to_string());
        config.insert("B".to_string(), "2".to_string());

        let ctx = base_builder().config(config.clone()).build().unwrap();

        // No key loss, no key addition, on every call
        assert_eq!(ctx.config(), &config);
        assert_eq!(ctx.config(), &config);
    }

    #[test]
    fn test_function_config_wins_on_collision() {
        let mut app = HashMap::new();
        app.insert("SHARED".to_string(), "app".to_string());
        app.insert("APP_ONLY".to_string(), "a".to_string());

        let mut function = HashMap::new();
        function.insert("SHARED".to_string(), "fn".to_string());

        let ctx = base_builder().merge_config(app, function).build().unwrap();

        assert_eq!(ctx.config().get("SHARED").map(String::as_str), Some("fn"));
        assert_eq!(ctx.config().get("APP_ONLY").map(String::as_str), Some("a"));
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let ctx = base_builder()
            .header("Content-Type", "application/json")
            .build()
            .unwrap();

        assert_eq!(ctx.header("content-type"), Some("application/json"));
        assert_eq!(ctx.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(ctx.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_repeated_header_is_multi_valued() {
        let ctx = base_builder()
            .header("Accept", "text/plain")
            .header("accept", "application/json")
            .build()
            .unwrap();

        let values: Vec<_> = ctx.headers().get_all("Accept").iter().collect();
        assert_eq!(values.len(), 2);
        // Single-value accessor returns the first
        assert_eq!(ctx.header("Accept"), Some("text/plain"));
    }

    #[test]
    fn test_missing_call_id_fails_at_construction() {
        let err = InvocationContext::builder()
            .app_id("app-01")
            .fn_id("fn-01")
            .deadline("2024-06-01T12:00:00Z")
            .build()
            .unwrap_err();

        assert!(matches!(err, ContextError::NotAvailable("call_id")));
    }

    #[test]
    fn test_empty_identifier_counts_as_missing() {
        let err = base_builder().app_id("").build().unwrap_err();
        assert!(matches!(err, ContextError::NotAvailable("app_id")));
    }

    #[test]
    fn test_unknown_format_token_is_malformed() {
        let err = base_builder().format("carrier-pigeon").build().unwrap_err();
        assert!(matches!(err, ContextError::Malformed(_)));
    }

    #[test]
    fn test_epoch_deadline_accepted() {
        let ctx = base_builder().deadline("1717243200").build().unwrap();
        assert_eq!(ctx.deadline().timestamp(), 1_717_243_200);
    }

    #[test]
    fn test_garbage_deadline_is_malformed() {
        let err = base_builder().deadline("soonish").build().unwrap_err();
        assert!(matches!(err, ContextError::Malformed(_)));
    }

    #[test]
    fn test_invalid_header_name_is_malformed() {
        let err = base_builder().header("bad name\n", "x").build().unwrap_err();
        assert!(matches!(err, ContextError::Malformed(_)));
    }
}
