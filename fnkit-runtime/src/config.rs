//! Process-wide runtime configuration
//!
//! Read once at startup and threaded explicitly into the server,
//! never captured through module-level state. The per-invocation
//! context borrows its config snapshot from here, so the environment
//! is not re-read mid-invocation.

use std::collections::HashMap;
use thiserror::Error;

const DEFAULT_LISTENER: &str = "127.0.0.1:8080";
const DEFAULT_FORMAT: &str = "http-stream";

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("required environment variable {0} is unset or empty")]
    MissingEnv(&'static str),
}

/// Identity and settings the hosting platform hands a function
/// process through its environment.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// ID of the application this function belongs to (`FN_APP_ID`).
    pub app_id: String,
    /// ID of this function (`FN_FN_ID`).
    pub fn_id: String,
    /// Communication format token (`FN_FORMAT`).
    pub format: String,
    /// Address the invoke endpoint binds to (`FN_LISTENER`).
    pub listener: String,
    /// Environment snapshot exposed to handlers as invocation config.
    pub config: HashMap<String, String>,
}

impl RuntimeConfig {
    /// Load from the process environment.
    ///
    /// Fails when an identifier variable is unset or empty; the
    /// platform supplying them is part of its contract.
    pub fn from_env() -> Result<Self, RuntimeError> {
        let config: HashMap<String, String> = std::env::vars().collect();

        Ok(Self {
            app_id: require(&config, "FN_APP_ID")?,
            fn_id: require(&config, "FN_FN_ID")?,
            format: lookup(&config, "FN_FORMAT", DEFAULT_FORMAT),
            listener: lookup(&config, "FN_LISTENER", DEFAULT_LISTENER),
            config,
        })
    }
}

fn require(env: &HashMap<String, String>, key: &'static str) -> Result<String, RuntimeError> {
    match env.get(key) {
        Some(v) if !v.is_empty() => Ok(v.clone()),
        _ => Err(RuntimeError::MissingEnv(key)),
    }
}

fn lookup(env: &HashMap<String, String>, key: &str, default: &str) -> String {
    match env.get(key) {
        Some(v) if !v.is_empty() => v.clone(),
        _ => default.to_string(),
    }
}
