//! Runtime boundary for fnkit
//!
//! Hosts a single function handler behind an Fn-style HTTP invoke
//! endpoint: per request it assembles an immutable invocation
//! context, runs the handler, and transmits the serialized response
//! envelope back to the caller.

pub mod config;
pub mod handler;
pub mod server;

pub use config::{RuntimeConfig, RuntimeError};
pub use handler::{Handler, HandlerResult};
pub use server::{invoke_router, serve, RuntimeState};
