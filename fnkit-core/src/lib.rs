//! Core types for fnkit
//!
//! Provides the per-invocation context facade and the response
//! envelope that function handlers build their results with.

pub mod context;
pub mod error;
pub mod response;

pub use context::{ContextBuilder, Format, InvocationContext};
pub use error::{ContextError, ResponseError};
pub use response::{ResponseEnvelope, SerializedResponse};
