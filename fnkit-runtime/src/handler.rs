//! Handler trait for function logic

use async_trait::async_trait;
use bytes::Bytes;
use std::future::Future;

use fnkit_core::{InvocationContext, ResponseEnvelope};

/// What one invocation of handler logic produces.
///
/// Failure paths are explicit: a handler that cannot produce a result
/// returns an error here instead of leaving a half-built response
/// behind. The boundary converts it into a generic failure for the
/// caller and logs the detail.
pub type HandlerResult = Result<ResponseEnvelope, anyhow::Error>;

/// One function's business logic, invoked once per call.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn handle(&self, ctx: InvocationContext, body: Bytes) -> HandlerResult;
}

/// Plain async functions are handlers.
#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(InvocationContext, Bytes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send,
{
    async fn handle(&self, ctx: InvocationContext, body: Bytes) -> HandlerResult {
        self(ctx, body).await
    }
}
