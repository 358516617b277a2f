//! The capability set every adapter exposes to the core (§4.2). The core
//! treats adapters as black boxes; only this trait and the types in
//! `types`/`failure` are part of its contract.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::failure::UpstreamFailure;
use crate::types::{EventStream, RawByteStream, UpstreamHttpRequest, UpstreamHttpResponse};

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("request does not match this adapter's wire shape")]
    UnsupportedRequest,
    #[error("could not convert upstream response: {0}")]
    FormatConversion(String),
}

/// One adapter per (client-format, provider-type) pair (§4.2).
#[async_trait]
pub trait Adapter: Send + Sync {
    fn name(&self) -> &'static str;

    fn is_streaming(&self, client_request: &Value) -> bool;

    fn translate_request(&self, client_request: &Value) -> Result<UpstreamHttpRequest, AdapterError>;

    fn translate_response(&self, upstream_response: &Value) -> Result<Value, AdapterError>;

    /// Consumes a raw upstream byte stream and produces client-facing
    /// events: pass-through bytes, usage notifications, and terminal
    /// classified errors (§4.2). Runs as a background task feeding the
    /// returned receiver.
    fn stream_transform(&self, upstream: RawByteStream) -> EventStream;
}

/// Abstraction over the outbound HTTP stack so the Retry Executor depends
/// only on first-byte/idle timeouts and a byte stream, never a concrete
/// HTTP client (§10.7).
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn dispatch(
        &self,
        request: UpstreamHttpRequest,
        first_byte_timeout: Duration,
    ) -> Result<UpstreamHttpResponse, UpstreamFailure>;
}
