//! Wire-level shapes the dispatch pipeline deals with (§4.2, §10.7). These
//! are intentionally format-agnostic: per-vendor adapters translate into
//! and out of these, but the core never inspects vendor-specific shapes.

use bytes::Bytes;
use polyroute_model::{ErrorKind, Usage};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

pub type Headers = Vec<(String, String)>;

pub fn header_get<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// A raw byte stream from the upstream transport, fed into `stream_transform`.
pub type RawByteStream = mpsc::Receiver<Bytes>;

/// What `stream_transform` emits for the Retry Executor to forward or act on
/// (§4.2, §4.3): forwardable bytes, a usage notification carried alongside
/// them, or a terminal classified error.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    Bytes(Bytes),
    Usage(Usage),
    Error(ErrorKind),
}

pub type EventStream = mpsc::Receiver<StreamEvent>;

#[derive(Debug)]
pub enum UpstreamBody {
    Bytes(Bytes),
    Stream(RawByteStream),
}

#[derive(Debug)]
pub struct UpstreamHttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Headers,
    pub body: Option<Bytes>,
    pub is_stream: bool,
}

#[derive(Debug)]
pub struct UpstreamHttpResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: UpstreamBody,
}
