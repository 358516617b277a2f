//! One reference adapter per client format (§4.2), wired to a generic
//! pass-through/JSON-reshape provider: the request body passes through
//! unchanged and usage is pulled out of the response via the pricing
//! crate's shape-detecting extractor. Production per-vendor adapters
//! implement the same `Adapter` trait; this one exists so the dispatch
//! pipeline is independently testable without a real upstream.

use bytes::{Buf, Bytes, BytesMut};
use polyroute_common::ClientType;
use polyroute_model::ErrorKind;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::adapter::{Adapter, AdapterError};
use crate::types::{EventStream, HttpMethod, RawByteStream, StreamEvent, UpstreamHttpRequest};

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Generic JSON pass-through adapter parameterized by client format; the
/// format only decides the streaming flag field and the upstream path.
#[derive(Debug, Clone)]
pub struct PassthroughAdapter {
    client_type: ClientType,
    upstream_base_url: String,
}

impl PassthroughAdapter {
    pub fn new(client_type: ClientType, upstream_base_url: impl Into<String>) -> Self {
        Self {
            client_type,
            upstream_base_url: upstream_base_url.into(),
        }
    }

    fn upstream_path(&self) -> &'static str {
        match self.client_type {
            ClientType::Claude => "/v1/messages",
            ClientType::Openai => "/v1/chat/completions",
            ClientType::Codex => "/v1/responses",
            ClientType::Gemini => "/v1beta/models/generateContent",
        }
    }
}

#[async_trait::async_trait]
impl Adapter for PassthroughAdapter {
    fn name(&self) -> &'static str {
        match self.client_type {
            ClientType::Claude => "passthrough.claude",
            ClientType::Openai => "passthrough.openai_chat",
            ClientType::Codex => "passthrough.openai_responses",
            ClientType::Gemini => "passthrough.gemini",
        }
    }

    fn is_streaming(&self, client_request: &Value) -> bool {
        client_request
            .get("stream")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    fn translate_request(&self, client_request: &Value) -> Result<UpstreamHttpRequest, AdapterError> {
        let body = serde_json::to_vec(client_request)
            .map_err(|err| AdapterError::FormatConversion(err.to_string()))?;
        Ok(UpstreamHttpRequest {
            method: HttpMethod::Post,
            url: format!("{}{}", self.upstream_base_url, self.upstream_path()),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(Bytes::from(body)),
            is_stream: self.is_streaming(client_request),
        })
    }

    fn translate_response(&self, upstream_response: &Value) -> Result<Value, AdapterError> {
        Ok(upstream_response.clone())
    }

    fn stream_transform(&self, mut upstream: RawByteStream) -> EventStream {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(async move {
            let mut buffer = BytesMut::new();
            while let Some(chunk) = upstream.recv().await {
                buffer.extend_from_slice(&chunk);
                if tx.send(StreamEvent::Bytes(chunk)).await.is_err() {
                    return;
                }
                while let Some(frame_len) = find_double_newline(&buffer) {
                    let frame = buffer.split_to(frame_len);
                    buffer.advance(2);
                    if let Some(data) = sse_data_payload(&frame)
                        && data != "[DONE]"
                        && let Ok(value) = serde_json::from_str::<Value>(data)
                        && let Some(reading) = polyroute_pricing::extract(&value)
                    {
                        if tx.send(StreamEvent::Usage(reading.usage)).await.is_err() {
                            return;
                        }
                    }
                }
            }
        });
        rx
    }
}

fn find_double_newline(buffer: &BytesMut) -> Option<usize> {
    buffer.windows(2).position(|window| window == b"\n\n")
}

fn sse_data_payload(frame: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(frame).ok()?;
    for line in text.lines() {
        if let Some(data) = line.strip_prefix("data: ") {
            return Some(data.trim());
        }
        if let Some(data) = line.strip_prefix("data:") {
            return Some(data.trim());
        }
    }
    None
}

/// Converts an `AdapterError` to the §7 taxonomy for the caller to attach
/// to the current attempt.
pub fn classify_adapter_error(error: &AdapterError) -> ErrorKind {
    match error {
        AdapterError::UnsupportedRequest => ErrorKind::UnsupportedFormat,
        AdapterError::FormatConversion(_) => ErrorKind::FormatConversion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn is_streaming_reads_stream_flag() {
        let adapter = PassthroughAdapter::new(ClientType::Claude, "http://upstream".into());
        assert!(adapter.is_streaming(&json!({"stream": true})));
        assert!(!adapter.is_streaming(&json!({"stream": false})));
        assert!(!adapter.is_streaming(&json!({})));
    }

    #[test]
    fn translate_request_builds_post_with_json_body() {
        let adapter = PassthroughAdapter::new(ClientType::Gemini, "http://upstream".into());
        let request = adapter
            .translate_request(&json!({"contents": []}))
            .unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert!(request.url.ends_with("/v1beta/models/generateContent"));
        assert!(request.body.is_some());
    }

    #[tokio::test]
    async fn stream_transform_extracts_usage_from_sse_frames() {
        let adapter = PassthroughAdapter::new(ClientType::Claude, "http://upstream".into());
        let (tx, rx) = mpsc::channel(4);
        let mut events = adapter.stream_transform(rx);
        let frame = b"data: {\"usage\": {\"input_tokens\": 5, \"output_tokens\": 2}}\n\n".to_vec();
        tx.send(Bytes::from(frame)).await.unwrap();
        drop(tx);

        let mut saw_usage = false;
        while let Some(event) = events.recv().await {
            if let StreamEvent::Usage(usage) = event {
                assert_eq!(usage.input_tokens, 5);
                saw_usage = true;
            }
        }
        assert!(saw_usage);
    }
}
