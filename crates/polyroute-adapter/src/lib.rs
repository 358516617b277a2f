pub mod adapter;
pub mod failure;
pub mod reference;
pub mod types;

pub use adapter::{Adapter, AdapterError, UpstreamClient};
pub use failure::{classify, Classification, CooldownDirective, RateLimitInfo, TransportErrorKind, UpstreamFailure};
pub use reference::{classify_adapter_error, PassthroughAdapter};
pub use types::{
    header_get, EventStream, Headers, HttpMethod, RawByteStream, StreamEvent, UpstreamBody,
    UpstreamHttpRequest, UpstreamHttpResponse,
};
