pub mod adapter_registry;
pub mod backoff;
pub mod executor;
pub mod recorder;
pub mod session_waiter;
pub mod upstream_client;

pub use adapter_registry::AdapterRegistry;
pub use backoff::backoff_duration;
pub use executor::{ClientConnection, ExecuteRequest, FinalOutcome, RetryExecutor};
pub use recorder::Recorder;
pub use session_waiter::{SessionWaiter, WaitOutcome};
pub use upstream_client::{UpstreamClientConfig, WreqUpstreamClient};
