pub mod registry;

pub use registry::{CooldownRegistry, SWEEP_INTERVAL};
