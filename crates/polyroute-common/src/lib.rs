pub mod client_type;
pub mod config;
pub mod slug;
pub mod token;

pub use client_type::ClientType;
pub use config::{GlobalConfig, GlobalConfigError, GlobalConfigPatch};
pub use token::constant_time_eq;
