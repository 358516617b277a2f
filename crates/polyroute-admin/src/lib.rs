//! Thin CRUD router over the repositories plus the live event channel
//! (§4.10). Contains no business logic: every handler calls straight
//! into a repo trait, the Cooldown Registry, or the Event Broadcaster.

mod api_tokens;
mod auth;
mod cooldowns;
mod error;
mod events;
mod history;
mod model_mappings;
mod projects;
mod providers;
mod retry_configs;
mod router;
mod routes;
mod state;
mod strategies;
mod system_settings;

pub use router::{admin_router, events_router};
pub use state::AdminState;
