pub mod model_mapper;
pub mod router;
pub mod strategy;

pub use model_mapper::resolve_model;
pub use router::{Candidate, Router, RouterError};
