//! Pipeline plan: the lowered, serializable form of a validated workflow.

pub mod types;
pub mod validate;

pub use types::*;
pub use validate::{ValidationError, validate_plan};
