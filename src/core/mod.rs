//! Core types - pure abstractions shared across the codebase.

mod origin;
mod run_id;

pub use origin::{OriginError, PageOrigin};
pub use run_id::RunId;
