//! Pipeline entry points.
//!
//! - `run_resolve`: Expand range tokens and write the rules document back
//! - `run_count`: Count recent postings per postcode and write the report
//! - `run_validate`: Check config and dry-run the resolver
//! - `run_pipeline`: Resolve, then count

pub mod count;
pub mod pipeline;
pub mod resolve;
pub mod validate;

pub use count::run_count;
pub use pipeline::run_pipeline;
pub use resolve::run_resolve;
pub use validate::{ValidationSummary, run_validate};
