//! Service layer.
//!
//! - Postcode set resolution (`resolver`)
//! - Posting recency classification (`recency`)
//! - Job source sessions (`source`)
//! - Per-postcode job counting (`aggregator`)

pub mod aggregator;
pub mod recency;
pub mod resolver;
pub mod source;

pub use aggregator::{AggregateStats, Aggregator, CountAccumulator, CountOutcome};
pub use resolver::{PostcodeUniverse, Resolution, UnresolvedRegion, resolve, unresolved_regions};
pub use source::{HttpJobSource, HttpJobSourceFactory, JobSource, JobSourceFactory};
