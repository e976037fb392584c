// src/models/mod.rs

//! Domain models for the resolver and aggregator.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod keywords;
mod postcode;
mod report;
pub(crate) mod rules;
mod source;

// Re-export all public types
pub use config::{
    AggregationConfig, Config, PathsConfig, RecencyOption, SourceConfig, SourceSelectors,
};
pub use keywords::KeywordGroup;
pub use postcode::{ALL_SENTINEL, Postcode, RangeToken, expand};
pub use report::{JobCountReport, PoaCount};
pub use rules::{RangeCategory, RegionSpec, RulesDocument};
pub use source::{CountPolicy, Recency, ResultItem};
