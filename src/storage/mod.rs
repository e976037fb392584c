// src/storage/mod.rs

//! Storage abstractions for the rules document and the count report.
//!
//! Both documents are JSON files addressed by a key relative to the storage
//! root. Writes replace the whole file atomically.

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{JobCountReport, RulesDocument};

pub use local::LocalStorage;

/// Metadata about a report write.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// Where the document was written
    pub location: String,
    /// Number of postcode entries
    pub entry_count: usize,
    pub timestamp: DateTime<Utc>,
}

/// Trait for document storage backends.
#[async_trait]
pub trait DocumentStorage: Send + Sync {
    /// Load the eligibility rules document. A missing file is a `Config` error.
    async fn load_rules(&self, key: &str) -> Result<RulesDocument>;

    /// Replace the rules document.
    async fn save_rules(&self, key: &str, document: &RulesDocument) -> Result<()>;

    /// Load a previously written report, if any.
    async fn load_report(&self, key: &str) -> Result<Option<JobCountReport>>;

    /// Replace the report.
    async fn write_report(&self, key: &str, report: &JobCountReport) -> Result<WriteMetadata>;
}
