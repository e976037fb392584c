//! Job source client abstraction.
//!
//! A `JobSource` is a single stateful session against an external job search
//! system. Calls on one session are strictly sequential; concurrent workers
//! each open their own session through a `JobSourceFactory`.

mod http;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ResultItem;

pub use http::{
    HttpJobSource, HttpJobSourceFactory, PageSelectors, ResultsPage, build_search_url,
    parse_results_page,
};

/// Operation-level contract the aggregator drives.
#[async_trait]
pub trait JobSource: Send {
    /// Source name recorded in the report.
    fn name(&self) -> &str;

    /// Open the search surface. Fails with `SourceUnavailable` if unreachable.
    async fn navigate_to_search(&mut self) -> Result<()>;

    /// Narrow results to postings no older than `window_days`.
    ///
    /// Returns `false` when the source has no such filter; results are then
    /// classified per item only.
    async fn apply_recency_filter(&mut self, window_days: u32) -> Result<bool>;

    /// Run a keyword + location search and load its first page.
    async fn search(&mut self, keyword_query: &str, location_query: &str) -> Result<()>;

    /// Items on the current page.
    async fn list_result_items(&mut self) -> Result<Vec<ResultItem>>;

    /// Whether a usable "next page" control exists.
    async fn has_next_page(&mut self) -> Result<bool>;

    async fn go_to_next_page(&mut self) -> Result<()>;

    /// Release the session. Called on every exit path.
    async fn close(&mut self) -> Result<()>;
}

/// Opens independent sessions, one per worker.
#[async_trait]
pub trait JobSourceFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn JobSource>>;
}
