//! Transport trait for the tracker's search API.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{SearchRequest, SearchResponse};

/// Sends one search request to the tracker.
///
/// Implementations own the base URL and credentials. Non-success statuses
/// must be reported through [`crate::Error::from_status`] so callers can tell
/// a rejected query (400) from a fatal failure.
#[async_trait]
pub trait SearchTransport: Send + Sync {
    /// Get the transport name (e.g., "jira")
    fn name(&self) -> &str;

    /// Run a search and return one page of results
    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse>;
}
