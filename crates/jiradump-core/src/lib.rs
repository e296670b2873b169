//! Core traits, types, and error handling for jiradump.
//!
//! This crate provides the foundational abstractions shared by the Jira
//! fetch plugin, the export pipeline and the CLI.

pub mod config;
pub mod error;
pub mod provider;
pub mod types;

pub use config::{Config, ExportConfig, JiraConfig};
pub use error::{Error, Result};
pub use provider::SearchTransport;
pub use types::{
    CompactIssue, CustomFieldEntry, CustomFieldSpec, CustomFieldValue, PaginationState, RawIssue,
    SearchRequest, SearchResponse, DEFAULT_MAX_RESULTS, MISSING,
};
