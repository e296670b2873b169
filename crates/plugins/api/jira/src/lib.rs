//! Jira search integration for jiradump.
//!
//! Reads the issues of one or more projects from the Jira Server/Data Center
//! search API (`/rest/api/2/search`), page by page, and maps each result to a
//! [`CompactIssue`](jiradump_core::CompactIssue).
//!
//! # Example
//!
//! ```ignore
//! use jiradump_jira::{write_multi_project_issues, Credentials, FetchOptions, JiraClient};
//!
//! let client = JiraClient::new("jira.example.com", Credentials::basic("user", "pass"))?;
//! let path = write_multi_project_issues(
//!     &client, &projects, &spec, &FetchOptions::default(), policy, &outdir,
//! ).await?;
//! ```

mod client;
mod export;
mod mapping;
mod pager;

pub use client::{Credentials, JiraClient};
pub use export::write_multi_project_issues;
pub use mapping::map_issue;
pub use pager::{
    fetch_page, page_through_all, page_through_project, FetchOptions, IssueStream, PageOutcome,
    ProjectQuery, BASIC_FIELDS,
};
