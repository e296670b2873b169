//! Common test utilities.
//!
//! `FixtureTransport` answers search requests from the JSON fixtures in
//! `tests/fixtures/jira/`, one file per project (`{PROJECT}.json`, an array
//! of issues). Pages are cut from the fixture by `startAt`/`maxResults` the
//! way the server does; a project without a fixture is rejected with the
//! same 400 error Jira returns for an unknown project.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use jiradump_core::{Error, RawIssue, Result, SearchRequest, SearchResponse, SearchTransport};

/// Search transport backed by fixture files.
#[derive(Debug, Default)]
pub struct FixtureTransport {
    requests: Mutex<Vec<SearchRequest>>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn load_issues(project: &str) -> Option<Vec<RawIssue>> {
        let path = fixtures_dir().join(format!("{}.json", project));
        let content = std::fs::read_to_string(path).ok()?;
        let issues = serde_json::from_str(&content).expect("Failed to parse issues fixture");
        Some(issues)
    }
}

#[async_trait]
impl SearchTransport for FixtureTransport {
    fn name(&self) -> &str {
        "fixtures"
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let project = project_from_jql(&request.jql);
        let Some(issues) = Self::load_issues(&project) else {
            return Err(Error::BadRequest {
                messages: vec![format!(
                    "The value '{}' does not exist for the field 'project'.",
                    project
                )],
            });
        };

        let total = issues.len() as u32;
        let page = issues
            .into_iter()
            .skip(request.start_at as usize)
            .take(request.max_results as usize)
            .collect();

        Ok(SearchResponse {
            issues: page,
            start_at: Some(request.start_at),
            max_results: Some(request.max_results),
            total: Some(total),
        })
    }
}

/// Directory holding the Jira fixtures.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("jira")
}

/// Extract `ABC` from `project = "ABC" ...`.
fn project_from_jql(jql: &str) -> String {
    jql.split('"').nth(1).unwrap_or_default().to_string()
}
