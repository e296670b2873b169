//! Export of several projects into one CSV file.

use std::path::{Path, PathBuf};

use jiradump_core::{CustomFieldSpec, Result, SearchTransport};
use jiradump_pipeline::{export_to_csv, output_file_path, DescriptionPolicy};
use tracing::info;

use crate::pager::{page_through_all, FetchOptions};

/// Fetch the issues of `project_ids` and write them to
/// `{outdir}/{ids joined by "-"}-jira-issues.csv`.
///
/// Returns the output path, also when no issue was found and no file was
/// written.
pub async fn write_multi_project_issues<T>(
    transport: &T,
    project_ids: &[String],
    spec: &CustomFieldSpec,
    options: &FetchOptions,
    policy: DescriptionPolicy,
    outdir: &Path,
) -> Result<PathBuf>
where
    T: SearchTransport + ?Sized,
{
    let output_path = output_file_path(outdir, project_ids);
    info!(
        provider = transport.name(),
        projects = ?project_ids,
        path = ?output_path,
        "Exporting issues"
    );

    let issues = page_through_all(transport, project_ids, spec, options);
    export_to_csv(issues, spec, policy, &output_path).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{Credentials, JiraClient};
    use httpmock::prelude::*;
    use jiradump_core::Error;
    use serde_json::json;
    use tempfile::TempDir;

    fn issue_json(key: &str, id: u64, wave: &str) -> serde_json::Value {
        json!({
            "id": id.to_string(),
            "key": key,
            "fields": {
                "description": "## Notes\n\nSee **this**",
                "created": "2024-01-01T10:00:00.000+0000",
                "updated": "2024-01-02T15:30:00.000+0000",
                "status": {"name": "Open"},
                "assignee": null,
                "issuetype": {"name": "Story"},
                "project": {"name": "Project"},
                "creator": {"name": "jdoe"},
                "reporter": {"name": "jdoe"},
                "priority": {"name": "Medium"},
                "labels": ["x", "y"],
                "customfield_2": [{"value": wave}, {"value": "W9"}]
            }
        })
    }

    fn client(server: &MockServer) -> JiraClient {
        JiraClient::with_base_url(server.base_url(), Credentials::basic("user", "pass")).unwrap()
    }

    fn spec() -> CustomFieldSpec {
        [("customfield_2", "wave")].into_iter().collect()
    }

    #[tokio::test]
    async fn test_write_multi_project_issues() {
        let server = MockServer::start();
        let abc_first = server.mock(|when, then| {
            when.method(POST)
                .path("/search")
                .body_includes("project = \\\"ABC\\\"")
                .body_includes("\"startAt\":0");
            then.status(200).json_body(json!({
                "issues": [issue_json("ABC-1", 1, "W1")],
                "startAt": 0,
                "maxResults": 1,
                "total": 2
            }));
        });
        let abc_second = server.mock(|when, then| {
            when.method(POST)
                .path("/search")
                .body_includes("project = \\\"ABC\\\"")
                .body_includes("\"startAt\":1");
            then.status(200).json_body(json!({
                "issues": [issue_json("ABC-2", 2, "W2")],
                "startAt": 1,
                "maxResults": 1,
                "total": 2
            }));
        });
        let missing = server.mock(|when, then| {
            when.method(POST)
                .path("/search")
                .body_includes("project = \\\"NOPE\\\"");
            then.status(400).json_body(json!({
                "errorMessages": ["The value 'NOPE' does not exist for the field 'project'."],
                "errors": {}
            }));
        });
        let xyz = server.mock(|when, then| {
            when.method(POST)
                .path("/search")
                .body_includes("project = \\\"XYZ\\\"");
            then.status(200).json_body(json!({
                "issues": [issue_json("XYZ-7", 7, "W3")],
                "startAt": 0,
                "maxResults": 1,
                "total": 1
            }));
        });

        let dir = TempDir::new().unwrap();
        let projects = vec!["ABC".to_string(), "NOPE".to_string(), "XYZ".to_string()];
        let options = FetchOptions {
            max_results: 1,
            ..FetchOptions::default()
        };

        let path = write_multi_project_issues(
            &client(&server),
            &projects,
            &spec(),
            &options,
            DescriptionPolicy::StripMarkdown,
            dir.path(),
        )
        .await
        .unwrap();

        abc_first.assert_calls(1);
        abc_second.assert_calls(1);
        missing.assert_calls(1);
        xyz.assert_calls(1);

        assert_eq!(path, dir.path().join("ABC-NOPE-XYZ-jira-issues.csv"));

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        assert_eq!(headers.len(), 14);
        assert_eq!(headers[12], "description");
        assert_eq!(headers[13], "wave");

        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        let keys: Vec<&str> = rows.iter().map(|r| &r[1]).collect();
        assert_eq!(keys, vec!["ABC-1", "ABC-2", "XYZ-7"]);
        assert_eq!(&rows[0][3], "-");
        assert_eq!(&rows[0][11], "x,y");
        assert_eq!(&rows[0][12], "Notes\n\nSee this");
        assert_eq!(&rows[2][13], "W3 - W9");
    }

    #[tokio::test]
    async fn test_write_fatal_error_leaves_no_file() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/search");
            then.status(401).body("Unauthorized");
        });

        let dir = TempDir::new().unwrap();
        let projects = vec!["ABC".to_string()];
        let stale = dir.path().join("ABC-jira-issues.csv");
        std::fs::write(&stale, "old\n").unwrap();

        let result = write_multi_project_issues(
            &client(&server),
            &projects,
            &spec(),
            &FetchOptions::default(),
            DescriptionPolicy::Drop,
            dir.path(),
        )
        .await;

        assert!(matches!(result, Err(Error::Unauthorized(_))));
        assert!(!stale.exists());
    }

    #[tokio::test]
    async fn test_write_no_issues() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/search");
            then.status(200).json_body(json!({
                "issues": [],
                "startAt": 0,
                "maxResults": 1000,
                "total": 0
            }));
        });

        let dir = TempDir::new().unwrap();
        let projects = vec!["ABC".to_string()];

        let path = write_multi_project_issues(
            &client(&server),
            &projects,
            &spec(),
            &FetchOptions::default(),
            DescriptionPolicy::Drop,
            dir.path(),
        )
        .await
        .unwrap();

        assert_eq!(path, dir.path().join("ABC-jira-issues.csv"));
        assert!(!path.exists());
    }
}
