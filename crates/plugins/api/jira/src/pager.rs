//! Paginated issue retrieval.
//!
//! A project is read page by page through a [`SearchTransport`]; several
//! projects are read one after another into a single lazy stream.

use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use jiradump_core::{
    CompactIssue, CustomFieldSpec, Error, PaginationState, RawIssue, Result, SearchRequest,
    SearchTransport, DEFAULT_MAX_RESULTS,
};
use tracing::{debug, info, warn};

use crate::mapping::map_issue;

/// Fields requested for every issue, ahead of the custom fields.
pub const BASIC_FIELDS: [&str; 12] = [
    "summary",
    "description",
    "created",
    "updated",
    "creator",
    "reporter",
    "priority",
    "labels",
    "status",
    "assignee",
    "issuetype",
    "project",
];

/// Lazy stream of mapped issues.
pub type IssueStream<'a> = BoxStream<'a, Result<CompactIssue>>;

/// Options shared by every project of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Offset of the first page
    pub start_at: u32,
    /// Page size
    pub max_results: u32,
    /// Restrict the search to one issue type (e.g., "Story")
    pub issue_type: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            start_at: 0,
            max_results: DEFAULT_MAX_RESULTS,
            issue_type: None,
        }
    }
}

impl FetchOptions {
    pub fn start_state(&self) -> PaginationState {
        PaginationState::new(self.start_at, self.max_results)
    }
}

/// Search for the issues of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectQuery {
    pub project_id: String,
    pub issue_type: Option<String>,
    /// Requested fields: [`BASIC_FIELDS`] then the custom field identifiers
    pub fields: Vec<String>,
}

impl ProjectQuery {
    pub fn new(project_id: impl Into<String>, spec: &CustomFieldSpec) -> Self {
        let fields = BASIC_FIELDS
            .iter()
            .copied()
            .chain(spec.ids())
            .map(str::to_string)
            .collect();

        Self {
            project_id: project_id.into(),
            issue_type: None,
            fields,
        }
    }

    pub fn with_issue_type(mut self, issue_type: Option<String>) -> Self {
        self.issue_type = issue_type;
        self
    }

    /// JQL selecting the project's issues.
    pub fn jql(&self) -> String {
        let mut jql = format!("project = \"{}\"", escape_jql(&self.project_id));
        if let Some(issue_type) = &self.issue_type {
            jql.push_str(&format!(" AND issuetype = \"{}\"", escape_jql(issue_type)));
        }
        jql
    }

    /// Search request for the page at `state`.
    pub fn request(&self, state: &PaginationState) -> SearchRequest {
        SearchRequest {
            jql: self.jql(),
            start_at: state.start_at,
            max_results: state.max_results,
            fields: self.fields.clone(),
        }
    }
}

fn escape_jql(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Result of fetching one page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// Issues in server order and the state for the following page
    Page {
        issues: Vec<RawIssue>,
        next: PaginationState,
    },
    /// The server rejected the query (HTTP 400); the project yields nothing more
    Rejected,
}

/// Fetch the page of `query` at `state`.
///
/// A rejected query is logged and reported as [`PageOutcome::Rejected`];
/// every other failure is returned as an error.
pub async fn fetch_page<T>(
    transport: &T,
    query: &ProjectQuery,
    state: PaginationState,
) -> Result<PageOutcome>
where
    T: SearchTransport + ?Sized,
{
    debug!(
        project = query.project_id,
        start_at = state.start_at,
        "Fetching page"
    );

    let response = match transport.search(&query.request(&state)).await {
        Ok(response) => response,
        Err(e) if e.is_recoverable() => {
            let messages = match &e {
                Error::BadRequest { messages } => messages.as_slice(),
                _ => &[][..],
            };
            if messages.is_empty() {
                warn!(
                    "Search for project {} was rejected by the server",
                    query.project_id
                );
            }
            for message in messages {
                warn!("{}", message);
            }
            return Ok(PageOutcome::Rejected);
        }
        Err(e) => return Err(e),
    };

    let received = response.issues.len();
    let total = response
        .total
        .unwrap_or_else(|| state.start_at.saturating_add(received as u32));
    let next = state.advance(received, total);

    info!(
        "read {} of {} total issues for project {}",
        next.start_at, total, query.project_id
    );

    Ok(PageOutcome::Page {
        issues: response.issues,
        next,
    })
}

/// Paging position within one project. `state` is `None` once the last page
/// has been fetched.
struct Cursor {
    query: ProjectQuery,
    state: Option<PaginationState>,
}

async fn next_page<T>(
    transport: &T,
    mut cursor: Cursor,
) -> Result<Option<(Vec<RawIssue>, Cursor)>>
where
    T: SearchTransport + ?Sized,
{
    let Some(state) = cursor.state.take() else {
        info!(
            "Reading of issues completed for project {}",
            cursor.query.project_id
        );
        return Ok(None);
    };

    match fetch_page(transport, &cursor.query, state).await? {
        PageOutcome::Rejected => Ok(None),
        PageOutcome::Page { issues, next } => {
            if next.is_exhausted() {
                cursor.state = None;
            } else if issues.is_empty() {
                warn!(
                    start_at = next.start_at,
                    total = next.total,
                    "Empty page before the reported total for project {}, stopping",
                    cursor.query.project_id
                );
                cursor.state = None;
            } else {
                cursor.state = Some(next);
            }
            Ok(Some((issues, cursor)))
        }
    }
}

/// Stream every issue of one project, starting at `start`.
///
/// Pages are requested one at a time, only once the previous page has been
/// consumed.
pub fn page_through_project<'a, T>(
    transport: &'a T,
    query: ProjectQuery,
    spec: &'a CustomFieldSpec,
    start: PaginationState,
) -> IssueStream<'a>
where
    T: SearchTransport + ?Sized,
{
    let cursor = Cursor {
        query,
        state: Some(start),
    };

    stream::try_unfold(cursor, move |cursor| next_page(transport, cursor))
        .map_ok(move |issues| {
            stream::iter(
                issues
                    .into_iter()
                    .map(move |raw| Ok::<_, Error>(map_issue(&raw, spec))),
            )
        })
        .try_flatten()
        .boxed()
}

struct Sequencer<'a> {
    current: Option<IssueStream<'a>>,
    remaining: std::slice::Iter<'a, String>,
    failed: bool,
}

/// Stream the issues of every project in `project_ids`, in order.
///
/// The first error ends the stream; later projects are not fetched.
pub fn page_through_all<'a, T>(
    transport: &'a T,
    project_ids: &'a [String],
    spec: &'a CustomFieldSpec,
    options: &'a FetchOptions,
) -> IssueStream<'a>
where
    T: SearchTransport + ?Sized,
{
    let sequencer = Sequencer {
        current: None,
        remaining: project_ids.iter(),
        failed: false,
    };

    stream::unfold(sequencer, move |mut seq| async move {
        if seq.failed {
            return None;
        }
        loop {
            if let Some(current) = seq.current.as_mut() {
                let item = current.next().await;
                match item {
                    Some(Ok(issue)) => return Some((Ok(issue), seq)),
                    Some(Err(e)) => {
                        seq.current = None;
                        seq.failed = true;
                        return Some((Err(e), seq));
                    }
                    None => seq.current = None,
                }
            }

            let project_id = seq.remaining.next()?;
            let query = ProjectQuery::new(project_id.as_str(), spec)
                .with_issue_type(options.issue_type.clone());
            seq.current = Some(page_through_project(
                transport,
                query,
                spec,
                options.start_state(),
            ));
        }
    })
    .boxed()
}
