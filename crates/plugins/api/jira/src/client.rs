//! Jira API client implementation.
//!
//! Talks to the self-hosted search endpoint (`/rest/api/2/search`) with
//! basic auth or a personal access token.

use async_trait::async_trait;
use jiradump_core::{Error, Result, SearchRequest, SearchResponse, SearchTransport};
use tracing::{debug, warn};

/// Credentials for the Jira API.
#[derive(Clone)]
pub enum Credentials {
    /// Username and password (basic auth)
    Basic { username: String, password: String },
    /// Personal access token (bearer auth)
    Bearer(String),
}

impl Credentials {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Basic {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<hidden>")
                .finish(),
            Credentials::Bearer(_) => f.debug_tuple("Bearer").field(&"<hidden>").finish(),
        }
    }
}

/// Jira API client.
pub struct JiraClient {
    base_url: String,
    credentials: Credentials,
    client: reqwest::Client,
}

impl JiraClient {
    /// Create a new Jira client for a host such as `jira.example.com`.
    ///
    /// A host without scheme is reached over HTTPS.
    pub fn new(jira_url: impl AsRef<str>, credentials: Credentials) -> Result<Self> {
        Self::with_base_url(build_api_base(jira_url.as_ref()), credentials)
    }

    /// Create a new Jira client with explicit base URL (for testing with httpmock).
    /// The base URL is used as-is (no `/rest/api/2` suffix appended).
    pub fn with_base_url(base_url: impl Into<String>, credentials: Credentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("jiradump")
            .build()
            .map_err(|e| Error::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            client,
        })
    }

    /// API base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build request with auth header.
    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, url)
            .header("Content-Type", "application/json");

        match &self.credentials {
            Credentials::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            }
            Credentials::Bearer(token) => builder.bearer_auth(token),
        }
    }

    /// Make an authenticated POST request.
    async fn post<T: serde::de::DeserializeOwned, B: serde::Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        debug!(url = url, "Jira POST request");

        let response = self
            .request(reqwest::Method::POST, url)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        self.handle_response(response).await
    }

    /// Handle response and map errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status_code,
                message = message,
                "Jira API error response"
            );
            return Err(Error::from_status(status_code, message));
        }

        response
            .json()
            .await
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))
    }
}

/// Build the API base URL from the instance host.
fn build_api_base(url: &str) -> String {
    let base = url.trim().trim_end_matches('/');
    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{}/rest/api/2", base)
    } else {
        format!("https://{}/rest/api/2", base)
    }
}

#[async_trait]
impl SearchTransport for JiraClient {
    fn name(&self) -> &str {
        "jira"
    }

    async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let url = format!("{}/search", self.base_url);
        debug!(
            jql = request.jql,
            start_at = request.start_at,
            max_results = request.max_results,
            "Jira search"
        );
        self.post(&url, request).await
    }
}

// =============================================================================
// Tests
// =============================================================================
