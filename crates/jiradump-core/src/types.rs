//! Domain types shared by the fetch and export stages.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// Placeholder used for display fields the tracker did not return.
pub const MISSING: &str = "-";

// =============================================================================
// Raw issue
// =============================================================================

/// Issue exactly as returned by the search endpoint.
///
/// `fields` is kept as raw JSON: custom fields are only known at runtime.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawIssue {
    /// Numeric issue ID (Jira sends it as a string)
    #[serde(deserialize_with = "deserialize_issue_id")]
    pub id: u64,
    /// Issue key (e.g., "PROJ-123")
    pub key: String,
    /// Field name -> raw JSON value
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

fn deserialize_issue_id<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IssueId {
        Number(u64),
        Text(String),
    }

    match IssueId::deserialize(deserializer)? {
        IssueId::Number(n) => Ok(n),
        IssueId::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid issue id '{}'", s))),
    }
}

// =============================================================================
// Custom field spec
// =============================================================================

/// A single custom field to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomFieldEntry {
    /// Tracker-internal identifier (e.g., "customfield_11520")
    pub id: String,
    /// Column name in the export (e.g., "line_of_business")
    pub name: String,
}

/// Ordered mapping of custom field identifier to output name.
///
/// Identifiers are unique; output names are not checked and duplicates
/// collide in the exported columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomFieldSpec {
    entries: Vec<CustomFieldEntry>,
}

impl CustomFieldSpec {
    /// Create an empty spec.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing the output name if the identifier already exists.
    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        let id = id.into();
        let name = name.into();
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => entry.name = name,
            None => self.entries.push(CustomFieldEntry { id, name }),
        }
    }

    /// Parse `"customfield_XXXXX: output_name"` strings.
    pub fn parse_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut spec = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (id, name) = pair.split_once(':').ok_or_else(|| {
                Error::Config(format!(
                    "Invalid custom field '{}'. Expected format: customfield_XXXXX: name",
                    pair
                ))
            })?;
            let (id, name) = (id.trim(), name.trim());
            if id.is_empty() || name.is_empty() {
                return Err(Error::Config(format!(
                    "Invalid custom field '{}'. Identifier and name must not be empty",
                    pair
                )));
            }
            spec.insert(id, name);
        }
        Ok(spec)
    }

    /// Parse a JSON object of `{"customfield_XXXXX": "output_name"}`.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Custom field identifiers, in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    /// Iterate over the entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &CustomFieldEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<I: Into<String>, N: Into<String>> FromIterator<(I, N)> for CustomFieldSpec {
    fn from_iter<T: IntoIterator<Item = (I, N)>>(iter: T) -> Self {
        let mut spec = Self::new();
        for (id, name) in iter {
            spec.insert(id, name);
        }
        spec
    }
}

impl Serialize for CustomFieldSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.id, &entry.name)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CustomFieldSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SpecVisitor;

        impl<'de> Visitor<'de> for SpecVisitor {
            type Value = CustomFieldSpec;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of custom field identifiers to output names")
            }

            // Visiting the map directly keeps document order.
            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut spec = CustomFieldSpec::new();
                while let Some((id, name)) = access.next_entry::<String, String>()? {
                    spec.insert(id, name);
                }
                Ok(spec)
            }
        }

        deserializer.deserialize_map(SpecVisitor)
    }
}

// =============================================================================
// Compact issue
// =============================================================================

/// Resolved value of one custom field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CustomFieldValue {
    /// Custom field identifier, empty when the issue lacks the field
    pub id: String,
    /// Output name
    pub name: String,
    /// Resolved value, multi-valued fields joined with `" - "`
    pub value: String,
}

/// Normalized issue record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompactIssue {
    pub id: u64,
    pub key: String,
    pub description: String,
    pub status: String,
    pub assignee: String,
    pub issuetype: String,
    pub project: String,
    pub created: String,
    pub updated: String,
    pub creator: String,
    pub reporter: String,
    pub priority: String,
    pub labels: Vec<String>,
    /// Output name -> value
    pub custom_fields: BTreeMap<String, CustomFieldValue>,
}

// =============================================================================
// Pagination
// =============================================================================

/// Default page size for search requests.
pub const DEFAULT_MAX_RESULTS: u32 = 1000;

/// Cursor over a paginated search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationState {
    /// Zero-based offset of the next page
    pub start_at: u32,
    /// Page size requested from the server
    pub max_results: u32,
    /// Total matching issues, known after the first response
    pub total: Option<u32>,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            start_at: 0,
            max_results: DEFAULT_MAX_RESULTS,
            total: None,
        }
    }
}

impl PaginationState {
    /// Start paging at `start_at` with pages of `max_results` (at least 1).
    pub fn new(start_at: u32, max_results: u32) -> Self {
        Self {
            start_at,
            max_results: max_results.max(1),
            total: None,
        }
    }

    /// State after a page of `received` issues out of `total`.
    pub fn advance(self, received: usize, total: u32) -> Self {
        let received = u32::try_from(received).unwrap_or(u32::MAX);
        Self {
            start_at: self.start_at.saturating_add(received),
            max_results: self.max_results,
            total: Some(total),
        }
    }

    /// Whether every issue has been read. Unknown totals are never exhausted.
    pub fn is_exhausted(&self) -> bool {
        self.total.is_some_and(|total| self.start_at >= total)
    }
}

// =============================================================================
// Search wire types
// =============================================================================

/// Body of `POST /rest/api/2/search`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub jql: String,
    #[serde(rename = "startAt")]
    pub start_at: u32,
    #[serde(rename = "maxResults")]
    pub max_results: u32,
    pub fields: Vec<String>,
}

/// Response of the search endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchResponse {
    /// Issues in this page
    #[serde(default)]
    pub issues: Vec<RawIssue>,
    /// Offset the server applied
    #[serde(default, rename = "startAt")]
    pub start_at: Option<u32>,
    /// Page size the server applied
    #[serde(default, rename = "maxResults")]
    pub max_results: Option<u32>,
    /// Total number of results
    #[serde(default)]
    pub total: Option<u32>,
}
