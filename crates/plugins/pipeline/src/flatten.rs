//! Flattening of compact issues into CSV rows.

use jiradump_core::{CompactIssue, CustomFieldSpec, Error, Result};

use crate::markdown::strip_markdown;

/// What to do with the issue description in the export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DescriptionPolicy {
    /// Leave the description column out (long text with newlines and commas)
    #[default]
    Drop,
    /// Keep the description as markdown-stripped plain text
    StripMarkdown,
}

impl DescriptionPolicy {
    pub fn from_include(include_description: bool) -> Self {
        if include_description {
            DescriptionPolicy::StripMarkdown
        } else {
            DescriptionPolicy::Drop
        }
    }
}

/// One CSV row: ordered `(column, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportRecord {
    columns: Vec<(String, String)>,
}

impl ExportRecord {
    fn push(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.columns.push((column.into(), value.into()));
    }

    /// Column names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Column values, in order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(_, value)| value.as_str())
    }

    /// Value of the first column called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Flatten `issue` into a row, splicing each custom field in as a column.
///
/// Fails with [`Error::SpecMismatch`] when `spec` names a field the issue was
/// not mapped with.
pub fn flatten(
    issue: &CompactIssue,
    spec: &CustomFieldSpec,
    policy: DescriptionPolicy,
) -> Result<ExportRecord> {
    let mut record = ExportRecord::default();

    record.push("id", issue.id.to_string());
    record.push("key", issue.key.as_str());
    record.push("status", issue.status.as_str());
    record.push("assignee", issue.assignee.as_str());
    record.push("issuetype", issue.issuetype.as_str());
    record.push("project", issue.project.as_str());
    record.push("created", issue.created.as_str());
    record.push("updated", issue.updated.as_str());
    record.push("creator", issue.creator.as_str());
    record.push("reporter", issue.reporter.as_str());
    record.push("priority", issue.priority.as_str());
    record.push("labels", issue.labels.join(","));

    if policy == DescriptionPolicy::StripMarkdown {
        record.push("description", strip_markdown(&issue.description));
    }

    for entry in spec.iter() {
        let field = issue
            .custom_fields
            .get(&entry.name)
            .ok_or_else(|| Error::SpecMismatch {
                name: entry.name.clone(),
                key: issue.key.clone(),
            })?;
        record.push(entry.name.as_str(), field.value.as_str());
    }

    Ok(record)
}
