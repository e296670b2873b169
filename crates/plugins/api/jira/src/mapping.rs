//! Mapping of raw search results to compact issues.

use std::collections::BTreeMap;

use jiradump_core::{CompactIssue, CustomFieldSpec, CustomFieldValue, RawIssue, MISSING};
use serde_json::Value;

/// Separator between the values of a multi-valued custom field.
const MULTI_VALUE_SEPARATOR: &str = " - ";

/// Map a raw issue to a [`CompactIssue`], resolving every field in `spec`.
pub fn map_issue(raw: &RawIssue, spec: &CustomFieldSpec) -> CompactIssue {
    let fields = &raw.fields;

    let custom_fields = spec
        .iter()
        .map(|entry| {
            let value = match fields.get(&entry.id) {
                None | Some(Value::Null) => CustomFieldValue {
                    id: String::new(),
                    name: entry.name.clone(),
                    value: String::new(),
                },
                Some(value) => CustomFieldValue {
                    id: entry.id.clone(),
                    name: entry.name.clone(),
                    value: custom_field_text(value),
                },
            };
            (entry.name.clone(), value)
        })
        .collect::<BTreeMap<_, _>>();

    CompactIssue {
        id: raw.id,
        key: raw.key.clone(),
        description: match fields.get("description") {
            None | Some(Value::Null) => MISSING.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        },
        status: display_name(fields.get("status")),
        assignee: display_name(fields.get("assignee")),
        issuetype: display_name(fields.get("issuetype")),
        project: display_name(fields.get("project")),
        created: plain_text(fields.get("created")),
        updated: plain_text(fields.get("updated")),
        creator: display_name(fields.get("creator")),
        reporter: display_name(fields.get("reporter")),
        priority: display_name(fields.get("priority")),
        labels: fields
            .get("labels")
            .and_then(Value::as_array)
            .map(|labels| labels.iter().map(scalar_text).collect())
            .unwrap_or_default(),
        custom_fields,
    }
}

/// `.name` of a nested object, falling back to `.displayName`.
fn display_name(value: Option<&Value>) -> String {
    value
        .and_then(|v| {
            v.get("name")
                .and_then(Value::as_str)
                .or_else(|| v.get("displayName").and_then(Value::as_str))
        })
        .unwrap_or(MISSING)
        .to_string()
}

/// Timestamps pass through as-is; absent ones stay empty.
fn plain_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(v) => scalar_text(v),
    }
}

/// Resolve a custom field value to text.
///
/// Option lists join their `.value`s, option objects yield their `.value`,
/// plain scalars are rendered as they are.
fn custom_field_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| option_value(item.get("value")))
            .collect::<Vec<_>>()
            .join(MULTI_VALUE_SEPARATOR),
        Value::Object(_) => option_value(value.get("value")),
        other => scalar_text(other),
    }
}

fn option_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(v @ Value::Object(_)) => match v.get("value") {
            Some(inner) => option_value(Some(inner)),
            None => v.to_string(),
        },
        Some(v) => scalar_text(v),
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(fields: Value) -> RawIssue {
        serde_json::from_value(json!({
            "id": "10001",
            "key": "PROJ-1",
            "fields": fields
        }))
        .unwrap()
    }

    fn full_issue() -> RawIssue {
        raw(json!({
            "summary": "Fix login bug",
            "description": "Users cannot log in",
            "created": "2024-01-01T10:00:00.000+0000",
            "updated": "2024-01-02T15:30:00.000+0000",
            "creator": {"name": "jdoe", "displayName": "John Doe"},
            "reporter": {"name": "jsmith"},
            "priority": {"name": "High", "id": "2"},
            "labels": ["bug", "mobile"],
            "status": {"name": "In Progress"},
            "assignee": {"displayName": "Alice Cooper"},
            "issuetype": {"name": "Bug"},
            "project": {"key": "PROJ", "name": "Project"},
            "customfield_11520": [{"value": "Retail"}, {"value": "Banking"}],
            "customfield_18714": {"value": "Gold", "id": "1"},
            "customfield_30": 3.5
        }))
    }

    fn spec() -> CustomFieldSpec {
        [
            ("customfield_11520", "line_of_business"),
            ("customfield_18714", "customers"),
            ("customfield_30", "story_points"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_map_full_issue() {
        let issue = map_issue(&full_issue(), &spec());

        assert_eq!(issue.id, 10001);
        assert_eq!(issue.key, "PROJ-1");
        assert_eq!(issue.description, "Users cannot log in");
        assert_eq!(issue.status, "In Progress");
        assert_eq!(issue.assignee, "Alice Cooper");
        assert_eq!(issue.issuetype, "Bug");
        assert_eq!(issue.project, "Project");
        assert_eq!(issue.created, "2024-01-01T10:00:00.000+0000");
        assert_eq!(issue.updated, "2024-01-02T15:30:00.000+0000");
        assert_eq!(issue.creator, "jdoe");
        assert_eq!(issue.reporter, "jsmith");
        assert_eq!(issue.priority, "High");
        assert_eq!(issue.labels, vec!["bug", "mobile"]);

        assert_eq!(
            issue.custom_fields["line_of_business"],
            CustomFieldValue {
                id: "customfield_11520".to_string(),
                name: "line_of_business".to_string(),
                value: "Retail - Banking".to_string(),
            }
        );
        assert_eq!(issue.custom_fields["customers"].value, "Gold");
        assert_eq!(issue.custom_fields["story_points"].value, "3.5");
    }

    #[test]
    fn test_map_is_deterministic() {
        let raw = full_issue();
        assert_eq!(map_issue(&raw, &spec()), map_issue(&raw, &spec()));
    }

    #[test]
    fn test_map_missing_fields_default() {
        let issue = map_issue(&raw(json!({"assignee": null})), &spec());

        assert_eq!(issue.description, "-");
        assert_eq!(issue.status, "-");
        assert_eq!(issue.assignee, "-");
        assert_eq!(issue.issuetype, "-");
        assert_eq!(issue.project, "-");
        assert_eq!(issue.created, "");
        assert_eq!(issue.updated, "");
        assert_eq!(issue.creator, "-");
        assert_eq!(issue.reporter, "-");
        assert_eq!(issue.priority, "-");
        assert!(issue.labels.is_empty());
    }

    #[test]
    fn test_map_absent_timestamps_are_empty() {
        let issue = map_issue(&raw(json!({})), &CustomFieldSpec::new());
        assert_eq!(issue.created, "");
        assert_eq!(issue.updated, "");

        let nulls = map_issue(
            &raw(json!({"created": null, "updated": "2024-02-01T08:30:00.000+0000"})),
            &CustomFieldSpec::new(),
        );
        assert_eq!(nulls.created, "");
        assert_eq!(nulls.updated, "2024-02-01T08:30:00.000+0000");
    }

    #[test]
    fn test_map_absent_custom_field() {
        let issue = map_issue(&raw(json!({"customfield_18714": null})), &spec());

        assert_eq!(issue.custom_fields.len(), 3);
        for name in ["line_of_business", "customers", "story_points"] {
            let field = &issue.custom_fields[name];
            assert_eq!(field.id, "");
            assert_eq!(field.name, name);
            assert_eq!(field.value, "");
        }
    }

    #[test]
    fn test_map_multi_value_join() {
        let spec: CustomFieldSpec = [("customfield_1", "tags")].into_iter().collect();

        let issue = map_issue(
            &raw(json!({"customfield_1": [{"value": "a"}, {"value": "b"}]})),
            &spec,
        );
        assert_eq!(issue.custom_fields["tags"].value, "a - b");

        let partial = map_issue(
            &raw(json!({"customfield_1": [{"value": "a"}, {"id": "7"}, {"value": 2}]})),
            &spec,
        );
        assert_eq!(partial.custom_fields["tags"].value, "a -  - 2");

        let empty = map_issue(&raw(json!({"customfield_1": []})), &spec);
        assert_eq!(empty.custom_fields["tags"].id, "customfield_1");
        assert_eq!(empty.custom_fields["tags"].value, "");
    }

    #[test]
    fn test_map_nested_option_value() {
        let spec: CustomFieldSpec = [("customfield_1", "cascade")].into_iter().collect();
        let issue = map_issue(
            &raw(json!({"customfield_1": {"value": {"value": "Parent"}}})),
            &spec,
        );
        assert_eq!(issue.custom_fields["cascade"].value, "Parent");
    }

    #[test]
    fn test_map_scalar_custom_fields() {
        let spec: CustomFieldSpec = [("customfield_1", "team"), ("customfield_2", "flagged")]
            .into_iter()
            .collect();
        let issue = map_issue(
            &raw(json!({"customfield_1": "Platform", "customfield_2": true})),
            &spec,
        );
        assert_eq!(issue.custom_fields["team"].value, "Platform");
        assert_eq!(issue.custom_fields["flagged"].value, "true");
    }

    #[test]
    fn test_map_non_string_description() {
        let issue = map_issue(
            &raw(json!({"description": {"type": "doc"}})),
            &CustomFieldSpec::new(),
        );
        assert_eq!(issue.description, r#"{"type":"doc"}"#);
    }
}
