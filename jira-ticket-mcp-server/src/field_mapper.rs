//! Field mapping from flat ticket parameters to JIRA's nested field payload
//!
//! A create draft always carries its required fields and adds optional fields
//! only when they hold a value. An update patch is sparse: `None` means "leave
//! unchanged" and never produces a key, while `Some("")` is a deliberate clear.

use crate::config::{CustomFieldIds, JiraConfig};
use crate::error::{TrackerError, TrackerResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::debug;

/// The `fields` object of a create or update request
pub type FieldMap = Map<String, Value>;

/// Which JIRA flavour the payloads target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVariant {
    /// Server/Data Center: REST v2, users referenced by `name`, plain-text descriptions
    #[default]
    Legacy,

    /// Cloud: REST v3, users referenced by `accountId`, rich-text (ADF) descriptions
    Current,
}

impl SchemaVariant {
    /// REST API version used for create, get-issue and get-project calls
    pub fn api_version(self) -> u8 {
        match self {
            SchemaVariant::Legacy => 2,
            SchemaVariant::Current => 3,
        }
    }

    fn user_key(self) -> &'static str {
        match self {
            SchemaVariant::Legacy => "name",
            SchemaVariant::Current => "accountId",
        }
    }
}

impl FromStr for SchemaVariant {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "legacy" | "server" | "v2" | "2" => Ok(SchemaVariant::Legacy),
            "current" | "cloud" | "v3" | "3" => Ok(SchemaVariant::Current),
            other => Err(TrackerError::config(format!(
                "Unknown schema variant '{}', expected 'legacy' or 'current'",
                other
            ))),
        }
    }
}

/// Reference to a project, by numeric id or by key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectRef {
    Id(String),
    Key(String),
}

impl ProjectRef {
    /// All-digit values are ids, anything else is a key
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
            ProjectRef::Id(value.to_string())
        } else {
            ProjectRef::Key(value.to_string())
        }
    }

    pub fn value(&self) -> &str {
        match self {
            ProjectRef::Id(v) | ProjectRef::Key(v) => v,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            ProjectRef::Id(id) => json!({ "id": id }),
            ProjectRef::Key(key) => json!({ "key": key }),
        }
    }
}

/// Reference to an issue type, by numeric id or by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueTypeRef {
    Id(String),
    Name(String),
}

impl IssueTypeRef {
    /// All-digit values are ids, anything else is a name
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
            IssueTypeRef::Id(value.to_string())
        } else {
            IssueTypeRef::Name(value.to_string())
        }
    }

    pub fn value(&self) -> &str {
        match self {
            IssueTypeRef::Id(v) | IssueTypeRef::Name(v) => v,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            IssueTypeRef::Id(id) => json!({ "id": id }),
            IssueTypeRef::Name(name) => json!({ "name": name }),
        }
    }
}

/// Everything needed to create a ticket
#[derive(Debug, Clone, PartialEq)]
pub struct TicketDraft {
    pub summary: String,
    pub description: String,
    pub project: ProjectRef,
    pub issue_type: IssueTypeRef,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub reporter: Option<String>,
    pub labels: Option<Vec<String>>,
    pub cost_centers: Option<Vec<String>>,
    pub flows: Option<String>,
    pub tag_types: Option<String>,
    pub beat_types: Option<String>,
    pub parent_key: Option<String>,
    pub security_id: Option<String>,
    pub original_estimate: Option<String>,
    pub remaining_estimate: Option<String>,
    pub versions: Option<Vec<String>>,
    pub environment: Option<String>,
    /// Extra raw fields, applied last and never overriding a mapped key
    pub custom_fields: BTreeMap<String, Value>,
}

impl TicketDraft {
    /// A draft with only the required fields set
    pub fn new(
        summary: impl Into<String>,
        description: impl Into<String>,
        project: ProjectRef,
        issue_type: IssueTypeRef,
    ) -> Self {
        Self {
            summary: summary.into(),
            description: description.into(),
            project,
            issue_type,
            priority: None,
            assignee: None,
            reporter: None,
            labels: None,
            cost_centers: None,
            flows: None,
            tag_types: None,
            beat_types: None,
            parent_key: None,
            security_id: None,
            original_estimate: None,
            remaining_estimate: None,
            versions: None,
            environment: None,
            custom_fields: BTreeMap::new(),
        }
    }
}

/// Sparse set of field changes for an existing ticket
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TicketPatch {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub assignee: Option<String>,
    pub labels: Option<Vec<String>>,
    pub cost_centers: Option<Vec<String>>,
    pub flows: Option<String>,
    pub tag_types: Option<String>,
    pub beat_types: Option<String>,
    pub original_estimate: Option<String>,
    pub remaining_estimate: Option<String>,
    pub versions: Option<Vec<String>>,
    pub environment: Option<String>,
    pub custom_fields: BTreeMap<String, Value>,
}

/// Converts drafts and patches into JIRA `fields` objects
#[derive(Debug, Clone)]
pub struct FieldMapper {
    schema: SchemaVariant,
    ids: CustomFieldIds,
}

impl FieldMapper {
    pub fn new(schema: SchemaVariant, ids: CustomFieldIds) -> Self {
        Self { schema, ids }
    }

    pub fn from_config(config: &JiraConfig) -> Self {
        Self::new(config.schema_variant, config.custom_fields.clone())
    }

    pub fn schema(&self) -> SchemaVariant {
        self.schema
    }

    /// Build the `fields` object for a create request
    pub fn build_create_fields(&self, draft: &TicketDraft) -> TrackerResult<FieldMap> {
        validate_draft(draft)?;

        let mut fields = FieldMap::new();
        fields.insert("project".to_string(), draft.project.to_json());
        fields.insert("issuetype".to_string(), draft.issue_type.to_json());
        fields.insert("summary".to_string(), json!(draft.summary));
        fields.insert(
            "description".to_string(),
            self.rich_text(&draft.description),
        );

        if let Some(priority) = present(&draft.priority) {
            fields.insert("priority".to_string(), json!({ "name": priority }));
        }
        if let Some(assignee) = present(&draft.assignee) {
            fields.insert("assignee".to_string(), self.user_ref(assignee));
        }
        if let Some(reporter) = present(&draft.reporter) {
            fields.insert("reporter".to_string(), self.user_ref(reporter));
        }
        if let Some(labels) = present_list(&draft.labels) {
            fields.insert("labels".to_string(), json!(labels));
        }
        if let Some(cost_centers) = present_list(&draft.cost_centers) {
            fields.insert(self.ids.cost_center.clone(), option_values(cost_centers));
        }
        if let Some(flows) = present(&draft.flows) {
            fields.insert(self.ids.flows.clone(), json!(flows));
        }
        if let Some(tag_types) = present(&draft.tag_types) {
            fields.insert(self.ids.tag_types.clone(), json!(tag_types));
        }
        if let Some(beat_types) = present(&draft.beat_types) {
            fields.insert(self.ids.beat_types.clone(), json!(beat_types));
        }
        if let Some(parent) = present(&draft.parent_key) {
            fields.insert("parent".to_string(), json!({ "key": parent }));
        }
        if let Some(security) = present(&draft.security_id) {
            fields.insert("security".to_string(), json!({ "id": security }));
        }
        if let Some(versions) = present_list(&draft.versions) {
            fields.insert("versions".to_string(), named_values(versions));
        }
        if let Some(environment) = present(&draft.environment) {
            fields.insert("environment".to_string(), self.rich_text(environment));
        }
        if let Some(timetracking) = timetracking(
            present(&draft.original_estimate),
            present(&draft.remaining_estimate),
        ) {
            fields.insert("timetracking".to_string(), timetracking);
        }

        merge_custom_fields(&mut fields, &draft.custom_fields);

        debug!("Built create fields: {:?}", fields.keys().collect::<Vec<_>>());
        Ok(fields)
    }

    /// Build the `fields` object for an update request
    ///
    /// Updates always go through REST v2, so text fields stay plain strings.
    pub fn build_update_fields(&self, patch: &TicketPatch) -> FieldMap {
        let mut fields = FieldMap::new();

        if let Some(summary) = &patch.summary {
            fields.insert("summary".to_string(), json!(summary));
        }
        if let Some(description) = &patch.description {
            fields.insert("description".to_string(), json!(description));
        }
        if let Some(priority) = &patch.priority {
            fields.insert("priority".to_string(), clearable_ref("name", priority));
        }
        if let Some(assignee) = &patch.assignee {
            fields.insert(
                "assignee".to_string(),
                clearable_ref(self.schema.user_key(), assignee),
            );
        }
        if let Some(labels) = &patch.labels {
            fields.insert("labels".to_string(), json!(labels));
        }
        if let Some(cost_centers) = &patch.cost_centers {
            fields.insert(self.ids.cost_center.clone(), option_values(cost_centers));
        }
        if let Some(flows) = &patch.flows {
            fields.insert(self.ids.flows.clone(), json!(flows));
        }
        if let Some(tag_types) = &patch.tag_types {
            fields.insert(self.ids.tag_types.clone(), json!(tag_types));
        }
        if let Some(beat_types) = &patch.beat_types {
            fields.insert(self.ids.beat_types.clone(), json!(beat_types));
        }
        if let Some(versions) = &patch.versions {
            fields.insert("versions".to_string(), named_values(versions));
        }
        if let Some(environment) = &patch.environment {
            fields.insert("environment".to_string(), json!(environment));
        }
        if let Some(timetracking) = timetracking(
            patch.original_estimate.as_deref(),
            patch.remaining_estimate.as_deref(),
        ) {
            fields.insert("timetracking".to_string(), timetracking);
        }

        merge_custom_fields(&mut fields, &patch.custom_fields);

        debug!("Built update fields: {:?}", fields.keys().collect::<Vec<_>>());
        fields
    }

    fn user_ref(&self, user: &str) -> Value {
        let mut reference = Map::new();
        reference.insert(self.schema.user_key().to_string(), json!(user));
        Value::Object(reference)
    }

    fn rich_text(&self, text: &str) -> Value {
        match self.schema {
            SchemaVariant::Legacy => json!(text),
            SchemaVariant::Current => adf_document(text),
        }
    }
}

/// Reject drafts missing any required field before a request is built
pub fn validate_draft(draft: &TicketDraft) -> TrackerResult<()> {
    let checks = [
        ("summary", draft.summary.as_str()),
        ("description", draft.description.as_str()),
        ("project", draft.project.value()),
        ("issue_type", draft.issue_type.value()),
    ];

    for (parameter, value) in checks {
        if value.trim().is_empty() {
            return Err(TrackerError::invalid_param(
                parameter,
                format!("{} is required to create a ticket", parameter),
            ));
        }
    }

    Ok(())
}

/// Wrap plain text in a minimal Atlassian Document Format document,
/// one paragraph per blank-line separated block.
pub fn adf_document(text: &str) -> Value {
    let paragraphs: Vec<Value> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|block| !block.is_empty())
        .map(|block| {
            json!({
                "type": "paragraph",
                "content": [{ "type": "text", "text": block }]
            })
        })
        .collect();

    json!({
        "type": "doc",
        "version": 1,
        "content": paragraphs
    })
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn present_list(values: &Option<Vec<String>>) -> Option<&[String]> {
    values.as_deref().filter(|v| !v.is_empty())
}

/// `{"<key>": value}`, or `null` when the value is a deliberate clear
fn clearable_ref(key: &str, value: &str) -> Value {
    if value.is_empty() {
        Value::Null
    } else {
        let mut reference = Map::new();
        reference.insert(key.to_string(), json!(value));
        Value::Object(reference)
    }
}

fn option_values(values: &[String]) -> Value {
    Value::Array(values.iter().map(|v| json!({ "value": v })).collect())
}

fn named_values(values: &[String]) -> Value {
    Value::Array(values.iter().map(|v| json!({ "name": v })).collect())
}

fn timetracking(original: Option<&str>, remaining: Option<&str>) -> Option<Value> {
    if original.is_none() && remaining.is_none() {
        return None;
    }

    let mut tracking = Map::new();
    if let Some(original) = original {
        tracking.insert("originalEstimate".to_string(), json!(original));
    }
    if let Some(remaining) = remaining {
        tracking.insert("remainingEstimate".to_string(), json!(remaining));
    }
    Some(Value::Object(tracking))
}

fn merge_custom_fields(fields: &mut FieldMap, custom: &BTreeMap<String, Value>) {
    for (field_id, value) in custom {
        if !fields.contains_key(field_id) {
            fields.insert(field_id.clone(), value.clone());
        }
    }
}
