//! Parameters of the create_jira_ticket tool

use crate::config::TicketDefaults;
use crate::field_mapper::{IssueTypeRef, ProjectRef, TicketDraft};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Parameters for the create_jira_ticket tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CreateJiraTicketParams {
    /// Ticket summary/title (required)
    pub summary: String,

    /// Ticket description (required)
    pub description: String,

    /// Project id or key (optional, defaults to the configured project)
    /// Examples: "31900", "FCA"
    pub project_id: Option<String>,

    /// Issue type id or name (optional, defaults to the configured type)
    /// Examples: "1", "Bug", "Story"
    pub issue_type: Option<String>,

    /// Priority name (optional, default: "Medium")
    pub priority: Option<String>,

    /// Assignee username (Server) or account id (Cloud)
    pub assignee: Option<String>,

    /// Reporter username (Server) or account id (Cloud)
    pub reporter: Option<String>,

    /// Labels to set
    pub labels: Option<Vec<String>>,

    /// Cost centers (optional, default: ["EDC & Enterprise"])
    #[serde(alias = "fin_business_cost_center")]
    pub cost_centers: Option<Vec<String>>,

    /// Flows classifier (optional, default: "*")
    pub flows: Option<String>,

    /// Tag types classifier (optional, default: "*")
    pub tag_types: Option<String>,

    /// Beat types classifier (optional, default: "*")
    pub beat_types: Option<String>,

    /// Parent issue key, for sub-tasks
    pub parent_key: Option<String>,

    /// Security level id
    pub security_id: Option<String>,

    /// Original estimate, e.g. "2d" or "4h"
    pub original_estimate: Option<String>,

    /// Remaining estimate, e.g. "1d"
    pub remaining_estimate: Option<String>,

    /// Affected version names
    pub versions: Option<Vec<String>>,

    /// Environment description
    pub environment: Option<String>,

    /// Extra raw fields keyed by field id; mapped fields take precedence
    pub custom_fields: Option<BTreeMap<String, Value>>,
}

impl CreateJiraTicketParams {
    /// Build a draft, filling every parameter the caller left out from `defaults`
    pub fn into_draft(self, defaults: &TicketDefaults) -> TicketDraft {
        let project = self
            .project_id
            .unwrap_or_else(|| defaults.project_id.clone());
        let issue_type = self
            .issue_type
            .unwrap_or_else(|| defaults.issue_type.clone());

        let mut draft = TicketDraft::new(
            self.summary,
            self.description,
            ProjectRef::parse(&project),
            IssueTypeRef::parse(&issue_type),
        );

        draft.priority = Some(self.priority.unwrap_or_else(|| defaults.priority.clone()));
        draft.assignee = self.assignee;
        draft.reporter = self.reporter;
        draft.labels = self.labels;
        draft.cost_centers = Some(
            self.cost_centers
                .unwrap_or_else(|| defaults.cost_centers.clone()),
        );
        draft.flows = Some(self.flows.unwrap_or_else(|| defaults.flows.clone()));
        draft.tag_types = Some(self.tag_types.unwrap_or_else(|| defaults.tag_types.clone()));
        draft.beat_types = Some(
            self.beat_types
                .unwrap_or_else(|| defaults.beat_types.clone()),
        );
        draft.parent_key = self.parent_key;
        draft.security_id = self.security_id;
        draft.original_estimate = self.original_estimate;
        draft.remaining_estimate = self.remaining_estimate;
        draft.versions = self.versions;
        draft.environment = self.environment;
        draft.custom_fields = self.custom_fields.unwrap_or_default();

        draft
    }
}
