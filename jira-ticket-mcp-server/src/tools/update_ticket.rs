//! Parameters of the update_jira_ticket tool
//!
//! Every field is optional and an absent field is left unchanged on the
//! ticket. An empty string clears the field.

use crate::field_mapper::TicketPatch;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Parameters for the update_jira_ticket tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateJiraTicketParams {
    /// JIRA issue key (required)
    /// Examples: "FCA-123"
    pub issue_key: String,

    /// Target status name; the matching workflow transition is triggered
    /// before any field is written (case-insensitive, e.g. "In Progress")
    pub status_name: Option<String>,

    pub summary: Option<String>,
    pub description: Option<String>,

    /// Priority name; "" clears it
    pub priority: Option<String>,

    /// Assignee username or account id; "" unassigns
    pub assignee: Option<String>,

    /// Replaces all labels
    pub labels: Option<Vec<String>>,

    #[serde(alias = "fin_business_cost_center")]
    pub cost_centers: Option<Vec<String>>,
    pub flows: Option<String>,
    pub tag_types: Option<String>,
    pub beat_types: Option<String>,
    pub original_estimate: Option<String>,
    pub remaining_estimate: Option<String>,
    pub versions: Option<Vec<String>>,
    pub environment: Option<String>,

    /// Extra raw fields keyed by field id; mapped fields take precedence
    pub custom_fields: Option<BTreeMap<String, Value>>,
}

impl UpdateJiraTicketParams {
    /// Split into (issue key, requested status, field patch)
    pub fn into_parts(self) -> (String, Option<String>, TicketPatch) {
        let patch = TicketPatch {
            summary: self.summary,
            description: self.description,
            priority: self.priority,
            assignee: self.assignee,
            labels: self.labels,
            cost_centers: self.cost_centers,
            flows: self.flows,
            tag_types: self.tag_types,
            beat_types: self.beat_types,
            original_estimate: self.original_estimate,
            remaining_estimate: self.remaining_estimate,
            versions: self.versions,
            environment: self.environment,
            custom_fields: self.custom_fields.unwrap_or_default(),
        };

        (self.issue_key, self.status_name, patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_fields_stay_absent() {
        let params: UpdateJiraTicketParams = serde_json::from_value(json!({
            "issue_key": "FCA-9",
            "status_name": "Done",
            "assignee": ""
        }))
        .unwrap();

        let (key, status, patch) = params.into_parts();
        assert_eq!(key, "FCA-9");
        assert_eq!(status.as_deref(), Some("Done"));
        assert_eq!(patch.assignee.as_deref(), Some(""));
        assert!(patch.summary.is_none());
        assert!(patch.custom_fields.is_empty());
    }

    #[test]
    fn test_cost_center_field_name_is_accepted() {
        let params: UpdateJiraTicketParams = serde_json::from_value(json!({
            "issue_key": "FCA-9",
            "fin_business_cost_center": ["Retail"]
        }))
        .unwrap();

        let (_, _, patch) = params.into_parts();
        assert_eq!(patch.cost_centers, Some(vec!["Retail".to_string()]));
    }
}
