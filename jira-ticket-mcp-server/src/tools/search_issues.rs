//! Parameters of the search_issues tool
//!
//! Each parameter becomes one JQL predicate; see `crate::jql` for the order
//! and quoting rules.

use crate::jql::SearchFilters;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the search_issues tool
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SearchIssuesParams {
    /// Project key (optional, default: configured search project, e.g. "FCA")
    pub project_key: Option<String>,

    /// Assignee (optional, defaults to the configured user id)
    /// Pass "null" to search across all assignees
    pub assignee: Option<String>,

    pub reporter: Option<String>,
    #[serde(alias = "fixVersion")]
    pub fix_version: Option<String>,
    pub dev_assignee: Option<String>,
    pub qa_assignee: Option<String>,

    /// Backend delivery date, e.g. "2024-06-30"
    pub be_delivery_date: Option<String>,

    /// Frontend delivery date
    pub fe_delivery_date: Option<String>,

    /// Development delivery date
    pub dev_delivery_date: Option<String>,

    /// QA delivery date
    pub qa_delivery_date: Option<String>,

    /// Whether QA is required, e.g. "Yes"
    pub qa_required: Option<String>,

    pub dependent_systems: Option<String>,

    /// Epic issue key, e.g. "FCA-100"
    pub epic_link: Option<String>,

    /// Sprint id or name
    pub sprint: Option<String>,

    pub priority: Option<String>,
    pub issue_type: Option<String>,

    /// Any of these statuses, e.g. ["To Do", "In Progress"]
    pub status: Option<Vec<String>>,

    /// Maximum results to return (optional, default: 5, capped by configuration)
    pub max_results: Option<u32>,
}

impl SearchIssuesParams {
    /// Filters for the query builder; a missing assignee becomes `default_assignee`
    pub fn to_filters(&self, default_assignee: &str) -> SearchFilters {
        SearchFilters {
            assignee: Some(
                self.assignee
                    .clone()
                    .unwrap_or_else(|| default_assignee.to_string()),
            ),
            reporter: self.reporter.clone(),
            fix_version: self.fix_version.clone(),
            dev_assignee: self.dev_assignee.clone(),
            qa_assignee: self.qa_assignee.clone(),
            be_delivery_date: self.be_delivery_date.clone(),
            fe_delivery_date: self.fe_delivery_date.clone(),
            dev_delivery_date: self.dev_delivery_date.clone(),
            qa_delivery_date: self.qa_delivery_date.clone(),
            qa_required: self.qa_required.clone(),
            dependent_systems: self.dependent_systems.clone(),
            epic_link: self.epic_link.clone(),
            sprint: self.sprint.clone(),
            priority: self.priority.clone(),
            issue_type: self.issue_type.clone(),
            status: self.status.clone(),
        }
    }
}
