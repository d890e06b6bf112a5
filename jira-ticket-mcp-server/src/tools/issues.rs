//! Parameters of the get_issue tool

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the get_issue tool
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct GetIssueParams {
    /// JIRA issue key or numeric id (required)
    /// Examples: "FCA-123", "10042"
    pub issue_key: String,
}
